// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migration safety: a database populated under schema version N keeps
//! every row in every pre-existing table when opened under a later version.

use quotely_storage::database::Database;
use quotely_storage::migrations;
use quotely_storage::queries::{leads, quotes};

#[tokio::test]
async fn rows_survive_upgrade_from_v2() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("upgrade_v2.db");

    // Populate the database as a version-2 installation (leads + quotes
    // only) would have left it.
    {
        let mut conn = rusqlite::Connection::open(&db_path).unwrap();
        migrations::run_migrations_to(&mut conn, 2).unwrap();

        conn.execute(
            "INSERT INTO leads (created_at, updated_at, name, status)
             VALUES ('2025-01-01T00:00:00.000Z', '2025-01-01T00:00:00.000Z', 'Dana Fixit', 'new')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO quotes (created_at, updated_at, customer_name, source, status, lines)
             VALUES ('2025-01-02T00:00:00.000Z', '2025-01-02T00:00:00.000Z', 'Sam', 'manual',
                     'draft', '[{\"id\":\"a\",\"description\":\"Labour\",\"qty\":2,\"unit_price\":50}]')",
            [],
        )
        .unwrap();

        // V3..V5 tables must not exist yet.
        let later_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('jobs', 'settings', 'usage')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(later_tables, 0);
    }

    // Opening at the latest version applies V3..V5 and preserves the data.
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

    let all_leads = leads::list_leads(&db, None).await.unwrap();
    assert_eq!(all_leads.len(), 1);
    assert_eq!(all_leads[0].name, "Dana Fixit");

    let all_quotes = quotes::list_quotes(&db, None).await.unwrap();
    assert_eq!(all_quotes.len(), 1);
    assert_eq!(all_quotes[0].customer_name, "Sam");
    assert_eq!(all_quotes[0].lines.len(), 1);
    assert_eq!(all_quotes[0].lines[0].qty, 2.0);

    // And the newer tables are now present and usable.
    let later_tables: i64 = db
        .connection()
        .call(|conn| -> Result<i64, tokio_rusqlite::Error> {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('jobs', 'settings', 'usage')",
                [],
                |row| row.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(later_tables, 3);

    db.close().await.unwrap();
}

#[tokio::test]
async fn rows_survive_upgrade_from_v1() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("upgrade_v1.db");

    {
        let mut conn = rusqlite::Connection::open(&db_path).unwrap();
        migrations::run_migrations_to(&mut conn, 1).unwrap();
        conn.execute(
            "INSERT INTO leads (created_at, updated_at, name, phone, status)
             VALUES ('2024-06-01T00:00:00.000Z', '2024-06-01T00:00:00.000Z',
                     'Old Lead', '07700 900000', 'contacted')",
            [],
        )
        .unwrap();
    }

    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    let all_leads = leads::list_leads(&db, None).await.unwrap();
    assert_eq!(all_leads.len(), 1);
    assert_eq!(all_leads[0].name, "Old Lead");
    assert_eq!(all_leads[0].phone.as_deref(), Some("07700 900000"));
    db.close().await.unwrap();
}

#[tokio::test]
async fn upgraded_database_accepts_new_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("upgrade_write.db");

    {
        let mut conn = rusqlite::Connection::open(&db_path).unwrap();
        migrations::run_migrations_to(&mut conn, 2).unwrap();
        conn.execute(
            "INSERT INTO leads (created_at, updated_at, name, status)
             VALUES ('t', 't', 'Existing', 'new')",
            [],
        )
        .unwrap();
    }

    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

    // New rows get ids after the preserved ones.
    let saved = leads::put_lead(&db, quotely_storage::Lead::new("Newcomer"))
        .await
        .unwrap();
    assert!(saved.id.unwrap() > 1);
    assert_eq!(leads::list_leads(&db, None).await.unwrap().len(), 2);

    db.close().await.unwrap();
}
