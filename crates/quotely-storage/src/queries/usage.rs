// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger storage.
//!
//! One row per user, two JSON arrays of distinct quote ids. `record` is a
//! read-modify-write inside a single transaction on the writer thread, and
//! its effect is set-union: replaying it with the same quote id is a no-op.
//! That monotonicity is what makes a lost update from a second process a
//! re-check instead of a double charge.

use std::collections::BTreeSet;

use rusqlite::{OptionalExtension, params};

use quotely_core::QuotelyError;
use quotely_core::types::{QuotaKind, Usage, now_iso};

use crate::database::{Database, map_tr_err};

/// Parse a stored id array, tolerating ids written as numbers. Corrupt JSON
/// degrades to an empty set rather than wedging the ledger.
fn parse_id_set(raw: &str) -> BTreeSet<String> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).unwrap_or_default();
    values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn to_json(set: &BTreeSet<String>) -> String {
    serde_json::to_string(set).unwrap_or_else(|_| "[]".to_string())
}

fn load_row(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<Option<Usage>> {
    conn.query_row(
        "SELECT user_id, created_quote_ids, sent_quote_ids, created_at
         FROM usage WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(Usage {
                user_id: row.get(0)?,
                created_quote_ids: parse_id_set(&row.get::<_, String>(1)?),
                sent_quote_ids: parse_id_set(&row.get::<_, String>(2)?),
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Get a user's ledger state. An absent row reads as empty; nothing is
/// written until the first `record`.
pub async fn get_usage(db: &Database, user_id: &str) -> Result<Usage, QuotelyError> {
    let user = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let usage = load_row(conn, &user)?.unwrap_or_else(|| Usage::empty(&user));
            Ok(usage)
        })
        .await
        .map_err(map_tr_err)
}

/// Count of distinct quote ids recorded for this user and kind.
pub async fn used(db: &Database, user_id: &str, kind: QuotaKind) -> Result<usize, QuotelyError> {
    Ok(get_usage(db, user_id).await?.set(kind).len())
}

/// Whether this quote id has already been recorded for this user and kind.
pub async fn already_recorded(
    db: &Database,
    user_id: &str,
    kind: QuotaKind,
    quote_id: &str,
) -> Result<bool, QuotelyError> {
    Ok(get_usage(db, user_id).await?.set(kind).contains(quote_id))
}

/// Add a quote id to the user's ledger set and return the new distinct
/// count. Recording an id that is already present is a no-op returning the
/// unchanged count — callers may replay this freely.
pub async fn record(
    db: &Database,
    user_id: &str,
    kind: QuotaKind,
    quote_id: &str,
) -> Result<usize, QuotelyError> {
    let user = user_id.to_string();
    let quote = quote_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut usage = load_row(&tx, &user)?.unwrap_or_else(|| Usage {
                user_id: user.clone(),
                created_quote_ids: BTreeSet::new(),
                sent_quote_ids: BTreeSet::new(),
                created_at: now_iso(),
            });

            // A quote id that is already a member changes nothing; skip the
            // write entirely so replays stay cheap.
            let inserted = usage.set_mut(kind).insert(quote);
            if inserted {
                tx.execute(
                    "INSERT INTO usage (user_id, created_quote_ids, sent_quote_ids, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(user_id) DO UPDATE SET
                       created_quote_ids = excluded.created_quote_ids,
                       sent_quote_ids = excluded.sent_quote_ids",
                    params![
                        usage.user_id,
                        to_json(&usage.created_quote_ids),
                        to_json(&usage.sent_quote_ids),
                        usage.created_at,
                    ],
                )?;
            }
            tx.commit()?;

            Ok(usage.set(kind).len())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn recording_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();

        assert_eq!(record(&db, "u1", QuotaKind::Sent, "7").await.unwrap(), 1);
        assert_eq!(record(&db, "u1", QuotaKind::Sent, "7").await.unwrap(), 1);
        assert_eq!(record(&db, "u1", QuotaKind::Sent, "7").await.unwrap(), 1);
        assert_eq!(used(&db, "u1", QuotaKind::Sent).await.unwrap(), 1);

        assert_eq!(record(&db, "u1", QuotaKind::Sent, "8").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ledgers_are_independent_per_kind_and_user() {
        let db = Database::open_in_memory().await.unwrap();

        record(&db, "u1", QuotaKind::Created, "1").await.unwrap();
        record(&db, "u1", QuotaKind::Sent, "1").await.unwrap();
        record(&db, "u2", QuotaKind::Created, "1").await.unwrap();

        assert_eq!(used(&db, "u1", QuotaKind::Created).await.unwrap(), 1);
        assert_eq!(used(&db, "u1", QuotaKind::Sent).await.unwrap(), 1);
        assert_eq!(used(&db, "u2", QuotaKind::Created).await.unwrap(), 1);
        assert_eq!(used(&db, "u2", QuotaKind::Sent).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn membership_test_matches_recorded_ids() {
        let db = Database::open_in_memory().await.unwrap();

        assert!(
            !already_recorded(&db, "u1", QuotaKind::Created, "7")
                .await
                .unwrap()
        );
        record(&db, "u1", QuotaKind::Created, "7").await.unwrap();
        assert!(
            already_recorded(&db, "u1", QuotaKind::Created, "7")
                .await
                .unwrap()
        );
        assert!(
            !already_recorded(&db, "u1", QuotaKind::Sent, "7")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn reading_never_creates_a_row() {
        let db = Database::open_in_memory().await.unwrap();
        let usage = get_usage(&db, "u1").await.unwrap();
        assert!(usage.created_quote_ids.is_empty());

        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, tokio_rusqlite::Error> {
                Ok(conn.query_row("SELECT COUNT(*) FROM usage", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn legacy_numeric_ids_are_coerced() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), tokio_rusqlite::Error> {
                conn.execute(
                    "INSERT INTO usage (user_id, created_quote_ids, sent_quote_ids, created_at)
                     VALUES ('u1', '[7, \"8\"]', 'garbage', 't')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let usage = get_usage(&db, "u1").await.unwrap();
        assert!(usage.created_quote_ids.contains("7"));
        assert!(usage.created_quote_ids.contains("8"));
        // Corrupt JSON degrades to empty instead of failing the read.
        assert!(usage.sent_quote_ids.is_empty());
    }

    #[tokio::test]
    async fn concurrent_records_of_same_quote_count_once() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("concurrent_usage.db");
        let db = std::sync::Arc::new(Database::open(db_path.to_str().unwrap()).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = std::sync::Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                record(&db, "u1", QuotaKind::Sent, "7").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(used(&db, "u1", QuotaKind::Sent).await.unwrap(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ledger_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist_usage.db");

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        record(&db, "u1", QuotaKind::Created, "1").await.unwrap();
        record(&db, "u1", QuotaKind::Created, "2").await.unwrap();
        db.close().await.unwrap();

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert_eq!(used(&db, "u1", QuotaKind::Created).await.unwrap(), 2);
        db.close().await.unwrap();
    }
}
