// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings row operations. There is exactly one row, id `"default"`.

use rusqlite::{OptionalExtension, params};

use quotely_core::QuotelyError;
use quotely_core::types::{SETTINGS_ID, Settings, now_iso};

use crate::database::{Database, map_tr_err};
use crate::normalize::normalize_settings;

/// Get the settings row, if one has been saved.
pub async fn get_settings(db: &Database) -> Result<Option<Settings>, QuotelyError> {
    db.connection()
        .call(|conn| {
            let settings = conn
                .query_row(
                    "SELECT id, business_name, phone, email, address, terms, updated_at
                     FROM settings WHERE id = ?1",
                    params![SETTINGS_ID],
                    |row| {
                        Ok(Settings {
                            id: row.get(0)?,
                            business_name: row.get(1)?,
                            phone: row.get(2)?,
                            email: row.get(3)?,
                            address: row.get(4)?,
                            terms: row.get(5)?,
                            updated_at: row.get(6)?,
                        })
                    },
                )
                .optional()?;
            Ok(settings)
        })
        .await
        .map_err(map_tr_err)
}

/// Upsert the settings row.
pub async fn put_settings(db: &Database, mut settings: Settings) -> Result<Settings, QuotelyError> {
    normalize_settings(&mut settings);
    settings.updated_at = Some(now_iso());

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO settings (id, business_name, phone, email, address, terms, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                   business_name = excluded.business_name,
                   phone = excluded.phone,
                   email = excluded.email,
                   address = excluded.address,
                   terms = excluded.terms,
                   updated_at = excluded.updated_at",
                params![
                    settings.id,
                    settings.business_name,
                    settings.phone,
                    settings.email,
                    settings.address,
                    settings.terms,
                    settings.updated_at,
                ],
            )?;
            Ok(settings)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_settings_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_settings(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips_and_upserts() {
        let db = Database::open_in_memory().await.unwrap();

        let first = put_settings(
            &db,
            Settings {
                business_name: Some("BuildRight Ltd".into()),
                phone: Some("07700 900123".into()),
                ..Settings::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(first.id, SETTINGS_ID);

        let loaded = get_settings(&db).await.unwrap().unwrap();
        assert_eq!(loaded.business_name.as_deref(), Some("BuildRight Ltd"));

        // A second save replaces the same row.
        put_settings(
            &db,
            Settings {
                business_name: Some("BuildRight & Sons".into()),
                ..Settings::default()
            },
        )
        .await
        .unwrap();

        let loaded = get_settings(&db).await.unwrap().unwrap();
        assert_eq!(loaded.business_name.as_deref(), Some("BuildRight & Sons"));
        assert_eq!(loaded.phone, None, "save replaces, not merges");
    }
}
