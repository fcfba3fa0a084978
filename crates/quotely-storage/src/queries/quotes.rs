// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote CRUD operations.
//!
//! Lines and the activity log are stored as JSON documents inside the row.
//! Reads are lenient: a row written by an older version (a `desc` key,
//! camel-case `unitPrice`, numeric ids, stringly quantities) deserializes
//! through the aliases and coercions on [`QuoteLine`], and a corrupt JSON
//! document degrades to empty rather than poisoning the whole row.

use rusqlite::{OptionalExtension, params};

use quotely_core::QuotelyError;
use quotely_core::types::{Quote, QuoteActivity, QuoteLine, now_iso};

use crate::database::{Database, map_tr_err};
use crate::normalize::normalize_quote;
use crate::queries::parse_enum;

const COLUMNS: &str = "id, created_at, updated_at, user_id, lead_id, customer_name, address, \
                       notes, transcript, source, status, lines, vat_enabled, vat_rate, \
                       total_override, activities";

fn row_to_quote(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quote> {
    let lines_raw: String = row.get(11)?;
    let activities_raw: String = row.get(15)?;

    Ok(Quote {
        id: Some(row.get(0)?),
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        user_id: row.get(3)?,
        lead_id: row.get(4)?,
        customer_name: row.get(5)?,
        address: row.get(6)?,
        notes: row.get(7)?,
        transcript: row.get(8)?,
        source: parse_enum(9, row.get::<_, String>(9)?)?,
        status: parse_enum(10, row.get::<_, String>(10)?)?,
        lines: serde_json::from_str::<Vec<QuoteLine>>(&lines_raw).unwrap_or_default(),
        vat_enabled: row.get(12)?,
        vat_rate: row.get(13)?,
        total_override: row.get(14)?,
        activities: serde_json::from_str::<Vec<QuoteActivity>>(&activities_raw)
            .unwrap_or_default(),
    })
}

/// Upsert a quote. A quote without an id is inserted and assigned the next
/// monotonic identity; `updated_at` is refreshed either way.
pub async fn put_quote(db: &Database, mut quote: Quote) -> Result<Quote, QuotelyError> {
    normalize_quote(&mut quote);

    let now = now_iso();
    quote.updated_at = now.clone();
    if quote.created_at.is_empty() {
        quote.created_at = now;
    }

    let lines_json = serde_json::to_string(&quote.lines)
        .map_err(|e| QuotelyError::Internal(format!("serialize quote lines: {e}")))?;
    let activities_json = serde_json::to_string(&quote.activities)
        .map_err(|e| QuotelyError::Internal(format!("serialize quote activities: {e}")))?;

    db.connection()
        .call(move |conn| {
            match quote.id {
                Some(id) => {
                    conn.execute(
                        "INSERT INTO quotes (id, created_at, updated_at, user_id, lead_id,
                                             customer_name, address, notes, transcript, source,
                                             status, lines, vat_enabled, vat_rate,
                                             total_override, activities)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                         ON CONFLICT(id) DO UPDATE SET
                           updated_at = excluded.updated_at,
                           user_id = excluded.user_id,
                           lead_id = excluded.lead_id,
                           customer_name = excluded.customer_name,
                           address = excluded.address,
                           notes = excluded.notes,
                           transcript = excluded.transcript,
                           source = excluded.source,
                           status = excluded.status,
                           lines = excluded.lines,
                           vat_enabled = excluded.vat_enabled,
                           vat_rate = excluded.vat_rate,
                           total_override = excluded.total_override,
                           activities = excluded.activities",
                        params![
                            id,
                            quote.created_at,
                            quote.updated_at,
                            quote.user_id,
                            quote.lead_id,
                            quote.customer_name,
                            quote.address,
                            quote.notes,
                            quote.transcript,
                            quote.source.to_string(),
                            quote.status.to_string(),
                            lines_json,
                            quote.vat_enabled,
                            quote.vat_rate,
                            quote.total_override,
                            activities_json,
                        ],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO quotes (created_at, updated_at, user_id, lead_id,
                                             customer_name, address, notes, transcript, source,
                                             status, lines, vat_enabled, vat_rate,
                                             total_override, activities)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                        params![
                            quote.created_at,
                            quote.updated_at,
                            quote.user_id,
                            quote.lead_id,
                            quote.customer_name,
                            quote.address,
                            quote.notes,
                            quote.transcript,
                            quote.source.to_string(),
                            quote.status.to_string(),
                            lines_json,
                            quote.vat_enabled,
                            quote.vat_rate,
                            quote.total_override,
                            activities_json,
                        ],
                    )?;
                    quote.id = Some(conn.last_insert_rowid());
                }
            }
            Ok(quote)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a quote by id.
pub async fn get_quote(db: &Database, id: i64) -> Result<Option<Quote>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let quote = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM quotes WHERE id = ?1"),
                    params![id],
                    row_to_quote,
                )
                .optional()?;
            Ok(quote)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a quote. No error if the row is already gone.
pub async fn delete_quote(db: &Database, id: i64) -> Result<(), QuotelyError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM quotes WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List quotes newest-updated first, applying the legacy visibility rule.
pub async fn list_quotes(
    db: &Database,
    visible_to: Option<&str>,
) -> Result<Vec<Quote>, QuotelyError> {
    let user = visible_to.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM quotes
                 WHERE ?1 IS NULL OR user_id IS NULL OR user_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![user], row_to_quote)?;
            let mut quotes = Vec::new();
            for row in rows {
                quotes.push(row?);
            }
            Ok(quotes)
        })
        .await
        .map_err(map_tr_err)
}

/// Quotes that reference the given lead, newest-updated first.
pub async fn quotes_for_lead(db: &Database, lead_id: i64) -> Result<Vec<Quote>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM quotes WHERE lead_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![lead_id], row_to_quote)?;
            let mut quotes = Vec::new();
            for row in rows {
                quotes.push(row?);
            }
            Ok(quotes)
        })
        .await
        .map_err(map_tr_err)
}

/// Prepend an activity to a quote's log and refresh `updated_at`, as one
/// read-modify-write transaction. Returns the updated quote, or `None` if
/// the quote does not exist.
pub async fn append_activity(
    db: &Database,
    quote_id: i64,
    activity: QuoteActivity,
) -> Result<Option<Quote>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let quote = {
                tx.query_row(
                    &format!("SELECT {COLUMNS} FROM quotes WHERE id = ?1"),
                    params![quote_id],
                    row_to_quote,
                )
                .optional()?
            };

            let Some(mut quote) = quote else {
                tx.commit()?;
                return Ok(None);
            };

            quote.activities.insert(0, activity);
            quote.updated_at = now_iso();

            let activities_json = serde_json::to_string(&quote.activities)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            tx.execute(
                "UPDATE quotes SET activities = ?1, updated_at = ?2 WHERE id = ?3",
                params![activities_json, quote.updated_at, quote_id],
            )?;
            tx.commit()?;

            Ok(Some(quote))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotely_core::types::{ActivityKind, QuoteSource, QuoteStatus, SendChannel};

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn make_quote(customer: &str) -> Quote {
        Quote {
            customer_name: customer.into(),
            lines: vec![QuoteLine::new("Labour", 2.0, 50.0)],
            ..Quote::default()
        }
    }

    #[tokio::test]
    async fn put_and_get_round_trips() {
        let db = setup_db().await;
        let mut quote = make_quote("Sam Homeowner");
        quote.vat_enabled = true;
        quote.transcript = Some("two days labour at fifty".into());
        quote.source = QuoteSource::Voice;

        let saved = put_quote(&db, quote).await.unwrap();
        let loaded = get_quote(&db, saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.lines[0].unit_price, 50.0);
    }

    #[tokio::test]
    async fn blank_customer_name_defaults_on_save() {
        let db = setup_db().await;
        let saved = put_quote(&db, make_quote("   ")).await.unwrap();
        assert_eq!(saved.customer_name, "Customer");
        let loaded = get_quote(&db, saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.customer_name, "Customer");
    }

    #[tokio::test]
    async fn legacy_line_shapes_normalize_on_read() {
        let db = setup_db().await;

        // A row as an older version would have written it: `desc` key,
        // camel-case unitPrice, numeric line id, stringly qty.
        let id: i64 = db
            .connection()
            .call(|conn| -> Result<i64, tokio_rusqlite::Error> {
                conn.execute(
                    "INSERT INTO quotes (created_at, updated_at, customer_name, source, status, lines)
                     VALUES ('t', 't', 'Old Customer', 'manual', 'draft', ?1)",
                    params![r#"[{"id": 1, "desc": "Boiler swap", "qty": "2", "unitPrice": 50}]"#],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .unwrap();

        let loaded = get_quote(&db, id).await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.lines[0].id, "1");
        assert_eq!(loaded.lines[0].description, "Boiler swap");
        assert_eq!(loaded.lines[0].qty, 2.0);
        assert_eq!(loaded.lines[0].unit_price, 50.0);
    }

    #[tokio::test]
    async fn corrupt_lines_json_degrades_to_empty() {
        let db = setup_db().await;
        let id: i64 = db
            .connection()
            .call(|conn| -> Result<i64, tokio_rusqlite::Error> {
                conn.execute(
                    "INSERT INTO quotes (created_at, updated_at, customer_name, source, status, lines)
                     VALUES ('t', 't', 'C', 'manual', 'draft', 'not json')",
                    [],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .unwrap();

        let loaded = get_quote(&db, id).await.unwrap().unwrap();
        assert!(loaded.lines.is_empty());
    }

    #[tokio::test]
    async fn append_activity_prepends_newest_first() {
        let db = setup_db().await;
        let saved = put_quote(&db, make_quote("Sam")).await.unwrap();
        let id = saved.id.unwrap();

        append_activity(&db, id, QuoteActivity::record(ActivityKind::Created, None))
            .await
            .unwrap();
        let updated = append_activity(
            &db,
            id,
            QuoteActivity::record(ActivityKind::Sent, Some(SendChannel::Email)),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.activities.len(), 2);
        assert_eq!(updated.activities[0].kind, ActivityKind::Sent);
        assert_eq!(updated.activities[1].kind, ActivityKind::Created);
    }

    #[tokio::test]
    async fn append_activity_to_missing_quote_returns_none() {
        let db = setup_db().await;
        let result = append_activity(
            &db,
            404,
            QuoteActivity::record(ActivityKind::Saved, None),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_keeps_soft_references() {
        let db = setup_db().await;
        let mut quote = make_quote("Sam");
        quote.lead_id = Some(7);
        let saved = put_quote(&db, quote).await.unwrap();

        delete_quote(&db, saved.id.unwrap()).await.unwrap();
        delete_quote(&db, saved.id.unwrap()).await.unwrap();
        assert!(get_quote(&db, saved.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_by_lead_reference() {
        let db = setup_db().await;
        let mut linked = make_quote("Sam");
        linked.lead_id = Some(42);
        put_quote(&db, linked).await.unwrap();
        put_quote(&db, make_quote("Other")).await.unwrap();

        let for_lead = quotes_for_lead(&db, 42).await.unwrap();
        assert_eq!(for_lead.len(), 1);
        assert_eq!(for_lead[0].customer_name, "Sam");
    }

    #[tokio::test]
    async fn status_round_trips_through_text() {
        let db = setup_db().await;
        let mut quote = make_quote("Sam");
        quote.status = QuoteStatus::Accepted;
        let saved = put_quote(&db, quote).await.unwrap();
        let loaded = get_quote(&db, saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuoteStatus::Accepted);
    }
}
