// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job CRUD operations.

use rusqlite::{OptionalExtension, params};

use quotely_core::QuotelyError;
use quotely_core::types::{Job, now_iso};

use crate::database::{Database, map_tr_err};
use crate::normalize::normalize_job;
use crate::queries::parse_enum;

const COLUMNS: &str = "id, created_at, updated_at, user_id, lead_id, quote_id, customer_name, \
                       address, notes, stage, scheduled_for";

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: Some(row.get(0)?),
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        user_id: row.get(3)?,
        lead_id: row.get(4)?,
        quote_id: row.get(5)?,
        customer_name: row.get(6)?,
        address: row.get(7)?,
        notes: row.get(8)?,
        stage: parse_enum(9, row.get::<_, String>(9)?)?,
        scheduled_for: row.get(10)?,
    })
}

/// Upsert a job. A job without an id is inserted and assigned the next
/// monotonic identity.
pub async fn put_job(db: &Database, mut job: Job) -> Result<Job, QuotelyError> {
    normalize_job(&mut job);

    let now = now_iso();
    job.updated_at = now.clone();
    if job.created_at.is_empty() {
        job.created_at = now;
    }

    db.connection()
        .call(move |conn| {
            match job.id {
                Some(id) => {
                    conn.execute(
                        "INSERT INTO jobs (id, created_at, updated_at, user_id, lead_id, quote_id,
                                           customer_name, address, notes, stage, scheduled_for)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                         ON CONFLICT(id) DO UPDATE SET
                           updated_at = excluded.updated_at,
                           user_id = excluded.user_id,
                           lead_id = excluded.lead_id,
                           quote_id = excluded.quote_id,
                           customer_name = excluded.customer_name,
                           address = excluded.address,
                           notes = excluded.notes,
                           stage = excluded.stage,
                           scheduled_for = excluded.scheduled_for",
                        params![
                            id,
                            job.created_at,
                            job.updated_at,
                            job.user_id,
                            job.lead_id,
                            job.quote_id,
                            job.customer_name,
                            job.address,
                            job.notes,
                            job.stage.to_string(),
                            job.scheduled_for,
                        ],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO jobs (created_at, updated_at, user_id, lead_id, quote_id,
                                           customer_name, address, notes, stage, scheduled_for)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        params![
                            job.created_at,
                            job.updated_at,
                            job.user_id,
                            job.lead_id,
                            job.quote_id,
                            job.customer_name,
                            job.address,
                            job.notes,
                            job.stage.to_string(),
                            job.scheduled_for,
                        ],
                    )?;
                    job.id = Some(conn.last_insert_rowid());
                }
            }
            Ok(job)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a job by id.
pub async fn get_job(db: &Database, id: i64) -> Result<Option<Job>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let job = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM jobs WHERE id = ?1"),
                    params![id],
                    row_to_job,
                )
                .optional()?;
            Ok(job)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a job. No error if the row is already gone.
pub async fn delete_job(db: &Database, id: i64) -> Result<(), QuotelyError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List jobs newest-updated first, applying the legacy visibility rule.
pub async fn list_jobs(db: &Database, visible_to: Option<&str>) -> Result<Vec<Job>, QuotelyError> {
    let user = visible_to.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM jobs
                 WHERE ?1 IS NULL OR user_id IS NULL OR user_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![user], row_to_job)?;
            let mut jobs = Vec::new();
            for row in rows {
                jobs.push(row?);
            }
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}

/// Jobs that reference the given quote, newest-updated first.
pub async fn jobs_for_quote(db: &Database, quote_id: i64) -> Result<Vec<Job>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM jobs WHERE quote_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![quote_id], row_to_job)?;
            let mut jobs = Vec::new();
            for row in rows {
                jobs.push(row?);
            }
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}
