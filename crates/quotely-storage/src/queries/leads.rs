// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead CRUD operations.

use rusqlite::{OptionalExtension, params};

use quotely_core::QuotelyError;
use quotely_core::types::{Lead, LeadStatus, now_iso};

use crate::database::{Database, map_tr_err};
use crate::normalize::normalize_lead;
use crate::queries::parse_enum;

const COLUMNS: &str =
    "id, created_at, updated_at, user_id, name, phone, email, address, job_type, notes, status";

fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: Some(row.get(0)?),
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        user_id: row.get(3)?,
        name: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        job_type: row.get(8)?,
        notes: row.get(9)?,
        status: parse_enum(10, row.get::<_, String>(10)?)?,
    })
}

/// Upsert a lead. A lead without an id is inserted and assigned the next
/// monotonic identity; `updated_at` is refreshed either way.
pub async fn put_lead(db: &Database, mut lead: Lead) -> Result<Lead, QuotelyError> {
    normalize_lead(&mut lead)?;

    let now = now_iso();
    lead.updated_at = now.clone();
    if lead.created_at.is_empty() {
        lead.created_at = now;
    }

    db.connection()
        .call(move |conn| {
            match lead.id {
                Some(id) => {
                    conn.execute(
                        "INSERT INTO leads (id, created_at, updated_at, user_id, name, phone,
                                            email, address, job_type, notes, status)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                         ON CONFLICT(id) DO UPDATE SET
                           updated_at = excluded.updated_at,
                           user_id = excluded.user_id,
                           name = excluded.name,
                           phone = excluded.phone,
                           email = excluded.email,
                           address = excluded.address,
                           job_type = excluded.job_type,
                           notes = excluded.notes,
                           status = excluded.status",
                        params![
                            id,
                            lead.created_at,
                            lead.updated_at,
                            lead.user_id,
                            lead.name,
                            lead.phone,
                            lead.email,
                            lead.address,
                            lead.job_type,
                            lead.notes,
                            lead.status.to_string(),
                        ],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO leads (created_at, updated_at, user_id, name, phone, email,
                                            address, job_type, notes, status)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        params![
                            lead.created_at,
                            lead.updated_at,
                            lead.user_id,
                            lead.name,
                            lead.phone,
                            lead.email,
                            lead.address,
                            lead.job_type,
                            lead.notes,
                            lead.status.to_string(),
                        ],
                    )?;
                    lead.id = Some(conn.last_insert_rowid());
                }
            }
            Ok(lead)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a lead by id.
pub async fn get_lead(db: &Database, id: i64) -> Result<Option<Lead>, QuotelyError> {
    db.connection()
        .call(move |conn| {
            let lead = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM leads WHERE id = ?1"),
                    params![id],
                    row_to_lead,
                )
                .optional()?;
            Ok(lead)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a lead. Succeeds whether or not the row exists; related quotes
/// and jobs keep their dangling references.
pub async fn delete_lead(db: &Database, id: i64) -> Result<(), QuotelyError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM leads WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List leads newest-updated first. `visible_to` applies the legacy rule:
/// rows without a user id are visible to every user.
pub async fn list_leads(
    db: &Database,
    visible_to: Option<&str>,
) -> Result<Vec<Lead>, QuotelyError> {
    let user = visible_to.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM leads
                 WHERE ?1 IS NULL OR user_id IS NULL OR user_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![user], row_to_lead)?;
            let mut leads = Vec::new();
            for row in rows {
                leads.push(row?);
            }
            Ok(leads)
        })
        .await
        .map_err(map_tr_err)
}

/// List leads in a given status, newest-updated first.
pub async fn leads_by_status(
    db: &Database,
    status: LeadStatus,
    visible_to: Option<&str>,
) -> Result<Vec<Lead>, QuotelyError> {
    let user = visible_to.map(str::to_string);
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM leads
                 WHERE status = ?1 AND (?2 IS NULL OR user_id IS NULL OR user_id = ?2)
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![status, user], row_to_lead)?;
            let mut leads = Vec::new();
            for row in rows {
                leads.push(row?);
            }
            Ok(leads)
        })
        .await
        .map_err(map_tr_err)
}

/// Advance a lead's status (used when a lead is converted into a quote).
pub async fn set_lead_status(
    db: &Database,
    id: i64,
    status: LeadStatus,
) -> Result<(), QuotelyError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status, now_iso(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
