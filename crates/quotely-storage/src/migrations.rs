// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!` and run automatically on database open, in ascending
//! version order. Refinery tracks applied versions in its own
//! `refinery_schema_history` table.
//!
//! Every step is additive: it may create a table, add indexes, or add
//! columns, but never drops or renames a table that holds data. V1–V4
//! mirror the schema history of the application (leads, then quotes, then
//! jobs, then settings); V5 adds the usage ledger.

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), refinery::Error> {
    embedded::migrations::runner().run(conn)?;
    Ok(())
}

/// Run migrations only up to `version`.
///
/// Used by tests to populate a database as an older installation would have
/// left it, then verify a later open preserves every row.
pub fn run_migrations_to(
    conn: &mut rusqlite::Connection,
    version: u32,
) -> Result<(), refinery::Error> {
    embedded::migrations::runner()
        .set_target(refinery::Target::Version(version as i32))
        .run(conn)?;
    Ok(())
}
