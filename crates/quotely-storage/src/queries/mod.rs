// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.
//!
//! Conventions shared by every module: `get_*` returns `Option` (a missing
//! row is not an error), `put_*` normalizes then upserts and returns the
//! stored entity with its assigned id, `delete_*` is a no-op when the row is
//! already gone, and `list_*` orders by `updated_at` descending and applies
//! the legacy visibility rule — rows without a `user_id` predate per-user
//! scoping and are visible to everyone.

pub mod jobs;
pub mod leads;
pub mod quotes;
pub mod settings;
pub mod usage;

/// Parse a TEXT column into a strum-backed enum inside a rusqlite row
/// mapper.
pub(crate) fn parse_enum<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
