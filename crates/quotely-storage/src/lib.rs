// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned SQLite persistence layer for Quotely.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, store-boundary
//! entity normalization, and typed CRUD operations for leads, quotes, jobs,
//! settings, and the usage ledger.

pub mod database;
pub mod migrations;
pub mod models;
pub mod normalize;
pub mod queries;

pub use database::{Database, with_write_retry};
pub use models::*;
