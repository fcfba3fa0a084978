// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread; the [`Database`] struct IS the single writer for this process.
//! Do NOT create additional Connection instances for writes. There is no
//! cross-process exclusion — the usage ledger's set-union design is what
//! keeps a second process safe.

use std::fs;
use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use quotely_config::model::StorageConfig;
use quotely_core::QuotelyError;

use crate::migrations;

/// Handle to the embedded store.
///
/// Opening is idempotent: pending schema migrations are applied in ascending
/// version order before the handle is returned. A failure to open or migrate
/// is [`QuotelyError::StoreUnavailable`]; callers degrade to
/// [`Database::open_in_memory`] rather than crash.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and bring its
    /// schema up to date.
    pub async fn open(path: &str) -> Result<Self, QuotelyError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| QuotelyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| QuotelyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        debug!(path, "opening database");
        Self::initialize(conn, true).await
    }

    /// Open according to the `[storage]` config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, QuotelyError> {
        if let Some(parent) = Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| QuotelyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(&config.database_path)
            .await
            .map_err(|e| QuotelyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        debug!(path = %config.database_path, "opening database");
        Self::initialize(conn, config.wal_mode).await
    }

    /// The degraded mode: a fully migrated schema backed by `:memory:`.
    /// Nothing written here survives the process.
    pub async fn open_in_memory() -> Result<Self, QuotelyError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| QuotelyError::StoreUnavailable {
                source: Box::new(e),
            })?;
        Self::initialize(conn, false).await
    }

    async fn initialize(conn: Connection, wal_mode: bool) -> Result<Self, QuotelyError> {
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(|e| QuotelyError::StoreUnavailable {
            source: Box::new(e),
        })?;

        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite handle. Query modules go through this.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and shut down the writer thread. Subsequent
    /// operations on this handle fail.
    pub async fn close(&self) -> Result<(), QuotelyError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| QuotelyError::Internal(format!("close failed: {e}")))?;
        debug!("database closed, WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error from a normal read/write into the retryable
/// store-write failure. Open-time failures map to `StoreUnavailable` at the
/// call site instead.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> QuotelyError {
    QuotelyError::StoreWriteFailed {
        source: Box::new(err),
    }
}

/// Run a store operation, retrying exactly once if it fails with a
/// retryable write error.
pub async fn with_write_retry<T, F, Fut>(mut op: F) -> Result<T, QuotelyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, QuotelyError>>,
{
    match op().await {
        Err(err) if err.is_retryable() => {
            warn!(%err, "store write failed, retrying once");
            op().await
        }
        other => other,
    }
}
