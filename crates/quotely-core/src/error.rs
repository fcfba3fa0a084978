// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the Quotely workspace.
//!
//! Two non-errors by design: a missing entity is `Option::None`, never an
//! error, and a quota denial is a decision value returned by the gate.

use thiserror::Error;

/// The primary error type used across Quotely crates.
#[derive(Debug, Error)]
pub enum QuotelyError {
    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage engine failed to open or migrate. Fatal for the session;
    /// callers degrade to an in-memory store instead of crashing.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A read or write against an open store failed. Transient; safe to
    /// retry once.
    #[error("store write failed: {source}")]
    StoreWriteFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An entity broke a shape rule at the store boundary
    /// (e.g. a lead name shorter than two characters).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuotelyError {
    /// Whether the operation that produced this error may be retried once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreWriteFailed { .. })
    }
}
