// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The quota ledger: per-user counts of distinct quote identities.
//!
//! Counting is membership in a durable set, not an incrementing counter, so
//! recording is idempotent by construction: replaying `record` for a quote
//! that is already counted returns the unchanged count. A failed action is
//! never recorded — callers record only after the action succeeds.

use quotely_core::QuotelyError;
use quotely_core::types::QuotaKind;
use quotely_storage::Database;
use quotely_storage::queries::usage;

/// Distinct quotes a free-tier user may have counted per ledger.
pub const FREE_QUOTE_LIMIT: u32 = 10;

/// A user's position against the limit for one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSummary {
    pub used: u32,
    pub remaining: u32,
}

impl UsageSummary {
    fn from_used(used: usize) -> Self {
        let used = used as u32;
        Self {
            used,
            remaining: FREE_QUOTE_LIMIT.saturating_sub(used),
        }
    }
}

/// Count of distinct quote ids recorded for this user and kind.
pub async fn used(db: &Database, user_id: &str, kind: QuotaKind) -> Result<u32, QuotelyError> {
    Ok(usage::used(db, user_id, kind).await? as u32)
}

/// Free units left: `max(0, LIMIT - used)`.
pub async fn remaining(db: &Database, user_id: &str, kind: QuotaKind) -> Result<u32, QuotelyError> {
    Ok(summary(db, user_id, kind).await?.remaining)
}

/// Both figures in one read.
pub async fn summary(
    db: &Database,
    user_id: &str,
    kind: QuotaKind,
) -> Result<UsageSummary, QuotelyError> {
    Ok(UsageSummary::from_used(usage::used(db, user_id, kind).await?))
}

/// Whether this quote has already been counted for this user and kind.
pub async fn already_recorded(
    db: &Database,
    user_id: &str,
    kind: QuotaKind,
    quote_id: i64,
) -> Result<bool, QuotelyError> {
    usage::already_recorded(db, user_id, kind, &quote_id.to_string()).await
}

/// Count this quote, once. Returns the summary after the (possibly no-op)
/// union. Safe to retry: the operation is pure set-union.
pub async fn record(
    db: &Database,
    user_id: &str,
    kind: QuotaKind,
    quote_id: i64,
) -> Result<UsageSummary, QuotelyError> {
    let used = usage::record(db, user_id, kind, &quote_id.to_string()).await?;
    Ok(UsageSummary::from_used(used))
}
