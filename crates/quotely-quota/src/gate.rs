// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The quota gate: may this user perform this action on this quote?
//!
//! Denial is expected control flow — the gate returns booleans, never
//! errors. If the ledger cannot be read the gate denies (fails closed);
//! an un-metered bypass is worse than a spurious denial. The ledger is read
//! on every check, never cached across a session, to keep the race window
//! between two open tabs as small as the storage allows.

use tracing::warn;

use quotely_config::model::ChargeOn;
use quotely_core::QuotelyError;
use quotely_core::types::QuotaKind;
use quotely_storage::Database;

use crate::ledger;

/// Policy layer consulted by the save/send flows.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGate {
    policy: ChargeOn,
}

impl QuotaGate {
    pub fn new(policy: ChargeOn) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ChargeOn {
        self.policy
    }

    /// Whether the configured policy gates actions charged to `kind`.
    /// The other ledger keeps recording but never denies.
    pub fn gates(&self, kind: QuotaKind) -> bool {
        matches!(
            (self.policy, kind),
            (ChargeOn::Create, QuotaKind::Created) | (ChargeOn::Send, QuotaKind::Sent)
        )
    }

    /// The core check: an already-counted quote is always allowed (repeats
    /// are free), otherwise there must be quota remaining. Ledger failure
    /// denies.
    pub async fn can_perform(
        &self,
        db: &Database,
        user_id: &str,
        kind: QuotaKind,
        quote_id: Option<i64>,
    ) -> bool {
        match self.check(db, user_id, kind, quote_id).await {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(%err, user_id, "quota ledger unreadable, denying action");
                false
            }
        }
    }

    /// Policy-aware variant used by the action flows: kinds the policy does
    /// not gate are always allowed.
    pub async fn allows(
        &self,
        db: &Database,
        user_id: &str,
        kind: QuotaKind,
        quote_id: Option<i64>,
    ) -> bool {
        if !self.gates(kind) {
            return true;
        }
        self.can_perform(db, user_id, kind, quote_id).await
    }

    async fn check(
        &self,
        db: &Database,
        user_id: &str,
        kind: QuotaKind,
        quote_id: Option<i64>,
    ) -> Result<bool, QuotelyError> {
        if let Some(id) = quote_id
            && ledger::already_recorded(db, user_id, kind, id).await?
        {
            return Ok(true);
        }
        Ok(ledger::remaining(db, user_id, kind).await? > 0)
    }
}
