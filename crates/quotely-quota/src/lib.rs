// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-tier quota enforcement for Quotely.
//!
//! The [`ledger`] answers "how many distinct quotes has this user had
//! counted" with idempotent, at-most-once recording; the [`gate`] decides
//! whether an action may proceed under the configured charging policy; and
//! [`actions`] wires the gate-before / record-after protocol around the
//! save and send flows.

pub mod actions;
pub mod gate;
pub mod ledger;

pub use actions::{ConvertOutcome, SaveOutcome, SendOutcome, convert_lead, save_quote, send_quote};
pub use gate::QuotaGate;
pub use ledger::{FREE_QUOTE_LIMIT, UsageSummary};
