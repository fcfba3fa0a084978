// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `quotely-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within the
//! storage crate.

pub use quotely_core::types::{
    ActivityKind, Job, JobStage, Lead, LeadStatus, Quote, QuoteActivity, QuoteLine, QuoteSource,
    QuoteStatus, QuotaKind, SETTINGS_ID, SendChannel, Settings, Usage,
};
