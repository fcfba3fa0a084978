// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Quotely, a local-first quoting tool for trade
//! businesses.
//!
//! This crate provides the entity types persisted by the store, the shared
//! error taxonomy, and the session-scoped identity resolution service used
//! by the storage and quota crates.

pub mod error;
pub mod identity;
pub mod types;

pub use error::QuotelyError;
pub use identity::{ANON_USER, IdentityProvider, IdentityResolver, StaticIdentity};
pub use types::{
    ActivityKind, DEFAULT_VAT_RATE, Job, JobStage, Lead, LeadStatus, Quote, QuoteActivity,
    QuoteLine, QuoteSource, QuoteStatus, QuotaKind, SETTINGS_ID, SendChannel, Settings, Usage,
};
