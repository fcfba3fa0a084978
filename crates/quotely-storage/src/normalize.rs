// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-boundary shape normalization.
//!
//! Applied by every `put_*` before a row is written: strings are trimmed,
//! optional fields that trim to empty become `None` (so "absent" and
//! "explicitly blank" both store as absent), and numeric fields are
//! sanitized rather than rejected. The only rule that rejects a save is the
//! lead-name minimum length.

use quotely_core::types::{DEFAULT_VAT_RATE, Job, Lead, Quote, SETTINGS_ID, Settings, fresh_id};
use quotely_core::QuotelyError;

/// Fallback customer name applied when a quote or job is saved blank.
pub const DEFAULT_CUSTOMER_NAME: &str = "Customer";

fn clean(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(clean)
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Normalize a lead before writing. The name must survive trimming with at
/// least two characters.
pub fn normalize_lead(lead: &mut Lead) -> Result<(), QuotelyError> {
    lead.name = lead.name.trim().to_string();
    if lead.name.chars().count() < 2 {
        return Err(QuotelyError::Validation(
            "lead name must be at least 2 characters".to_string(),
        ));
    }

    lead.user_id = clean_opt(lead.user_id.take());
    lead.phone = clean_opt(lead.phone.take());
    lead.email = clean_opt(lead.email.take());
    lead.address = clean_opt(lead.address.take());
    lead.job_type = clean_opt(lead.job_type.take());
    lead.notes = clean_opt(lead.notes.take());
    Ok(())
}

/// Normalize a quote before writing.
///
/// Never rejects: a blank customer name becomes "Customer", loose numerics
/// collapse to finite values, blank overrides become unset, and lines with
/// no id get a fresh one.
pub fn normalize_quote(quote: &mut Quote) {
    quote.customer_name = clean(&quote.customer_name)
        .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string());

    quote.user_id = clean_opt(quote.user_id.take());
    quote.address = clean_opt(quote.address.take());
    quote.notes = clean_opt(quote.notes.take());
    quote.transcript = clean_opt(quote.transcript.take());
    quote.total_override = clean_opt(quote.total_override.take());

    quote.vat_rate = finite_or(quote.vat_rate, DEFAULT_VAT_RATE);

    for line in &mut quote.lines {
        line.description = line.description.trim().to_string();
        line.qty = finite_or(line.qty, 0.0);
        line.unit_price = finite_or(line.unit_price, 0.0);
        if line.id.trim().is_empty() {
            line.id = fresh_id();
        }
    }
}

/// Normalize a job before writing.
pub fn normalize_job(job: &mut Job) {
    job.customer_name = clean(&job.customer_name)
        .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string());
    job.user_id = clean_opt(job.user_id.take());
    job.address = clean_opt(job.address.take());
    job.notes = clean_opt(job.notes.take());
    job.scheduled_for = clean_opt(job.scheduled_for.take());
}

/// Normalize the settings row. The id is always the well-known one.
pub fn normalize_settings(settings: &mut Settings) {
    settings.id = SETTINGS_ID.to_string();
    settings.business_name = clean_opt(settings.business_name.take());
    settings.phone = clean_opt(settings.phone.take());
    settings.email = clean_opt(settings.email.take());
    settings.address = clean_opt(settings.address.take());
    settings.terms = clean_opt(settings.terms.take());
}
