// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote totals.
//!
//! Intermediate figures stay full-precision floats; the 2-decimal rounding
//! in [`money`] is applied only when a figure is rendered, never
//! mid-calculation.

use quotely_core::types::{DEFAULT_VAT_RATE, Quote, QuoteLine};

/// Derived financial figures for one quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub vat_enabled: bool,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub computed_total: f64,
    /// The total actually quoted: the manual override when one parses, else
    /// the computed total.
    pub effective_total: f64,
    /// Whether a manual override supplied the effective total.
    pub overridden: bool,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// `qty * unit_price`, with non-finite inputs collapsing to 0 so NaN never
/// reaches an output figure.
pub fn line_total(line: &QuoteLine) -> f64 {
    finite_or_zero(finite_or_zero(line.qty) * finite_or_zero(line.unit_price))
}

/// Sum of line totals. An empty line list is 0.
pub fn subtotal(lines: &[QuoteLine]) -> f64 {
    lines.iter().map(line_total).sum()
}

/// Parse a manual override. Blank or non-numeric means "unset".
pub fn parse_override(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Derive all totals for a quote from its authoritative lines and VAT
/// configuration.
pub fn calc_totals(quote: &Quote) -> Totals {
    let subtotal = subtotal(&quote.lines);

    let vat_rate = if quote.vat_rate.is_finite() {
        quote.vat_rate
    } else {
        DEFAULT_VAT_RATE
    };
    let vat_amount = if quote.vat_enabled {
        subtotal * vat_rate
    } else {
        0.0
    };

    let computed_total = subtotal + vat_amount;
    let override_value = parse_override(quote.total_override.as_deref());

    Totals {
        subtotal,
        vat_enabled: quote.vat_enabled,
        vat_rate,
        vat_amount,
        computed_total,
        effective_total: override_value.unwrap_or(computed_total),
        overridden: override_value.is_some(),
    }
}

/// Render a figure with presentation rounding to 2 decimal places.
pub fn money(value: f64) -> String {
    format!("{:.2}", finite_or_zero(value))
}
