// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound quote message rendering.
//!
//! Consumes a quote (totals derived via [`crate::totals`]) plus the
//! settings row and produces the text block handed to the send targets.
//! Pure: no storage, no network, deterministic output.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use quotely_core::types::{Quote, Settings};

use crate::totals::{calc_totals, line_total, money};

const MISSING: &str = "—";

/// Prefilled share/send URLs for one rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendTargets {
    pub whatsapp_url: String,
    pub gmail_url: String,
    pub mailto_url: String,
    pub sms_url: String,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Render the outbound message for a quote.
pub fn build_quote_message(settings: Option<&Settings>, quote: &Quote) -> String {
    let biz_lines: Vec<&str> = settings
        .map(|s| {
            [
                s.business_name.as_deref(),
                s.phone.as_deref(),
                s.email.as_deref(),
                s.address.as_deref(),
            ]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
        })
        .unwrap_or_default();
    let biz_block = if biz_lines.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", biz_lines.join("\n"))
    };

    let customer_name = if quote.customer_name.is_empty() {
        "Customer"
    } else {
        &quote.customer_name
    };
    let address = quote.address.as_deref().unwrap_or(MISSING);
    let notes = quote.notes.as_deref().unwrap_or(MISSING);
    let transcript = quote.transcript.as_deref().unwrap_or(MISSING);

    let totals = calc_totals(quote);

    let line_text = if quote.lines.is_empty() {
        MISSING.to_string()
    } else {
        quote
            .lines
            .iter()
            .map(|line| {
                let description = if line.description.is_empty() {
                    "Item"
                } else {
                    &line.description
                };
                format!(
                    "{description} {MISSING} {} × £{} = £{}",
                    line.qty,
                    money(line.unit_price),
                    money(line_total(line)),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let vat_block = if totals.vat_enabled {
        format!(
            "\nVAT ({}%): £{}",
            (totals.vat_rate * 100.0).round() as i64,
            money(totals.vat_amount)
        )
    } else {
        String::new()
    };
    let override_note = if totals.overridden {
        "\n(Manual total used)"
    } else {
        ""
    };

    let terms_block = settings
        .and_then(|s| s.terms.as_deref())
        .map(str::trim)
        .filter(|terms| !terms.is_empty())
        .map(|terms| format!("\n\nTerms:\n{terms}"))
        .unwrap_or_default();

    format!(
        "{biz_block}Quote for {customer_name}\n\n\
         Address: {address}\n\n\
         Items:\n{line_text}\n\n\
         Subtotal: £{subtotal}{vat_block}\n\n\
         Total: £{total}{override_note}\n\n\
         Notes:\n{notes}\n\n\
         Transcript:\n{transcript}{terms_block}",
        subtotal = money(totals.subtotal),
        total = money(totals.effective_total),
    )
    .trim()
    .to_string()
}

/// Build prefilled send URLs for a rendered message.
pub fn build_send_targets(message: &str, customer_name: &str) -> SendTargets {
    let name = if customer_name.trim().is_empty() {
        "Customer"
    } else {
        customer_name
    };
    let subject = encode(&format!("Quote - {name}"));
    let body = encode(message);

    SendTargets {
        whatsapp_url: format!("https://wa.me/?text={body}"),
        gmail_url: format!(
            "https://mail.google.com/mail/?view=cm&fs=1&su={subject}&body={body}"
        ),
        mailto_url: format!("mailto:?subject={subject}&body={body}"),
        sms_url: format!("sms:?&body={body}"),
    }
}
