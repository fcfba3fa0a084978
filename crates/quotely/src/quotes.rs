// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotely quote` subcommands.

use clap::Subcommand;

use quotely_core::QuotelyError;
use quotely_core::types::{Quote, QuoteLine, QuoteSource, SendChannel};
use quotely_pricing::{calc_totals, money};
use quotely_quota::{QuotaGate, SaveOutcome, SendOutcome, save_quote, send_quote};
use quotely_storage::Database;
use quotely_storage::queries::quotes;

#[derive(Subcommand, Debug)]
pub enum QuoteCommands {
    /// Draft a new quote.
    New {
        /// Customer name (blank falls back to "Customer").
        #[arg(long, default_value = "")]
        customer: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Dictated transcript to keep alongside the quote.
        #[arg(long)]
        transcript: Option<String>,
        /// Line item as "description:qty:unit_price". Repeatable.
        #[arg(long = "line")]
        lines: Vec<String>,
        /// Charge VAT on this quote.
        #[arg(long)]
        vat: bool,
        /// VAT rate as a decimal fraction.
        #[arg(long, default_value_t = quotely_core::DEFAULT_VAT_RATE)]
        vat_rate: f64,
        /// Link back to a lead.
        #[arg(long)]
        lead: Option<i64>,
    },
    /// List quotes, newest first.
    List,
    /// Show one quote with derived totals.
    Show { id: i64 },
    /// Override the quoted total (empty string clears the override).
    Override { id: i64, total: String },
    /// Send a quote via whatsapp, email, or copy.
    Send {
        id: i64,
        #[arg(long, default_value = "copy")]
        channel: String,
    },
    /// Delete a quote.
    Rm { id: i64 },
}

/// Parse "description:qty:unit_price". The description may itself contain
/// colons; numbers that do not parse sanitize to 0 like every other numeric
/// input.
fn parse_line(spec: &str) -> QuoteLine {
    let mut parts = spec.rsplitn(3, ':');
    let price = parts.next().unwrap_or_default();
    let qty = parts.next().unwrap_or_default();
    let description = parts.next().unwrap_or(spec);

    QuoteLine::new(
        description,
        qty.trim().parse().unwrap_or(0.0),
        price.trim().parse().unwrap_or(0.0),
    )
}

fn print_quote(quote: &Quote) {
    let totals = calc_totals(quote);
    println!(
        "quote #{} for {} [{}]",
        quote.id.unwrap_or_default(),
        quote.customer_name,
        quote.status,
    );
    for line in &quote.lines {
        println!(
            "  {} x {} @ £{} = £{}",
            line.description,
            line.qty,
            money(line.unit_price),
            money(line.qty * line.unit_price),
        );
    }
    println!("  subtotal £{}", money(totals.subtotal));
    if totals.vat_enabled {
        println!(
            "  VAT ({}%) £{}",
            (totals.vat_rate * 100.0).round() as i64,
            money(totals.vat_amount)
        );
    }
    if totals.overridden {
        println!("  total £{} (manual override)", money(totals.effective_total));
    } else {
        println!("  total £{}", money(totals.effective_total));
    }
    if let Some(activity) = quote.activities.first() {
        println!("  last activity: {} at {}", activity.kind, activity.at);
    }
}

pub async fn run(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    command: QuoteCommands,
) -> Result<(), QuotelyError> {
    match command {
        QuoteCommands::New {
            customer,
            address,
            notes,
            transcript,
            lines,
            vat,
            vat_rate,
            lead,
        } => {
            let source = if transcript.is_some() {
                QuoteSource::Voice
            } else {
                QuoteSource::Manual
            };
            let quote = Quote {
                customer_name: customer,
                address,
                notes,
                transcript,
                source,
                lines: lines.iter().map(|spec| parse_line(spec)).collect(),
                vat_enabled: vat,
                vat_rate,
                lead_id: lead,
                ..Quote::default()
            };

            match save_quote(db, gate, user_id, quote).await? {
                SaveOutcome::Saved { quote, usage } => {
                    print_quote(&quote);
                    println!(
                        "({} of {} free quotes used)",
                        usage.used,
                        quotely_quota::FREE_QUOTE_LIMIT
                    );
                }
                SaveOutcome::LimitReached { remaining } => {
                    println!(
                        "free quote limit reached ({remaining} remaining) - upgrade to continue"
                    );
                }
            }
        }
        QuoteCommands::List => {
            let all = quotes::list_quotes(db, Some(user_id)).await?;
            if all.is_empty() {
                println!("no quotes yet");
            }
            for quote in all {
                let totals = calc_totals(&quote);
                println!(
                    "#{:<4} {:<24} {:<9} £{}",
                    quote.id.unwrap_or_default(),
                    quote.customer_name,
                    quote.status,
                    money(totals.effective_total),
                );
            }
        }
        QuoteCommands::Show { id } => match quotes::get_quote(db, id).await? {
            Some(quote) => print_quote(&quote),
            None => println!("quote #{id} not found"),
        },
        QuoteCommands::Override { id, total } => match quotes::get_quote(db, id).await? {
            Some(mut quote) => {
                quote.total_override = Some(total);
                match save_quote(db, gate, user_id, quote).await? {
                    SaveOutcome::Saved { quote, .. } => print_quote(&quote),
                    SaveOutcome::LimitReached { remaining } => {
                        println!(
                            "free quote limit reached ({remaining} remaining) - upgrade to continue"
                        );
                    }
                }
            }
            None => println!("quote #{id} not found"),
        },
        QuoteCommands::Send { id, channel } => {
            let channel: SendChannel = channel.parse().map_err(|_| {
                QuotelyError::Validation(format!(
                    "unknown channel `{channel}` (expected whatsapp, email, or copy)"
                ))
            })?;

            match send_quote(db, gate, user_id, id, channel).await? {
                SendOutcome::Sent {
                    usage,
                    message,
                    targets,
                    ..
                } => {
                    println!("{message}");
                    println!();
                    match channel {
                        SendChannel::Whatsapp => println!("open: {}", targets.whatsapp_url),
                        SendChannel::Email => println!("open: {}", targets.gmail_url),
                        SendChannel::Copy => println!("(message above ready to copy)"),
                    }
                    println!(
                        "({} of {} free quotes used)",
                        usage.used,
                        quotely_quota::FREE_QUOTE_LIMIT
                    );
                }
                SendOutcome::LimitReached { remaining } => {
                    println!(
                        "free quote limit reached ({remaining} remaining) - upgrade to continue"
                    );
                }
                SendOutcome::NotFound => println!("quote #{id} not found"),
            }
        }
        QuoteCommands::Rm { id } => {
            quotes::delete_quote(db, id).await?;
            println!("quote #{id} deleted");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_specs() {
        let line = parse_line("Boiler swap:2:450");
        assert_eq!(line.description, "Boiler swap");
        assert_eq!(line.qty, 2.0);
        assert_eq!(line.unit_price, 450.0);
    }

    #[test]
    fn description_may_contain_colons() {
        let line = parse_line("Labour: first fix:8:45.50");
        assert_eq!(line.description, "Labour: first fix");
        assert_eq!(line.qty, 8.0);
        assert_eq!(line.unit_price, 45.5);
    }

    #[test]
    fn unparsable_numbers_sanitize_to_zero() {
        let line = parse_line("Mystery:lots:cheap");
        assert_eq!(line.description, "Mystery");
        assert_eq!(line.qty, 0.0);
        assert_eq!(line.unit_price, 0.0);
    }
}
