// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotely lead` subcommands.

use clap::Subcommand;

use quotely_core::QuotelyError;
use quotely_core::types::Lead;
use quotely_quota::{ConvertOutcome, QuotaGate, convert_lead};
use quotely_storage::Database;
use quotely_storage::queries::leads;

#[derive(Subcommand, Debug)]
pub enum LeadCommands {
    /// Capture a new lead.
    Add {
        /// Customer name (at least 2 characters).
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Kind of work, e.g. "bathroom refit".
        #[arg(long)]
        job_type: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List leads, newest first.
    List,
    /// Turn a lead into a draft quote and mark it quoted.
    Convert { id: i64 },
    /// Delete a lead. Quotes and jobs keep their references.
    Rm { id: i64 },
}

pub async fn run(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    command: LeadCommands,
) -> Result<(), QuotelyError> {
    match command {
        LeadCommands::Add {
            name,
            phone,
            email,
            address,
            job_type,
            notes,
        } => {
            let lead = Lead {
                user_id: Some(user_id.to_string()),
                phone,
                email,
                address,
                job_type,
                notes,
                ..Lead::new(name)
            };
            let saved = leads::put_lead(db, lead).await?;
            println!(
                "lead #{} saved ({})",
                saved.id.unwrap_or_default(),
                saved.name
            );
        }
        LeadCommands::List => {
            let all = leads::list_leads(db, Some(user_id)).await?;
            if all.is_empty() {
                println!("no leads yet");
            }
            for lead in all {
                println!(
                    "#{:<4} {:<24} {:<10} {}",
                    lead.id.unwrap_or_default(),
                    lead.name,
                    lead.status,
                    lead.phone.as_deref().unwrap_or("-"),
                );
            }
        }
        LeadCommands::Convert { id } => {
            match convert_lead(db, gate, user_id, id).await? {
                ConvertOutcome::Converted { quote, usage } => {
                    println!(
                        "quote #{} drafted from lead #{id} ({} of {} free quotes used)",
                        quote.id.unwrap_or_default(),
                        usage.used,
                        quotely_quota::FREE_QUOTE_LIMIT,
                    );
                }
                ConvertOutcome::LimitReached { remaining } => {
                    println!(
                        "free quote limit reached ({remaining} remaining) - upgrade to continue"
                    );
                }
                ConvertOutcome::NotFound => println!("lead #{id} not found"),
            }
        }
        LeadCommands::Rm { id } => {
            leads::delete_lead(db, id).await?;
            println!("lead #{id} deleted");
        }
    }
    Ok(())
}
