// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotely settings` subcommands.

use clap::Subcommand;

use quotely_core::QuotelyError;
use quotely_core::types::Settings;
use quotely_storage::Database;
use quotely_storage::queries::settings;

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show the saved business details.
    Show,
    /// Replace the business details used on outgoing quotes.
    Set {
        #[arg(long)]
        business_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Terms appended to every quote message.
        #[arg(long)]
        terms: Option<String>,
    },
}

pub async fn run(db: &Database, command: SettingsCommands) -> Result<(), QuotelyError> {
    match command {
        SettingsCommands::Show => match settings::get_settings(db).await? {
            Some(saved) => {
                println!("business: {}", saved.business_name.as_deref().unwrap_or("-"));
                println!("phone:    {}", saved.phone.as_deref().unwrap_or("-"));
                println!("email:    {}", saved.email.as_deref().unwrap_or("-"));
                println!("address:  {}", saved.address.as_deref().unwrap_or("-"));
                println!("terms:    {}", saved.terms.as_deref().unwrap_or("-"));
            }
            None => println!("no settings saved yet"),
        },
        SettingsCommands::Set {
            business_name,
            phone,
            email,
            address,
            terms,
        } => {
            let saved = settings::put_settings(
                db,
                Settings {
                    business_name,
                    phone,
                    email,
                    address,
                    terms,
                    ..Settings::default()
                },
            )
            .await?;
            println!(
                "settings saved for {}",
                saved.business_name.as_deref().unwrap_or("(unnamed business)")
            );
        }
    }
    Ok(())
}
