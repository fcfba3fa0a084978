// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quotely - a local-first quoting tool for trade businesses.
//!
//! This binary stands in for the UI layer: it calls store CRUD directly and
//! wraps every create/send action in the quota gate.

mod leads;
mod quotes;
mod settings;
mod status;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use quotely_core::{IdentityResolver, QuotelyError, StaticIdentity};
use quotely_quota::QuotaGate;
use quotely_storage::Database;

/// Quotely - capture leads, draft quotes, send them, track their status.
#[derive(Parser, Debug)]
#[command(name = "quotely", version, about, long_about = None)]
struct Cli {
    /// Act as this user id (defaults to the anonymous identity).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture and manage leads.
    Lead {
        #[command(subcommand)]
        command: leads::LeadCommands,
    },
    /// Draft, list, and send quotes.
    Quote {
        #[command(subcommand)]
        command: quotes::QuoteCommands,
    },
    /// Manage the business details used on outgoing quotes.
    Settings {
        #[command(subcommand)]
        command: settings::SettingsCommands,
    },
    /// Show free-tier usage and storage state.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match quotely_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            quotely_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.app.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    // Storage faults must degrade, never crash: fall back to an in-memory
    // store so the session keeps working read-only from the user's view.
    let (db, degraded) = match Database::from_config(&config.storage).await {
        Ok(db) => (db, false),
        Err(err) => {
            warn!(%err, "store unavailable, falling back to in-memory storage");
            match Database::open_in_memory().await {
                Ok(db) => (db, true),
                Err(err) => {
                    eprintln!("quotely: cannot open any storage: {err}");
                    std::process::exit(1);
                }
            }
        }
    };
    if degraded {
        eprintln!("quotely: WARNING: changes made in this session will not be saved");
    }

    let identity = IdentityResolver::new(Box::new(match cli.user {
        Some(user) => StaticIdentity::new(user),
        None => StaticIdentity::anonymous(),
    }));
    let user_id = identity.user_id().await;
    let gate = QuotaGate::new(config.quota.charge_on);

    let result: Result<(), QuotelyError> = match cli.command {
        Commands::Lead { command } => leads::run(&db, &gate, &user_id, command).await,
        Commands::Quote { command } => quotes::run(&db, &gate, &user_id, command).await,
        Commands::Settings { command } => settings::run(&db, command).await,
        Commands::Status { json } => status::run(&db, &gate, &user_id, degraded, json).await,
    };

    let close_result = db.close().await;

    if let Err(err) = result {
        eprintln!("quotely: {err}");
        std::process::exit(1);
    }
    if let Err(err) = close_result {
        warn!(%err, "database close failed");
    }
}
