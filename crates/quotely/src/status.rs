// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotely status` command implementation.
//!
//! Shows the free-tier position for both ledgers, which action the current
//! policy charges, and whether the session degraded to in-memory storage.

use serde_json::json;

use quotely_core::QuotelyError;
use quotely_core::types::QuotaKind;
use quotely_quota::{FREE_QUOTE_LIMIT, QuotaGate, ledger};
use quotely_storage::Database;

pub async fn run(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    degraded: bool,
    json: bool,
) -> Result<(), QuotelyError> {
    let created = ledger::summary(db, user_id, QuotaKind::Created).await?;
    let sent = ledger::summary(db, user_id, QuotaKind::Sent).await?;

    if json {
        let payload = json!({
            "user": user_id,
            "limit": FREE_QUOTE_LIMIT,
            "charge_on": gate.policy().to_string(),
            "degraded_storage": degraded,
            "created": { "used": created.used, "remaining": created.remaining },
            "sent": { "used": sent.used, "remaining": sent.remaining },
        });
        println!("{payload}");
        return Ok(());
    }

    println!("user:        {user_id}");
    println!("policy:      charge on {}", gate.policy());
    println!(
        "created:     {} used, {} of {} remaining",
        created.used, created.remaining, FREE_QUOTE_LIMIT
    );
    println!(
        "sent:        {} used, {} of {} remaining",
        sent.used, sent.remaining, FREE_QUOTE_LIMIT
    );
    if degraded {
        println!("storage:     IN-MEMORY (changes will not be saved)");
    }
    Ok(())
}
