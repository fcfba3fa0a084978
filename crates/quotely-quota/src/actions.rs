// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote action flows: the gate-before / record-after protocol.
//!
//! Every flow follows the same order: consult the gate, perform and persist
//! the action, and only then record usage — so a failed save or send never
//! consumes quota. Recording is idempotent, which makes the whole flow safe
//! to retry end to end.

use tracing::info;

use quotely_core::QuotelyError;
use quotely_core::types::{
    ActivityKind, Lead, LeadStatus, Quote, QuoteActivity, QuotaKind, QuoteStatus, SendChannel,
};
use quotely_pricing::{SendTargets, build_quote_message, build_send_targets};
use quotely_storage::queries::{leads, quotes, settings};
use quotely_storage::{Database, with_write_retry};

use crate::gate::QuotaGate;
use crate::ledger::{self, UsageSummary};

/// Result of a save attempt.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved {
        quote: Quote,
        usage: UsageSummary,
    },
    /// Denied by the gate. Editing an already-counted quote is never
    /// denied; only new quotes hit this.
    LimitReached {
        remaining: u32,
    },
}

/// Result of a send attempt.
#[derive(Debug)]
pub enum SendOutcome {
    Sent {
        quote: Quote,
        usage: UsageSummary,
        message: String,
        targets: SendTargets,
    },
    LimitReached {
        remaining: u32,
    },
    NotFound,
}

/// Result of converting a lead into a draft quote.
#[derive(Debug)]
pub enum ConvertOutcome {
    Converted {
        quote: Quote,
        usage: UsageSummary,
    },
    LimitReached {
        remaining: u32,
    },
    NotFound,
}

async fn denied_remaining(db: &Database, user_id: &str, kind: QuotaKind) -> u32 {
    ledger::summary(db, user_id, kind)
        .await
        .map(|s| s.remaining)
        .unwrap_or(0)
}

/// Save a quote (create or edit), stamping ownership and logging the
/// activity. The created ledger records the quote after a successful write;
/// whether that ledger also gates the save depends on the configured
/// policy.
pub async fn save_quote(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    mut quote: Quote,
) -> Result<SaveOutcome, QuotelyError> {
    let is_new = quote.id.is_none();

    if !gate.allows(db, user_id, QuotaKind::Created, quote.id).await {
        return Ok(SaveOutcome::LimitReached {
            remaining: denied_remaining(db, user_id, QuotaKind::Created).await,
        });
    }

    if quote.user_id.is_none() {
        quote.user_id = Some(user_id.to_string());
    }
    quote.activities.insert(
        0,
        QuoteActivity::record(
            if is_new {
                ActivityKind::Created
            } else {
                ActivityKind::Saved
            },
            None,
        ),
    );

    let saved = with_write_retry(|| quotes::put_quote(db, quote.clone())).await?;
    let quote_id = saved
        .id
        .ok_or_else(|| QuotelyError::Internal("saved quote has no id".to_string()))?;

    // Record only after the write landed.
    let usage = ledger::record(db, user_id, QuotaKind::Created, quote_id).await?;
    info!(quote_id, user_id, used = usage.used, "quote saved");

    Ok(SaveOutcome::Saved {
        quote: saved,
        usage,
    })
}

/// Send a quote through a channel: gate, flip draft to sent, log the
/// activity, persist, record the send, then render the outbound message and
/// targets. A denial leaves the quote untouched.
pub async fn send_quote(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    quote_id: i64,
    channel: SendChannel,
) -> Result<SendOutcome, QuotelyError> {
    let Some(mut quote) = quotes::get_quote(db, quote_id).await? else {
        return Ok(SendOutcome::NotFound);
    };

    if !gate.allows(db, user_id, QuotaKind::Sent, Some(quote_id)).await {
        return Ok(SendOutcome::LimitReached {
            remaining: denied_remaining(db, user_id, QuotaKind::Sent).await,
        });
    }

    if quote.user_id.is_none() {
        quote.user_id = Some(user_id.to_string());
    }
    if quote.status == QuoteStatus::Draft {
        quote.status = QuoteStatus::Sent;
    }
    quote
        .activities
        .insert(0, QuoteActivity::record(ActivityKind::Sent, Some(channel)));

    let saved = with_write_retry(|| quotes::put_quote(db, quote.clone())).await?;

    // Record only after the write landed; a failed send stays free.
    let usage = ledger::record(db, user_id, QuotaKind::Sent, quote_id).await?;
    info!(quote_id, user_id, %channel, used = usage.used, "quote sent");

    let business = settings::get_settings(db).await?;
    let message = build_quote_message(business.as_ref(), &saved);
    let targets = build_send_targets(&message, &saved.customer_name);

    Ok(SendOutcome::Sent {
        quote: saved,
        usage,
        message,
        targets,
    })
}

/// Convert a lead into a draft quote and advance the lead to `quoted`.
pub async fn convert_lead(
    db: &Database,
    gate: &QuotaGate,
    user_id: &str,
    lead_id: i64,
) -> Result<ConvertOutcome, QuotelyError> {
    let Some(lead) = leads::get_lead(db, lead_id).await? else {
        return Ok(ConvertOutcome::NotFound);
    };

    let quote = quote_from_lead(&lead);
    match save_quote(db, gate, user_id, quote).await? {
        SaveOutcome::Saved { quote, usage } => {
            leads::set_lead_status(db, lead_id, LeadStatus::Quoted).await?;
            Ok(ConvertOutcome::Converted { quote, usage })
        }
        SaveOutcome::LimitReached { remaining } => {
            Ok(ConvertOutcome::LimitReached { remaining })
        }
    }
}

fn quote_from_lead(lead: &Lead) -> Quote {
    Quote {
        lead_id: lead.id,
        customer_name: lead.name.clone(),
        address: lead.address.clone(),
        notes: lead.notes.clone(),
        ..Quote::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotely_config::model::ChargeOn;
    use quotely_core::types::QuoteLine;
    use quotely_storage::queries::usage;

    use crate::ledger::FREE_QUOTE_LIMIT;

    async fn setup() -> (Database, QuotaGate) {
        let db = Database::open_in_memory().await.unwrap();
        (db, QuotaGate::new(ChargeOn::Send))
    }

    fn draft_quote(customer: &str) -> Quote {
        Quote {
            customer_name: customer.into(),
            lines: vec![QuoteLine::new("Labour", 2.0, 50.0)],
            ..Quote::default()
        }
    }

    #[tokio::test]
    async fn save_logs_created_then_saved_activities() {
        let (db, gate) = setup().await;

        let SaveOutcome::Saved { quote, .. } =
            save_quote(&db, &gate, "u1", draft_quote("Sam")).await.unwrap()
        else {
            panic!("save should be allowed");
        };
        assert_eq!(quote.activities[0].kind, ActivityKind::Created);
        assert_eq!(quote.user_id.as_deref(), Some("u1"));

        let SaveOutcome::Saved { quote, .. } =
            save_quote(&db, &gate, "u1", quote).await.unwrap()
        else {
            panic!("edit should be allowed");
        };
        assert_eq!(quote.activities.len(), 2);
        assert_eq!(quote.activities[0].kind, ActivityKind::Saved);
    }

    #[tokio::test]
    async fn send_flips_draft_and_records_once_per_quote() {
        let (db, gate) = setup().await;
        let SaveOutcome::Saved { quote, .. } =
            save_quote(&db, &gate, "u1", draft_quote("Sam")).await.unwrap()
        else {
            panic!();
        };
        let id = quote.id.unwrap();

        // Send twice through different channels.
        let SendOutcome::Sent { quote: sent, usage, message, targets } =
            send_quote(&db, &gate, "u1", id, SendChannel::Whatsapp).await.unwrap()
        else {
            panic!("first send should succeed");
        };
        assert_eq!(sent.status, QuoteStatus::Sent);
        assert_eq!(usage.used, 1);
        assert!(message.contains("Quote for Sam"));
        assert!(targets.whatsapp_url.starts_with("https://wa.me/"));

        let SendOutcome::Sent { quote: resent, usage, .. } =
            send_quote(&db, &gate, "u1", id, SendChannel::Email).await.unwrap()
        else {
            panic!("resend should succeed");
        };
        assert_eq!(usage.used, 1, "same quote must not consume quota twice");
        assert_eq!(resent.activities[0].channel, Some(SendChannel::Email));
        assert_eq!(resent.activities[1].channel, Some(SendChannel::Whatsapp));
    }

    #[tokio::test]
    async fn send_denial_leaves_the_quote_untouched() {
        let (db, gate) = setup().await;
        let SaveOutcome::Saved { quote, .. } =
            save_quote(&db, &gate, "u1", draft_quote("Sam")).await.unwrap()
        else {
            panic!();
        };
        let id = quote.id.unwrap();

        // Exhaust the sent ledger with other quote ids.
        for other in 1000..1000 + FREE_QUOTE_LIMIT as i64 {
            usage::record(&db, "u1", QuotaKind::Sent, &other.to_string())
                .await
                .unwrap();
        }

        let outcome = send_quote(&db, &gate, "u1", id, SendChannel::Copy).await.unwrap();
        let SendOutcome::LimitReached { remaining } = outcome else {
            panic!("send should be denied at the limit");
        };
        assert_eq!(remaining, 0);

        let untouched = quotes::get_quote(&db, id).await.unwrap().unwrap();
        assert_eq!(untouched.status, QuoteStatus::Draft);
        assert!(
            untouched.activities.iter().all(|a| a.kind != ActivityKind::Sent),
            "denied send must not log a sent activity"
        );
    }

    #[tokio::test]
    async fn already_sent_quotes_can_resend_at_the_limit() {
        let (db, gate) = setup().await;
        let SaveOutcome::Saved { quote, .. } =
            save_quote(&db, &gate, "u1", draft_quote("Sam")).await.unwrap()
        else {
            panic!();
        };
        let id = quote.id.unwrap();

        let SendOutcome::Sent { .. } =
            send_quote(&db, &gate, "u1", id, SendChannel::Email).await.unwrap()
        else {
            panic!();
        };

        // Fill the rest of the ledger.
        for other in 1000..1000 + FREE_QUOTE_LIMIT as i64 {
            usage::record(&db, "u1", QuotaKind::Sent, &other.to_string())
                .await
                .unwrap();
        }

        let outcome = send_quote(&db, &gate, "u1", id, SendChannel::Copy).await.unwrap();
        assert!(
            matches!(outcome, SendOutcome::Sent { .. }),
            "an already-counted quote stays sendable regardless of remaining"
        );
    }

    #[tokio::test]
    async fn create_policy_denies_the_eleventh_quote() {
        let db = Database::open_in_memory().await.unwrap();
        let gate = QuotaGate::new(ChargeOn::Create);

        let mut last = None;
        for i in 0..FREE_QUOTE_LIMIT {
            let outcome = save_quote(&db, &gate, "u1", draft_quote(&format!("C{i}")))
                .await
                .unwrap();
            let SaveOutcome::Saved { quote, .. } = outcome else {
                panic!("quote {i} should be allowed");
            };
            last = Some(quote);
        }

        let denied = save_quote(&db, &gate, "u1", draft_quote("One Too Many"))
            .await
            .unwrap();
        assert!(matches!(denied, SaveOutcome::LimitReached { remaining: 0 }));

        // Editing one of the original ten stays allowed.
        let edited = save_quote(&db, &gate, "u1", last.unwrap()).await.unwrap();
        assert!(matches!(edited, SaveOutcome::Saved { .. }));
    }

    #[tokio::test]
    async fn send_policy_leaves_saving_ungated() {
        let (db, gate) = setup().await;

        for i in 0..FREE_QUOTE_LIMIT + 2 {
            let outcome = save_quote(&db, &gate, "u1", draft_quote(&format!("C{i}")))
                .await
                .unwrap();
            assert!(
                matches!(outcome, SaveOutcome::Saved { .. }),
                "saves are free under the send policy"
            );
        }
        // The created ledger still counted every one of them.
        assert_eq!(
            ledger::used(&db, "u1", QuotaKind::Created).await.unwrap(),
            FREE_QUOTE_LIMIT + 2
        );
    }

    #[tokio::test]
    async fn send_missing_quote_is_not_found() {
        let (db, gate) = setup().await;
        let outcome = send_quote(&db, &gate, "u1", 404, SendChannel::Email)
            .await
            .unwrap();
        assert!(matches!(outcome, SendOutcome::NotFound));
    }

    #[tokio::test]
    async fn convert_lead_creates_draft_and_advances_status() {
        let (db, gate) = setup().await;
        let mut lead = Lead::new("Dana Fixit");
        lead.address = Some("12 Brick Lane".into());
        let lead = leads::put_lead(&db, lead).await.unwrap();
        let lead_id = lead.id.unwrap();

        let ConvertOutcome::Converted { quote, .. } =
            convert_lead(&db, &gate, "u1", lead_id).await.unwrap()
        else {
            panic!("convert should succeed");
        };
        assert_eq!(quote.customer_name, "Dana Fixit");
        assert_eq!(quote.lead_id, Some(lead_id));
        assert_eq!(quote.status, QuoteStatus::Draft);

        let advanced = leads::get_lead(&db, lead_id).await.unwrap().unwrap();
        assert_eq!(advanced.status, LeadStatus::Quoted);
    }

    #[tokio::test]
    async fn convert_missing_lead_is_not_found() {
        let (db, gate) = setup().await;
        let outcome = convert_lead(&db, &gate, "u1", 404).await.unwrap();
        assert!(matches!(outcome, ConvertOutcome::NotFound));
    }
}
