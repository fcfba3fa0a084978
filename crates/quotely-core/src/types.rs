// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity types persisted by the Quotely store.
//!
//! All entities carry ISO-8601 timestamps as strings and an optional owning
//! `user_id`. Rows written before per-user scoping existed have no
//! `user_id` and are visible to every user; that rule lives in the query
//! layer, not here.
//!
//! Quote lines tolerate legacy shapes on read: a `desc` key for the
//! description, camel-case `unitPrice`, numeric line ids, and quantities
//! stored as strings. Writes always emit the current shape.

use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Well-known id of the single settings row.
pub const SETTINGS_ID: &str = "default";

/// VAT rate applied when a stored rate is missing or non-finite.
pub const DEFAULT_VAT_RATE: f64 = 0.2;

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fresh random identity for lines and activities.
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Quoted,
    Won,
    Lost,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    Voice,
    Manual,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Booked,
    OnSite,
    InProgress,
    Completed,
    Invoiced,
}

/// Outbound channel a quote was sent through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SendChannel {
    Whatsapp,
    Email,
    Copy,
}

/// Kind of entry in a quote's activity log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Saved,
    Sent,
}

/// Which quota ledger an action charges against.
///
/// Both ledgers are always maintained; configuration picks which one gates
/// which action, so the charging policy can flip without a data migration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Created,
    Sent,
}

/// A captured lead: someone who asked for a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<String>,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub job_type: Option<String>,
    pub notes: Option<String>,

    pub status: LeadStatus,
}

impl Lead {
    /// A new, unsaved lead with the given name. Timestamps and identity are
    /// assigned by the store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: String::new(),
            updated_at: String::new(),
            user_id: None,
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            job_type: None,
            notes: None,
            status: LeadStatus::New,
        }
    }
}

/// One priced line on a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub id: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default = "default_qty", deserialize_with = "lenient::qty")]
    pub qty: f64,
    #[serde(default, alias = "unitPrice", deserialize_with = "lenient::f64_or_zero")]
    pub unit_price: f64,
}

fn default_qty() -> f64 {
    1.0
}

impl QuoteLine {
    pub fn new(description: impl Into<String>, qty: f64, unit_price: f64) -> Self {
        Self {
            id: fresh_id(),
            description: description.into(),
            qty,
            unit_price,
        }
    }
}

/// One entry in a quote's activity log, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteActivity {
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<SendChannel>,
    pub at: String,
    #[serde(default = "empty_meta")]
    pub meta: serde_json::Value,
}

fn empty_meta() -> serde_json::Value {
    serde_json::json!({})
}

impl QuoteActivity {
    /// A fresh activity stamped with the current time.
    pub fn record(kind: ActivityKind, channel: Option<SendChannel>) -> Self {
        Self {
            id: fresh_id(),
            kind,
            channel,
            at: now_iso(),
            meta: empty_meta(),
        }
    }
}

/// A quote: the central entity of the system.
///
/// `lines` are the authoritative pricing data; totals are always derived on
/// read and never persisted. `total_override` is a presentation escape hatch
/// kept in string form — blank or non-numeric means "unset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<String>,

    pub lead_id: Option<i64>,

    pub customer_name: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub transcript: Option<String>,

    pub source: QuoteSource,
    pub status: QuoteStatus,

    #[serde(default)]
    pub lines: Vec<QuoteLine>,
    #[serde(default)]
    pub vat_enabled: bool,
    #[serde(default = "default_vat_rate", deserialize_with = "lenient::vat_rate")]
    pub vat_rate: f64,
    #[serde(default)]
    pub total_override: Option<String>,
    #[serde(default)]
    pub activities: Vec<QuoteActivity>,
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

impl Default for Quote {
    fn default() -> Self {
        Self {
            id: None,
            created_at: String::new(),
            updated_at: String::new(),
            user_id: None,
            lead_id: None,
            customer_name: String::new(),
            address: None,
            notes: None,
            transcript: None,
            source: QuoteSource::Manual,
            status: QuoteStatus::Draft,
            lines: Vec::new(),
            vat_enabled: false,
            vat_rate: DEFAULT_VAT_RATE,
            total_override: None,
            activities: Vec::new(),
        }
    }
}

/// A scheduled or in-flight piece of work, usually born from a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<String>,

    pub lead_id: Option<i64>,
    pub quote_id: Option<i64>,

    pub customer_name: String,
    pub address: Option<String>,
    pub notes: Option<String>,

    pub stage: JobStage,
    pub scheduled_for: Option<String>,
}

/// The single per-installation settings row (`id = "default"`), consumed by
/// message rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_settings_id")]
    pub id: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub terms: Option<String>,
    pub updated_at: Option<String>,
}

fn default_settings_id() -> String {
    SETTINGS_ID.to_string()
}

/// Per-user quota ledger state: two independent sets of quote identities.
///
/// Membership is idempotent — recording the same quote id twice never grows
/// a set, which is what makes re-saves and re-sends free and makes lost
/// updates across processes re-checkable rather than double-charging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub user_id: String,
    #[serde(default)]
    pub created_quote_ids: BTreeSet<String>,
    #[serde(default)]
    pub sent_quote_ids: BTreeSet<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Usage {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            created_quote_ids: BTreeSet::new(),
            sent_quote_ids: BTreeSet::new(),
            created_at: now_iso(),
        }
    }

    pub fn set(&self, kind: QuotaKind) -> &BTreeSet<String> {
        match kind {
            QuotaKind::Created => &self.created_quote_ids,
            QuotaKind::Sent => &self.sent_quote_ids,
        }
    }

    pub fn set_mut(&mut self, kind: QuotaKind) -> &mut BTreeSet<String> {
        match kind {
            QuotaKind::Created => &mut self.created_quote_ids,
            QuotaKind::Sent => &mut self.sent_quote_ids,
        }
    }
}

mod lenient {
    //! Read-boundary coercions for fields that historically held loose data.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::DEFAULT_VAT_RATE;

    fn coerce_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Unit prices: anything unparsable (including null) becomes 0.
    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_f64(&value).unwrap_or(0.0))
    }

    /// Quantities: null means "not filled in" and defaults to 1, while a
    /// present-but-unparsable value sanitizes to 0.
    pub fn qty<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => 1.0,
            other => coerce_f64(&other).unwrap_or(0.0),
        })
    }

    /// VAT rate: non-finite or unparsable rates fall back to the default.
    pub fn vat_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_f64(&value).unwrap_or(DEFAULT_VAT_RATE))
    }

    /// Ids that may have been stored as numbers.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }
}
