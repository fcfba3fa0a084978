// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./quotely.toml` > `~/.config/quotely/quotely.toml`
//! > `/etc/quotely/quotely.toml`, with environment variable overrides via the
//! `QUOTELY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::QuotelyConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/quotely/quotely.toml` (system-wide)
/// 3. `~/.config/quotely/quotely.toml` (user XDG config)
/// 4. `./quotely.toml` (local directory)
/// 5. `QUOTELY_*` environment variables
pub fn load_config() -> Result<QuotelyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<QuotelyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuotelyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QuotelyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuotelyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading (exposed so tests and
/// diagnostics can inspect the merged providers).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QuotelyConfig::default()))
        .merge(Toml::file("/etc/quotely/quotely.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("quotely/quotely.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("quotely.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `QUOTELY_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("QUOTELY_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("quota_", "quota.", 1);
        mapped.into()
    })
}
