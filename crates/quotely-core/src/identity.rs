// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution.
//!
//! The real identity provider lives outside this system. Callers construct
//! one [`IdentityResolver`] per session and pass it by reference wherever a
//! user id is needed — there is no module-level cache to invalidate.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::QuotelyError;

/// Sentinel identity for unauthenticated use. Valid everywhere a user id is
/// accepted; the store and ledger give it no special treatment.
pub const ANON_USER: &str = "anon";

/// Source of the stable user id for this session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self) -> Result<String, QuotelyError>;
}

/// A provider that always returns a fixed id. Used by the CLI (`--user`)
/// and by tests.
pub struct StaticIdentity {
    user_id: String,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The unauthenticated sentinel.
    pub fn anonymous() -> Self {
        Self::new(ANON_USER)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self) -> Result<String, QuotelyError> {
        Ok(self.user_id.clone())
    }
}

/// Session-scoped identity service.
///
/// Resolves once through the provider and caches the result for the life of
/// the resolver. Provider failure or a blank id resolves to [`ANON_USER`].
pub struct IdentityResolver {
    provider: Box<dyn IdentityProvider>,
    cached: OnceCell<String>,
}

impl IdentityResolver {
    pub fn new(provider: Box<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cached: OnceCell::new(),
        }
    }

    /// The user id for this session, resolving it on first use.
    pub async fn user_id(&self) -> String {
        self.cached
            .get_or_init(|| async {
                match self.provider.resolve().await {
                    Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
                    Ok(_) => ANON_USER.to_string(),
                    Err(err) => {
                        debug!(%err, "identity provider failed, using anonymous identity");
                        ANON_USER.to_string()
                    }
                }
            })
            .await
            .clone()
    }
}
