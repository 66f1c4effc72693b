//! # Auth Header Provider
//!
//! Produces `Authorization` headers for outbound API calls, or `None` when the
//! caller should proceed unauthenticated.
//!
//! Resolution order, first match wins:
//!
//! ```text
//! ┌──────────────────────┐   yes   ┌──────────────────────────────┐
//! │ dev mode enabled?    │ ──────▶ │ fixed development identity   │
//! └──────────┬───────────┘         └──────────────────────────────┘
//!            │ no
//! ┌──────────▼───────────┐   no    ┌──────────────────────────────┐
//! │ signed in?           │ ──────▶ │ None                         │
//! └──────────┬───────────┘         └──────────────────────────────┘
//!            │ yes
//! ┌──────────▼───────────┐  error  ┌──────────────────────────────┐
//! │ TokenCache           │ ──────▶ │ warn!, None                  │
//! └──────────┬───────────┘         └──────────────────────────────┘
//!            │ token
//!            ▼
//!     Bearer <token>
//! ```
//!
//! Token failures while signed in are swallowed into `None`. This can hide a
//! broken session from the UI; callers that must surface auth problems
//! (checkout) check the token themselves.

use crate::error::AuthResult;
use crate::token::TokenCache;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// JSON content type sent unless the caller opts out (e.g. multipart uploads)
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Identity used when development mode is on
pub const DEFAULT_DEV_IDENTITY: &str = "dev-test@example.com";

/// The identity platform that knows whether a user is signed in and can
/// issue short-lived bearer tokens for them.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether a user session currently exists
    fn is_signed_in(&self) -> bool;

    /// Issue a token for the current session. `Ok(None)` means the provider
    /// answered without a token.
    async fn get_token(&self) -> AuthResult<Option<String>>;
}

/// Type alias for a shared identity provider (dynamic dispatch)
pub type BoxedIdentityProvider = Arc<dyn IdentityProvider>;

/// Headers for one outbound request. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    token: String,
    content_type: Option<&'static str>,
}

impl AuthHeaders {
    pub fn bearer(token: impl Into<String>, include_content_type: bool) -> Self {
        Self {
            token: token.into(),
            content_type: include_content_type.then_some(JSON_CONTENT_TYPE),
        }
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// The raw bearer token
    pub fn bearer_token(&self) -> &str {
        &self.token
    }

    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    /// Header name/value pairs, ready to attach to a request
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("Authorization", self.authorization())];
        if let Some(ct) = self.content_type {
            pairs.push(("Content-Type", ct.to_string()));
        }
        pairs
    }
}

/// Which branch of the resolution order applies right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Development,
    SignedIn,
    SignedOut,
}

/// Construction-time auth settings
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Bypass the identity provider entirely
    pub dev_mode: bool,
    /// Identity sent as the bearer value in dev mode
    pub dev_identity: String,
}

impl AuthSettings {
    pub fn production() -> Self {
        Self {
            dev_mode: false,
            dev_identity: DEFAULT_DEV_IDENTITY.to_string(),
        }
    }

    pub fn development() -> Self {
        Self {
            dev_mode: true,
            ..Self::production()
        }
    }

    /// Builder: override the development identity
    pub fn with_dev_identity(mut self, identity: impl Into<String>) -> Self {
        self.dev_identity = identity.into();
        self
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::production()
    }
}

/// Composes the token cache, the dev bypass and the signed-out fallback.
pub struct AuthHeaderProvider {
    identity: BoxedIdentityProvider,
    cache: Arc<TokenCache>,
    settings: AuthSettings,
}

impl AuthHeaderProvider {
    pub fn new(identity: BoxedIdentityProvider, settings: AuthSettings) -> Self {
        Self::with_cache(identity, Arc::new(TokenCache::new()), settings)
    }

    /// Use an existing cache (shared with other components or a test clock)
    pub fn with_cache(
        identity: BoxedIdentityProvider,
        cache: Arc<TokenCache>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            identity,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    pub fn is_dev_mode(&self) -> bool {
        self.settings.dev_mode
    }

    pub fn state(&self) -> AuthState {
        if self.settings.dev_mode {
            AuthState::Development
        } else if self.identity.is_signed_in() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    /// Build request headers, or `None` to proceed unauthenticated.
    /// Never fails.
    pub async fn get_auth_headers(&self, skip_content_type: bool) -> Option<AuthHeaders> {
        let include_content_type = !skip_content_type;

        match self.state() {
            AuthState::Development => {
                debug!("Development mode, using dev identity");
                Some(AuthHeaders::bearer(
                    self.settings.dev_identity.clone(),
                    include_content_type,
                ))
            }
            AuthState::SignedOut => {
                debug!("User not signed in, proceeding without auth headers");
                None
            }
            AuthState::SignedIn => {
                let identity = &self.identity;
                match self
                    .cache
                    .get_valid_token(|| async move { identity.get_token().await })
                    .await
                {
                    Ok(token) => {
                        debug!("Using bearer token {}...", token_prefix(&token));
                        Some(AuthHeaders::bearer(token, include_content_type))
                    }
                    Err(e) => {
                        warn!("Authentication error, proceeding without auth headers: {}", e);
                        None
                    }
                }
            }
        }
    }

    /// Bearer token for call sites that pass it on explicitly
    pub async fn access_token(&self) -> Option<String> {
        self.get_auth_headers(true)
            .await
            .map(|h| h.bearer_token().to_string())
    }
}

/// First few characters of a token, safe for logs
pub fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
