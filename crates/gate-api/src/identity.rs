//! # Clerk Identity Provider
//!
//! Issues session tokens through the Clerk Backend API:
//! `POST {api}/v1/sessions/{session_id}/tokens` with the secret key as
//! bearer, answering `{ "jwt": "..." }`.
//!
//! No session id configured means "not signed in".

use async_trait::async_trait;
use gate_core::{AuthError, AuthResult, IdentityProvider};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use tracing::{debug, instrument};

pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com";

/// Clerk Backend API settings
#[derive(Debug, Clone)]
pub struct ClerkConfig {
    /// Backend secret key (sk_test_... or sk_live_...)
    pub secret_key: String,
    /// Session to issue tokens for
    pub session_id: Option<String>,
    pub api_url: String,
}

impl ClerkConfig {
    /// Load configuration from environment variables.
    ///
    /// Env vars:
    /// - `CLERK_SECRET_KEY`
    /// - `CLERK_SESSION_ID` (unset means signed out)
    /// - `CLERK_API_URL` (optional)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            secret_key: env::var("CLERK_SECRET_KEY").unwrap_or_default(),
            session_id: env::var("CLERK_SESSION_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            api_url: env::var("CLERK_API_URL")
                .unwrap_or_else(|_| DEFAULT_CLERK_API_URL.to_string()),
        }
    }

    pub fn new(secret_key: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            session_id,
            api_url: DEFAULT_CLERK_API_URL.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SessionTokenResponse {
    #[serde(default)]
    jwt: Option<String>,
}

/// Identity provider backed by one Clerk session
pub struct ClerkSessionIdentity {
    config: ClerkConfig,
    client: Client,
}

impl ClerkSessionIdentity {
    pub fn new(config: ClerkConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(ClerkConfig::from_env())
    }
}

#[async_trait]
impl IdentityProvider for ClerkSessionIdentity {
    fn is_signed_in(&self) -> bool {
        self.config.session_id.is_some()
    }

    #[instrument(skip(self))]
    async fn get_token(&self) -> AuthResult<Option<String>> {
        let Some(session_id) = self.config.session_id.as_deref() else {
            return Ok(None);
        };

        if self.config.secret_key.is_empty() {
            return Err(AuthError::Provider("CLERK_SECRET_KEY not set".to_string()));
        }

        let url = format!(
            "{}/v1/sessions/{}/tokens",
            self.config.api_url.trim_end_matches('/'),
            session_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let token: SessionTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse token response: {}", e)))?;

        debug!("Issued session token: {}", token.jwt.is_some());
        Ok(token.jwt)
    }
}
