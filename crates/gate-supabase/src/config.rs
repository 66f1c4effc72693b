//! # Platform Configuration
//!
//! Base URL and public key of the backend platform, read from the
//! environment once at startup.
//!
//! Resolution never fails: a missing or placeholder value is kept as-is and
//! every operation that depends on the platform calls `validate()` first,
//! failing fast with a configuration error before any network access.

use gate_core::{CheckoutError, CheckoutResult};
use reqwest::Url;
use std::env;

/// Default platform domain the base URL must belong to
pub const DEFAULT_PLATFORM_DOMAIN: &str = "supabase.co";

/// Default edge function that creates checkout sessions
pub const DEFAULT_CHECKOUT_FUNCTION: &str = "checkout";

/// Markers of values copied from a template `.env` and never filled in
const PLACEHOLDER_MARKERS: &[&str] = &[
    "placeholder",
    "your-supabase-anon-key",
    "REPLACE_WITH_YOUR_ACTUAL_ANON_KEY",
];

const NOT_CONFIGURED: &str =
    "Billing platform not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY to enable billing.";

/// Backend platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Project URL (https://<ref>.supabase.co)
    pub base_url: String,

    /// Public (anon) key
    pub public_key: String,

    /// Domain `base_url` must match
    pub expected_domain: String,

    /// Edge function name under `/functions/v1/`
    pub checkout_function: String,
}

impl PlatformConfig {
    /// Load configuration from environment variables.
    ///
    /// Env vars:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    /// - `SUPABASE_CHECKOUT_FUNCTION` (optional, defaults to `checkout`)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self::new(
            env::var("SUPABASE_URL").unwrap_or_default(),
            env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
        );

        match env::var("SUPABASE_CHECKOUT_FUNCTION") {
            Ok(name) if !name.trim().is_empty() => config.with_checkout_function(name),
            _ => config,
        }
    }

    /// Create config with explicit values
    pub fn new(base_url: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            public_key: public_key.into().trim().to_string(),
            expected_domain: DEFAULT_PLATFORM_DOMAIN.to_string(),
            checkout_function: DEFAULT_CHECKOUT_FUNCTION.to_string(),
        }
    }

    /// Builder: accept a different platform domain (self-hosted, or a local
    /// mock server in tests)
    pub fn with_expected_domain(mut self, domain: impl Into<String>) -> Self {
        self.expected_domain = domain.into();
        self
    }

    /// Builder: set the checkout edge function name
    pub fn with_checkout_function(mut self, name: impl Into<String>) -> Self {
        self.checkout_function = name.into().trim().trim_matches('/').to_string();
        self
    }

    /// Whether both values are present and not template placeholders
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
            && !self.public_key.is_empty()
            && !is_placeholder(&self.public_key)
    }

    /// Check presence and well-formedness. Same input, same answer.
    pub fn validate(&self) -> CheckoutResult<()> {
        if !self.is_configured() {
            return Err(CheckoutError::Configuration(NOT_CONFIGURED.to_string()));
        }

        if is_placeholder(&self.base_url) {
            return Err(invalid("SUPABASE_URL is a placeholder value"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| invalid(&format!("SUPABASE_URL is not a valid URL ({})", e)))?;

        if !matches!(url.scheme(), "https" | "http") {
            return Err(invalid("SUPABASE_URL must be an http(s) URL"));
        }

        let host = url.host_str().unwrap_or_default();
        let domain = self.expected_domain.as_str();
        let suffix = format!(".{}", domain);
        if host != domain && !host.ends_with(&suffix) {
            return Err(invalid(&format!(
                "SUPABASE_URL host {} is not a {} project",
                host, domain
            )));
        }

        Ok(())
    }

    /// Full URL of the checkout edge function
    pub fn checkout_url(&self) -> String {
        format!("{}/functions/v1/{}", self.base_url, self.checkout_function)
    }

    /// Full URL of a table in the platform's REST interface
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|m| value.contains(m))
}

fn invalid(detail: &str) -> CheckoutError {
    CheckoutError::Configuration(format!(
        "Invalid billing platform configuration: {}. Please connect the billing platform to enable billing.",
        detail
    ))
}
