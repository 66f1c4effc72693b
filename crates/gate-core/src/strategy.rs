//! # Checkout Gateway Trait
//!
//! The seam between the sidecar and the platform that actually creates
//! checkout sessions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CheckoutGateway (trait)                    │
//! │  ├── create_checkout_session()                              │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                 ┌──────────┴──────────┐
//!                 │  SupabaseCheckout   │
//!                 │      Gateway        │
//!                 └─────────────────────┘
//! ```

use crate::checkout::{CheckoutMode, CheckoutPayload};
use crate::error::CheckoutResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Creates checkout sessions on behalf of an authenticated user.
///
/// Unlike the auth header provider, implementations never fall back to an
/// unauthenticated path: every failure is returned to the caller.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Start a checkout for `price_id`.
    ///
    /// # Arguments
    /// * `price_id` - Payment processor price identifier
    /// * `mode` - One-time payment or subscription
    /// * `access_token` - Bearer token of the signed-in user; `None` fails
    ///   with `AuthenticationRequired`
    async fn create_checkout_session(
        &self,
        price_id: &str,
        mode: CheckoutMode,
        access_token: Option<&str>,
    ) -> CheckoutResult<CheckoutPayload>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared checkout gateway (dynamic dispatch)
pub type BoxedCheckoutGateway = Arc<dyn CheckoutGateway>;

/// Return URLs handed to the payment processor
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Origin of the application (e.g., "https://app.example.com")
    pub origin: String,
    /// Page shown after a completed checkout
    pub success_path: String,
    /// Page shown when the customer backs out
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            success_path: "/success".to_string(),
            cancel_path: "/pricing".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.origin, self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.origin, self.cancel_path)
    }

    /// Builder: override the success page path
    pub fn with_success_path(mut self, path: impl Into<String>) -> Self {
        self.success_path = path.into();
        self
    }

    /// Builder: override the cancel page path
    pub fn with_cancel_path(mut self, path: impl Into<String>) -> Self {
        self.cancel_path = path.into();
        self
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:5173")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://app.example.com/");

        assert_eq!(urls.success_url(), "https://app.example.com/success");
        assert_eq!(urls.cancel_url(), "https://app.example.com/pricing");
    }

    #[test]
    fn test_custom_paths() {
        let urls = CheckoutUrls::new("https://app.example.com")
            .with_success_path("/billing/done")
            .with_cancel_path("/billing");

        assert_eq!(urls.success_url(), "https://app.example.com/billing/done");
        assert_eq!(urls.cancel_url(), "https://app.example.com/billing");
    }
}
