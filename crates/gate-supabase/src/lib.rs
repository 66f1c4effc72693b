//! # gate-supabase
//!
//! Supabase-backed platform integration for checkout-gate.
//!
//! 1. **SupabaseCheckoutGateway** - checkout sessions via an edge function
//!    - Config validated before any network access
//!    - Every failure surfaced as a typed `CheckoutError`
//!
//! 2. **BillingClient** - subscription and order rows via the REST interface
//!    - Optional auth, anonymous role when signed out
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gate_core::{CheckoutGateway, CheckoutMode, CheckoutUrls};
//! use gate_supabase::SupabaseCheckoutGateway;
//!
//! let gateway = SupabaseCheckoutGateway::from_env(CheckoutUrls::new("https://app.example.com"));
//!
//! let payload = gateway
//!     .create_checkout_session("price_123", CheckoutMode::Subscription, Some(&token))
//!     .await?;
//!
//! // Redirect user to payload.url()
//! ```

pub mod billing;
pub mod checkout;
pub mod config;

// Re-exports
pub use billing::{BillingClient, OrderRecord, SubscriptionRecord};
pub use checkout::SupabaseCheckoutGateway;
pub use config::PlatformConfig;
