//! # gate-core
//!
//! Core types and traits for checkout-gate.
//!
//! This crate provides:
//! - `TokenCache` for short-lived bearer tokens
//! - `AuthHeaderProvider` and the `IdentityProvider` trait for optional auth
//! - `CheckoutGateway` trait, `CheckoutRequest` and `CheckoutPayload`
//! - `PlanCatalog` for the purchasable plans
//! - `CheckoutError`, `AuthError` and `QueryError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use gate_core::{AuthHeaderProvider, AuthSettings, CheckoutGateway, CheckoutMode};
//!
//! let auth = AuthHeaderProvider::new(identity, AuthSettings::production());
//!
//! // Optional auth: None means "proceed anonymously"
//! let headers = auth.get_auth_headers(false).await;
//!
//! // Checkout requires a token and surfaces every failure
//! let token = auth.access_token().await;
//! let payload = gateway
//!     .create_checkout_session("price_123", CheckoutMode::Subscription, token.as_deref())
//!     .await?;
//! ```

pub mod auth;
pub mod checkout;
pub mod error;
pub mod product;
pub mod strategy;
pub mod token;

// Re-exports for convenience
pub use auth::{
    AuthHeaderProvider, AuthHeaders, AuthSettings, AuthState, BoxedIdentityProvider,
    IdentityProvider,
};
pub use checkout::{CheckoutMode, CheckoutPayload, CheckoutRequest};
pub use error::{AuthError, AuthResult, CheckoutError, CheckoutResult, QueryError, QueryResult};
pub use product::{BillingInterval, Currency, Plan, PlanCatalog, Price};
pub use strategy::{BoxedCheckoutGateway, CheckoutGateway, CheckoutUrls};
pub use token::{CachedToken, Clock, SystemClock, TokenCache};
