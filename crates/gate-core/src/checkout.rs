//! # Checkout Types
//!
//! Request and payload types for the checkout flow.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a checkout is a one-time payment or a recurring subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    #[default]
    Subscription,
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Subscription => "subscription",
            CheckoutMode::Payment => "payment",
        }
    }
}

impl std::fmt::Display for CheckoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(CheckoutMode::Subscription),
            "payment" => Ok(CheckoutMode::Payment),
            other => Err(format!(
                "Expected mode to be one of payment, subscription, got {}",
                other
            )),
        }
    }
}

/// Body of the checkout request. Built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    pub fn new(
        price_id: impl Into<String>,
        mode: CheckoutMode,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            price_id: price_id.into(),
            mode,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

/// Parsed success payload from the checkout endpoint.
///
/// The shape is owned by the server; it is passed through untouched and only
/// the well-known fields get accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutPayload(Value);

impl CheckoutPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Hosted checkout page to redirect the user to
    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.0
            .get("session_id")
            .or_else(|| self.0.get("sessionId"))
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}
