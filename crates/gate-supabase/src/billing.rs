//! # Billing Records
//!
//! Read-only queries against the platform's REST interface for the current
//! user's subscription and orders.
//!
//! These calls use optional auth: when the auth header provider yields no
//! headers the public key is sent as the bearer, which the platform treats as
//! the anonymous role (row-level security then returns nothing).

use crate::config::PlatformConfig;
use gate_core::{AuthHeaderProvider, QueryError, QueryResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const SUBSCRIPTIONS_TABLE: &str = "stripe_subscriptions";
pub const ORDERS_TABLE: &str = "stripe_orders";

/// A subscription row. Columns the sidecar does not know are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionRecord {
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub price_id: Option<String>,
    pub status: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub payment_method_brand: Option<String>,
    pub payment_method_last4: Option<String>,
}

impl SubscriptionRecord {
    /// Active or trialing subscriptions grant access
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_deref(), Some("active") | Some("trialing"))
    }
}

/// An order row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRecord {
    pub id: Option<i64>,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount_subtotal: Option<i64>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub payment_status: Option<String>,
    pub status: Option<String>,
    pub order_date: Option<String>,
}

/// Client for the billing tables
pub struct BillingClient {
    config: PlatformConfig,
    client: Client,
    auth: Arc<AuthHeaderProvider>,
}

impl BillingClient {
    pub fn new(config: PlatformConfig, auth: Arc<AuthHeaderProvider>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            config,
            client,
            auth,
        }
    }

    /// Builder: use a specific HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The user's subscription, if any
    #[instrument(skip(self))]
    pub async fn subscription(&self) -> QueryResult<Option<SubscriptionRecord>> {
        let mut rows: Vec<SubscriptionRecord> =
            self.select(SUBSCRIPTIONS_TABLE, &[("select", "*")]).await?;

        if rows.len() > 1 {
            return Err(QueryError::Parse(format!(
                "expected at most one subscription, got {}",
                rows.len()
            )));
        }
        Ok(rows.pop())
    }

    /// The user's orders, newest first
    #[instrument(skip(self))]
    pub async fn orders(&self) -> QueryResult<Vec<OrderRecord>> {
        self.select(ORDERS_TABLE, &[("select", "*"), ("order", "order_date.desc")])
            .await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> QueryResult<Vec<T>> {
        self.config
            .validate()
            .map_err(|e| QueryError::Configuration(e.to_string()))?;

        let authorization = match self.auth.get_auth_headers(true).await {
            Some(headers) => headers.authorization(),
            None => {
                debug!("No auth headers, querying {} as anonymous", table);
                format!("Bearer {}", self.config.public_key)
            }
        };

        let response = self
            .client
            .get(self.config.rest_url(table))
            .query(query)
            .header("apikey", &self.config.public_key)
            .header("Authorization", authorization)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!("Billing query on {} failed: status={}, body={}", table, status, body);
            return Err(QueryError::Status {
                status: status.as_u16(),
                message: rest_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| QueryError::Parse(e.to_string()))
    }
}

/// PostgREST errors carry a `message` field
fn rest_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
