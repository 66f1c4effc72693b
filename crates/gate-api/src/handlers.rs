//! # Request Handlers
//!
//! Axum request handlers for the sidecar API.
//!
//! Checkout errors are returned with their user-displayable message. Billing
//! reads degrade to `null` with `available: false`, since they only decorate
//! the UI.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use gate_core::{CheckoutError, CheckoutMode, Plan};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout request. One of `price_id`, `product_id` or `plan`
/// identifies what to buy.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Payment processor price id
    #[serde(default)]
    pub price_id: Option<String>,
    /// Catalog product id
    #[serde(default)]
    pub product_id: Option<String>,
    /// Catalog plan name (case-insensitive)
    #[serde(default)]
    pub plan: Option<String>,
    /// Defaults to the plan's mode, then to subscription
    #[serde(default)]
    pub mode: Option<CheckoutMode>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn checkout_error_to_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code).with_kind(err.kind());
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, 400)),
    )
}

/// Bearer token from an incoming `Authorization` header
fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-gate",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Current auth state. Never echoes the token.
pub async fn auth_status(State(state): State<AppState>) -> impl IntoResponse {
    let headers_available = state.auth.get_auth_headers(true).await.is_some();
    Json(serde_json::json!({
        "state": state.auth.state(),
        "dev_mode": state.auth.is_dev_mode(),
        "headers_available": headers_available,
    }))
}

/// Get plan list
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let plans: Vec<_> = state.catalog.active_plans().collect();
    Json(serde_json::json!({
        "products": plans,
        "count": plans.len()
    }))
}

/// Get single plan
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.catalog.get(&product_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Product not found: {}", product_id),
                404,
            )),
        )
    })?;

    Ok(Json(plan.clone()))
}

/// Create a checkout session
#[instrument(skip(state, headers, request))]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<Value>, ApiError> {
    let (price_id, plan) = resolve_price(&state, &request)?;
    let mode = request
        .mode
        .or(plan.map(|p| p.mode))
        .unwrap_or_default();

    // An explicit caller token wins over the sidecar's own session
    let token = match bearer_from_headers(&headers) {
        Some(token) => Some(token),
        None => state.auth.access_token().await,
    };

    info!(
        "Creating checkout: price={}, mode={}, plan={:?}",
        price_id,
        mode,
        plan.map(|p| p.name.as_str())
    );

    let payload = state
        .gateway
        .create_checkout_session(&price_id, mode, token.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to create checkout: {:?}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(payload.into_inner()))
}

/// Work out the price id and, when known, the catalog plan behind it
fn resolve_price<'a>(
    state: &'a AppState,
    request: &CreateCheckoutRequest,
) -> Result<(String, Option<&'a Plan>), ApiError> {
    if let Some(price_id) = request.price_id.as_deref().filter(|p| !p.is_empty()) {
        return Ok((price_id.to_string(), state.catalog.by_price_id(price_id)));
    }

    let plan = if let Some(product_id) = request.product_id.as_deref() {
        state.catalog.get(product_id)
    } else if let Some(name) = request.plan.as_deref() {
        state.catalog.by_name(name)
    } else {
        return Err(bad_request(
            "No price in checkout request (provide 'price_id', 'product_id' or 'plan')",
        ));
    };

    let plan = plan.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Invalid plan selected", 404)),
        )
    })?;

    if !plan.active {
        return Err(bad_request(format!("Plan is not available: {}", plan.name)));
    }

    Ok((plan.price_id.clone(), Some(plan)))
}

/// Current user's subscription, or null
pub async fn get_subscription(State(state): State<AppState>) -> impl IntoResponse {
    match state.billing.subscription().await {
        Ok(subscription) => {
            let plan = subscription
                .as_ref()
                .and_then(|s| s.price_id.as_deref())
                .and_then(|price_id| state.catalog.by_price_id(price_id))
                .map(|p| p.name.clone());
            Json(serde_json::json!({
                "available": true,
                "subscription": subscription,
                "plan": plan,
            }))
        }
        Err(e) => {
            warn!("Subscription data not available: {}", e);
            Json(serde_json::json!({
                "available": false,
                "subscription": null,
                "plan": null,
            }))
        }
    }
}

/// Current user's orders, newest first
pub async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    match state.billing.orders().await {
        Ok(orders) => Json(serde_json::json!({
            "available": true,
            "count": orders.len(),
            "orders": orders,
        })),
        Err(e) => {
            warn!("Order data not available: {}", e);
            Json(serde_json::json!({
                "available": false,
                "count": 0,
                "orders": null,
            }))
        }
    }
}
