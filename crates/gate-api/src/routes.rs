//! # Routes
//!
//! Axum router configuration for the sidecar API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
///
/// Routes:
///   - GET  /health - Liveness
///   - GET  /api/v1/auth/status - Auth state
///   - GET  /api/v1/products - List plans
///   - GET  /api/v1/products/{id} - Get plan by product id
///   - POST /api/v1/checkout - Create checkout session
///   - GET  /api/v1/billing/subscription - Current subscription
///   - GET  /api/v1/billing/orders - Order history
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.app_origin);

    let billing_routes = Router::new()
        .route("/subscription", get(handlers::get_subscription))
        .route("/orders", get(handlers::list_orders));

    let api_routes = Router::new()
        .route("/auth/status", get(handlers::auth_status))
        .route("/checkout", post(handlers::create_checkout))
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .nest("/billing", billing_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the UI origin only. Requests without a bearer run under the
/// sidecar's own session, so other origins must not read the responses.
fn cors_layer(app_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match HeaderValue::from_str(app_origin.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(AllowOrigin::exact(origin)),
        Err(e) => {
            warn!("Invalid APP_ORIGIN {:?}, cross-origin access disabled: {}", app_origin, e);
            cors
        }
    }
}
