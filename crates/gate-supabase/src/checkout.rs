//! # Supabase Checkout Gateway
//!
//! Creates checkout sessions through the platform's checkout edge function.
//!
//! The response body is always read as text before any parsing, so a body
//! that is not JSON can still be reported for diagnostics.

use crate::config::PlatformConfig;
use async_trait::async_trait;
use gate_core::{
    CheckoutError, CheckoutGateway, CheckoutMode, CheckoutPayload, CheckoutRequest,
    CheckoutResult, CheckoutUrls,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

const GENERIC_FAILURE: &str = "Checkout failed. Please try again or contact support.";

/// Checkout gateway backed by a Supabase edge function.
pub struct SupabaseCheckoutGateway {
    config: PlatformConfig,
    client: Client,
    urls: CheckoutUrls,
}

impl SupabaseCheckoutGateway {
    /// Create a new gateway
    pub fn new(config: PlatformConfig, urls: CheckoutUrls) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            config,
            client,
            urls,
        }
    }

    /// Create from environment variables
    pub fn from_env(urls: CheckoutUrls) -> Self {
        Self::new(PlatformConfig::from_env(), urls)
    }

    /// Builder: use a specific HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Build the request body for one checkout
    pub fn build_request(&self, price_id: &str, mode: CheckoutMode) -> CheckoutRequest {
        CheckoutRequest::new(
            price_id,
            mode,
            self.urls.success_url(),
            self.urls.cancel_url(),
        )
    }
}

#[async_trait]
impl CheckoutGateway for SupabaseCheckoutGateway {
    #[instrument(skip(self, access_token))]
    async fn create_checkout_session(
        &self,
        price_id: &str,
        mode: CheckoutMode,
        access_token: Option<&str>,
    ) -> CheckoutResult<CheckoutPayload> {
        self.config.validate()?;

        let access_token = access_token
            .filter(|t| !t.is_empty())
            .ok_or(CheckoutError::AuthenticationRequired)?;

        let request = self.build_request(price_id, mode);
        let url = self.config.checkout_url();

        info!("Creating checkout session for price: {}", price_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Checkout transport error: {}", e);
                CheckoutError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read checkout response body: {}", e);
            CheckoutError::Network(e.to_string())
        })?;

        debug!("Checkout response: status={}, {} bytes", status, body.len());

        let payload = classify_response(status, body)?;
        info!("Checkout session created successfully");
        Ok(payload)
    }

    fn provider_name(&self) -> &'static str {
        "supabase"
    }
}

/// Map a status and raw body onto the checkout outcome
fn classify_response(status: StatusCode, body: String) -> CheckoutResult<CheckoutPayload> {
    if !status.is_success() {
        error!("Checkout API error: status={}, body={}", status, body);

        return Err(match status {
            StatusCode::NOT_FOUND => CheckoutError::ServiceUnavailable,
            StatusCode::UNAUTHORIZED => CheckoutError::AuthenticationExpired,
            other => CheckoutError::Server {
                status: other.as_u16(),
                message: server_message(other, &body),
            },
        });
    }

    serde_json::from_str::<Value>(&body)
        .map(CheckoutPayload::new)
        .map_err(|e| {
            error!("Checkout response is not JSON: {}", e);
            CheckoutError::ResponseParse { body }
        })
}

/// Message for an unexpected non-2xx response.
///
/// JSON bodies contribute their `error` string (or `error.message`); a body
/// that is not JSON is used verbatim; an empty body becomes `HTTP <status>`.
fn server_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(Value::as_str)))
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string(),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status.as_u16()),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ORIGIN: &str = "https://app.example.com";

    fn gateway_for(server: &MockServer) -> SupabaseCheckoutGateway {
        let config = PlatformConfig::new(server.uri(), "anon-key").with_expected_domain("127.0.0.1");
        SupabaseCheckoutGateway::new(config, CheckoutUrls::new(ORIGIN))
    }

    async fn mock_checkout(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/functions/v1/checkout"))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/checkout"))
            .and(header("authorization", "Bearer tok_abc"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "price_id": "price_123",
                "mode": "subscription",
                "success_url": "https://app.example.com/success",
                "cancel_url": "https://app.example.com/pricing",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "cs_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap();

        assert_eq!(payload.session_id(), Some("cs_1"));
        assert_eq!(payload.into_inner(), json!({ "session_id": "cs_1" }));
    }

    #[tokio::test]
    async fn test_payment_mode_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/checkout"))
            .and(body_json(json!({
                "price_id": "price_once",
                "mode": "payment",
                "success_url": "https://app.example.com/success",
                "cancel_url": "https://app.example.com/pricing",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "https://pay" })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .create_checkout_session("price_once", CheckoutMode::Payment, Some("tok"))
            .await
            .unwrap();
        assert_eq!(payload.url(), Some("https://pay"));
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        for mode in [CheckoutMode::Subscription, CheckoutMode::Payment] {
            let err = gateway
                .create_checkout_session("price_123", mode, None)
                .await
                .unwrap_err();
            assert_eq!(err, CheckoutError::AuthenticationRequired);
        }

        let err = gateway
            .create_checkout_session("", CheckoutMode::Payment, Some(""))
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::AuthenticationRequired);
    }

    #[tokio::test]
    async fn test_unconfigured_platform_never_dispatches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = PlatformConfig::new(server.uri(), "").with_expected_domain("127.0.0.1");
        let gateway = SupabaseCheckoutGateway::new(config, CheckoutUrls::new(ORIGIN));

        let first = gateway
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok"))
            .await
            .unwrap_err();
        let second = gateway
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok"))
            .await
            .unwrap_err();

        assert!(matches!(first, CheckoutError::Configuration(_)));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_config_checked_before_token() {
        let gateway = SupabaseCheckoutGateway::new(
            PlatformConfig::new("https://placeholder.supabase.co", "anon"),
            CheckoutUrls::new(ORIGIN),
        );

        let err = gateway
            .create_checkout_session("price_123", CheckoutMode::Subscription, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_expired() {
        let server = MockServer::start().await;
        mock_checkout(
            &server,
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Failed to authenticate user" })),
        )
        .await;

        let err = gateway_for(&server)
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::AuthenticationExpired);
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_unavailable() {
        let server = MockServer::start().await;
        mock_checkout(&server, ResponseTemplate::new(404)).await;

        let err = gateway_for(&server)
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_server_error_message_from_body() {
        let server = MockServer::start().await;
        mock_checkout(
            &server,
            ResponseTemplate::new(500).set_body_json(json!({ "error": "X" })),
        )
        .await;

        let err = gateway_for(&server)
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CheckoutError::Server {
                status: 500,
                message: "X".into()
            }
        );
        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn test_non_json_success_is_parse_error() {
        let server = MockServer::start().await;
        mock_checkout(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = gateway_for(&server)
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CheckoutError::ResponseParse {
                body: "not json".into()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        // nothing listens on port 9 (discard) in the test environment
        let config = PlatformConfig::new("http://127.0.0.1:9", "anon").with_expected_domain("127.0.0.1");
        let gateway = SupabaseCheckoutGateway::new(config, CheckoutUrls::new(ORIGIN));

        let err = gateway
            .create_checkout_session("price_123", CheckoutMode::Subscription, Some("tok_abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Network(_)));
        assert!(err.to_string().starts_with("Network error"));
    }

    #[test]
    fn test_server_message_fallbacks() {
        let status = StatusCode::BAD_REQUEST;

        assert_eq!(
            server_message(status, r#"{"error":{"message":"No such price"}}"#),
            "No such price"
        );
        assert_eq!(server_message(status, r#"{"detail":"nope"}"#), GENERIC_FAILURE);
        assert_eq!(server_message(status, r#"{"error":""}"#), GENERIC_FAILURE);
        assert_eq!(server_message(status, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(server_message(status, ""), "HTTP 400");
    }

    #[test]
    fn test_classify_status_precedence() {
        // 404 wins even when the body carries an error
        let err = classify_response(StatusCode::NOT_FOUND, r#"{"error":"User not found"}"#.into())
            .unwrap_err();
        assert_eq!(err, CheckoutError::ServiceUnavailable);

        let ok = classify_response(StatusCode::CREATED, r#"{"url":"u"}"#.into()).unwrap();
        assert_eq!(ok.url(), Some("u"));
    }
}
