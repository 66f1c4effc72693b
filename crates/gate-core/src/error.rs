//! # Gateway Error Types
//!
//! Typed error handling for checkout-gate.
//!
//! Checkout failures are raised to the caller and every variant renders a
//! message that can be shown to the end user as-is. Authentication errors are
//! internal: the auth header provider logs them and degrades to "no headers".

use thiserror::Error;

/// Errors raised by the checkout gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Platform not configured, placeholder values, or wrong domain
    #[error("{0}")]
    Configuration(String),

    /// Checkout attempted without an access token
    #[error("Authentication required. Please sign out and sign back in to continue.")]
    AuthenticationRequired,

    /// Server rejected the access token (HTTP 401)
    #[error("Authentication expired. Please sign out and sign back in.")]
    AuthenticationExpired,

    /// Checkout endpoint not found (HTTP 404)
    #[error("Billing system not available. Please try again later or contact support.")]
    ServiceUnavailable,

    /// Transport-level failure, no server response was received.
    /// The detail is for logs, not for display.
    #[error("Network error. Please check your connection and try again.")]
    Network(String),

    /// 2xx response whose body is not valid JSON
    #[error("Invalid response from billing system. Please try again.")]
    ResponseParse { body: String },

    /// Any other non-2xx response
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl CheckoutError {
    /// Returns true if the user should be prompted to sign in again
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            CheckoutError::AuthenticationRequired | CheckoutError::AuthenticationExpired
        )
    }

    /// Short machine-readable category, used in API responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Configuration(_) => "configuration",
            CheckoutError::AuthenticationRequired => "authentication_required",
            CheckoutError::AuthenticationExpired => "authentication_expired",
            CheckoutError::ServiceUnavailable => "service_unavailable",
            CheckoutError::Network(_) => "network",
            CheckoutError::ResponseParse { .. } => "response_parse",
            CheckoutError::Server { .. } => "server",
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::AuthenticationRequired => 401,
            CheckoutError::AuthenticationExpired => 401,
            CheckoutError::ServiceUnavailable => 503,
            CheckoutError::Network(_) => 503,
            CheckoutError::ResponseParse { .. } => 502,
            CheckoutError::Server { .. } => 502,
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Failures while obtaining a token from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Provider answered but issued no token
    #[error("identity provider returned no token")]
    TokenUnavailable,

    /// Provider call itself failed
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Result type alias for token retrieval
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from billing record queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Query failed with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse query response: {0}")]
    Parse(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
