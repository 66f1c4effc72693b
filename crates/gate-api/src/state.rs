//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the auth header provider, checkout gateway, billing client and
//! plan catalog.

use crate::identity::ClerkSessionIdentity;
use gate_core::{
    AuthHeaderProvider, AuthSettings, BoxedCheckoutGateway, BoxedIdentityProvider, CheckoutUrls,
    PlanCatalog,
};
use gate_supabase::{BillingClient, PlatformConfig, SupabaseCheckoutGateway};
use reqwest::Url;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Origin of the UI, used for checkout return URLs
    pub app_origin: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Bypass the identity provider with a fixed development identity
    pub dev_auth: bool,
    /// Identity used when `dev_auth` is on
    pub dev_identity: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let app_origin =
            std::env::var("APP_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let dev_flag = std::env::var("AUTH_DEV_MODE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8787),
            dev_auth: dev_flag || is_loopback_origin(&app_origin),
            app_origin,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            dev_identity: std::env::var("DEV_IDENTITY")
                .unwrap_or_else(|_| gate_core::auth::DEFAULT_DEV_IDENTITY.to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            dev_mode: self.dev_auth,
            dev_identity: self.dev_identity.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Whether the UI is served from this machine
pub fn is_loopback_origin(origin: &str) -> bool {
    Url::parse(origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
        .unwrap_or(false)
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Optional-auth header source
    pub auth: Arc<AuthHeaderProvider>,
    /// Checkout gateway
    pub gateway: BoxedCheckoutGateway,
    /// Billing record queries
    pub billing: Arc<BillingClient>,
    /// Plan catalog
    pub catalog: PlanCatalog,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let platform = PlatformConfig::from_env();

        if let Err(e) = platform.validate() {
            // not fatal: checkout and billing report it per call
            tracing::error!("{}", e);
        }

        let catalog = load_plan_catalog()?;
        let identity = Arc::new(ClerkSessionIdentity::from_env());

        Ok(Self::build(config, platform, identity, catalog))
    }

    /// Assemble state from explicit parts
    pub fn build(
        config: AppConfig,
        platform: PlatformConfig,
        identity: BoxedIdentityProvider,
        catalog: PlanCatalog,
    ) -> Self {
        let auth = Arc::new(AuthHeaderProvider::new(identity, config.auth_settings()));
        let urls = CheckoutUrls::new(&config.app_origin);
        let gateway: BoxedCheckoutGateway = Arc::new(SupabaseCheckoutGateway::new(platform.clone(), urls));
        let billing = Arc::new(BillingClient::new(platform, auth.clone()));

        Self {
            auth,
            gateway,
            billing,
            catalog,
            config,
        }
    }
}

/// Load plan catalog from config file
fn load_plan_catalog() -> anyhow::Result<PlanCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = PlanCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} plans from {}", catalog.plans.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No plan catalog found, using empty catalog");
    Ok(PlanCatalog::new())
}
