//! # checkout-gate
//!
//! Local sidecar that authenticates API calls and starts checkout sessions
//! for a signed-in user.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export SUPABASE_URL=https://<project>.supabase.co
//! export SUPABASE_ANON_KEY=eyJ...
//! export CLERK_SECRET_KEY=sk_test_...
//! export CLERK_SESSION_ID=sess_...
//! export APP_ORIGIN=https://app.example.com
//!
//! # Run the sidecar
//! checkout-gate
//! ```

use gate_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;

    info!("checkout-gate v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", state.config.environment);
    info!("Plans loaded: {}", state.catalog.plans.len());
    info!("Checkout provider: {}", state.gateway.provider_name());
    info!("Auth state: {:?}", state.auth.state());

    if state.config.dev_auth && state.config.is_production() {
        warn!("Development auth bypass is enabled in production");
    }

    let app = routes::create_router(state);

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
