//! # gate-api
//!
//! Local HTTP sidecar for checkout-gate.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Clerk session identity provider
//! - REST endpoints for auth status, plans, checkout and billing records
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/auth/status` | Auth state |
//! | GET | `/api/v1/products` | List plans |
//! | GET | `/api/v1/products/{id}` | Get plan |
//! | POST | `/api/v1/checkout` | Create checkout session |
//! | GET | `/api/v1/billing/subscription` | Current subscription |
//! | GET | `/api/v1/billing/orders` | Order history |

pub mod handlers;
pub mod identity;
pub mod routes;
pub mod state;

pub use identity::{ClerkConfig, ClerkSessionIdentity};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
