//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health            - Health check
//!
//! # Session
//! GET  /api/session       - Current page, registration and history
//! POST /api/register      - Submit the registration form
//! POST /api/page          - Switch between register and chat
//!
//! # Chat
//! POST /api/chat          - One turn, reply as JSON
//! POST /api/chat/stream   - One turn, reply as server-sent events
//!
//! # Catalog
//! GET  /api/tools         - Registered tool descriptors
//! GET  /api/catalog?q=    - Products, optionally filtered
//! POST /api/orders        - Price an order for the registered user
//! ```

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod catalog;
pub mod chat;
pub mod session;

/// Build the full router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(session::router())
        .merge(chat::router())
        .merge(catalog::router())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
