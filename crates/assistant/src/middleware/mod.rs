//! HTTP middleware for the assistant.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)

pub mod session;

pub use session::{CONVERSATION_KEY, SESSION_COOKIE_NAME, conversation_id, create_session_layer};
