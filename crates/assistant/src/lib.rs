//! VendAI assistant library.
//!
//! A customer-support chatbot for a food-supply marketplace. Each user
//! message is routed by the chat model to one of three tools (SQL
//! generation, platform-error knowledge base, local product catalog) or
//! answered free-form.
//!
//! This crate provides the assistant as a library so the HTTP binary, the
//! CLI and the integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openai;
pub mod prompts;
pub mod rag;
pub mod resolver;
pub mod routes;
pub mod services;
pub mod state;
pub mod text;
pub mod tools;

use axum::Router;

use crate::config::AssistantConfig;
use crate::state::AppState;

/// The API router with session handling, ready for state.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(config: &AssistantConfig, state: AppState) -> Router {
    routes::routes()
        .layer(middleware::create_session_layer(config))
        .with_state(state)
}
