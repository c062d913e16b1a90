//! Chat-completions integration.
//!
//! # Features
//!
//! - [`OpenAIClient`] for any OpenAI-compatible `/chat/completions` endpoint
//! - Legacy `functions` / `function_call` requests for tool routing
//! - Server-sent event streaming for the free-form fallback
//! - [`ChatBackend`] seam so the resolver and handlers can be driven by a
//!   scripted backend in tests

mod client;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod types;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use client::OpenAIClient;
pub use error::{ApiError, ApiErrorResponse, OpenAIError};
pub use types::{
    ChatResponse, Choice, CompletionRequest, FunctionCall, FunctionCallMode, FunctionDefinition,
    Message, ResponseMessage, StreamChunk, ToolCall, Usage,
};

/// Text deltas of a streamed completion.
pub type TextStream = BoxStream<'static, Result<String, OpenAIError>>;

/// A chat-completions backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a completion and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResponse, OpenAIError>;

    /// Run a completion and stream its text deltas.
    ///
    /// Errors before the first byte are returned directly; later failures
    /// arrive as stream items.
    async fn complete_stream(&self, request: CompletionRequest) -> Result<TextStream, OpenAIError>;
}
