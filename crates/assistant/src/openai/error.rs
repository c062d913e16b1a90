//! Error types for the chat-completions client.

use thiserror::Error;

/// Errors that can occur when talking to the chat-completions endpoint.
///
/// Every variant means the upstream model was unavailable for this turn.
/// Callers turn them into an apology rather than failing the request.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned an error body.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Stream broke mid-response.
    #[error("stream error: {0}")]
    Stream(String),

    /// Response contained no choices.
    #[error("response contained no choices")]
    EmptyResponse,
}

/// Error body returned by OpenAI-compatible endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}
