//! `generate_sql`: turn a request into a SQL query with the handler model.

use std::sync::Arc;

use tracing::instrument;

use crate::openai::{ChatBackend, CompletionRequest, Message, OpenAIError};
use crate::prompts::sql_prompt;

const SQL_MAX_TOKENS: u32 = 150;

/// Generates SQL text. The query is never executed.
#[derive(Clone)]
pub struct SqlHandler {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl SqlHandler {
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Ask the model for a SQL query answering `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or returns no text.
    #[instrument(skip(self, query), fields(model = %self.model))]
    pub async fn handle(&self, query: &str) -> Result<String, OpenAIError> {
        let request = CompletionRequest::new(&self.model, vec![Message::user(sql_prompt(query))])
            .with_temperature(0.0)
            .with_max_tokens(SQL_MAX_TOKENS);

        let response = self.backend.complete(request).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(OpenAIError::EmptyResponse)
    }
}
