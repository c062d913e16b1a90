//! `perform_rag`: answer platform-error questions from the knowledge base.

use std::sync::Arc;

use crate::openai::{ChatBackend, OpenAIError};
use crate::rag::{KnowledgeBase, retrieve_information};

#[derive(Clone)]
pub struct RagHandler {
    kb: Arc<KnowledgeBase>,
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl RagHandler {
    #[must_use]
    pub fn new(kb: Arc<KnowledgeBase>, backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            kb,
            backend,
            model: model.into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the model call fails.
    pub async fn handle(&self, query: &str) -> Result<String, OpenAIError> {
        retrieve_information(&self.kb, self.backend.as_ref(), &self.model, query).await
    }
}
