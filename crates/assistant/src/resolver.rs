//! Function-call resolution: ask the model which tool a message needs.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use vendai_core::ConversationTurn;

use crate::openai::{ChatBackend, CompletionRequest, Message, OpenAIError};
use crate::tools::ToolRegistry;

const RESOLVE_MAX_TOKENS: u32 = 500;

/// The model's routing decision for one user message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionCallDecision {
    /// `None` when the model answered without calling a function.
    pub tool_name: Option<String>,
    pub arguments: Map<String, Value>,
}

impl FunctionCallDecision {
    /// A decision to reply without a tool.
    #[must_use]
    pub fn no_tool() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tool(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: Some(name.into()),
            arguments,
        }
    }

    /// A string argument, if present.
    #[must_use]
    pub fn str_argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }
}

/// Asks the chat model to pick a tool for each user message.
#[derive(Clone)]
pub struct FunctionCallResolver {
    backend: Arc<dyn ChatBackend>,
    registry: Arc<ToolRegistry>,
    role_prompt: Arc<str>,
    model: String,
}

impl FunctionCallResolver {
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        registry: Arc<ToolRegistry>,
        role_prompt: impl Into<Arc<str>>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            registry,
            role_prompt: role_prompt.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve `user_message` to a tool call.
    ///
    /// Only the current message is sent with the role prompt; `history` is
    /// not forwarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    #[instrument(skip_all, fields(model = %self.model, message_len = user_message.len()))]
    pub async fn resolve(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> Result<FunctionCallDecision, OpenAIError> {
        debug!(history_len = history.len(), "History not forwarded to resolver");

        let request = CompletionRequest::new(
            &self.model,
            vec![
                Message::system(self.role_prompt.as_ref()),
                Message::user(user_message),
            ],
        )
        .with_functions(self.registry.functions())
        .with_temperature(0.0)
        .with_max_tokens(RESOLVE_MAX_TOKENS);

        let response = self.backend.complete(request).await?;

        let Some(call) = response.function_call() else {
            debug!("No function call in response");
            return Ok(FunctionCallDecision::no_tool());
        };

        debug!(tool = %call.name, "Function call resolved");
        Ok(FunctionCallDecision::tool(
            call.name.clone(),
            parse_arguments(&call.name, &call.arguments),
        ))
    }
}

/// Parse a function call's JSON argument string.
///
/// Blank input is an empty map. Malformed JSON or a non-object value is
/// logged and also yields an empty map.
fn parse_arguments(tool: &str, raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(tool, found = %other, "Function arguments are not a JSON object");
            Map::new()
        }
        Err(e) => {
            warn!(tool, error = %e, "Failed to parse function arguments");
            Map::new()
        }
    }
}
