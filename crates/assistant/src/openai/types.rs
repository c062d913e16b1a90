//! Types for the chat-completions API.
//!
//! These match the OpenAI Chat Completions wire format, including the legacy
//! `functions` / `function_call` fields the resolver relies on.

use serde::{Deserialize, Serialize};
use vendai_core::{ChatRole, ConversationTurn};

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for Message {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the arguments.
    pub parameters: serde_json::Value,
}

/// How the model should choose between replying and calling a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCallMode {
    Auto,
    None,
}

/// A completion request, independent of transport.
///
/// Built by the resolver and handlers; the client adds `stream` when needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            functions: None,
            function_call: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Offer functions with `function_call: "auto"`.
    #[must_use]
    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = Some(functions);
        self.function_call = Some(FunctionCallMode::Auto);
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Request body on the wire.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    #[serde(flatten)]
    pub request: &'a CompletionRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Response from the chat-completions endpoint (non-streaming).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// A response whose only choice is plain text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(text.into()),
                    ..ResponseMessage::default()
                },
                ..Choice::default()
            }],
            ..Self::default()
        }
    }

    /// A response whose only choice is a legacy `function_call`.
    #[must_use]
    pub fn from_function_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    function_call: Some(FunctionCall {
                        name: name.into(),
                        arguments: arguments.into(),
                    }),
                    ..ResponseMessage::default()
                },
                finish_reason: Some("function_call".to_string()),
                ..Choice::default()
            }],
            ..Self::default()
        }
    }

    /// The first choice's message.
    #[must_use]
    pub fn message(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// The first choice's text content.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message().and_then(|m| m.content.as_deref())
    }

    /// The function the model asked to call, if any.
    ///
    /// Understands both the legacy `function_call` field and the first entry
    /// of `tool_calls`.
    #[must_use]
    pub fn function_call(&self) -> Option<&FunctionCall> {
        let message = self.message()?;
        message.function_call.as_ref().or_else(|| {
            message
                .tool_calls
                .iter()
                .find(|call| call.kind.as_deref().is_none_or(|k| k == "function"))
                .map(|call| &call.function)
        })
    }
}

/// One completion choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message returned by the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// A function-call directive. `arguments` is raw JSON text as produced by the
/// model and may be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Entry of the newer `tool_calls` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub function: FunctionCall,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

// =============================================================================
// Streaming Types
// =============================================================================

/// One `data:` payload of a streamed completion.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// Concatenated text of all choices in this chunk.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .choices
            .iter()
            .filter_map(|c| c.delta.content.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_with_functions() {
        let request = CompletionRequest::new("gpt-4", vec![Message::user("hi")])
            .with_functions(vec![FunctionDefinition {
                name: "generate_sql".to_string(),
                description: "SQL".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }])
            .with_temperature(0.0)
            .with_max_tokens(500);
        let body = ChatRequest {
            request: &request,
            stream: None,
        };

        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["function_call"], "auto");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["functions"][0]["name"], "generate_sql");
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = CompletionRequest::new("gpt-4o", vec![Message::system("x")]);
        let body = ChatRequest {
            request: &request,
            stream: Some(true),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("functions").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_response_legacy_function_call() {
        let json = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {"name": "perform_rag", "arguments": "{\"query\": \"login error\"}"}
                },
                "finish_reason": "function_call"
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).expect("deserialize");
        let call = response.function_call().expect("function call");
        assert_eq!(call.name, "perform_rag");
        assert!(call.arguments.contains("login error"));
        assert!(response.text().is_none());
    }

    #[test]
    fn test_response_tool_calls() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "generate_sql", "arguments": "{}"}
                    }]
                }
            }]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            response.function_call().map(|c| c.name.as_str()),
            Some("generate_sql")
        );
    }

    #[test]
    fn test_response_plain_text() {
        let response = ChatResponse::from_text("Hello");
        assert_eq!(response.text(), Some("Hello"));
        assert!(response.function_call().is_none());
    }

    #[test]
    fn test_stream_chunk_text() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).expect("chunk");
        assert_eq!(chunk.text().as_deref(), Some("Hel"));

        let role_only: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).expect("chunk");
        assert!(role_only.text().is_none());
    }
}
