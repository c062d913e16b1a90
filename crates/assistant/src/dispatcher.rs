//! Routes a resolved function call to its handler.
//!
//! Dispatch never fails: unknown tools, bad arguments and handler errors all
//! become reply text.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::{error, instrument, warn};
use vendai_core::{ChatRole, ConversationTurn};

use crate::catalog::Catalog;
use crate::handlers::{DiscoveryHandler, RagHandler, SqlHandler};
use crate::openai::{ChatBackend, CompletionRequest, Message, OpenAIError, TextStream};
use crate::prompts::fallback_prompt;
use crate::rag::KnowledgeBase;
use crate::resolver::FunctionCallDecision;
use crate::tools::{ToolKind, ToolRegistry};

/// Prefix shown before generated SQL.
pub const SQL_RESULT_LABEL: &str = "**[SQL Generation Result]:** ";

/// Reply when a handler or the model is unavailable.
pub const APOLOGY: &str =
    "Sorry, I'm having trouble reaching my tools right now. Please try again in a moment.";

/// Name used in the personalised prompt when nobody is registered.
const GUEST_NAME: &str = "Guest";

/// Incremental reply text.
pub type ReplyStream = TextStream;

/// What the dispatcher needs to know about the current turn.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub user_message: &'a str,
    pub user_name: Option<&'a str>,
    /// Turns before this one.
    pub history: &'a [ConversationTurn],
}

/// A dispatched reply.
pub enum Reply {
    Text(String),
    Stream(ReplyStream),
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn ChatBackend>,
    chat_model: String,
    sql: SqlHandler,
    rag: RagHandler,
    discovery: DiscoveryHandler,
}

impl Dispatcher {
    /// `chat_model` writes free-form replies; `handler_model` serves the SQL
    /// and knowledge-base handlers.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        backend: Arc<dyn ChatBackend>,
        catalog: Arc<Catalog>,
        knowledge_base: Arc<KnowledgeBase>,
        chat_model: &str,
        handler_model: &str,
    ) -> Self {
        Self {
            sql: SqlHandler::new(backend.clone(), handler_model),
            rag: RagHandler::new(knowledge_base, backend.clone(), handler_model),
            discovery: DiscoveryHandler::new(catalog),
            registry,
            backend,
            chat_model: chat_model.to_string(),
        }
    }

    /// Run the handler for `decision`.
    #[instrument(skip_all, fields(tool = decision.tool_name.as_deref().unwrap_or("none")))]
    pub async fn dispatch(&self, decision: &FunctionCallDecision, ctx: &DispatchContext<'_>) -> Reply {
        let Some(name) = decision.tool_name.as_deref() else {
            return self.fallback(ctx).await;
        };
        let Some(kind) = ToolKind::from_name(name) else {
            warn!(tool = name, "Unknown function call");
            return Reply::Text(format!("Unknown function call: {name}"));
        };

        let arguments = self.checked_arguments(kind, &decision.arguments, ctx.user_message);
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or(ctx.user_message);

        match kind {
            ToolKind::GenerateSql => match self.sql.handle(query).await {
                Ok(sql) => Reply::Text(format!("{SQL_RESULT_LABEL}{sql}")),
                Err(e) => apologise(kind, &e),
            },
            ToolKind::PerformRag => match self.rag.handle(query).await {
                Ok(answer) => Reply::Text(answer),
                Err(e) => apologise(kind, &e),
            },
            ToolKind::LocalDiscovery => {
                let products = string_list(arguments.get("products"));
                Reply::Text(self.discovery.handle(query, &products, ctx.user_name))
            }
        }
    }

    /// [`Self::dispatch`], with any stream collected into one string.
    pub async fn dispatch_text(
        &self,
        decision: &FunctionCallDecision,
        ctx: &DispatchContext<'_>,
    ) -> String {
        match self.dispatch(decision, ctx).await {
            Reply::Text(text) => text,
            Reply::Stream(stream) => collect_stream(stream).await,
        }
    }

    /// Validate arguments against the tool's schema. A violation is logged
    /// and replaced with the raw user message as `query`.
    fn checked_arguments(
        &self,
        kind: ToolKind,
        arguments: &Map<String, Value>,
        user_message: &str,
    ) -> Map<String, Value> {
        let Some(descriptor) = self.registry.for_kind(kind) else {
            return arguments.clone();
        };
        match descriptor.validate_arguments(arguments) {
            Ok(()) => arguments.clone(),
            Err(e) => {
                warn!(tool = %kind, error = %e, "MalformedToolArguments: falling back to the raw message");
                let mut degraded = Map::new();
                degraded.insert("query".to_string(), Value::String(user_message.to_string()));
                degraded
            }
        }
    }

    async fn fallback(&self, ctx: &DispatchContext<'_>) -> Reply {
        let name = ctx.user_name.unwrap_or(GUEST_NAME);
        let mut messages = vec![Message::system(fallback_prompt(name))];
        messages.extend(ctx.history.iter().map(Message::from));

        let already_sent = ctx
            .history
            .last()
            .is_some_and(|t| t.role == ChatRole::User && t.content == ctx.user_message);
        if !already_sent {
            messages.push(Message::user(ctx.user_message));
        }

        let request = CompletionRequest::new(&self.chat_model, messages);
        match self.backend.complete_stream(request).await {
            Ok(stream) => Reply::Stream(stream),
            Err(e) => {
                error!(error = %e, "Fallback completion failed");
                Reply::Text(APOLOGY.to_string())
            }
        }
    }
}

/// Concatenate a reply stream. A stream error discards the partial text and
/// yields [`APOLOGY`].
pub async fn collect_stream(mut stream: ReplyStream) -> String {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(delta) => text.push_str(&delta),
            Err(e) => {
                error!(error = %e, "Reply stream failed");
                return APOLOGY.to_string();
            }
        }
    }
    text
}

fn apologise(kind: ToolKind, e: &OpenAIError) -> Reply {
    error!(tool = %kind, error = %e, "Tool handler failed");
    Reply::Text(APOLOGY.to_string())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::openai::testing::{ScriptedBackend, ScriptedReply};
    use crate::rag::KnowledgeEntry;

    fn knowledge_base() -> Arc<KnowledgeBase> {
        Arc::new(
            KnowledgeBase::new(vec![KnowledgeEntry {
                title: "Payment declined".to_string(),
                keywords: vec!["payment".to_string(), "card".to_string()],
                symptoms: "Card payment fails".to_string(),
                resolution: "Try another card".to_string(),
            }])
            .expect("knowledge base"),
        )
    }

    fn dispatcher(backend: Arc<ScriptedBackend>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(ToolRegistry::builtin()),
            backend,
            Arc::new(Catalog::demo()),
            knowledge_base(),
            "gpt-4",
            "gpt-4o",
        )
    }

    fn ctx<'a>(message: &'a str, history: &'a [ConversationTurn]) -> DispatchContext<'a> {
        DispatchContext {
            user_message: message,
            user_name: Some("Ada"),
            history,
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let backend = Arc::new(ScriptedBackend::new());
        let decision = FunctionCallDecision::tool("book_flight", Map::new());
        let reply = dispatcher(backend.clone())
            .dispatch_text(&decision, &ctx("fly me", &[]))
            .await;
        assert_eq!(reply, "Unknown function call: book_flight");
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_sql_is_labelled() {
        let backend = Arc::new(ScriptedBackend::new().with_text("SELECT 1;"));
        let decision = FunctionCallDecision::tool("generate_sql", args(json!({"query": "one"})));
        let reply = dispatcher(backend.clone())
            .dispatch_text(&decision, &ctx("give me one", &[]))
            .await;
        assert_eq!(reply, "**[SQL Generation Result]:** SELECT 1;");
        assert_eq!(backend.requests()[0].model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_malformed_arguments_degrade_to_message() {
        let backend = Arc::new(ScriptedBackend::new().with_text("SELECT * FROM deliveries;"));
        let decision = FunctionCallDecision::tool("generate_sql", args(json!({"query": 42})));
        dispatcher(backend.clone())
            .dispatch_text(&decision, &ctx("my deliveries", &[]))
            .await;
        assert!(
            backend.requests()[0].messages[0]
                .content
                .ends_with("request: my deliveries")
        );
    }

    #[tokio::test]
    async fn test_empty_arguments_use_message() {
        let backend = Arc::new(ScriptedBackend::new());
        let decision = FunctionCallDecision::tool("local_discovery", Map::new());
        let reply = dispatcher(backend)
            .dispatch_text(&decision, &ctx("apple", &[]))
            .await;
        assert_eq!(reply, "Apple (Fruits) costs $0.60.");
    }

    #[tokio::test]
    async fn test_handler_failure_becomes_apology() {
        let backend = Arc::new(ScriptedBackend::new().with_failure("timeout"));
        let decision = FunctionCallDecision::tool("perform_rag", args(json!({"query": "card payment fails"})));
        let reply = dispatcher(backend)
            .dispatch_text(&decision, &ctx("card payment fails", &[]))
            .await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_perform_rag_verbatim() {
        let backend = Arc::new(ScriptedBackend::new().with_text("Try another card 💳"));
        let decision = FunctionCallDecision::tool("perform_rag", args(json!({"query": "card declined"})));
        let reply = dispatcher(backend)
            .dispatch_text(&decision, &ctx("card declined", &[]))
            .await;
        assert_eq!(reply, "Try another card 💳");
    }

    #[tokio::test]
    async fn test_product_discovery_alias_orders() {
        let backend = Arc::new(ScriptedBackend::new());
        let decision = FunctionCallDecision::tool(
            "product_discovery",
            args(json!({"query": "order these", "products": ["Apple", "Banana"]})),
        );
        let reply = dispatcher(backend)
            .dispatch_text(&decision, &ctx("order these", &[]))
            .await;
        assert!(reply.starts_with("Here is your order, Ada:"));
        assert!(reply.contains("**$0.90**"));
    }

    #[tokio::test]
    async fn test_fallback_streams_with_personalised_prompt() {
        let backend = Arc::new(ScriptedBackend::new().with_stream(&["Hi ", "Ada", "!"]));
        let history = vec![
            ConversationTurn::user("hello"),
            ConversationTurn::assistant("Hello Ada"),
        ];
        let reply = dispatcher(backend.clone())
            .dispatch(&FunctionCallDecision::no_tool(), &ctx("how are you", &history))
            .await;
        let Reply::Stream(stream) = reply else {
            panic!("expected a stream");
        };
        assert_eq!(collect_stream(stream).await, "Hi Ada!");

        let request = &backend.requests()[0];
        assert_eq!(request.model, "gpt-4");
        assert!(request.functions.is_none());
        assert_eq!(request.messages.len(), 4);
        assert!(request.messages[0].content.ends_with("Name = Ada"));
        assert_eq!(request.messages[3].content, "how are you");
    }

    #[tokio::test]
    async fn test_fallback_does_not_repeat_current_message() {
        let backend = Arc::new(ScriptedBackend::new().with_stream(&["ok"]));
        let history = vec![ConversationTurn::user("hello")];
        dispatcher(backend.clone())
            .dispatch_text(&FunctionCallDecision::no_tool(), &ctx("hello", &history))
            .await;
        assert_eq!(backend.requests()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_broken_stream_becomes_apology() {
        let backend = Arc::new(
            ScriptedBackend::new().with(ScriptedReply::BrokenStream(vec!["partial".to_string()])),
        );
        let reply = dispatcher(backend)
            .dispatch_text(&FunctionCallDecision::no_tool(), &ctx("hi", &[]))
            .await;
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_fallback_failure_becomes_apology() {
        let backend = Arc::new(ScriptedBackend::new().with_failure("down"));
        let reply = dispatcher(backend)
            .dispatch_text(&FunctionCallDecision::no_tool(), &ctx("hi", &[]))
            .await;
        assert_eq!(reply, APOLOGY);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(
            string_list(Some(&json!(["Apple", " ", 3, "Milk (1 gallon)"]))),
            vec!["Apple".to_string(), "Milk (1 gallon)".to_string()]
        );
        assert!(string_list(Some(&json!("Apple"))).is_empty());
        assert!(string_list(None).is_empty());
    }
}
