//! Chat service for one turn of a conversation.
//!
//! This service handles the complete flow of:
//! 1. Checking the session is registered
//! 2. Resolving the message to a tool call
//! 3. Dispatching to the tool or the free-form fallback
//! 4. Recording the user message and the single assistant reply
//!
//! Nothing is recorded until the reply is complete, so an abandoned stream
//! leaves the conversation untouched.

use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::conversation::Conversation;
use crate::dispatcher::{APOLOGY, DispatchContext, Dispatcher, Reply};
use crate::resolver::{FunctionCallDecision, FunctionCallResolver};

/// Errors that can occur in the chat service.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The session has not been through registration.
    #[error("please register before chatting")]
    NotRegistered,

    /// Blank message.
    #[error("message cannot be empty")]
    EmptyMessage,
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Tool the model chose, `None` for a free-form reply.
    pub tool: Option<String>,
    pub reply: String,
}

/// Events emitted while a turn streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    Tool { name: Option<String> },
    Delta { text: String },
    Done { reply: String },
    Error { message: String },
}

#[derive(Clone)]
pub struct ChatService {
    resolver: FunctionCallResolver,
    dispatcher: Dispatcher,
}

impl ChatService {
    #[must_use]
    pub const fn new(resolver: FunctionCallResolver, dispatcher: Dispatcher) -> Self {
        Self {
            resolver,
            dispatcher,
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &FunctionCallResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one turn to completion and record it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not registered or the message is
    /// blank. Upstream failures become an apology reply.
    #[instrument(skip_all)]
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        message: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let message = validate(conversation, message)?;

        let (tool, reply) = match self.decide(conversation, message).await {
            Some(decision) => {
                let ctx = DispatchContext {
                    user_message: message,
                    user_name: conversation.user_name(),
                    history: conversation.messages(),
                };
                let reply = self.dispatcher.dispatch_text(&decision, &ctx).await;
                (decision.tool_name, reply)
            }
            None => (None, APOLOGY.to_string()),
        };

        conversation.record_exchange(message, reply.clone());
        info!(tool = tool.as_deref().unwrap_or("none"), "Chat turn completed");
        Ok(TurnOutcome { tool, reply })
    }

    /// Run one turn as a stream of events.
    ///
    /// The conversation lock is held for the whole turn, so turns within a
    /// session never interleave. The exchange is recorded just before
    /// `Done`; dropping the stream earlier records nothing.
    pub fn respond_stream(
        &self,
        conversation: Arc<Mutex<Conversation>>,
        message: String,
    ) -> impl Stream<Item = ChatStreamEvent> + Send + use<> {
        let service = self.clone();

        stream! {
            let mut conversation = conversation.lock_owned().await;

            let message = match validate(&conversation, &message) {
                Ok(m) => m.to_string(),
                Err(e) => {
                    yield ChatStreamEvent::Error { message: e.to_string() };
                    return;
                }
            };

            let Some(decision) = service.decide(&conversation, &message).await else {
                conversation.record_exchange(&message, APOLOGY);
                yield ChatStreamEvent::Done { reply: APOLOGY.to_string() };
                return;
            };
            yield ChatStreamEvent::Tool { name: decision.tool_name.clone() };

            let reply = {
                let ctx = DispatchContext {
                    user_message: &message,
                    user_name: conversation.user_name(),
                    history: conversation.messages(),
                };
                service.dispatcher.dispatch(&decision, &ctx).await
            };

            let text = match reply {
                Reply::Text(text) => {
                    yield ChatStreamEvent::Delta { text: text.clone() };
                    text
                }
                Reply::Stream(mut deltas) => {
                    let mut text = String::new();
                    let mut failed = false;
                    while let Some(chunk) = deltas.next().await {
                        match chunk {
                            Ok(delta) => {
                                text.push_str(&delta);
                                yield ChatStreamEvent::Delta { text: delta };
                            }
                            Err(e) => {
                                error!(error = %e, "Reply stream failed");
                                failed = true;
                                break;
                            }
                        }
                    }
                    if failed {
                        yield ChatStreamEvent::Error { message: APOLOGY.to_string() };
                        APOLOGY.to_string()
                    } else {
                        text
                    }
                }
            };

            conversation.record_exchange(&message, text.clone());
            info!(tool = decision.tool_name.as_deref().unwrap_or("none"), "Chat turn streamed");
            yield ChatStreamEvent::Done { reply: text };
        }
    }

    /// Resolve the message, logging an upstream failure.
    async fn decide(&self, conversation: &Conversation, message: &str) -> Option<FunctionCallDecision> {
        match self.resolver.resolve(message, conversation.messages()).await {
            Ok(decision) => Some(decision),
            Err(e) => {
                error!(error = %e, "Function-call resolution failed");
                None
            }
        }
    }
}

/// Check a turn may run; returns the trimmed message.
///
/// # Errors
///
/// Returns an error if the session is unregistered or the message is blank.
pub fn validate<'m>(conversation: &Conversation, message: &'m str) -> Result<&'m str, ChatError> {
    if !conversation.is_registered() {
        return Err(ChatError::NotRegistered);
    }
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    Ok(message)
}
