//! Scripted backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use super::{ChatBackend, ChatResponse, CompletionRequest, OpenAIError, TextStream};

/// One scripted reply.
#[derive(Debug)]
pub enum ScriptedReply {
    /// Return this response from `complete`.
    Response(ChatResponse),
    /// Stream these chunks from `complete_stream`.
    Stream(Vec<String>),
    /// Stream these chunks, then fail.
    BrokenStream(Vec<String>),
    /// Fail the call.
    Fail(String),
}

/// A [`ChatBackend`] that replays queued replies in order and records every
/// request it receives.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply (builder style).
    #[must_use]
    pub fn with(self, reply: ScriptedReply) -> Self {
        self.push(reply);
        self
    }

    /// Queue a text response.
    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.with(ScriptedReply::Response(ChatResponse::from_text(text)))
    }

    /// Queue a legacy function-call response.
    #[must_use]
    pub fn with_function_call(self, name: &str, arguments: &str) -> Self {
        self.with(ScriptedReply::Response(ChatResponse::from_function_call(
            name, arguments,
        )))
    }

    /// Queue a streamed reply.
    #[must_use]
    pub fn with_stream(self, chunks: &[&str]) -> Self {
        self.with(ScriptedReply::Stream(
            chunks.iter().map(|c| (*c).to_string()).collect(),
        ))
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_failure(self, message: &str) -> Self {
        self.with(ScriptedReply::Fail(message.to_string()))
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn next(&self, request: CompletionRequest) -> ScriptedReply {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| ScriptedReply::Fail("no scripted reply left".to_string()))
    }
}

fn scripted_error(message: String) -> OpenAIError {
    OpenAIError::Api {
        error_type: "scripted".to_string(),
        message,
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResponse, OpenAIError> {
        match self.next(request) {
            ScriptedReply::Response(response) => Ok(response),
            ScriptedReply::Stream(chunks) | ScriptedReply::BrokenStream(chunks) => {
                Ok(ChatResponse::from_text(chunks.concat()))
            }
            ScriptedReply::Fail(message) => Err(scripted_error(message)),
        }
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<TextStream, OpenAIError> {
        match self.next(request) {
            ScriptedReply::Response(response) => {
                let text = response.text().unwrap_or_default().to_string();
                Ok(futures::stream::iter(vec![Ok(text)]).boxed())
            }
            ScriptedReply::Stream(chunks) => {
                Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed())
            }
            ScriptedReply::BrokenStream(chunks) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(OpenAIError::Stream(
                        "connection reset".to_string(),
                    ))));
                Ok(futures::stream::iter(items).boxed())
            }
            ScriptedReply::Fail(message) => Err(scripted_error(message)),
        }
    }
}
