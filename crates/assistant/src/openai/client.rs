//! Chat-completions client.
//!
//! Provides both streaming and non-streaming access to any OpenAI-compatible
//! `/chat/completions` endpoint.

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use crate::config::OpenAIConfig;

use super::ChatBackend;
use super::TextStream;
use super::error::{ApiErrorResponse, OpenAIError};
use super::types::{ChatRequest, ChatResponse, CompletionRequest, StreamChunk};

/// Chat-completions API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct OpenAIClient {
    inner: Arc<OpenAIClientInner>,
}

struct OpenAIClientInner {
    client: reqwest::Client,
    completions_url: Url,
}

impl OpenAIClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key contains invalid header characters, the
    /// base URL cannot be extended, or the HTTP client cannot be built.
    pub fn new(config: &OpenAIConfig) -> Result<Self, OpenAIError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| OpenAIError::Unauthorized("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAIClientInner {
                client,
                completions_url: completions_url(&config.base_url)?,
            }),
        })
    }

    /// The resolved `/chat/completions` URL.
    #[must_use]
    pub fn completions_url(&self) -> &Url {
        &self.inner.completions_url
    }

    async fn post(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, OpenAIError> {
        let body = ChatRequest {
            request,
            stream: stream.then_some(true),
        };
        let response = self
            .inner
            .client
            .post(self.inner.completions_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(handle_error_status(status, response).await)
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIClient {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResponse, OpenAIError> {
        let response = self.post(&request, false).await?;
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OpenAIError::Parse(format!("Failed to parse response: {e}")))?;

        if parsed.choices.is_empty() {
            return Err(OpenAIError::EmptyResponse);
        }
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }
        Ok(parsed)
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete_stream(&self, request: CompletionRequest) -> Result<TextStream, OpenAIError> {
        let response = self.post(&request, true).await?;

        Ok(stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);

                        while let Some(event) = extract_sse_event(&mut buffer) {
                            let event = match event {
                                Ok(e) => e,
                                Err(e) => {
                                    yield Err(e);
                                    return;
                                }
                            };
                            match parse_sse_event(&event) {
                                SseData::Text(delta) => yield Ok(delta),
                                SseData::Done => return,
                                SseData::Skip => {}
                                SseData::Error(e) => {
                                    yield Err(e);
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(OpenAIError::Stream(e.to_string()));
                        return;
                    }
                }
            }
        }
        .boxed())
    }
}

/// Append `chat/completions` to the base URL, keeping any path prefix.
fn completions_url(base: &Url) -> Result<Url, OpenAIError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| OpenAIError::Parse(format!("Invalid base URL: {e}")))
}

/// Map an error status code to an [`OpenAIError`].
async fn handle_error_status(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> OpenAIError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return OpenAIError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return OpenAIError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
            |_| OpenAIError::Api {
                error_type: status.to_string(),
                message: body.clone(),
            },
            |api_error| OpenAIError::Api {
                error_type: api_error
                    .error
                    .error_type
                    .unwrap_or_else(|| status.to_string()),
                message: api_error.error.message,
            },
        ),
        Err(e) => OpenAIError::Http(e),
    }
}

/// Extract a complete SSE event from the buffer.
///
/// Returns `Some(event)` if a complete event was found (and removes it from
/// the buffer), or `None` if no complete event is available yet. Only whole
/// events are decoded, so a character split across chunks stays intact.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<Result<String, OpenAIError>> {
    let (end, separator) = find_event_end(buffer)?;
    let event: Vec<u8> = buffer.drain(..end + separator).take(end).collect();
    Some(
        String::from_utf8(event)
            .map(|e| e.replace("\r\n", "\n"))
            .map_err(|e| OpenAIError::Parse(format!("Invalid UTF-8: {e}"))),
    )
}

/// Offset and length of the first blank-line separator, `\n\n` or `\r\n\r\n`.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    buffer
        .windows(2)
        .enumerate()
        .find_map(|(i, pair)| match pair {
            [b'\n', b'\n'] => Some((i, 2)),
            [b'\r', b'\n'] if buffer.get(i + 2..).is_some_and(|rest| rest.starts_with(b"\r\n")) => {
                Some((i, 4))
            }
            _ => None,
        })
}

#[derive(Debug)]
enum SseData {
    Text(String),
    Done,
    Skip,
    Error(OpenAIError),
}

/// Parse one SSE event into a text delta.
fn parse_sse_event(event: &str) -> SseData {
    let data: String = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();

    if data.is_empty() {
        return SseData::Skip;
    }
    if data == "[DONE]" {
        return SseData::Done;
    }

    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&data) {
        return SseData::Error(OpenAIError::Api {
            error_type: api_error.error.error_type.unwrap_or_default(),
            message: api_error.error.message,
        });
    }

    match serde_json::from_str::<StreamChunk>(&data) {
        Ok(chunk) => chunk.text().map_or(SseData::Skip, SseData::Text),
        Err(e) => SseData::Error(OpenAIError::Parse(format!(
            "Failed to parse stream chunk: {e}"
        ))),
    }
}
