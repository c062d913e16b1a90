//! Chat route handlers.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive};
use axum::{Json, Router, extract::State, response::Sse, routing::post};
use futures::StreamExt;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::conversation_id;
use crate::services::TurnOutcome;
use crate::services::chat::validate;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(send_message))
        .route("/api/chat/stream", post(send_message_stream))
}

/// Request to send a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// POST /api/chat
async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    let mut conversation = conversation.lock().await;

    let outcome = state.chat().respond(&mut conversation, &request.message).await?;
    Ok(Json(outcome))
}

/// POST /api/chat/stream
///
/// Streams `tool`, `delta`, `done` and `error` events as JSON. Requests that
/// would fail validation are rejected before the stream opens.
async fn send_message_stream(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SendMessageRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    validate(&*conversation.lock().await, &request.message)?;

    let event_stream = state.chat().respond_stream(conversation, request.message);

    // Map ChatStreamEvent to SSE Event
    let sse_stream = event_stream.map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_else(|_| {
            r#"{"type":"error","message":"Failed to serialize event"}"#.to_string()
        });
        Ok(Event::default().data(json))
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}
