//! Registration and page navigation.

use axum::{Json, Router, extract::State, routing::{get, post}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use vendai_core::{Page, UserInfo};

use crate::conversation::{Navigation, SessionView};
use crate::error::AppError;
use crate::middleware::conversation_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(show))
        .route("/api/register", post(register))
        .route("/api/page", post(navigate))
}

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub age: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: String,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    #[serde(flatten)]
    pub navigation: Navigation,
    pub session: SessionView,
}

/// GET /api/session
async fn show(State(state): State<AppState>, session: Session) -> Result<Json<SessionView>, AppError> {
    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    let view = conversation.lock().await.view();
    Ok(Json(view))
}

/// POST /api/register
#[instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterRequest>,
) -> Result<Json<SessionView>, AppError> {
    let user = UserInfo::new(&form.name, &form.email, form.age)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    let mut conversation = conversation.lock().await;
    conversation.register(user);
    // The flash is left for the next page load
    Ok(Json(conversation.snapshot()))
}

/// POST /api/page
async fn navigate(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PageRequest>,
) -> Result<Json<NavigationResponse>, AppError> {
    let page: Page = request.page.parse().map_err(AppError::BadRequest)?;

    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    let mut conversation = conversation.lock().await;
    let navigation = conversation.navigate(page);
    Ok(Json(NavigationResponse {
        navigation,
        session: conversation.view(),
    }))
}
