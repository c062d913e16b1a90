//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session only holds
//! the id of the caller's conversation; the conversation itself lives in
//! [`crate::state::AppState`].

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::error::AppError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vendai_session";

/// Session key holding the conversation id.
pub const CONVERSATION_KEY: &str = "conversation_id";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AssistantConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::minutes(config.session_idle_minutes),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The conversation id stored in the session, assigning a new one on first
/// use.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn conversation_id(session: &Session) -> Result<Uuid, AppError> {
    if let Some(id) = session.get::<Uuid>(CONVERSATION_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(CONVERSATION_KEY, id).await?;
    Ok(id)
}
