//! Integration tests for the VendAI assistant.
//!
//! Every test drives the real router, resolver and dispatcher against the
//! seeded data files in `data/`, with a [`ScriptedBackend`] standing in for
//! the chat-completions API. No network access is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vendai-integration-tests
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use vendai_assistant::catalog::Catalog;
use vendai_assistant::config::AssistantConfig;
use vendai_assistant::openai::testing::ScriptedBackend;
use vendai_assistant::rag::KnowledgeBase;
use vendai_assistant::state::{AppParts, AppState};
use vendai_assistant::tools::ToolRegistry;

/// Shaped like a real project key so config validation accepts it.
pub const TEST_API_KEY: &str = "sk-proj-aB3xY9mK2nL5pQ7rT0uW4zC6";

/// A file under the workspace `data/` directory.
#[must_use]
pub fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .join(name)
}

/// Configuration pointing at the seeded data files.
///
/// # Panics
///
/// Panics if the fixed variables are rejected.
#[must_use]
pub fn test_config() -> AssistantConfig {
    let vars: HashMap<String, String> = [
        ("OPENAI_API_KEY", TEST_API_KEY.to_string()),
        ("CATALOG_PATH", data_file("products.csv").display().to_string()),
        (
            "KNOWLEDGE_BASE_PATH",
            data_file("platform_errors.yaml").display().to_string(),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    AssistantConfig::from_map(&vars).expect("test config")
}

/// Application state over the seeded data with a scripted model.
///
/// # Panics
///
/// Panics if a data file fails to load.
#[must_use]
pub fn test_state(backend: Arc<ScriptedBackend>) -> AppState {
    let config = test_config();
    AppState::assemble(AppParts {
        backend,
        catalog: Catalog::load(&config.catalog_path).expect("seeded catalog"),
        knowledge_base: KnowledgeBase::load(&config.knowledge_base_path)
            .expect("seeded knowledge base"),
        registry: ToolRegistry::builtin(),
        chat_model: config.openai.model.clone(),
        handler_model: config.openai.handler_model.clone(),
        session_idle: Duration::from_secs(60),
    })
    .expect("app state")
}

/// The full API router over [`test_state`].
#[must_use]
pub fn test_app(backend: Arc<ScriptedBackend>) -> Router {
    vendai_assistant::app(&test_config(), test_state(backend))
}
