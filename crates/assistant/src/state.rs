//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogError};
use crate::config::AssistantConfig;
use crate::conversation::Conversation;
use crate::dispatcher::Dispatcher;
use crate::openai::{ChatBackend, OpenAIClient, OpenAIError};
use crate::prompts::role_prompt;
use crate::rag::{KnowledgeBase, KnowledgeBaseError};
use crate::resolver::FunctionCallResolver;
use crate::services::ChatService;
use crate::tools::{RegistryError, ToolRegistry};

/// Upper bound on live conversations kept in memory.
const MAX_SESSIONS: u64 = 10_000;

/// Failures that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("knowledge base unavailable: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("tool registry misconfigured: {0}")]
    Registry(#[from] RegistryError),

    #[error("chat client: {0}")]
    OpenAI(#[from] OpenAIError),
}

/// Everything the state is assembled from.
pub struct AppParts {
    pub backend: Arc<dyn ChatBackend>,
    pub catalog: Catalog,
    pub knowledge_base: KnowledgeBase,
    pub registry: ToolRegistry,
    /// Resolver and free-form model
    pub chat_model: String,
    /// SQL and knowledge-base model
    pub handler_model: String,
    pub session_idle: Duration,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    chat: ChatService,
    catalog: Arc<Catalog>,
    registry: Arc<ToolRegistry>,
    conversations: Cache<Uuid, Arc<Mutex<Conversation>>>,
}

impl AppState {
    /// Wire the resolver, dispatcher and session cache together.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is invalid or lacks a builtin tool.
    pub fn assemble(parts: AppParts) -> Result<Self, StartupError> {
        parts.registry.validate()?;
        parts.registry.require_builtin_kinds()?;

        let catalog = Arc::new(parts.catalog);
        let registry = Arc::new(parts.registry);

        let resolver = FunctionCallResolver::new(
            parts.backend.clone(),
            registry.clone(),
            role_prompt(),
            parts.chat_model.as_str(),
        );
        let dispatcher = Dispatcher::new(
            registry.clone(),
            parts.backend,
            catalog.clone(),
            Arc::new(parts.knowledge_base),
            &parts.chat_model,
            &parts.handler_model,
        );

        let conversations = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(parts.session_idle)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                chat: ChatService::new(resolver, dispatcher),
                catalog,
                registry,
                conversations,
            }),
        })
    }

    /// Load data files and build the HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a data file is unavailable or the client cannot
    /// be built.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, StartupError> {
        let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIClient::new(&config.openai)?);
        let catalog = Catalog::load(&config.catalog_path)?;
        let knowledge_base = KnowledgeBase::load(&config.knowledge_base_path)?;
        let registry = ToolRegistry::builtin();
        info!(
            products = catalog.len(),
            entries = knowledge_base.len(),
            tools = registry.len(),
            "Assistant data loaded"
        );

        Self::assemble(AppParts {
            backend,
            catalog,
            knowledge_base,
            registry,
            chat_model: config.openai.model.clone(),
            handler_model: config.openai.handler_model.clone(),
            session_idle: Duration::from_secs(
                u64::try_from(config.session_idle_minutes).unwrap_or(60) * 60,
            ),
        })
    }

    #[must_use]
    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.inner.registry
    }

    /// The conversation for `id`, created on first use.
    pub async fn conversation(&self, id: Uuid) -> Arc<Mutex<Conversation>> {
        self.inner
            .conversations
            .get_with(id, async { Arc::new(Mutex::new(Conversation::new())) })
            .await
    }
}
