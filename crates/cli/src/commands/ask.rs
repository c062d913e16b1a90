//! One-shot question through the resolver and dispatcher.

use std::sync::Arc;

use tracing::info;
use vendai_assistant::catalog::Catalog;
use vendai_assistant::config::AssistantConfig;
use vendai_assistant::dispatcher::{DispatchContext, Dispatcher};
use vendai_assistant::openai::{ChatBackend, OpenAIClient};
use vendai_assistant::prompts::role_prompt;
use vendai_assistant::rag::KnowledgeBase;
use vendai_assistant::resolver::FunctionCallResolver;
use vendai_assistant::tools::ToolRegistry;

/// Resolve `message` to a tool, run it and print the reply.
///
/// Uses the same environment variables as the assistant server.
///
/// # Errors
///
/// Returns an error if configuration or data files are unavailable, or the
/// model cannot be reached while resolving.
pub async fn ask(message: &str, name: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AssistantConfig::from_env()?;

    let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIClient::new(&config.openai)?);
    let registry = Arc::new(ToolRegistry::builtin());
    let catalog = Arc::new(Catalog::load(&config.catalog_path)?);
    let knowledge_base = Arc::new(KnowledgeBase::load(&config.knowledge_base_path)?);

    let resolver = FunctionCallResolver::new(
        backend.clone(),
        registry.clone(),
        role_prompt(),
        config.openai.model.as_str(),
    );
    let dispatcher = Dispatcher::new(
        registry,
        backend,
        catalog,
        knowledge_base,
        &config.openai.model,
        &config.openai.handler_model,
    );

    let decision = resolver.resolve(message, &[]).await?;
    info!(tool = decision.tool_name.as_deref().unwrap_or("none"), "Message resolved");

    let ctx = DispatchContext {
        user_message: message,
        user_name: name,
        history: &[],
    };
    let reply = dispatcher.dispatch_text(&decision, &ctx).await;

    #[allow(clippy::print_stdout)]
    {
        println!("{reply}");
    }
    Ok(())
}
