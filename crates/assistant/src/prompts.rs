//! Prompt templates sent to the chat model.

use askama::Template;

use crate::rag::KnowledgeEntry;

#[derive(Template)]
#[template(path = "prompts/role.txt")]
struct RolePromptTemplate;

#[derive(Template)]
#[template(path = "prompts/fallback.txt")]
struct FallbackPromptTemplate<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "prompts/sql.txt")]
struct SqlPromptTemplate<'a> {
    query: &'a str,
}

#[derive(Template)]
#[template(path = "prompts/rag.txt")]
struct RagPromptTemplate<'a> {
    query: &'a str,
    entries: &'a [&'a KnowledgeEntry],
}

/// System prompt used when asking the model to pick a tool.
#[must_use]
pub fn role_prompt() -> String {
    // Static template with no variables.
    RolePromptTemplate
        .render()
        .map_or_else(|_| String::from("You are VendAI, a helpful assistant."), |s| s.trim().to_string())
}

/// Personalised system prompt for free-form replies.
#[must_use]
pub fn fallback_prompt(name: &str) -> String {
    FallbackPromptTemplate { name }.render().map_or_else(
        |_| format!("You are VendAI, a helpful assistant.\n\nName = {name}"),
        |s| s.trim().to_string(),
    )
}

/// User prompt for SQL generation.
#[must_use]
pub fn sql_prompt(query: &str) -> String {
    SqlPromptTemplate { query }.render().map_or_else(
        |_| format!("Generate a SQL query for the following request: {query}"),
        |s| s.trim().to_string(),
    )
}

/// User prompt grounding an answer in retrieved knowledge-base entries.
#[must_use]
pub fn rag_prompt(query: &str, entries: &[&KnowledgeEntry]) -> String {
    RagPromptTemplate { query, entries }
        .render()
        .map_or_else(|_| query.to_string(), |s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_prompt_names_tools() {
        let prompt = role_prompt();
        assert!(prompt.starts_with("You are VendAI"));
        assert!(prompt.contains("generate_sql"));
        assert!(prompt.contains("perform_rag"));
        assert!(prompt.contains("local_discovery"));
    }

    #[test]
    fn test_fallback_prompt_personalised() {
        let prompt = fallback_prompt("Ada");
        assert!(prompt.ends_with("Name = Ada"));
        assert!(prompt.contains("personalize"));
    }

    #[test]
    fn test_sql_prompt_is_not_escaped() {
        assert_eq!(
            sql_prompt("orders > $100 & 'pending'"),
            "Generate a SQL query for the following request: orders > $100 & 'pending'"
        );
    }

    #[test]
    fn test_rag_prompt_includes_entries() {
        let entry = KnowledgeEntry {
            title: "Payment declined".to_string(),
            keywords: vec!["payment".to_string()],
            symptoms: "Card payment fails at checkout".to_string(),
            resolution: "Re-enter the card details".to_string(),
        };
        let prompt = rag_prompt("my payment fails", &[&entry]);
        assert!(prompt.contains("### Payment declined"));
        assert!(prompt.contains("Resolution: Re-enter the card details"));
        assert!(prompt.ends_with("Customer question: my payment fails"));
    }
}
