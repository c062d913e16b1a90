//! Platform-error knowledge base behind `perform_rag`.
//!
//! The knowledge base is a YAML sequence of troubleshooting entries:
//!
//! ```yaml
//! - title: Payment declined
//!   keywords: [payment, card, declined]
//!   symptoms: Card payment fails at checkout.
//!   resolution: Re-enter the card details or try another card.
//! ```
//!
//! Retrieval is a lexical scorer over keywords, titles and symptoms. The best
//! entries are pasted into a prompt and the handler model writes the answer.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::openai::{ChatBackend, CompletionRequest, Message, OpenAIError};
use crate::prompts::rag_prompt;
use crate::text::TermAnalyzer;

/// Number of entries pasted into the answer prompt.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 3;

/// Reply when no entry matches the question.
pub const NO_MATCH_REPLY: &str = "I couldn't find anything about that error in our troubleshooting notes. \
     Please contact Vendease support with a screenshot and we'll sort it out for you.";

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "but", "can", "do", "does", "error", "for", "get", "getting",
    "have", "how", "i", "im", "in", "is", "it", "keep", "me", "my", "not", "of", "on", "or",
    "please", "the", "this", "to", "what", "when", "why", "with", "won", "t", "you",
];

static QUERY_ANALYZER: LazyLock<TermAnalyzer> = LazyLock::new(|| TermAnalyzer::new(STOPWORDS));

// Keywords are curated, so nothing is dropped from them.
static KEYWORD_ANALYZER: LazyLock<TermAnalyzer> = LazyLock::new(|| TermAnalyzer::new(&[]));

/// Errors loading the knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("knowledge base not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read knowledge base: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid knowledge base YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("knowledge base has no entries")]
    Empty,

    #[error("entry {index} is missing a {field}")]
    InvalidEntry { index: usize, field: &'static str },
}

/// One troubleshooting note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub symptoms: String,
    pub resolution: String,
}

/// Immutable set of troubleshooting notes.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build a knowledge base, rejecting entries without a title or resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if `entries` is empty or an entry is incomplete.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeBaseError> {
        if entries.is_empty() {
            return Err(KnowledgeBaseError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            if entry.title.trim().is_empty() {
                return Err(KnowledgeBaseError::InvalidEntry { index, field: "title" });
            }
            if entry.resolution.trim().is_empty() {
                return Err(KnowledgeBaseError::InvalidEntry {
                    index,
                    field: "resolution",
                });
            }
        }
        Ok(Self { entries })
    }

    /// Load from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KnowledgeBaseError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KnowledgeBaseError::NotFound(path.to_path_buf()));
        }
        let kb = Self::from_yaml_str(&std::fs::read_to_string(path)?)?;
        info!(entries = kb.len(), "Knowledge base loaded");
        Ok(kb)
    }

    /// Parse from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, KnowledgeBaseError> {
        Self::new(serde_yaml::from_str(yaml)?)
    }

    #[must_use]
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries relevant to `query`, best first, at most `limit`.
    ///
    /// A query term found in an entry's keywords scores 2, in its title or
    /// symptoms 1. Entries scoring zero are dropped; ties keep file order.
    #[must_use]
    pub fn retrieve(&self, query: &str, limit: usize) -> Vec<&KnowledgeEntry> {
        let query_terms = QUERY_ANALYZER.terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &KnowledgeEntry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let keywords: Vec<String> = entry
                    .keywords
                    .iter()
                    .flat_map(|k| KEYWORD_ANALYZER.terms(k))
                    .collect();
                let text = QUERY_ANALYZER.terms(&format!("{} {}", entry.title, entry.symptoms));

                let score: usize = query_terms
                    .iter()
                    .map(|t| {
                        if keywords.contains(t) {
                            2
                        } else {
                            usize::from(text.contains(t))
                        }
                    })
                    .sum();
                (score > 0).then_some((score, entry))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

/// Answer a platform-error question from the knowledge base.
///
/// With no matching entry the fixed [`NO_MATCH_REPLY`] is returned without
/// calling the model.
///
/// # Errors
///
/// Returns an error if the model call fails.
#[instrument(skip(kb, backend, query), fields(query_len = query.len()))]
pub async fn retrieve_information(
    kb: &KnowledgeBase,
    backend: &dyn ChatBackend,
    model: &str,
    query: &str,
) -> Result<String, OpenAIError> {
    let entries = kb.retrieve(query, DEFAULT_RETRIEVAL_LIMIT);
    if entries.is_empty() {
        debug!("No knowledge base entry matched");
        return Ok(NO_MATCH_REPLY.to_string());
    }
    debug!(
        matched = entries.len(),
        top = entries.first().map_or("", |e| e.title.as_str()),
        "Knowledge base entries retrieved"
    );

    let request = CompletionRequest::new(model, vec![Message::user(rag_prompt(query, &entries))])
        .with_temperature(0.0)
        .with_max_tokens(400);
    let response = backend.complete(request).await?;

    response
        .text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(OpenAIError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::testing::ScriptedBackend;

    const KB: &str = r"
- title: Payment declined
  keywords: [payment, card, declined, checkout]
  symptoms: Card payment fails at checkout with a declined message.
  resolution: Re-enter the card details or try another card.
- title: Cannot log in
  keywords: [login, password, sign]
  symptoms: The login page rejects a correct password.
  resolution: Reset the password from the login page.
- title: Delivery not showing
  keywords: [delivery, tracking]
  symptoms: An order delivery does not appear on the dashboard.
  resolution: Refresh the orders page; deliveries sync every 15 minutes.
";

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_yaml_str(KB).expect("valid knowledge base")
    }

    #[test]
    fn test_load_yaml() {
        let kb = kb();
        assert_eq!(kb.len(), 3);
        assert_eq!(kb.entries()[1].title, "Cannot log in");
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            KnowledgeBase::from_yaml_str("[]"),
            Err(KnowledgeBaseError::Empty)
        ));
    }

    #[test]
    fn test_entry_without_resolution_rejected() {
        let yaml = "- title: Broken\n  resolution: ''\n";
        assert!(matches!(
            KnowledgeBase::from_yaml_str(yaml),
            Err(KnowledgeBaseError::InvalidEntry { index: 0, field: "resolution" })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            KnowledgeBase::load("/nonexistent/kb.yaml"),
            Err(KnowledgeBaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_retrieve_prefers_keywords() {
        let kb = kb();
        let hits = kb.retrieve("my card payment keeps getting declined", 3);
        assert_eq!(hits[0].title, "Payment declined");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_retrieve_plural_and_limit() {
        let kb = kb();
        let hits = kb.retrieve("deliveries and passwords", 1);
        // Both score 2; file order breaks the tie.
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Cannot log in");
    }

    #[test]
    fn test_retrieve_nothing() {
        assert!(kb().retrieve("what is the weather", 3).is_empty());
        assert!(kb().retrieve("", 3).is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_information_no_match_skips_model() {
        let backend = ScriptedBackend::new();
        let reply = retrieve_information(&kb(), &backend, "gpt-4o", "tell me a joke")
            .await
            .expect("no model call");
        assert_eq!(reply, NO_MATCH_REPLY);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_information_grounds_prompt() {
        let backend = ScriptedBackend::new().with_text("  Reset your password from the login page 🔑  ");
        let reply = retrieve_information(&kb(), &backend, "gpt-4o", "I can't log in, password rejected")
            .await
            .expect("answer");
        assert_eq!(reply, "Reset your password from the login page 🔑");

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o");
        assert!(requests[0].messages[0].content.contains("Reset the password"));
    }
}
