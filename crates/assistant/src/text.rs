//! Word-level analysis shared by catalog search and knowledge-base
//! retrieval, built on tantivy's English analyzer chain.

use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer, TokenStream,
};

/// Longer tokens are noise (pasted IDs, URLs) and are dropped.
const MAX_TOKEN_LEN: usize = 40;

/// Split on non-alphanumerics, lower-case, drop stopwords, then stem.
///
/// Stopwords are matched before stemming, so list them as written.
#[derive(Clone)]
pub struct TermAnalyzer {
    analyzer: TextAnalyzer,
}

impl TermAnalyzer {
    #[must_use]
    pub fn new(stopwords: &[&str]) -> Self {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
            .filter(LowerCaser)
            .filter(StopWordFilter::remove(
                stopwords.iter().map(|w| (*w).to_string()),
            ))
            .filter(Stemmer::new(Language::English))
            .build();
        Self { analyzer }
    }

    /// Stemmed terms of `text` in order. Bare numbers are dropped.
    #[must_use]
    pub fn terms(&self, text: &str) -> Vec<String> {
        // token_stream needs &mut; clones share nothing mutable
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            let token = &stream.token().text;
            if !token.chars().all(|c| c.is_ascii_digit()) {
                out.push(token.clone());
            }
        }
        out
    }
}

impl std::fmt::Debug for TermAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermAnalyzer").finish_non_exhaustive()
    }
}
