//! Lexical product discovery over the catalog.

use std::sync::LazyLock;

use vendai_core::Product;

use super::Catalog;
use crate::text::TermAnalyzer;

/// Words that say nothing about which product is meant.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "available", "buy", "can", "cost", "costs", "do", "does",
    "for", "get", "have", "how", "i", "in", "is", "it", "list", "many", "me", "much", "my",
    "need", "of", "on", "or", "order", "please", "price", "prices", "sell", "show", "some",
    "tell", "the", "there", "to", "want", "what", "which", "with", "you", "your",
];

static ANALYZER: LazyLock<TermAnalyzer> = LazyLock::new(|| TermAnalyzer::new(STOPWORDS));

impl Catalog {
    /// Products matching the query's words, best match first.
    ///
    /// Name matches weigh twice as much as category or sub-category
    /// matches. Words are compared by English stem, so plurals match their
    /// singular. Ties keep catalog order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(u32, &Product)> = self
            .products
            .iter()
            .filter_map(|product| {
                let score = score(product, &terms);
                (score > 0).then_some((score, product))
            })
            .collect();

        // sort_by is stable, so equal scores stay in catalog order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, p)| p).collect()
    }

    /// Alternatives for a product that is not in the catalog: everything in
    /// the sub-category of the best partial match.
    ///
    /// Returns nothing when the name is an exact product or nothing matches.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Vec<&Product> {
        if self.find(name).is_some() {
            return Vec::new();
        }
        let Some(best) = self.search(name).into_iter().next() else {
            return Vec::new();
        };

        self.products
            .iter()
            .filter(|p| p.sub_category == best.sub_category)
            .collect()
    }
}

fn score(product: &Product, terms: &[String]) -> u32 {
    let name = tokenize(&product.name);
    let group: Vec<String> = tokenize(&product.category)
        .into_iter()
        .chain(tokenize(&product.sub_category))
        .collect();

    terms
        .iter()
        .map(|term| {
            if name.contains(term) {
                2
            } else {
                u32::from(group.contains(term))
            }
        })
        .sum()
}

fn tokenize(text: &str) -> Vec<String> {
    ANALYZER.terms(text)
}
