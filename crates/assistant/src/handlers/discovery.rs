//! `local_discovery`: product questions and ordering against the catalog.

use std::sync::Arc;

use tracing::{debug, instrument};
use vendai_core::Product;

use crate::catalog::Catalog;

/// Most products listed in one search answer.
const MAX_RESULTS: usize = 5;

pub(crate) const REGISTER_FIRST: &str =
    "Please register first so I can place the order in your name.";

/// Answers from the local catalog. Never calls the model.
#[derive(Clone)]
pub struct DiscoveryHandler {
    catalog: Arc<Catalog>,
}

impl DiscoveryHandler {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// With `products`, build an order for the registered user; otherwise
    /// answer `query` from the catalog.
    #[must_use]
    #[instrument(skip_all, fields(products = products.len(), registered = user_name.is_some()))]
    pub fn handle(&self, query: &str, products: &[String], user_name: Option<&str>) -> String {
        if products.is_empty() {
            self.answer(query)
        } else {
            self.order(products, user_name)
        }
    }

    fn order(&self, products: &[String], user_name: Option<&str>) -> String {
        let Some(name) = user_name else {
            return REGISTER_FIRST.to_string();
        };

        let priced = self
            .catalog
            .price_order(self.catalog.build_order(name, products));
        let mut out = format!("Here is your order, {name}:\n\n{}", priced.to_markdown());

        if !priced.unknown.is_empty() {
            out.push_str(&format!(
                "\nThese items are not in our catalog: {}.",
                priced.unknown.join(", ")
            ));
            for missing in &priced.unknown {
                let alternatives = self.catalog.suggest(missing);
                if !alternatives.is_empty() {
                    out.push_str(&format!(
                        "\nInstead of {missing} you might like: {}.",
                        inline_list(&alternatives)
                    ));
                }
            }
        }
        out
    }

    fn answer(&self, query: &str) -> String {
        let trimmed = query.trim().trim_end_matches(['?', '.', '!']);
        if let Some(product) = self.catalog.find(trimmed) {
            return price_line(product);
        }

        let hits = self.catalog.search(query);
        debug!(hits = hits.len(), "Catalog search");
        match hits.as_slice() {
            [] => format!(
                "Sorry, I couldn't find \"{}\" in our catalog. We stock: {}.",
                query.trim(),
                self.catalog.sub_categories().join(", ")
            ),
            [only] => price_line(only),
            many => {
                let mut out = String::from("Here's what I found:\n");
                for product in many.iter().take(MAX_RESULTS) {
                    out.push_str(&format!(
                        "\n- {} ({}): {}",
                        product.name,
                        product.sub_category,
                        product.price.display()
                    ));
                }
                if many.len() > MAX_RESULTS {
                    out.push_str(&format!("\n\n...and {} more.", many.len() - MAX_RESULTS));
                }
                out
            }
        }
    }
}

fn price_line(product: &Product) -> String {
    format!(
        "{} ({}) costs {}.",
        product.name,
        product.sub_category,
        product.price.display()
    )
}

fn inline_list(products: &[&Product]) -> String {
    products
        .iter()
        .map(|p| format!("{} ({})", p.name, p.price.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
