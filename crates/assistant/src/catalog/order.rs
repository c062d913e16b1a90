//! Order building and pricing.

use serde::Serialize;
use tracing::debug;
use vendai_core::{OrderLine, Price, Product};

use super::Catalog;

/// Build one `Pending` order line per product name.
///
/// Insertion order and duplicates are kept. Names are not checked against
/// any catalog; an empty list yields an empty order.
#[must_use]
pub fn build_order<S: AsRef<str>>(user_name: &str, product_names: &[S]) -> Vec<OrderLine> {
    product_names
        .iter()
        .map(|name| OrderLine::pending(user_name, name.as_ref()))
        .collect()
}

/// An order line with its catalog entry, if the product exists.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    #[serde(flatten)]
    pub line: OrderLine,
    pub product: Option<Product>,
}

/// An order priced against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    /// Sum of the known products' prices.
    pub total: Price,
    /// Names that are not in the catalog, in order of appearance.
    pub unknown: Vec<String>,
}

impl Catalog {
    /// Build an order for `user_name`, logging names the catalog lacks.
    #[must_use]
    pub fn build_order<S: AsRef<str>>(&self, user_name: &str, product_names: &[S]) -> Vec<OrderLine> {
        for name in product_names {
            if self.find(name.as_ref()).is_none() {
                debug!(product = name.as_ref(), "Order line for product not in catalog");
            }
        }
        build_order(user_name, product_names)
    }

    /// Attach catalog entries and a total to order lines.
    #[must_use]
    pub fn price_order(&self, lines: Vec<OrderLine>) -> PricedOrder {
        let mut total = Price::zero_usd();
        let mut unknown = Vec::new();

        let lines = lines
            .into_iter()
            .map(|line| {
                let product = self.find(&line.product_name).cloned();
                match &product {
                    Some(p) => total = total.checked_add(p.price).unwrap_or(total),
                    None => unknown.push(line.product_name.clone()),
                }
                PricedLine { line, product }
            })
            .collect();

        PricedOrder {
            lines,
            total,
            unknown,
        }
    }
}

impl PricedOrder {
    /// Render as a markdown table with a total row.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("| # | Product | Price | Status |\n|---|---|---|---|\n");
        for (idx, priced) in self.lines.iter().enumerate() {
            let (name, price) = priced.product.as_ref().map_or_else(
                || (priced.line.product_name.as_str(), "n/a".to_string()),
                |p| (p.name.as_str(), p.price.display()),
            );
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                idx + 1,
                table_cell(name),
                price,
                priced.line.status
            ));
        }
        out.push_str(&format!("| | **Total** | **{}** | |\n", self.total.display()));
        out
    }
}

/// Keep free-text names inside one table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
