//! Catalog product.

use serde::{Deserialize, Serialize};

use super::Price;

/// One row of the product catalog. `name` is unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Top-level grouping, e.g. "Food" or "Drinks".
    pub category: String,
    /// Finer grouping, e.g. "Fruits" or "Soft Drinks".
    pub sub_category: String,
    pub name: String,
    pub price: Price,
}

impl Product {
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        name: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
            name: name.into(),
            price,
        }
    }
}
