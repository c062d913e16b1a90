//! Product catalog and order store.
//!
//! The catalog is loaded once at startup from a CSV file and is immutable
//! afterwards. Any problem with the file is fatal: the assistant refuses to
//! start with a partial catalog.
//!
//! ## CSV Format
//!
//! ```text
//! category,sub_category,product,price_(USD)
//! Food,Fruits,Apple,0.60
//! Drinks,Soft Drinks,Coca-Cola (12 oz),1.50
//! ```
//!
//! Header names are normalised before matching (trimmed, lower-cased, `-`
//! and spaces turned into `_`), so `sub-category` and `price (USD)` work too.

mod order;
mod search;
mod seed;

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument};
use vendai_core::{Price, PriceError, Product};

pub use order::{PricedLine, PricedOrder, build_order};
pub use seed::{default_products, write_csv};

/// Normalised names of the required columns.
pub const COLUMN_CATEGORY: &str = "category";
pub const COLUMN_SUB_CATEGORY: &str = "sub_category";
pub const COLUMN_PRODUCT: &str = "product";
pub const COLUMN_PRICE: &str = "price_(usd)";

/// Catalog load failures. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read catalog: {0}")]
    Read(#[from] csv::Error),

    #[error("catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: column '{column}' is empty")]
    EmptyCell { row: u64, column: &'static str },

    #[error("row {row}: invalid price: {source}")]
    InvalidPrice {
        row: u64,
        #[source]
        source: PriceError,
    },

    #[error("row {row}: duplicate product name '{name}'")]
    DuplicateProduct { row: u64, name: String },
}

/// Immutable product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    /// Lower-cased product name to index in `products`.
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from products, rejecting duplicate names. Rows in
    /// errors are CSV line numbers (header is line 1).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateProduct`] if two products share a name
    /// (case-insensitive).
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::with_capacity(products.len());
        for (idx, product) in products.iter().enumerate() {
            if by_name.insert(name_key(&product.name), idx).is_some() {
                return Err(CatalogError::DuplicateProduct {
                    row: idx as u64 + 2,
                    name: product.name.clone(),
                });
            }
        }
        Ok(Self { products, by_name })
    }

    /// Load the catalog from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file is missing or unreadable, a
    /// required column is absent, a cell is empty, a price is invalid, or a
    /// product name repeats.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound(path.to_path_buf())
            } else {
                CatalogError::Read(csv::Error::from(e))
            }
        })?;

        let catalog = Self::from_reader(file)?;
        info!(products = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Load the catalog from any CSV source.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(CatalogError::MissingColumn(name))
        };
        let category_idx = column(COLUMN_CATEGORY)?;
        let sub_category_idx = column(COLUMN_SUB_CATEGORY)?;
        let product_idx = column(COLUMN_PRODUCT)?;
        let price_idx = column(COLUMN_PRICE)?;

        let mut products = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = record.position().map_or(0, csv::Position::line);
            let cell = |idx: usize, name: &'static str| {
                record
                    .get(idx)
                    .filter(|v| !v.is_empty())
                    .ok_or(CatalogError::EmptyCell { row, column: name })
            };

            let price = Price::parse_usd(cell(price_idx, COLUMN_PRICE)?)
                .map_err(|source| CatalogError::InvalidPrice { row, source })?;
            products.push(Product::new(
                cell(category_idx, COLUMN_CATEGORY)?,
                cell(sub_category_idx, COLUMN_SUB_CATEGORY)?,
                cell(product_idx, COLUMN_PRODUCT)?,
                price,
            ));
        }

        Self::new(products)
    }

    /// The built-in demo catalog.
    #[must_use]
    pub fn demo() -> Self {
        let products = default_products();
        let by_name = products
            .iter()
            .enumerate()
            .map(|(idx, p)| (name_key(&p.name), idx))
            .collect();
        Self { products, by_name }
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Case-insensitive exact lookup by product name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Product> {
        self.by_name
            .get(&name_key(name))
            .and_then(|&idx| self.products.get(idx))
    }

    /// Distinct sub-categories in catalog order.
    #[must_use]
    pub fn sub_categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.sub_category.as_str()) {
                seen.push(product.sub_category.as_str());
            }
        }
        seen
    }
}

/// Normalise a CSV header for matching.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
