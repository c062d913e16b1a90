//! Catalog seeding and listing.

use std::path::Path;

use tracing::info;
use vendai_assistant::catalog::{Catalog, default_products, write_csv};
use vendai_core::Product;

/// Write the demo catalog to `output`.
///
/// # Errors
///
/// Returns an error if `output` exists and `force` is not set, or the file
/// cannot be written.
pub fn seed(output: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )
        .into());
    }
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let products = default_products();
    write_csv(output, &products)?;

    // Read back so a bad write fails here rather than at server start
    let catalog = Catalog::load(output)?;
    info!(products = catalog.len(), path = %output.display(), "Catalog seeded");
    Ok(())
}

/// Print the catalog, or the products matching `query`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn list(path: &Path, query: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load(path)?;
    let products: Vec<&Product> = match query {
        Some(q) => catalog.search(q),
        None => catalog.products().iter().collect(),
    };

    if products.is_empty() {
        info!("No products matched");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    {
        print!("{}", product_table(&products));
    }
    Ok(())
}

/// Fixed-width table of products.
fn product_table(products: &[&Product]) -> String {
    let name_width = products
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .max("Product".len());
    let sub_width = products
        .iter()
        .map(|p| p.sub_category.len())
        .max()
        .unwrap_or(0)
        .max("Sub-category".len());

    let mut out = format!(
        "{:<name_width$}  {:<sub_width$}  {:>8}\n",
        "Product", "Sub-category", "Price"
    );
    for product in products {
        out.push_str(&format!(
            "{:<name_width$}  {:<sub_width$}  {:>8}\n",
            product.name,
            product.sub_category,
            product.price.display()
        ));
    }
    out
}
