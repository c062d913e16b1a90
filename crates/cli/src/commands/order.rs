//! Order building from the command line.

use std::path::Path;

use tracing::{info, warn};
use vendai_assistant::catalog::Catalog;

/// Build an order for `user` and print it as a markdown table.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn build(
    catalog_path: &Path,
    user: &str,
    products: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load(catalog_path)?;
    let order = catalog.price_order(catalog.build_order(user, products));

    info!(lines = order.lines.len(), total = %order.total, "Order built");
    for name in &order.unknown {
        let suggestions: Vec<&str> = catalog.suggest(name).into_iter().map(|p| p.name.as_str()).collect();
        if suggestions.is_empty() {
            warn!(product = %name, "Not in catalog");
        } else {
            warn!(product = %name, suggestions = %suggestions.join(", "), "Not in catalog");
        }
    }

    #[allow(clippy::print_stdout)]
    {
        print!("{}", order.to_markdown());
    }
    Ok(())
}
