//! Demo catalog generator.

use std::path::Path;

use rust_decimal::Decimal;
use tracing::info;
use vendai_core::{Price, Product};

use super::CatalogError;

/// (category, sub-category, product, price in cents)
const DEMO_PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("Food", "Fruits", "Apple", 60),
    ("Food", "Fruits", "Banana", 30),
    ("Food", "Vegetables", "Carrot", 25),
    ("Food", "Vegetables", "Broccoli", 150),
    ("Food", "Grains", "Rice (1 lb)", 200),
    ("Food", "Grains", "Quinoa (1 lb)", 400),
    ("Food", "Proteins", "Chicken Breast (1 lb)", 550),
    ("Food", "Proteins", "Tofu (14 oz)", 200),
    ("Food", "Dairy", "Milk (1 gallon)", 399),
    ("Food", "Dairy", "Cheddar Cheese (1 lb)", 586),
    ("Drinks", "Soft Drinks", "Coca-Cola (12 oz)", 150),
    ("Drinks", "Soft Drinks", "Pepsi (12 oz)", 150),
    ("Drinks", "Juices", "Orange Juice (1 gallon)", 600),
    ("Drinks", "Juices", "Apple Juice (1 gallon)", 550),
    ("Drinks", "Tea", "Green Tea (20 bags)", 300),
    ("Drinks", "Tea", "Black Tea (20 bags)", 250),
    ("Drinks", "Coffee", "Espresso (1 shot)", 200),
    ("Drinks", "Coffee", "Latte (12 oz)", 400),
    ("Drinks", "Water", "Evian Water (1.5 liters)", 200),
    ("Drinks", "Water", "Spring Water (1.5 liters)", 100),
];

/// The twenty-product demo catalog.
#[must_use]
pub fn default_products() -> Vec<Product> {
    DEMO_PRODUCTS
        .iter()
        .map(|&(category, sub_category, name, cents)| {
            Product::new(category, sub_category, name, Price::usd(Decimal::new(cents, 2)))
        })
        .collect()
}

/// Write products as a catalog CSV that [`super::Catalog::load`] accepts.
///
/// # Errors
///
/// Returns [`CatalogError::Read`] if the file cannot be written.
pub fn write_csv(path: impl AsRef<Path>, products: &[Product]) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["category", "sub_category", "product", "price_(USD)"])?;
    for product in products {
        writer.write_record([
            product.category.as_str(),
            product.sub_category.as_str(),
            product.name.as_str(),
            product.price.plain().as_str(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;

    info!(path = %path.display(), products = products.len(), "Catalog written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Catalog;
    use super::*;

    #[test]
    fn test_default_products() {
        let products = default_products();
        assert_eq!(products.len(), 20);
        assert_eq!(products[0].name, "Apple");
        assert_eq!(products[0].price.display(), "$0.60");
        assert_eq!(products[9].price.display(), "$5.86");
        assert_eq!(products.iter().filter(|p| p.category == "Drinks").count(), 10);
    }

    #[test]
    fn test_write_csv_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("products.csv");

        write_csv(&path, &default_products()).expect("write catalog");
        let catalog = Catalog::load(&path).expect("load written catalog");

        assert_eq!(catalog.len(), 20);
        let latte = catalog.find("Latte (12 oz)").expect("latte");
        assert_eq!(latte.sub_category, "Coffee");
        assert_eq!(latte.price.plain(), "4.00");
    }
}
