//! Seed catalog loading from `catalog.toml`
//!
//! The catalog file lists products and their variants. `core::seed::seed_catalog`
//! inserts whatever is missing, so the same file can be applied repeatedly.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog file
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A product and the variants it should have
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Unique product name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// List price
    pub price: Decimal,
    /// Optional image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Variants of this product
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
}

/// A single variant
#[derive(Debug, Deserialize, Clone)]
pub struct VariantSeed {
    /// Unique SKU
    pub sku: String,
    /// Optional size label
    #[serde(default)]
    pub size: Option<String>,
    /// Optional color label
    #[serde(default)]
    pub color: Option<String>,
    /// Optional price replacing the product's list price
    #[serde(default)]
    pub price_override: Option<Decimal>,
    /// Initial stock
    #[serde(default)]
    pub stock: i32,
}

/// Parses a catalog from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML is malformed or required fields are missing.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })
}

/// Loads a catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;
    parse_catalog(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_catalog() {
        let toml_str = r#"
            [[products]]
            name = "Denim Jacket"
            description = "Stonewashed"
            price = "79.99"

            [[products.variants]]
            sku = "DJ-M-BLU"
            size = "M"
            color = "blue"
            stock = 4

            [[products.variants]]
            sku = "DJ-XL-BLU"
            size = "XL"
            color = "blue"
            price_override = "84.99"
            stock = 2

            [[products]]
            name = "Canvas Tote"
            price = "19.99"
        "#;

        let catalog = parse_catalog(toml_str).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].price, dec!(79.99));
        assert_eq!(catalog.products[0].variants.len(), 2);
        assert_eq!(catalog.products[0].variants[1].price_override, Some(dec!(84.99)));
        assert_eq!(catalog.products[0].variants[0].stock, 4);
        assert!(catalog.products[1].variants.is_empty());
        assert!(catalog.products[1].description.is_none());
    }

    #[test]
    fn test_missing_price_is_rejected() {
        let result = parse_catalog("[[products]]\nname = \"Nameless\"");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
