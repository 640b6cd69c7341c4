//! Catalog seeding and the demo data loader.
//!
//! `seed_catalog` inserts only what is missing, matching products by name and variants by
//! SKU, so re-running it against a populated database changes nothing.

use crate::{
    config::catalog::CatalogConfig,
    core::{
        catalog::validate_name,
        line_item::{LineItem, ProductRef, round_money, validate_amount},
        sale::create_sale_at_time,
    },
    entities::{Product, Variant, product, variant},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Rows inserted by one seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Products created
    pub products_created: usize,
    /// Variants created
    pub variants_created: usize,
}

/// Applies the same rules as `create_product` and `create_variant` to every entry.
fn validate_catalog(catalog: &CatalogConfig) -> Result<()> {
    for seed in &catalog.products {
        validate_name(&seed.name, "Product name")?;
        validate_amount(seed.price)?;
        for variant_seed in &seed.variants {
            validate_name(&variant_seed.sku, "SKU")?;
            if let Some(price) = variant_seed.price_override {
                validate_amount(price)?;
            }
            if variant_seed.stock < 0 {
                return Err(Error::InvalidQuantity {
                    quantity: variant_seed.stock,
                });
            }
        }
    }
    Ok(())
}

/// Inserts every product and variant in `catalog` that does not exist yet.
///
/// The whole file is validated first, then written in one transaction: a bad entry
/// leaves the catalog as it was.
///
/// # Errors
/// Returns a validation error for an invalid entry (blank name or SKU, bad price,
/// negative stock), or an error if a write fails (e.g. a SKU already used by another
/// product).
#[instrument(skip(db, catalog), fields(products = catalog.products.len()))]
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<SeedReport> {
    validate_catalog(catalog)?;

    let txn = db.begin().await?;
    let mut report = SeedReport::default();

    for seed in &catalog.products {
        let existing = Product::find()
            .filter(product::Column::Name.eq(seed.name.as_str()))
            .one(&txn)
            .await?;
        let product = if let Some(product) = existing {
            debug!("Product '{}' already present", seed.name);
            product
        } else {
            let now = Utc::now();
            report.products_created += 1;
            product::ActiveModel {
                name: Set(seed.name.clone()),
                description: Set(seed.description.clone()),
                price: Set(seed.price),
                image_url: Set(seed.image_url.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        };

        for variant_seed in &seed.variants {
            let present = Variant::find()
                .filter(variant::Column::Sku.eq(variant_seed.sku.as_str()))
                .one(&txn)
                .await?
                .is_some();
            if present {
                continue;
            }
            variant::ActiveModel {
                product_id: Set(product.id),
                sku: Set(variant_seed.sku.clone()),
                size: Set(variant_seed.size.clone()),
                color: Set(variant_seed.color.clone()),
                price_override: Set(variant_seed.price_override),
                stock: Set(variant_seed.stock),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.variants_created += 1;
        }
    }

    txn.commit().await?;
    info!(
        "Seeded {} product(s) and {} variant(s)",
        report.products_created, report.variants_created
    );
    Ok(report)
}

/// Records a few demo sales over the last days at current list prices.
///
/// Uses the first products of the catalog by ID; does nothing when the catalog is empty.
///
/// # Errors
/// Returns an error if a sale cannot be recorded.
#[instrument(skip(db))]
pub async fn seed_demo_sales(db: &DatabaseConnection) -> Result<usize> {
    let products = Product::find()
        .order_by_asc(product::Column::Id)
        .limit(3)
        .all(db)
        .await?;
    if products.is_empty() {
        info!("No products in the catalog; skipping demo sales");
        return Ok(0);
    }

    let now = Utc::now();
    let mut recorded = 0;
    for (days_ago, quantity) in [(2_i64, 1_i32), (1, 2), (0, 3)] {
        let lines = products
            .iter()
            .take(usize::try_from(days_ago + 1).unwrap_or(1))
            .map(|p| LineItem::new(ProductRef(p.id), quantity, round_money(p.price)))
            .collect::<Result<Vec<_>>>()?;
        create_sale_at_time(db, lines, now - Duration::days(days_ago)).await?;
        recorded += 1;
    }
    info!("Recorded {} demo sale(s)", recorded);
    Ok(recorded)
}
