//! Catalog business logic - products, variants and stock.
//!
//! Products and variants have lifecycles independent of the ledgers that reference them.
//! A product or variant still referenced by a historical line cannot be deleted: the
//! check here gives a descriptive error, and the `RESTRICT` foreign keys stop anything that
//! slips past it.

use crate::{
    core::line_item::{round_money, validate_amount},
    entities::{
        OrderItem, Product, SaleItem, Variant, order_item, product, sale_item, variant,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Fields for a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Unique display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// List price
    pub price: Decimal,
    /// Optional image reference
    pub image_url: Option<String>,
}

/// Fields for a new variant
#[derive(Debug, Clone)]
pub struct NewVariant {
    /// Owning product
    pub product_id: i64,
    /// Unique SKU
    pub sku: String,
    /// Optional size label
    pub size: Option<String>,
    /// Optional color label
    pub color: Option<String>,
    /// Optional price replacing the product's list price
    pub price_override: Option<Decimal>,
    /// Initial stock
    pub stock: i32,
}

/// A variant together with its product name, as shown on inventory screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// The variant row
    pub variant: variant::Model,
    /// Name of the owning product
    pub product_name: String,
    /// Price a new line would snapshot
    pub unit_price: Decimal,
}

/// Rejects an empty or whitespace-only product name or SKU.
///
/// # Errors
/// Returns `Error::InvalidName` naming the rejected field.
pub fn validate_name(name: &str, what: &'static str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName { what });
    }
    Ok(())
}

/// Creates a product after validating its name and price.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative, finer than a cent, or above the ledger maximum
/// - Another product already has this name (`Error::ConstraintViolation`)
#[instrument(skip(db, new), fields(name = %new.name))]
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    validate_name(&new.name, "Product name")?;
    validate_amount(new.price)?;

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        price: Set(new.price),
        image_url: Set(new.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created product '{}' (ID: {})", product.name, product.id);
    Ok(product)
}

/// Retrieves a product by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every product, alphabetically.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renames and/or re-prices a product.
///
/// Existing order and sale lines keep their snapshot prices; only lines written after this
/// call see the new price.
///
/// # Errors
/// Returns `Error::ProductNotFound`, a validation error, or a database error.
#[instrument(skip(db))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    new_name: Option<String>,
    new_price: Option<Decimal>,
) -> Result<product::Model> {
    if let Some(name) = new_name.as_deref() {
        validate_name(name, "Product name")?;
    }
    if let Some(price) = new_price {
        validate_amount(price)?;
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    if let Some(name) = new_name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(price) = new_price {
        product.price = Set(price);
    }
    product.updated_at = Set(chrono::Utc::now());

    let updated = product.update(db).await?;
    debug!("Updated product {}: price now {}", updated.id, updated.price);
    Ok(updated)
}

/// Sets or clears a product's image reference.
///
/// # Errors
/// Returns `Error::ProductNotFound` or a database error.
#[instrument(skip(db))]
pub async fn set_product_image(
    db: &DatabaseConnection,
    product_id: i64,
    image_url: Option<String>,
) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();
    product.image_url = Set(image_url.filter(|url| !url.trim().is_empty()));
    product.updated_at = Set(chrono::Utc::now());
    product.update(db).await.map_err(Into::into)
}

/// Deletes a product that nothing references.
///
/// The reference count and the delete run in one transaction. A reference written by
/// another connection in between still trips the `RESTRICT` foreign key, which surfaces
/// as `Error::ConstraintViolation`.
///
/// # Errors
/// Returns `Error::ProductInUse` while variants or sale items reference the product,
/// `Error::ProductNotFound` if it does not exist.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let variants = Variant::find()
        .filter(variant::Column::ProductId.eq(product_id))
        .count(&txn)
        .await?;
    let sale_lines = SaleItem::find()
        .filter(sale_item::Column::ProductId.eq(product_id))
        .count(&txn)
        .await?;
    if variants + sale_lines > 0 {
        warn!(
            "Refusing to delete product {}: {} variant(s), {} sale line(s) reference it",
            product_id, variants, sale_lines
        );
        return Err(Error::ProductInUse {
            product_id,
            references: variants + sale_lines,
        });
    }

    product.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted product {}", product_id);
    Ok(())
}

/// Creates a variant of an existing product.
///
/// # Errors
/// Returns an error if the SKU is empty, the stock or price override is negative,
/// the product does not exist, or the SKU is already taken.
#[instrument(skip(db, new), fields(sku = %new.sku))]
pub async fn create_variant(db: &DatabaseConnection, new: NewVariant) -> Result<variant::Model> {
    validate_name(&new.sku, "SKU")?;
    if new.stock < 0 {
        return Err(Error::InvalidQuantity {
            quantity: new.stock,
        });
    }
    if let Some(price) = new.price_override {
        validate_amount(price)?;
    }
    if get_product_by_id(db, new.product_id).await?.is_none() {
        return Err(Error::ProductNotFound {
            id: new.product_id,
        });
    }

    let variant = variant::ActiveModel {
        product_id: Set(new.product_id),
        sku: Set(new.sku.trim().to_string()),
        size: Set(new.size),
        color: Set(new.color),
        price_override: Set(new.price_override),
        stock: Set(new.stock),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created variant {} ({}) of product {} with stock {}",
        variant.id, variant.sku, variant.product_id, variant.stock
    );
    Ok(variant)
}

/// Retrieves a variant by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_variant_by_id<C>(db: &C, variant_id: i64) -> Result<Option<variant::Model>>
where
    C: ConnectionTrait,
{
    Variant::find_by_id(variant_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the variants of one product, by SKU.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_variants_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<variant::Model>> {
    Variant::find()
        .filter(variant::Column::ProductId.eq(product_id))
        .order_by_asc(variant::Column::Sku)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every variant with its product name and effective price.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_inventory(db: &DatabaseConnection) -> Result<Vec<InventoryEntry>> {
    let rows = Variant::find()
        .find_also_related(Product)
        .order_by_asc(variant::Column::Sku)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(variant, product)| {
            product.map(|product| InventoryEntry {
                unit_price: variant.effective_price(&product),
                product_name: product.name,
                variant,
            })
        })
        .collect())
}

/// Unit price a new line for `variant_id` would snapshot right now.
///
/// Rounded to cents, since `SQLite` hands the stored price back as a float.
///
/// # Errors
/// Returns `Error::VariantNotFound` or `Error::ProductNotFound` for dangling references.
pub async fn effective_price<C>(db: &C, variant_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let (variant, product) = Variant::find_by_id(variant_id)
        .find_also_related(Product)
        .one(db)
        .await?
        .ok_or(Error::VariantNotFound { id: variant_id })?;
    let product = product.ok_or(Error::ProductNotFound {
        id: variant.product_id,
    })?;
    Ok(round_money(variant.effective_price(&product)))
}

/// Adds units to a variant's stock.
///
/// # Errors
/// Returns `Error::InvalidQuantity` for non-positive amounts, `Error::VariantNotFound`
/// for unknown variants.
#[instrument(skip(db))]
pub async fn restock_variant(
    db: &DatabaseConnection,
    variant_id: i64,
    quantity: i32,
) -> Result<variant::Model> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    release_stock(db, variant_id, quantity).await?;
    let variant = get_variant_by_id(db, variant_id)
        .await?
        .ok_or(Error::VariantNotFound { id: variant_id })?;
    info!("Restocked variant {} by {} to {}", variant_id, quantity, variant.stock);
    Ok(variant)
}

/// Deletes a variant that no order item references.
///
/// Same shape as [`delete_product`]: count and delete share a transaction, and the
/// foreign key catches anything that gets in between.
///
/// # Errors
/// Returns `Error::VariantInUse` while order items reference the variant,
/// `Error::VariantNotFound` if it does not exist.
#[instrument(skip(db))]
pub async fn delete_variant(db: &DatabaseConnection, variant_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let variant = Variant::find_by_id(variant_id)
        .one(&txn)
        .await?
        .ok_or(Error::VariantNotFound { id: variant_id })?;

    let references = OrderItem::find()
        .filter(order_item::Column::VariantId.eq(variant_id))
        .count(&txn)
        .await?;
    if references > 0 {
        warn!(
            "Refusing to delete variant {}: {} order item(s) reference it",
            variant_id, references
        );
        return Err(Error::VariantInUse {
            variant_id,
            references,
        });
    }

    variant.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted variant {}", variant_id);
    Ok(())
}

/// Takes `quantity` units of a variant's stock, or fails without touching it.
///
/// This is the only place stock goes down. The decrement is a single conditional
/// `UPDATE ... WHERE stock >= quantity`: the check and the write happen in one statement,
/// so two concurrent reservations can never both take the last unit. When no row matches,
/// the variant is read back to tell a missing variant from a short one.
///
/// Call it with the transaction that writes the order line, as [`create_order`] and
/// [`add_order_item`] do. A later failure in that transaction then puts the stock back
/// with the rollback, and no compensating [`release_stock`] is needed.
///
/// [`create_order`]: crate::core::order::create_order
/// [`add_order_item`]: crate::core::order::add_order_item
///
/// # Errors
/// Returns `Error::InsufficientStock` when the stock is too low, `Error::VariantNotFound`
/// when the variant does not exist.
pub async fn reserve_stock<C>(db: &C, variant_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let result = Variant::update_many()
        .col_expr(
            variant::Column::Stock,
            Expr::col(variant::Column::Stock).sub(quantity),
        )
        .filter(variant::Column::Id.eq(variant_id))
        .filter(variant::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let variant = Variant::find_by_id(variant_id)
            .one(db)
            .await?
            .ok_or(Error::VariantNotFound { id: variant_id })?;
        debug!(
            "Stock reservation refused for variant {}: requested {}, available {}",
            variant_id, quantity, variant.stock
        );
        return Err(Error::InsufficientStock {
            variant_id,
            requested: quantity,
            available: variant.stock,
        });
    }
    Ok(())
}

/// Returns `quantity` units to a variant's stock.
///
/// # Errors
/// Returns `Error::VariantNotFound` when the variant does not exist.
pub async fn release_stock<C>(db: &C, variant_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Variant::update_many()
        .col_expr(
            variant::Column::Stock,
            Expr::col(variant::Column::Stock).add(quantity),
        )
        .filter(variant::Column::Id.eq(variant_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::VariantNotFound { id: variant_id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(
            &db,
            NewProduct {
                name: "   ".to_string(),
                description: None,
                price: dec!(10.00),
                image_url: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InvalidName {
                what: "Product name"
            })
        ));

        let result = create_product(
            &db,
            NewProduct {
                name: "Scarf".to_string(),
                description: None,
                price: dec!(-1.00),
                image_url: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));

        let result = create_product(
            &db,
            NewProduct {
                name: "Scarf".to_string(),
                description: None,
                price: dec!(12.999),
                image_url: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_variant_rejects_blank_sku() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = create_test_variant(&db, 1, " ", 1).await;
        assert!(matches!(result, Err(Error::InvalidName { what: "SKU" })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_without_image_reads_back_null() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Denim Jacket", dec!(49.99)).await?;

        let found = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(found.image_url, None);
        assert_eq!(found.price.round_dp(2), dec!(49.99));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_product_name_is_a_constraint_violation() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "Beanie", dec!(12.00)).await?;

        let result = create_test_product(&db, "Beanie", dec!(13.00)).await;
        assert!(matches!(result, Err(Error::ConstraintViolation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_and_clear_product_image() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Sneaker", dec!(89.00)).await?;

        let with_image = set_product_image(
            &db,
            product.id,
            Some("https://cdn.example.com/sneaker.png".to_string()),
        )
        .await?;
        assert_eq!(
            with_image.image_url.as_deref(),
            Some("https://cdn.example.com/sneaker.png")
        );

        let cleared = set_product_image(&db, product.id, Some("  ".to_string())).await?;
        assert_eq!(cleared.image_url, None);

        let missing = set_product_image(&db, 999, None).await;
        assert!(matches!(missing, Err(Error::ProductNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_changes_price() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Belt", dec!(25.00)).await?;

        let updated = update_product(&db, product.id, None, Some(dec!(30.00))).await?;
        assert_eq!(updated.name, "Belt");
        assert_eq!(updated.price.round_dp(2), dec!(30.00));

        let renamed = update_product(&db, product.id, Some("Leather Belt".to_string()), None)
            .await?;
        assert_eq!(renamed.name, "Leather Belt");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_inventory_uses_override_price() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Hoodie", dec!(40.00)).await?;
        create_test_variant(&db, product.id, "HD-M", 3).await?;
        create_variant(
            &db,
            NewVariant {
                product_id: product.id,
                sku: "HD-XXL".to_string(),
                size: Some("XXL".to_string()),
                color: None,
                price_override: Some(dec!(45.00)),
                stock: 1,
            },
        )
        .await?;

        let inventory = list_inventory(&db).await?;
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].variant.sku, "HD-M");
        assert_eq!(inventory[0].product_name, "Hoodie");
        assert_eq!(inventory[0].unit_price.round_dp(2), dec!(40.00));
        assert_eq!(inventory[1].unit_price.round_dp(2), dec!(45.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_variant_for_missing_product() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_test_variant(&db, 42, "GHOST-1", 1).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_stock_is_conditional() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Cap", dec!(15.00)).await?;
        let variant = create_test_variant(&db, product.id, "CAP-1", 2).await?;

        reserve_stock(&db, variant.id, 2).await?;
        let result = reserve_stock(&db, variant.id, 1).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock {
                requested: 1,
                available: 0,
                ..
            })
        ));

        let after = get_variant_by_id(&db, variant.id).await?.unwrap();
        assert_eq!(after.stock, 0);

        let missing = reserve_stock(&db, 999, 1).await;
        assert!(matches!(missing, Err(Error::VariantNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_restock_variant() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Sock", dec!(4.00)).await?;
        let variant = create_test_variant(&db, product.id, "SOCK-1", 0).await?;

        let restocked = restock_variant(&db, variant.id, 12).await?;
        assert_eq!(restocked.stock, 12);

        let invalid = restock_variant(&db, variant.id, 0).await;
        assert!(matches!(invalid, Err(Error::InvalidQuantity { quantity: 0 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unreferenced_variant_and_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gloves", dec!(18.00)).await?;
        let variant = create_test_variant(&db, product.id, "GLV-1", 1).await?;

        // The product is still referenced by its variant
        let blocked = delete_product(&db, product.id).await;
        assert!(matches!(
            blocked,
            Err(Error::ProductInUse { references: 1, .. })
        ));

        delete_variant(&db, variant.id).await?;
        delete_product(&db, product.id).await?;
        assert!(get_product_by_id(&db, product.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_restrict_foreign_key_backs_up_the_check() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Parka", dec!(120.00)).await?;
        create_test_variant(&db, product.id, "PK-1", 1).await?;

        // Bypass delete_product's check and go straight at the table
        let result = Product::delete_by_id(product.id).exec(&db).await;
        let err: Error = result.unwrap_err().into();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        Ok(())
    }
}
