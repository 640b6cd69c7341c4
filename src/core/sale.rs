//! Sales ledger business logic.
//!
//! A sale is a completed point-of-sale transaction: one `sales` row and its `sale_items`,
//! each pointing at a product with the unit price rung up at the till. Sales do not touch
//! variant stock; that is the orders ledger's concern.

use crate::{
    core::{
        catalog::get_product_by_id,
        line_item::{LineItem, ProductRef, round_money, total_of, validate_lines},
    },
    entities::{Product, Sale, SaleItem, sale, sale_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// A sale line with the name of the product it sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLine {
    /// Stored line
    pub item: sale_item::Model,
    /// Product name at read time
    pub product_name: String,
}

/// A sale with all of its lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleDetails {
    /// Parent row
    pub sale: sale::Model,
    /// Lines, in insertion order
    pub items: Vec<SaleLine>,
}

/// Records a sale timestamped now.
///
/// # Errors
/// Returns `Error::EmptyTransaction` for an empty sale (nothing is written),
/// `Error::ProductNotFound` for unknown products, or a database error. Any failure rolls
/// back the whole sale.
pub async fn create_sale(
    db: &DatabaseConnection,
    lines: Vec<LineItem<ProductRef>>,
) -> Result<SaleDetails> {
    create_sale_at_time(db, lines, Utc::now()).await
}

/// Records a sale with an explicit timestamp.
///
/// [`create_sale`] calls this with the current time. Back-dated sales come from the demo
/// loader and from imports, which need `sale_time` to match when the goods changed hands
/// so that daily reports land on the right day.
///
/// Every product is looked up inside the transaction, and the product name in the
/// returned [`SaleLine`]s is the one current at that moment. Stock is not touched.
///
/// # Errors
/// Same as [`create_sale`], plus `Error::AmountOverflow` when the total does not fit the
/// ledger (nothing is written).
#[instrument(skip(db, lines), fields(lines = lines.len()))]
pub async fn create_sale_at_time(
    db: &DatabaseConnection,
    lines: Vec<LineItem<ProductRef>>,
    sale_time: DateTime<Utc>,
) -> Result<SaleDetails> {
    validate_lines(&lines, "sale")?;
    let total = total_of(&lines, "sale")?;

    let txn = db.begin().await?;
    let sale = sale::ActiveModel {
        sale_time: Set(sale_time),
        total: Set(total),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let ProductRef(product_id) = line.reference();
        let product = get_product_by_id(&txn, product_id)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;

        let item = sale_item::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(product_id),
            quantity: Set(line.quantity()),
            price: Set(line.unit_price()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(SaleLine {
            item,
            product_name: product.name,
        });
    }
    txn.commit().await?;

    info!(
        "Recorded sale {} with {} line(s), total {}",
        sale.id,
        items.len(),
        sale.total
    );
    Ok(SaleDetails { sale, items })
}

/// Records a sale at the products' current list prices.
///
/// # Errors
/// Same as [`create_sale`], plus `Error::InvalidQuantity` for bad quantities.
pub async fn create_sale_at_catalog_prices(
    db: &DatabaseConnection,
    lines: &[(i64, i32)],
) -> Result<SaleDetails> {
    let mut items = Vec::with_capacity(lines.len());
    for &(product_id, quantity) in lines {
        let product = get_product_by_id(db, product_id)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;
        items.push(LineItem::new(
            ProductRef(product_id),
            quantity,
            round_money(product.price),
        )?);
    }
    create_sale(db, items).await
}

/// Retrieves a sale with its lines and product names.
///
/// # Errors
/// Returns `Error::SaleNotFound` or a database error.
#[instrument(skip(db))]
pub async fn get_sale_details(db: &DatabaseConnection, sale_id: i64) -> Result<SaleDetails> {
    let sale = Sale::find_by_id(sale_id)
        .one(db)
        .await?
        .ok_or(Error::SaleNotFound { id: sale_id })?;

    let rows = SaleItem::find()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .find_also_related(Product)
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await?;
    let items = rows
        .into_iter()
        .map(|(item, product)| SaleLine {
            product_name: product.map_or_else(|| format!("#{}", item.product_id), |p| p.name),
            item,
        })
        .collect();
    Ok(SaleDetails { sale, items })
}

/// Lists sales newest first.
///
/// With a range, only sales whose `sale_time` falls in `[from, until)` are returned.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_sales_history(
    db: &DatabaseConnection,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<sale::Model>> {
    let mut query = Sale::find();
    if let Some((from, until)) = range {
        query = query
            .filter(sale::Column::SaleTime.gte(from))
            .filter(sale::Column::SaleTime.lt(until));
    }
    let sales = query
        .order_by_desc(sale::Column::SaleTime)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;
    debug!("Loaded {} sale(s)", sales.len());
    Ok(sales)
}

/// Deletes a sale; its items go with it.
///
/// # Errors
/// Returns `Error::SaleNotFound` or a database error.
#[instrument(skip(db))]
pub async fn delete_sale(db: &DatabaseConnection, sale_id: i64) -> Result<()> {
    let result = Sale::delete_by_id(sale_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::SaleNotFound { id: sale_id });
    }
    info!("Deleted sale {}", sale_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{delete_product, update_product};
    use crate::test_utils::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    #[tokio::test]
    async fn test_empty_sale_is_rejected_before_any_write() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = create_sale(&db, Vec::new()).await;
        assert!(matches!(result, Err(Error::EmptyTransaction { kind: "sale" })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_details_carry_product_names() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(19.99)).await?;
        let cap = create_test_product(&db, "Cap", dec!(14.50)).await?;

        let recorded = create_sale_at_catalog_prices(&db, &[(tee.id, 2), (cap.id, 1)]).await?;
        assert_eq!(recorded.sale.total.round_dp(2), dec!(54.48));

        let details = get_sale_details(&db, recorded.sale.id).await?;
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.items[0].product_name, "Tee");
        assert_eq!(details.items[1].product_name, "Cap");
        assert_eq!(details.sale.total.round_dp(2), dec!(54.48));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_the_sale() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(19.99)).await?;
        let lines = vec![
            LineItem::new(ProductRef(tee.id), 1, dec!(19.99))?,
            LineItem::new(ProductRef(777), 1, dec!(5.00))?,
        ];

        let result = create_sale(&db, lines).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 777 })));
        assert_eq!(Sale::find().count(&db).await?, 0);
        assert_eq!(SaleItem::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_total_unaffected_by_later_price_change() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(20.00)).await?;
        let recorded = create_sale_at_catalog_prices(&db, &[(tee.id, 3)]).await?;

        update_product(&db, tee.id, None, Some(dec!(25.00))).await?;

        let details = get_sale_details(&db, recorded.sale.id).await?;
        assert_eq!(details.sale.total.round_dp(2), dec!(60.00));
        assert_eq!(details.items[0].item.price.round_dp(2), dec!(20.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_range_filtered() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(10.00)).await?;
        let now = Utc::now();
        let line = || LineItem::new(ProductRef(tee.id), 1, dec!(10.00));

        let old = create_sale_at_time(&db, vec![line()?], now - Duration::days(3)).await?;
        let recent = create_sale_at_time(&db, vec![line()?], now - Duration::hours(1)).await?;
        let middle = create_sale_at_time(&db, vec![line()?], now - Duration::days(1)).await?;

        let history = list_sales_history(&db, None).await?;
        let ids: Vec<i64> = history.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![recent.sale.id, middle.sale.id, old.sale.id]);

        let last_two_days =
            list_sales_history(&db, Some((now - Duration::days(2), now))).await?;
        assert_eq!(last_two_days.len(), 2);
        assert!(last_two_days.iter().all(|s| s.id != old.sale.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_sale_cascades_and_frees_product() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(10.00)).await?;
        let recorded = create_sale_at_catalog_prices(&db, &[(tee.id, 1)]).await?;

        let blocked = delete_product(&db, tee.id).await;
        assert!(matches!(blocked, Err(Error::ProductInUse { .. })));

        delete_sale(&db, recorded.sale.id).await?;
        assert_eq!(SaleItem::find().count(&db).await?, 0);
        delete_product(&db, tee.id).await?;

        let missing = delete_sale(&db, recorded.sale.id).await;
        assert!(matches!(missing, Err(Error::SaleNotFound { .. })));
        Ok(())
    }
}
