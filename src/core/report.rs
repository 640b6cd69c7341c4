//! Report generation business logic.
//!
//! Read-only summaries over the sales ledger and the catalog. All functions return
//! structured data; formatting is left to the caller.

use crate::{
    core::line_item::round_money,
    entities::{Product, Sale, SaleItem, Variant, product, sale, sale_item, variant},
    errors::{Error, Result},
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Totals for one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    /// The day summarized
    pub date: NaiveDate,
    /// Number of sales recorded that day
    pub sales_count: u64,
    /// Units across all sale lines
    pub units_sold: i64,
    /// Sum of sale totals
    pub revenue: Decimal,
}

/// A variant running short, with its product name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockEntry {
    /// The variant row
    pub variant: variant::Model,
    /// Name of the owning product
    pub product_name: String,
}

/// Revenue attributed to one product by the sales ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRevenue {
    /// Product ID
    pub product_id: i64,
    /// Product name
    pub name: String,
    /// Units sold
    pub units: i64,
    /// `Σ price × quantity` over its sale lines
    pub revenue: Decimal,
}

/// Summarizes the sales recorded on `date`.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn daily_sales_summary(db: &DatabaseConnection, date: NaiveDate) -> Result<DailySummary> {
    let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
    let end = start + chrono::Duration::days(1);

    let sales = Sale::find()
        .filter(sale::Column::SaleTime.gte(start))
        .filter(sale::Column::SaleTime.lt(end))
        .all(db)
        .await?;
    let sale_ids: Vec<i64> = sales.iter().map(|s| s.id).collect();

    let units_sold = if sale_ids.is_empty() {
        0
    } else {
        SaleItem::find()
            .filter(sale_item::Column::SaleId.is_in(sale_ids))
            .all(db)
            .await?
            .iter()
            .map(|item| i64::from(item.quantity))
            .sum()
    };

    let summary = DailySummary {
        date,
        sales_count: sales.len() as u64,
        units_sold,
        revenue: round_money(sales.iter().map(|s| s.total).sum()),
    };
    debug!(
        "Daily summary for {}: {} sale(s), {} unit(s), {}",
        date, summary.sales_count, summary.units_sold, summary.revenue
    );
    Ok(summary)
}

/// Variants with `stock <= threshold`, lowest stock first.
///
/// # Errors
/// Returns `Error::InvalidQuantity` for a negative threshold, or a database error.
#[instrument(skip(db))]
pub async fn low_stock_variants(
    db: &DatabaseConnection,
    threshold: i32,
) -> Result<Vec<LowStockEntry>> {
    if threshold < 0 {
        return Err(Error::InvalidQuantity {
            quantity: threshold,
        });
    }

    let rows = Variant::find()
        .filter(variant::Column::Stock.lte(threshold))
        .find_also_related(Product)
        .order_by_asc(variant::Column::Stock)
        .order_by_asc(variant::Column::Sku)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(variant, product)| LowStockEntry {
            product_name: product.map_or_else(String::new, |p: product::Model| p.name),
            variant,
        })
        .collect())
}

/// The `limit` products with the highest sales revenue, best first.
///
/// Ties are broken by product name.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn top_products(db: &DatabaseConnection, limit: usize) -> Result<Vec<ProductRevenue>> {
    let rows = SaleItem::find()
        .find_also_related(Product)
        .all(db)
        .await?;

    let mut by_product: HashMap<i64, ProductRevenue> = HashMap::new();
    for (item, product) in rows {
        let entry = by_product
            .entry(item.product_id)
            .or_insert_with(|| ProductRevenue {
                product_id: item.product_id,
                name: product.map(|p| p.name).unwrap_or_default(),
                units: 0,
                revenue: Decimal::ZERO,
            });
        entry.units += i64::from(item.quantity);
        entry.revenue += item.subtotal();
    }

    let mut ranked: Vec<ProductRevenue> = by_product
        .into_values()
        .map(|mut entry| {
            entry.revenue = round_money(entry.revenue);
            entry
        })
        .collect();
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line_item::{LineItem, ProductRef};
    use crate::core::sale::{create_sale_at_catalog_prices, create_sale_at_time};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_daily_summary_counts_only_that_day() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(10.00)).await?;
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).ok_or(Error::Config {
            message: "bad date".to_string(),
        })?;
        let noon = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap_or_default());

        create_sale_at_time(&db, vec![LineItem::new(ProductRef(tee.id), 2, dec!(10.00))?], noon)
            .await?;
        create_sale_at_time(&db, vec![LineItem::new(ProductRef(tee.id), 1, dec!(9.50))?], noon)
            .await?;
        create_sale_at_time(
            &db,
            vec![LineItem::new(ProductRef(tee.id), 5, dec!(10.00))?],
            noon + chrono::Duration::days(1),
        )
        .await?;

        let summary = daily_sales_summary(&db, day).await?;
        assert_eq!(summary.sales_count, 2);
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.revenue, dec!(29.50));

        let empty_day = day.pred_opt().unwrap_or(day);
        let none = daily_sales_summary(&db, empty_day).await?;
        assert_eq!(none.sales_count, 0);
        assert_eq!(none.revenue, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_variants() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Sock", dec!(4.00)).await?;
        create_test_variant(&db, product.id, "SOCK-S", 1).await?;
        create_test_variant(&db, product.id, "SOCK-M", 8).await?;
        create_test_variant(&db, product.id, "SOCK-L", 0).await?;

        let low = low_stock_variants(&db, 2).await?;
        let skus: Vec<&str> = low.iter().map(|e| e.variant.sku.as_str()).collect();
        assert_eq!(skus, vec!["SOCK-L", "SOCK-S"]);
        assert_eq!(low[0].product_name, "Sock");

        let invalid = low_stock_variants(&db, -1).await;
        assert!(matches!(invalid, Err(Error::InvalidQuantity { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_top_products_ranked_by_revenue() -> Result<()> {
        let db = setup_test_db().await?;
        let tee = create_test_product(&db, "Tee", dec!(10.00)).await?;
        let coat = create_test_product(&db, "Coat", dec!(90.00)).await?;
        let pin = create_test_product(&db, "Pin", dec!(1.00)).await?;

        create_sale_at_catalog_prices(&db, &[(tee.id, 3), (pin.id, 4)]).await?;
        create_sale_at_catalog_prices(&db, &[(coat.id, 1), (tee.id, 1)]).await?;

        let top = top_products(&db, 2).await?;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Coat");
        assert_eq!(top[0].revenue, dec!(90.00));
        assert_eq!(top[1].name, "Tee");
        assert_eq!(top[1].units, 4);
        assert_eq!(top[1].revenue, dec!(40.00));
        Ok(())
    }
}
