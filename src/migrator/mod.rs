//! Schema migration ledger.
//!
//! Migrations are applied in the order [`Migrator::migrations`] lists them; each entry's
//! predecessor is the one before it. `sea_orm_migration` records applied revisions in the
//! `seaql_migrations` table, so a revision is never applied twice and pending revisions are
//! never skipped.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;
use tracing::{debug, instrument};

mod m20240101_000001_create_pos_schema;
mod m20240215_000002_add_product_image_url;
mod m20240301_000003_normalize_order_items;

pub use m20240101_000001_create_pos_schema::{Orders, Products, SaleItems, Sales, Variants};
pub use m20240301_000003_normalize_order_items::OrderItems;

/// Ordered list of every schema revision.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_pos_schema::Migration),
            Box::new(m20240215_000002_add_product_image_url::Migration),
            Box::new(m20240301_000003_normalize_order_items::Migration),
        ]
    }
}

/// Revision name of the baseline schema.
pub const BASELINE_REVISION: &str = "m20240101_000001_create_pos_schema";
/// Revision name of the product image column migration.
pub const PRODUCT_IMAGE_REVISION: &str = "m20240215_000002_add_product_image_url";
/// Revision name of the order normalization migration.
pub const ORDER_ITEMS_REVISION: &str = "m20240301_000003_normalize_order_items";

/// Name of the most recently applied revision, or `None` on an empty database.
#[instrument(skip(db))]
pub async fn applied_revision<C>(db: &C) -> Result<Option<String>, DbErr>
where
    C: ConnectionTrait,
{
    let applied = Migrator::get_applied_migrations(db).await?;
    let latest = applied.last().map(|m| m.name().to_string());
    debug!("Applied revision: {:?}", latest);
    Ok(latest)
}

/// Names of the revisions that have not been applied yet, in application order.
#[instrument(skip(db))]
pub async fn pending_revisions<C>(db: &C) -> Result<Vec<String>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(Migrator::get_pending_migrations(db)
        .await?
        .iter()
        .map(|m| m.name().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::init_test_tracing;
    use sea_orm::{Database, DatabaseConnection};

    async fn empty_db() -> DatabaseConnection {
        init_test_tracing();
        Database::connect("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn test_revisions_are_unique_and_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![BASELINE_REVISION, PRODUCT_IMAGE_REVISION, ORDER_ITEMS_REVISION]
        );
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, names, "revision names must sort in application order");
    }

    #[tokio::test]
    async fn test_fresh_database_has_everything_pending() -> Result<(), DbErr> {
        let db = empty_db().await;
        assert_eq!(applied_revision(&db).await?, None);
        assert_eq!(pending_revisions(&db).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_up_applies_in_order_and_is_not_reapplied() -> Result<(), DbErr> {
        let db = empty_db().await;

        Migrator::up(&db, Some(1)).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(BASELINE_REVISION)
        );

        Migrator::up(&db, None).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(ORDER_ITEMS_REVISION)
        );
        assert!(pending_revisions(&db).await?.is_empty());

        // Running again is a no-op: nothing is pending, so nothing is re-applied.
        Migrator::up(&db, None).await?;
        let applied = Migrator::get_applied_migrations(&db).await?;
        assert_eq!(applied.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_down_walks_back_one_revision_at_a_time() -> Result<(), DbErr> {
        let db = empty_db().await;
        Migrator::up(&db, None).await?;

        Migrator::down(&db, Some(1)).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(PRODUCT_IMAGE_REVISION)
        );

        Migrator::down(&db, Some(1)).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(BASELINE_REVISION)
        );

        Migrator::up(&db, None).await?;
        assert_eq!(
            applied_revision(&db).await?.as_deref(),
            Some(ORDER_ITEMS_REVISION)
        );
        Ok(())
    }
}
