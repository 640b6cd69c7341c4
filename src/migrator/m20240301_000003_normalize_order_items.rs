//! Moves order line detail out of `orders` into a one-to-many `order_items` relation.
//!
//! Forward: rebuild `orders` without `variant_id` and `quantity`, which drops the
//! `orders -> variants` foreign key along with them, then create `order_items`. `SQLite`
//! cannot drop a foreign key in place, hence the rebuild (create, copy, drop, rename).
//! Reverse adds both columns back, the foreign key riding on `variant_id`, and drops
//! `order_items`. Both directions run inside one transaction so a failing step leaves the
//! schema untouched.
//!
//! Reverting is lossy. The re-added `variant_id` and `quantity` columns come back nullable
//! and empty; line items are not folded back into them, since an order with several lines
//! has no single-variant representation.

use sea_orm::{ConnectionTrait, TransactionTrait};
use sea_orm_migration::prelude::*;
use tracing::{debug, info, warn};

use super::{Orders, Variants};

const ORDER_ITEMS_ORDER_INDEX: &str = "idx_order_items_order_id";
const ORDER_ITEMS_VARIANT_INDEX: &str = "idx_order_items_variant_id";
const ORDERS_REBUILD_TABLE: &str = "orders_rebuild";

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        super::ORDER_ITEMS_REVISION
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("orders", "variant_id").await?
            || manager.has_table("order_items").await?
        {
            return Err(DbErr::Migration(
                "orders are already normalized (orders.variant_id missing or order_items present)"
                    .to_string(),
            ));
        }

        let txn = manager.get_connection().begin().await?;
        let schema = SchemaManager::new(&txn);

        rebuild_orders_without_line_columns(&schema).await?;
        debug!("Dropped orders.variant_id and orders.quantity");

        create_order_items(&schema).await?;

        txn.commit().await?;
        info!("Orders normalized into order_items");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        warn!(
            "Reverting order normalization: order_items are dropped and orders.variant_id/quantity come back empty"
        );

        let txn = manager.get_connection().begin().await?;
        let schema = SchemaManager::new(&txn);

        // ADD COLUMN with a NULL default may carry a REFERENCES clause, so the constraint
        // comes back without another rebuild.
        txn.execute_unprepared(
            "ALTER TABLE \"orders\" ADD COLUMN \"variant_id\" bigint NULL REFERENCES \"variants\" (\"id\")",
        )
        .await?;
        schema
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .add_column(ColumnDef::new(Orders::Quantity).integer().null())
                    .to_owned(),
            )
            .await?;

        schema
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;

        txn.commit().await
    }
}

async fn rebuild_orders_without_line_columns(schema: &SchemaManager<'_>) -> Result<(), DbErr> {
    let rebuild = Alias::new(ORDERS_REBUILD_TABLE);

    schema
        .create_table(
            Table::create()
                .table(rebuild.clone())
                .col(
                    ColumnDef::new(Orders::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Orders::CustomerName).string().null())
                .col(
                    ColumnDef::new(Orders::Status)
                        .string_len(16)
                        .not_null()
                        .default("pending"),
                )
                .col(
                    ColumnDef::new(Orders::Total)
                        .decimal_len(10, 2)
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Orders::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(Orders::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .to_owned(),
        )
        .await?;

    let copy = Query::insert()
        .into_table(rebuild.clone())
        .columns(kept_order_columns())
        .select_from(
            Query::select()
                .columns(kept_order_columns())
                .from(Orders::Table)
                .to_owned(),
        )
        .map_err(|e| DbErr::Migration(format!("failed to build orders copy: {e}")))?
        .to_owned();
    let conn = schema.get_connection();
    conn.execute(conn.get_database_backend().build(&copy)).await?;

    schema
        .drop_table(Table::drop().table(Orders::Table).to_owned())
        .await?;
    schema
        .rename_table(Table::rename().table(rebuild, Orders::Table).to_owned())
        .await
}

const fn kept_order_columns() -> [Orders; 6] {
    [
        Orders::Id,
        Orders::CustomerName,
        Orders::Status,
        Orders::Total,
        Orders::CreatedAt,
        Orders::UpdatedAt,
    ]
}

async fn create_order_items(schema: &SchemaManager<'_>) -> Result<(), DbErr> {
    schema
        .create_table(
            Table::create()
                .table(OrderItems::Table)
                .col(
                    ColumnDef::new(OrderItems::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(OrderItems::OrderId).big_integer().not_null())
                .col(ColumnDef::new(OrderItems::VariantId).big_integer().not_null())
                .col(
                    ColumnDef::new(OrderItems::Quantity)
                        .integer()
                        .not_null()
                        .check(Expr::col(OrderItems::Quantity).gt(0)),
                )
                .col(
                    ColumnDef::new(OrderItems::Price)
                        .decimal_len(10, 2)
                        .not_null(),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_order_items_order_id")
                        .from(OrderItems::Table, OrderItems::OrderId)
                        .to(Orders::Table, Orders::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_order_items_variant_id")
                        .from(OrderItems::Table, OrderItems::VariantId)
                        .to(Variants::Table, Variants::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .to_owned(),
        )
        .await?;

    schema
        .create_index(
            Index::create()
                .name(ORDER_ITEMS_ORDER_INDEX)
                .table(OrderItems::Table)
                .col(OrderItems::OrderId)
                .to_owned(),
        )
        .await?;

    schema
        .create_index(
            Index::create()
                .name(ORDER_ITEMS_VARIANT_INDEX)
                .table(OrderItems::Table)
                .col(OrderItems::VariantId)
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    VariantId,
    Quantity,
    Price,
}
