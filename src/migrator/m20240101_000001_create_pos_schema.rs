//! Baseline schema: catalog, the legacy single-line orders table, and the sales ledger.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        super::BASELINE_REVISION
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .col(
                        ColumnDef::new(Products::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Products::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Variants::Table)
                    .col(
                        ColumnDef::new(Variants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Variants::ProductId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Variants::Sku)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Variants::Size).string().null())
                    .col(ColumnDef::new(Variants::Color).string().null())
                    .col(ColumnDef::new(Variants::PriceOverride).decimal_len(10, 2).null())
                    .col(
                        ColumnDef::new(Variants::Stock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_variants_product_id")
                            .from(Variants::Table, Variants::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_variants_product_id")
                    .table(Variants::Table)
                    .col(Variants::ProductId)
                    .to_owned(),
            )
            .await?;

        // Single-line orders: each order points straight at one variant.
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
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
                    .col(ColumnDef::new(Orders::VariantId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Quantity).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name(ORDERS_VARIANT_FK)
                            .from(Orders::Table, Orders::VariantId)
                            .to(Variants::Table, Variants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .col(
                        ColumnDef::new(Sales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sales::SaleTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sales::Total).decimal_len(10, 2).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_sale_time")
                    .table(Sales::Table)
                    .col(Sales::SaleTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SaleItems::Table)
                    .col(
                        ColumnDef::new(SaleItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SaleItems::SaleId).big_integer().not_null())
                    .col(ColumnDef::new(SaleItems::ProductId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SaleItems::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(SaleItems::Quantity).gt(0)),
                    )
                    .col(ColumnDef::new(SaleItems::Price).decimal_len(10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_sale_id")
                            .from(SaleItems::Table, SaleItems::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_product_id")
                            .from(SaleItems::Table, SaleItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sale_items_sale_id")
                    .table(SaleItems::Table)
                    .col(SaleItems::SaleId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children before parents so no foreign key is left dangling.
        manager
            .drop_table(Table::drop().table(SaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Variants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

/// Name of the legacy `orders.variant_id` foreign key.
const ORDERS_VARIANT_FK: &str = "fk_orders_variant_id";

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Variants {
    Table,
    Id,
    ProductId,
    Sku,
    Size,
    Color,
    PriceOverride,
    Stock,
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    CustomerName,
    Status,
    Total,
    CreatedAt,
    UpdatedAt,
    VariantId,
    Quantity,
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    SaleTime,
    Total,
}

#[derive(DeriveIden)]
pub enum SaleItems {
    Table,
    Id,
    SaleId,
    ProductId,
    Quantity,
    Price,
}
