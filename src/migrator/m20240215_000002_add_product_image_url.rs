//! Adds the optional `products.image_url` display column.
//!
//! Forward is purely additive: existing rows read back `NULL`. Reverting drops the column
//! together with every URL stored in it; that loss is accepted and not recoverable.

use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use super::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        super::PRODUCT_IMAGE_REVISION
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.has_column("products", "image_url").await? {
            return Err(DbErr::Migration(
                "products.image_url already exists; refusing to add it again".to_string(),
            ));
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .add_column(ColumnDef::new(Products::ImageUrl).text().null())
                    .to_owned(),
            )
            .await?;
        info!("Added nullable products.image_url");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        warn!("Dropping products.image_url; stored image references are discarded");
        manager
            .alter_table(
                Table::alter()
                    .table(Products::Table)
                    .drop_column(Products::ImageUrl)
                    .to_owned(),
            )
            .await
    }
}
