//! Variant entity - A stock-keeping unit of a product (size, color).
//!
//! Stock is only mutated by the order fulfilment paths in `core::order` and by explicit
//! restocking in `core::catalog`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Variant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variants")]
pub struct Model {
    /// Unique identifier for the variant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning product
    pub product_id: i64,
    /// Stock-keeping unit code, unique across the catalog
    #[sea_orm(unique)]
    pub sku: String,
    /// Optional size label (e.g., "M", "42")
    pub size: Option<String>,
    /// Optional color label
    pub color: Option<String>,
    /// Price that replaces the product's list price for this variant, if any
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub price_override: Option<Decimal>,
    /// Units on hand
    pub stock: i32,
}

impl Model {
    /// Unit price a new line for this variant should snapshot.
    #[must_use]
    pub fn effective_price(&self, product: &super::product::Model) -> Decimal {
        self.price_override.unwrap_or(product.price)
    }
}

/// Defines relationships between Variant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each variant belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Restrict"
    )]
    Product,
    /// One variant is referenced by many order lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
