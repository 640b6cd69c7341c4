//! Product entity - Represents a catalog item offered at the till.
//!
//! Products carry the list price. Stock lives on their variants, and historical
//! order and sale lines keep their own price snapshot, so editing a product never
//! rewrites the past.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across the catalog (e.g., "Denim Jacket")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Current list price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Optional image reference, display-only
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many variants
    #[sea_orm(has_many = "super::variant::Entity")]
    Variants,
    /// One product appears on many sale lines
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
