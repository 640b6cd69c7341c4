//! Wire types exchanged with the POS API.

use crate::{
    core::{
        line_item::{LineItem, ProductRef, VariantRef},
        order::NewOrder,
    },
    entities::OrderStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Account name
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Login response body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent calls
    pub access_token: String,
    /// Usually `"bearer"`
    #[serde(default)]
    pub token_type: Option<String>,
}

/// An order as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOrder {
    /// Order ID
    pub id: i64,
    /// Optional customer name
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Stored total
    pub total: Decimal,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One order line as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOrderItem {
    /// Line ID
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Variant sold
    pub variant_id: i64,
    /// Units
    pub quantity: i32,
    /// Snapshot unit price
    pub price: Decimal,
}

/// A line in a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    /// Variant to reserve
    pub variant_id: i64,
    /// Units
    pub quantity: i32,
    /// Snapshot unit price
    pub price: Decimal,
}

/// Body of `POST /orders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Lines
    pub items: Vec<OrderLineRequest>,
}

impl From<&NewOrder> for CreateOrderRequest {
    fn from(order: &NewOrder) -> Self {
        Self {
            customer_name: order.customer_name.clone(),
            items: order
                .items
                .iter()
                .map(|line: &LineItem<VariantRef>| OrderLineRequest {
                    variant_id: line.reference().0,
                    quantity: line.quantity(),
                    price: line.unit_price(),
                })
                .collect(),
        }
    }
}

/// Body of `PUT /orders/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    /// New customer name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// A sale as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSale {
    /// Sale ID
    pub id: i64,
    /// When it was rung up
    pub sale_time: DateTime<Utc>,
    /// Stored total
    pub total: Decimal,
}

/// One sale line as the API reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSaleItem {
    /// Line ID
    pub id: i64,
    /// Owning sale
    pub sale_id: i64,
    /// Product sold
    pub product_id: i64,
    /// Product name, when the server includes it
    #[serde(default)]
    pub product_name: Option<String>,
    /// Units
    pub quantity: i32,
    /// Snapshot unit price
    pub price: Decimal,
}

/// A line in `POST /sales`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRequest {
    /// Product sold
    pub product_id: i64,
    /// Units
    pub quantity: i32,
    /// Snapshot unit price
    pub price: Decimal,
}

/// Body of `POST /sales`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    /// Lines
    pub items: Vec<SaleLineRequest>,
}

impl From<&[LineItem<ProductRef>]> for CreateSaleRequest {
    fn from(lines: &[LineItem<ProductRef>]) -> Self {
        Self {
            items: lines
                .iter()
                .map(|line| SaleLineRequest {
                    product_id: line.reference().0,
                    quantity: line.quantity(),
                    price: line.unit_price(),
                })
                .collect(),
        }
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Stock level of one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Variant ID
    pub variant_id: i64,
    /// SKU
    pub sku: String,
    /// Owning product name
    #[serde(default)]
    pub product_name: Option<String>,
    /// Units on hand
    pub stock: i32,
}

/// A recorded business expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID
    pub id: i64,
    /// What the money went on
    pub description: String,
    /// Amount spent
    pub amount: Decimal,
    /// Day it was incurred
    #[serde(default)]
    pub date: Option<NaiveDate>,
}
