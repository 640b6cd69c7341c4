//! Orders ledger business logic.
//!
//! An order is a parent row plus one `order_items` row per line. Every write that touches
//! more than one row (creating an order, appending a line, cancelling) runs inside a single
//! database transaction, so a failure on any line leaves neither the order nor the stock
//! changes behind.

use crate::{
    core::{
        catalog::{effective_price, release_stock, reserve_stock},
        line_item::{LineItem, MAX_AMOUNT, VariantRef, round_money, total_of, validate_lines},
    },
    entities::{Order, OrderItem, OrderStatus, order, order_item},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Input for [`create_order`]
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Lines with their snapshot prices
    pub items: Vec<LineItem<VariantRef>>,
}

/// An order together with its lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithItems {
    /// Parent row
    pub order: order::Model,
    /// Lines, in insertion order
    pub items: Vec<order_item::Model>,
}

async fn insert_line<C>(
    db: &C,
    order_id: i64,
    line: &LineItem<VariantRef>,
) -> Result<order_item::Model>
where
    C: ConnectionTrait,
{
    let VariantRef(variant_id) = line.reference();
    reserve_stock(db, variant_id, line.quantity()).await?;

    let item = order_item::ActiveModel {
        order_id: Set(order_id),
        variant_id: Set(variant_id),
        quantity: Set(line.quantity()),
        price: Set(line.unit_price()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(
        "Order {}: {} x variant {} at {}",
        order_id, item.quantity, item.variant_id, item.price
    );
    Ok(item)
}

async fn find_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })
}

/// Records an order and reserves stock for every line.
///
/// This is the write path behind the till and the API: the caller has already priced each
/// line (see [`create_order_at_catalog_prices`] for the usual way to do that), and this
/// function stores those snapshot prices as-is. The stored total is the exact sum of the
/// lines, computed before the transaction opens.
///
/// The order row, every item row and every stock decrement share one transaction. Stock is
/// taken with [`reserve_stock`], so of two orders racing for the last unit only one
/// commits; the other sees `Error::InsufficientStock` and leaves nothing behind.
///
/// # Errors
/// Returns an error if:
/// - `items` is empty (nothing is written)
/// - The total does not fit the ledger (`Error::AmountOverflow`, nothing is written)
/// - Any variant is unknown or short of stock
/// - The database rejects a write
///
/// In every error case the whole order is rolled back.
#[instrument(skip(db, new), fields(lines = new.items.len()))]
pub async fn create_order(db: &DatabaseConnection, new: NewOrder) -> Result<OrderWithItems> {
    validate_lines(&new.items, "order")?;
    let total = total_of(&new.items, "order")?;

    let txn = db.begin().await?;
    let now = Utc::now();
    let order = order::ActiveModel {
        customer_name: Set(new.customer_name),
        status: Set(OrderStatus::Pending),
        total: Set(total),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(new.items.len());
    for line in &new.items {
        items.push(insert_line(&txn, order.id, line).await?);
    }
    txn.commit().await?;

    info!(
        "Created order {} with {} line(s), total {}",
        order.id,
        items.len(),
        order.total
    );
    Ok(OrderWithItems { order, items })
}

/// Records an order at the variants' current effective prices.
///
/// # Errors
/// Same as [`create_order`], plus `Error::InvalidQuantity` for bad quantities.
#[instrument(skip(db, lines))]
pub async fn create_order_at_catalog_prices(
    db: &DatabaseConnection,
    customer_name: Option<String>,
    lines: &[(i64, i32)],
) -> Result<OrderWithItems> {
    let mut items = Vec::with_capacity(lines.len());
    for &(variant_id, quantity) in lines {
        let price = effective_price(db, variant_id).await?;
        items.push(LineItem::new(VariantRef(variant_id), quantity, price)?);
    }
    create_order(
        db,
        NewOrder {
            customer_name,
            items,
        },
    )
    .await
}

/// Appends a line to a pending order and refreshes its stored total.
///
/// # Errors
/// Returns `Error::OrderNotFound`, `Error::OrderNotPending`, or any stock error.
#[instrument(skip(db))]
pub async fn add_order_item(
    db: &DatabaseConnection,
    order_id: i64,
    line: LineItem<VariantRef>,
) -> Result<OrderWithItems> {
    let txn = db.begin().await?;
    let order = find_order(&txn, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(Error::OrderNotPending {
            order_id,
            status: order.status.to_string(),
        });
    }

    insert_line(&txn, order_id, &line).await?;
    recompute_order_total(&txn, order_id).await?;
    let details = load_with_items(&txn, order_id).await?;
    txn.commit().await?;
    Ok(details)
}

async fn load_with_items<C>(db: &C, order_id: i64) -> Result<OrderWithItems>
where
    C: ConnectionTrait,
{
    let order = find_order(db, order_id).await?;
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    Ok(OrderWithItems { order, items })
}

/// Retrieves an order with all of its lines.
///
/// # Errors
/// Returns `Error::OrderNotFound` or a database error.
pub async fn get_order_with_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<OrderWithItems> {
    load_with_items(db, order_id).await
}

/// Lists orders newest first, optionally only those in `status`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lines of one order, in insertion order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_order_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums the order's item rows and stores the result as its total.
///
/// Only the snapshot prices on the items are read; current catalog prices play no part.
///
/// # Errors
/// Returns `Error::OrderNotFound`, `Error::AmountOverflow` when the lines add up to more
/// than the ledger can store, or a database error.
pub async fn recompute_order_total<C>(db: &C, order_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let order = find_order(db, order_id).await?;
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(db)
        .await?;
    let total = round_money(items.iter().map(order_item::Model::subtotal).sum());
    if total > MAX_AMOUNT {
        return Err(Error::AmountOverflow { kind: "order" });
    }

    let mut active: order::ActiveModel = order.into();
    active.total = Set(total);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    debug!("Order {} total recomputed as {}", order_id, total);
    Ok(total)
}

/// Moves an order to `next`.
///
/// Allowed moves are `pending -> paid -> fulfilled`, and any status other than
/// `fulfilled` to `cancelled`. Cancelling returns every line's quantity to stock in the
/// same transaction.
///
/// # Errors
/// Returns `Error::OrderNotFound` or `Error::InvalidStatusTransition`.
#[instrument(skip(db))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    next: OrderStatus,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let order = find_order(&txn, order_id).await?;
    let current = order.status;
    if !current.can_transition_to(next) {
        warn!("Rejected order {} transition {} -> {}", order_id, current, next);
        return Err(Error::InvalidStatusTransition {
            order_id,
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    if next == OrderStatus::Cancelled {
        restore_stock(&txn, order_id).await?;
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!("Order {} moved from {} to {}", order_id, current, next);
    Ok(updated)
}

async fn restore_stock<C>(db: &C, order_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(db)
        .await?;
    for item in &items {
        release_stock(db, item.variant_id, item.quantity).await?;
    }
    debug!("Returned stock for {} line(s) of order {}", items.len(), order_id);
    Ok(())
}

/// Deletes an order; its items go with it.
///
/// Stock reserved by an order that was neither fulfilled nor already cancelled is
/// returned first.
///
/// # Errors
/// Returns `Error::OrderNotFound` or a database error.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let order = find_order(&txn, order_id).await?;
    if matches!(order.status, OrderStatus::Pending | OrderStatus::Paid) {
        restore_stock(&txn, order_id).await?;
    }
    order.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted order {}", order_id);
    Ok(())
}
