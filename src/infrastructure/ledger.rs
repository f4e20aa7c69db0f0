//! Row-level building blocks shared by the repositories.
//!
//! Every function here expects to run inside a transaction opened by the
//! caller; the `lock_*` helpers take `FOR UPDATE` locks that are held until
//! that transaction ends.

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::loyalty::LoyaltyReason;
use crate::domain::order::OrderStatus;
use crate::schema::{loyalty_transactions, order_items, order_outbox, orders, products, users};

use super::models::{
    NewLoyaltyTransactionRow, NewOrderItemRow, NewOrderRow, NewOutboxEventRow, OrderRow,
    ProductRow, UserRow,
};

// ── Inventory ─────────────────────────────────────────────────────────────────

pub fn lock_product(conn: &mut PgConnection, id: Uuid) -> Result<ProductRow, DomainError> {
    products::table
        .filter(products::id.eq(id))
        .select(ProductRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or(DomainError::NotFound("Product"))
}

/// Locks every listed product in id order. Missing ids are reported as not found.
pub fn lock_products(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<ProductRow>, DomainError> {
    let rows = products::table
        .filter(products::id.eq_any(ids))
        .order(products::id.asc())
        .select(ProductRow::as_select())
        .for_update()
        .load(conn)?;
    if rows.len() != ids.len() {
        return Err(DomainError::NotFound("Product"));
    }
    Ok(rows)
}

/// Decrements stock only when enough is left, so it can never go negative.
pub fn take_stock(conn: &mut PgConnection, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
    let updated = diesel::update(
        products::table
            .filter(products::id.eq(product_id))
            .filter(products::stock.ge(quantity)),
    )
    .set(products::stock.eq(products::stock - quantity))
    .execute(conn)?;

    if updated == 0 {
        let available = products::table
            .filter(products::id.eq(product_id))
            .select(products::stock)
            .first::<i32>(conn)
            .optional()?
            .unwrap_or(0);
        return Err(DomainError::InsufficientStock {
            product_id,
            available,
            requested: quantity,
        });
    }
    Ok(())
}

// ── Orders ────────────────────────────────────────────────────────────────────

pub fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrderRow,
    items: &[NewOrderItemRow],
) -> Result<(), DomainError> {
    diesel::insert_into(orders::table).values(order).execute(conn)?;
    diesel::insert_into(order_items::table)
        .values(items)
        .execute(conn)?;
    Ok(())
}

pub fn lock_order(conn: &mut PgConnection, id: Uuid) -> Result<OrderRow, DomainError> {
    orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or(DomainError::NotFound("Order"))
}

/// Compare-and-swap on the order status. Returns `false` when the order was
/// no longer in `expected`.
pub fn advance_order(
    conn: &mut PgConnection,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
) -> Result<bool, DomainError> {
    expected.transition(next)?;
    let updated = diesel::update(
        orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::status.eq(expected.as_str())),
    )
    .set((
        orders::status.eq(next.as_str()),
        orders::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;
    Ok(updated == 1)
}

/// Writes a lifecycle event to the outbox in the caller's transaction.
pub fn record_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event_type: &str,
    payload: Value,
) -> Result<(), DomainError> {
    diesel::insert_into(order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_id: order_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .execute(conn)?;
    Ok(())
}

// ── Loyalty ───────────────────────────────────────────────────────────────────

pub fn lock_user(conn: &mut PgConnection, id: Uuid) -> Result<UserRow, DomainError> {
    users::table
        .filter(users::id.eq(id))
        .select(UserRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or(DomainError::NotFound("User"))
}

/// Applies `delta` to the balance and journals it. Returns the new balance.
pub fn credit_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    order_id: Option<Uuid>,
    delta: i32,
    reason: LoyaltyReason,
) -> Result<i32, DomainError> {
    let balance_after = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(users::loyalty_points.eq(users::loyalty_points + delta))
        .returning(users::loyalty_points)
        .get_result::<i32>(conn)
        .optional()?
        .ok_or(DomainError::NotFound("User"))?;
    journal(conn, user_id, order_id, delta, balance_after, reason)?;
    Ok(balance_after)
}

pub fn journal(
    conn: &mut PgConnection,
    user_id: Uuid,
    order_id: Option<Uuid>,
    delta: i32,
    balance_after: i32,
    reason: LoyaltyReason,
) -> Result<(), DomainError> {
    diesel::insert_into(loyalty_transactions::table)
        .values(&NewLoyaltyTransactionRow {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            delta,
            balance_after,
            reason: reason.as_str().to_string(),
        })
        .execute(conn)?;
    Ok(())
}
