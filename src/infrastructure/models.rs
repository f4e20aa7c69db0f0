use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::loyalty::LoyaltyEntry;
use crate::domain::order::{OrderItemView, OrderView};
use crate::domain::pricing::OrderTotals;
use crate::domain::user::User;
use crate::schema::{loyalty_transactions, order_items, order_outbox, orders, payments, products, users};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub loyalty_points: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub loyalty_points: i32,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            loyalty_points: row.loyalty_points,
            role: row.role.parse()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub discount_percent: BigDecimal,
    pub cost_price: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub discount_percent: BigDecimal,
    pub cost_price: Option<BigDecimal>,
    pub expiry_date: Option<NaiveDate>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            brand: row.brand,
            price: row.price,
            stock: row.stock,
            discount_percent: row.discount_percent,
            cost_price: row.cost_price,
            expiry_date: row.expiry_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
    pub payment_method: String,
    pub status: String,
    pub momo_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
    pub payment_method: String,
    pub status: String,
    pub momo_number: Option<String>,
}

impl OrderRow {
    pub fn into_view(self, items: Vec<OrderItemView>) -> Result<OrderView, DomainError> {
        Ok(OrderView {
            id: self.id,
            user_id: self.user_id,
            status: self.status.parse()?,
            payment_method: self.payment_method,
            totals: OrderTotals {
                subtotal: self.subtotal,
                tax: self.tax,
                grand_total: self.grand_total,
            },
            momo_number: self.momo_number,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = loyalty_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LoyaltyTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub delta: i32,
    pub balance_after: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = loyalty_transactions)]
pub struct NewLoyaltyTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub delta: i32,
    pub balance_after: i32,
    pub reason: String,
}

impl From<LoyaltyTransactionRow> for LoyaltyEntry {
    fn from(row: LoyaltyTransactionRow) -> Self {
        LoyaltyEntry {
            id: row.id,
            order_id: row.order_id,
            delta: row.delta,
            balance_after: row.balance_after,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
