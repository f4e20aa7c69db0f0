use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::loyalty::{
    self, LoyaltyEntry, LoyaltyReason, PointsAdjustment, Redemption, REDEMPTION_COST,
};
use crate::domain::order::{OrderStatus, PaymentMethod};
use crate::domain::ports::LoyaltyRepository;
use crate::domain::pricing::{round_cents, OrderTotals};
use crate::schema::{loyalty_transactions, users};

use super::ledger;
use super::models::{LoyaltyTransactionRow, NewOrderItemRow, NewOrderRow};

pub struct DieselLoyaltyRepository {
    pool: DbPool,
}

impl DieselLoyaltyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl LoyaltyRepository for DieselLoyaltyRepository {
    fn redeem_free_item(&self, user_id: Uuid, product_id: Uuid) -> Result<Redemption, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. The user row lock prevents two redemptions spending the same points.
            let user = ledger::lock_user(conn, user_id)?;
            let new_balance = loyalty::redeem(user.loyalty_points)?;

            let product: Product = ledger::lock_product(conn, product_id)?.into();
            product.ensure_stock(1)?;

            diesel::update(users::table.filter(users::id.eq(user_id)))
                .set(users::loyalty_points.eq(new_balance))
                .execute(conn)?;

            // 2. A zero-priced order that is complete from the start.
            let order_id = Uuid::new_v4();
            let totals = OrderTotals::zero();
            ledger::insert_order(
                conn,
                &NewOrderRow {
                    id: order_id,
                    user_id,
                    subtotal: totals.subtotal.clone(),
                    tax: totals.tax.clone(),
                    grand_total: totals.grand_total.clone(),
                    payment_method: PaymentMethod::FreeItem.as_str().to_string(),
                    status: OrderStatus::Completed.as_str().to_string(),
                    momo_number: None,
                },
                &[NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id,
                    quantity: 1,
                    unit_price: totals.subtotal.clone(),
                }],
            )?;
            ledger::take_stock(conn, product_id, 1)?;
            ledger::journal(
                conn,
                user_id,
                Some(order_id),
                -REDEMPTION_COST,
                new_balance,
                LoyaltyReason::FreeItemRedeemed,
            )?;

            ledger::record_event(
                conn,
                order_id,
                "FreeItemRedeemed",
                json!({
                    "order_id": order_id,
                    "user_id": user_id,
                    "product_id": product_id,
                    "points_spent": REDEMPTION_COST,
                    "loyalty_balance": new_balance,
                    "list_price": round_cents(&product.price).to_string()
                }),
            )?;

            Ok(Redemption {
                order_id,
                product_id,
                product_name: product.name,
                new_balance,
            })
        })
    }

    fn adjust_points(&self, user_id: Uuid, adjustment: PointsAdjustment) -> Result<i32, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let user = ledger::lock_user(conn, user_id)?;
            let next = adjustment.apply(user.loyalty_points)?;

            diesel::update(users::table.filter(users::id.eq(user_id)))
                .set(users::loyalty_points.eq(next))
                .execute(conn)?;
            ledger::journal(
                conn,
                user_id,
                None,
                next - user.loyalty_points,
                next,
                LoyaltyReason::ManualAdjustment,
            )?;

            Ok(next)
        })
    }

    fn history(&self, user_id: Uuid, limit: i64) -> Result<Vec<LoyaltyEntry>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = loyalty_transactions::table
            .filter(loyalty_transactions::user_id.eq(user_id))
            .select(LoyaltyTransactionRow::as_select())
            .order(loyalty_transactions::created_at.desc())
            .limit(limit)
            .load(&mut conn)?;

        Ok(rows.into_iter().map(LoyaltyEntry::from).collect())
    }
}
