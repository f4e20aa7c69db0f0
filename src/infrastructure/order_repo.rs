use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::loyalty::{LoyaltyReason, POINTS_PER_ORDER};
use crate::domain::order::{
    gross_profit, normalize_lines, InStorePurchase, OrderItemView, OrderLineInput, OrderStatus,
    OrderView, PaymentMethod, PaymentStatus, PendingPaymentView, PlacedOrder, ReviewDecision,
    ReviewOutcome, SalesSummary, SoldLine, SubmittedProof,
};
use crate::domain::catalog::Product;
use crate::domain::pricing::{round_cents, OrderTotals};
use crate::domain::ports::OrderRepository;
use crate::domain::user::User;
use crate::schema::{order_items, orders, payments, products, users};

use super::ledger;
use super::models::{NewOrderItemRow, NewOrderRow, NewPaymentRow, OrderRow, PaymentRow};

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn lock_payment(conn: &mut PgConnection, id: Uuid) -> Result<PaymentRow, DomainError> {
    payments::table
        .filter(payments::id.eq(id))
        .select(PaymentRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or(DomainError::NotFound("Payment"))
}

impl OrderRepository for DieselOrderRepository {
    fn place_order(
        &self,
        user_id: Uuid,
        lines: Vec<OrderLineInput>,
        momo_number: &str,
    ) -> Result<PlacedOrder, DomainError> {
        let lines = normalize_lines(lines)?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock every product row and check stock before writing anything.
            let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
            let rows = ledger::lock_products(conn, &ids)?;

            let mut priced = Vec::with_capacity(lines.len());
            for line in &lines {
                let product: Product = rows
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .cloned()
                    .ok_or(DomainError::NotFound("Product"))?
                    .into();
                product.ensure_stock(line.quantity)?;
                priced.push((line, product.unit_price()));
            }
            let totals = OrderTotals::compute(priced.iter().map(|(l, price)| (price, l.quantity)));

            // 2. Insert the order in its initial state together with its items.
            let order_id = Uuid::new_v4();
            let items: Vec<NewOrderItemRow> = priced
                .iter()
                .map(|(l, price)| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price: price.clone(),
                })
                .collect();
            ledger::insert_order(
                conn,
                &NewOrderRow {
                    id: order_id,
                    user_id,
                    subtotal: totals.subtotal.clone(),
                    tax: totals.tax.clone(),
                    grand_total: totals.grand_total.clone(),
                    payment_method: PaymentMethod::Momo.as_str().to_string(),
                    status: OrderStatus::PendingPayment.as_str().to_string(),
                    momo_number: Some(momo_number.to_string()),
                },
                &items,
            )?;

            // 3. Reserve stock.
            for line in &lines {
                ledger::take_stock(conn, line.product_id, line.quantity)?;
            }

            // 4. The order now waits for the customer's transfer proof.
            ledger::advance_order(
                conn,
                order_id,
                OrderStatus::PendingPayment,
                OrderStatus::AwaitingProof,
            )?;

            let line_payloads: Vec<serde_json::Value> = priced
                .iter()
                .map(|(l, price)| {
                    json!({
                        "product_id": l.product_id,
                        "quantity": l.quantity,
                        "unit_price": price.to_string()
                    })
                })
                .collect();
            ledger::record_event(
                conn,
                order_id,
                "OrderPlaced",
                json!({
                    "order_id": order_id,
                    "user_id": user_id,
                    "status": OrderStatus::AwaitingProof.as_str(),
                    "grand_total": totals.grand_total.to_string(),
                    "lines": line_payloads
                }),
            )?;

            Ok(PlacedOrder {
                id: order_id,
                status: OrderStatus::AwaitingProof,
                totals,
                momo_number: Some(momo_number.to_string()),
            })
        })
    }

    fn find_for_user(&self, order_id: Uuid, user_id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = order_items::table
            .left_join(products::table)
            .filter(order_items::order_id.eq(order.id))
            .select((
                order_items::id,
                order_items::product_id,
                products::name.nullable(),
                order_items::quantity,
                order_items::unit_price,
            ))
            .load::<(Uuid, Uuid, Option<String>, i32, BigDecimal)>(&mut conn)?;

        let items = items
            .into_iter()
            .map(|(id, product_id, product_name, quantity, unit_price)| OrderItemView {
                id,
                product_id,
                product_name,
                quantity,
                unit_price,
            })
            .collect();

        order.into_view(items).map(Some)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;

        rows.into_iter().map(|o| o.into_view(vec![])).collect()
    }

    fn attach_payment_proof(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        image_path: &str,
    ) -> Result<SubmittedProof, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = ledger::lock_order(conn, order_id)?;
            if order.user_id != user_id {
                return Err(DomainError::NotFound("Order"));
            }

            let current: OrderStatus = order.status.parse()?;
            let status = match current {
                OrderStatus::AwaitingProof => {
                    ledger::advance_order(
                        conn,
                        order_id,
                        current,
                        OrderStatus::PendingCashierReview,
                    )?;
                    OrderStatus::PendingCashierReview
                }
                // Another proof for an order already under review.
                OrderStatus::PendingCashierReview => current,
                other => other.transition(OrderStatus::PendingCashierReview)?,
            };

            let payment_id = Uuid::new_v4();
            diesel::insert_into(payments::table)
                .values(&NewPaymentRow {
                    id: payment_id,
                    order_id,
                    user_id,
                    image_path: image_path.to_string(),
                    status: PaymentStatus::Pending.as_str().to_string(),
                })
                .execute(conn)?;

            ledger::record_event(
                conn,
                order_id,
                "PaymentProofSubmitted",
                json!({
                    "order_id": order_id,
                    "payment_id": payment_id,
                    "status": status.as_str()
                }),
            )?;

            Ok(SubmittedProof {
                payment_id,
                order_id,
                order_status: status,
            })
        })
    }

    fn review_payment(
        &self,
        reviewer: &User,
        payment_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. The payment row lock serialises concurrent reviews of the same proof.
            let payment = lock_payment(conn, payment_id)?;
            if !reviewer.may_review_payment_of(payment.user_id) {
                return Err(DomainError::Forbidden("cashiers cannot review their own payments"));
            }
            if payment.status.parse::<PaymentStatus>()? != PaymentStatus::Pending {
                return Err(DomainError::PaymentAlreadyReviewed);
            }

            let payment_status = decision.payment_status();
            diesel::update(payments::table.filter(payments::id.eq(payment_id)))
                .set(payments::status.eq(payment_status.as_str()))
                .execute(conn)?;

            // 2. Mirror the verdict into the order unless it is already settled.
            let order = ledger::lock_order(conn, payment.order_id)?;
            let current: OrderStatus = order.status.parse()?;
            if current.is_terminal() {
                return Ok(ReviewOutcome {
                    payment_id,
                    order_id: order.id,
                    payment_status,
                    order_status: current,
                    points_awarded: 0,
                });
            }

            let target = decision.order_status();
            let moved = ledger::advance_order(conn, order.id, current, target)?;
            if !moved {
                return Err(DomainError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }

            // 3. The point follows the status change, so it is awarded at most once.
            let points_awarded = if target.is_completed_like() {
                ledger::credit_points(
                    conn,
                    order.user_id,
                    Some(order.id),
                    POINTS_PER_ORDER,
                    LoyaltyReason::OrderCompleted,
                )?;
                POINTS_PER_ORDER
            } else {
                0
            };

            let event_type = match decision {
                ReviewDecision::Approve => "OrderCompleted",
                ReviewDecision::Reject => "OrderRejected",
            };
            ledger::record_event(
                conn,
                order.id,
                event_type,
                json!({
                    "order_id": order.id,
                    "payment_id": payment_id,
                    "reviewed_by": reviewer.id,
                    "status": target.as_str(),
                    "points_awarded": points_awarded
                }),
            )?;

            Ok(ReviewOutcome {
                payment_id,
                order_id: order.id,
                payment_status,
                order_status: target,
                points_awarded,
            })
        })
    }

    fn pending_payments(
        &self,
        hide_payer: Option<Uuid>,
    ) -> Result<Vec<PendingPaymentView>, DomainError> {
        let mut conn = self.pool.get()?;

        // Proofs left behind once a sibling settled the order are not queued.
        let mut query = payments::table
            .inner_join(users::table)
            .inner_join(orders::table)
            .filter(payments::status.eq(PaymentStatus::Pending.as_str()))
            .filter(orders::status.eq(OrderStatus::PendingCashierReview.as_str()))
            .select((PaymentRow::as_select(), users::username))
            .order(payments::created_at.desc())
            .into_boxed();
        if let Some(payer) = hide_payer {
            query = query.filter(payments::user_id.ne(payer));
        }

        let rows: Vec<(PaymentRow, String)> = query.load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(p, username)| PendingPaymentView {
                id: p.id,
                order_id: p.order_id,
                user_id: p.user_id,
                username,
                image_path: p.image_path,
                created_at: p.created_at,
            })
            .collect())
    }

    fn record_in_store_purchase(
        &self,
        purchase: InStorePurchase,
    ) -> Result<PlacedOrder, DomainError> {
        if purchase.quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let customer = ledger::lock_user(conn, purchase.customer_id)?;
            let product: Product = ledger::lock_product(conn, purchase.product_id)?.into();
            product.ensure_stock(purchase.quantity)?;

            if let Some(cost) = &purchase.cost_price {
                diesel::update(products::table.filter(products::id.eq(product.id)))
                    .set(products::cost_price.eq(round_cents(cost)))
                    .execute(conn)?;
            }

            // Walk-in sales are charged list price.
            let unit_price = round_cents(&product.price);
            let totals = OrderTotals::compute([(&unit_price, purchase.quantity)]);

            let order_id = Uuid::new_v4();
            ledger::insert_order(
                conn,
                &NewOrderRow {
                    id: order_id,
                    user_id: customer.id,
                    subtotal: totals.subtotal.clone(),
                    tax: totals.tax.clone(),
                    grand_total: totals.grand_total.clone(),
                    payment_method: PaymentMethod::InStore.as_str().to_string(),
                    status: OrderStatus::Completed.as_str().to_string(),
                    momo_number: None,
                },
                &[NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: product.id,
                    quantity: purchase.quantity,
                    unit_price: unit_price.clone(),
                }],
            )?;
            ledger::take_stock(conn, product.id, purchase.quantity)?;
            let balance = ledger::credit_points(
                conn,
                customer.id,
                Some(order_id),
                POINTS_PER_ORDER,
                LoyaltyReason::InStorePurchase,
            )?;

            ledger::record_event(
                conn,
                order_id,
                "InStorePurchaseRecorded",
                json!({
                    "order_id": order_id,
                    "user_id": customer.id,
                    "product_id": product.id,
                    "quantity": purchase.quantity,
                    "unit_price": unit_price.to_string(),
                    "grand_total": totals.grand_total.to_string(),
                    "loyalty_balance": balance
                }),
            )?;

            Ok(PlacedOrder {
                id: order_id,
                status: OrderStatus::Completed,
                totals,
                momo_number: None,
            })
        })
    }

    fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary, DomainError> {
        let mut conn = self.pool.get()?;

        let completed: Vec<&str> = OrderStatus::COMPLETED_LIKE
            .iter()
            .map(|s| s.as_str())
            .collect();

        let (orders, revenue) = orders::table
            .filter(orders::status.eq_any(completed.clone()))
            .filter(orders::created_at.ge(from))
            .filter(orders::created_at.lt(to))
            .select((count_star(), sum(orders::grand_total)))
            .first::<(i64, Option<BigDecimal>)>(&mut conn)?;

        let sold: Vec<SoldLine> = order_items::table
            .inner_join(orders::table)
            .left_join(products::table)
            .filter(orders::status.eq_any(completed))
            .filter(orders::created_at.ge(from))
            .filter(orders::created_at.lt(to))
            .select((
                order_items::unit_price,
                order_items::quantity,
                products::cost_price.nullable(),
            ))
            .load::<(BigDecimal, i32, Option<BigDecimal>)>(&mut conn)?
            .into_iter()
            .map(|(unit_price, quantity, cost_price)| SoldLine {
                unit_price,
                quantity,
                cost_price,
            })
            .collect();

        Ok(SalesSummary {
            orders,
            revenue: round_cents(&revenue.unwrap_or_default()),
            profit: gross_profit(&sold),
        })
    }
}
