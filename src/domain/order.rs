use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::{round_cents, OrderTotals};

/// Lifecycle of an order.
///
/// `Approved` and `Paid` are legacy spellings of `Completed` that may still be
/// present in stored rows. The service only ever writes `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    PendingPayment,
    AwaitingProof,
    PendingCashierReview,
    Completed,
    Approved,
    Paid,
    Rejected,
}

impl OrderStatus {
    pub const COMPLETED_LIKE: [OrderStatus; 3] =
        [OrderStatus::Completed, OrderStatus::Approved, OrderStatus::Paid];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::AwaitingProof => "awaiting_proof",
            OrderStatus::PendingCashierReview => "pending_cashier_review",
            OrderStatus::Completed => "completed",
            OrderStatus::Approved => "approved",
            OrderStatus::Paid => "paid",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_completed_like(self) -> bool {
        Self::COMPLETED_LIKE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        self.is_completed_like() || self == OrderStatus::Rejected
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, AwaitingProof)
                | (AwaitingProof, PendingCashierReview)
                | (PendingCashierReview, Completed | Approved | Paid | Rejected)
        )
    }

    /// Validates a single forward step and returns the new status.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending_payment" => Ok(OrderStatus::PendingPayment),
            "awaiting_proof" => Ok(OrderStatus::AwaitingProof),
            "pending_cashier_review" => Ok(OrderStatus::PendingCashierReview),
            "completed" => Ok(OrderStatus::Completed),
            "approved" => Ok(OrderStatus::Approved),
            "paid" => Ok(OrderStatus::Paid),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(DomainError::Internal(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Momo,
    FreeItem,
    InStore,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Momo => "momo",
            PaymentMethod::FreeItem => "free_item",
            PaymentMethod::InStore => "in_store",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(DomainError::Internal(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// A cashier's verdict on an uploaded payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn payment_status(self) -> PaymentStatus {
        match self {
            ReviewDecision::Approve => PaymentStatus::Approved,
            ReviewDecision::Reject => PaymentStatus::Rejected,
        }
    }

    pub fn order_status(self) -> OrderStatus {
        match self {
            ReviewDecision::Approve => OrderStatus::Completed,
            ReviewDecision::Reject => OrderStatus::Rejected,
        }
    }
}

/// One requested checkout line, already merged per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: String,
    pub totals: OrderTotals,
    pub momo_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Result of a successful checkout or in-store purchase.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: Uuid,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub momo_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub points_awarded: i32,
}

#[derive(Debug, Clone)]
pub struct PendingPaymentView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubmittedProof {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub order_status: OrderStatus,
}

/// A walk-in sale recorded by staff on behalf of a customer.
#[derive(Debug, Clone)]
pub struct InStorePurchase {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Replaces the product's cost price when present.
    pub cost_price: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub orders: i64,
    pub revenue: BigDecimal,
    pub profit: BigDecimal,
}

/// A sold line as seen by the profit report.
#[derive(Debug, Clone)]
pub struct SoldLine {
    pub unit_price: BigDecimal,
    pub quantity: i32,
    /// Products without a recorded cost count as free to stock.
    pub cost_price: Option<BigDecimal>,
}

/// Sum of `(unit price - cost) * quantity`, rounded to cents.
pub fn gross_profit(lines: &[SoldLine]) -> BigDecimal {
    let total = lines.iter().fold(BigDecimal::from(0), |acc, line| {
        let cost = line.cost_price.clone().unwrap_or_default();
        acc + (&line.unit_price - cost) * BigDecimal::from(line.quantity)
    });
    round_cents(&total)
}

/// Merges duplicate product lines and rejects non-positive quantities.
pub fn normalize_lines(lines: Vec<OrderLineInput>) -> Result<Vec<OrderLineInput>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::EmptyCart);
    }
    let mut merged: Vec<OrderLineInput> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }
    // Lock rows in a stable order so concurrent checkouts cannot deadlock.
    merged.sort_by_key(|l| l.product_id);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sold(unit_price: &str, quantity: i32, cost_price: Option<&str>) -> SoldLine {
        SoldLine {
            unit_price: BigDecimal::from_str(unit_price).unwrap(),
            quantity,
            cost_price: cost_price.map(|c| BigDecimal::from_str(c).unwrap()),
        }
    }

    #[test]
    fn gross_profit_treats_missing_cost_as_zero() {
        let lines = [
            sold("45.00", 2, Some("30.00")),
            sold("12.50", 1, None),
            sold("0.00", 1, Some("20.00")),
        ];
        assert_eq!(gross_profit(&lines).to_string(), "22.50");
        assert_eq!(gross_profit(&[]).to_string(), "0.00");
    }

    const ALL: [OrderStatus; 7] = [
        OrderStatus::PendingPayment,
        OrderStatus::AwaitingProof,
        OrderStatus::PendingCashierReview,
        OrderStatus::Completed,
        OrderStatus::Approved,
        OrderStatus::Paid,
        OrderStatus::Rejected,
    ];

    #[test]
    fn happy_path_moves_forward() {
        let s = OrderStatus::PendingPayment
            .transition(OrderStatus::AwaitingProof)
            .and_then(|s| s.transition(OrderStatus::PendingCashierReview))
            .and_then(|s| s.transition(OrderStatus::Completed))
            .expect("forward path should be allowed");
        assert_eq!(s, OrderStatus::Completed);
    }

    #[test]
    fn review_can_reject() {
        assert!(OrderStatus::PendingCashierReview.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in ALL.iter().copied().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(
                    !from.can_transition_to(to),
                    "{} -> {} must be refused",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn never_moves_backward() {
        assert!(!OrderStatus::AwaitingProof.can_transition_to(OrderStatus::PendingPayment));
        assert!(!OrderStatus::PendingCashierReview.can_transition_to(OrderStatus::AwaitingProof));
        assert!(!OrderStatus::Rejected.can_transition_to(OrderStatus::PendingCashierReview));
    }

    #[test]
    fn cannot_skip_review() {
        let err = OrderStatus::AwaitingProof
            .transition(OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: OrderStatus::AwaitingProof,
                to: OrderStatus::Completed
            }
        ));
    }

    #[test]
    fn completed_like_set() {
        let completed: Vec<_> = ALL.iter().filter(|s| s.is_completed_like()).collect();
        assert_eq!(completed.len(), 3);
        assert!(!OrderStatus::Rejected.is_completed_like());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_parses_its_own_representation() {
        for s in ALL {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
        assert_eq!("COMPLETED".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn normalize_merges_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = normalize_lines(vec![
            OrderLineInput { product_id: a, quantity: 1 },
            OrderLineInput { product_id: b, quantity: 2 },
            OrderLineInput { product_id: a, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(lines.len(), 2);
        let merged_a = lines.iter().find(|l| l.product_id == a).unwrap();
        assert_eq!(merged_a.quantity, 4);
        assert!(lines.windows(2).all(|w| w[0].product_id <= w[1].product_id));
    }

    #[test]
    fn normalize_rejects_empty_and_non_positive() {
        assert!(matches!(normalize_lines(vec![]), Err(DomainError::EmptyCart)));
        let err = normalize_lines(vec![OrderLineInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
        }])
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn decision_maps_to_statuses() {
        assert_eq!(ReviewDecision::Approve.order_status(), OrderStatus::Completed);
        assert_eq!(ReviewDecision::Reject.payment_status(), PaymentStatus::Rejected);
    }
}
