use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    InStorePurchase, OrderStatus, OrderView, PendingPaymentView, PlacedOrder, ReviewDecision,
    ReviewOutcome, SalesSummary, SubmittedProof,
};
use crate::domain::payment::ProofImage;
use crate::domain::ports::{OrderRepository, ProofStorage, UserRepository};
use crate::domain::user::Role;

use super::load_user;

/// Sales for the current day and the current month so far.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub today: SalesSummary,
    pub month: SalesSummary,
}

pub struct OrderService<R, U, P> {
    repo: R,
    users: U,
    proofs: P,
    momo_number: String,
}

impl<R: OrderRepository, U: UserRepository, P: ProofStorage> OrderService<R, U, P> {
    pub fn new(repo: R, users: U, proofs: P, momo_number: impl Into<String>) -> Self {
        Self {
            repo,
            users,
            proofs,
            momo_number: momo_number.into(),
        }
    }

    /// Places an order for everything in `cart` and empties it on success.
    /// On failure the cart is left as it was.
    pub fn checkout(&self, user_id: Uuid, cart: &mut Cart) -> Result<PlacedOrder, DomainError> {
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        load_user(&self.users, user_id)?;

        match self.repo.place_order(user_id, cart.order_lines(), &self.momo_number) {
            Ok(placed) => {
                cart.clear();
                log::info!(
                    "Order {} placed by {} for {}",
                    placed.id,
                    user_id,
                    placed.totals.grand_total
                );
                Ok(placed)
            }
            Err(e) => {
                log::warn!("Checkout for {} refused: {}", user_id, e);
                Err(e)
            }
        }
    }

    pub fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, DomainError> {
        self.repo
            .find_for_user(order_id, user_id)?
            .ok_or(DomainError::NotFound("Order"))
    }

    pub fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_for_user(user_id)
    }

    /// Stores the proof image and records the payment. The stored file is
    /// removed again when the order cannot accept it.
    pub fn submit_payment_proof(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmittedProof, DomainError> {
        let image = ProofImage::new(content_type, bytes)?;
        let order = self.get_order(user_id, order_id)?;
        if order.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::PendingCashierReview,
            });
        }

        let path = self.proofs.store(order_id, &image)?;
        match self.repo.attach_payment_proof(order_id, user_id, &path) {
            Ok(submitted) => {
                log::info!(
                    "Payment proof {} submitted for order {}",
                    submitted.payment_id,
                    order_id
                );
                Ok(submitted)
            }
            Err(e) => {
                log::warn!("Discarding proof {} for order {}: {}", path, order_id, e);
                self.proofs.discard(&path);
                Err(e)
            }
        }
    }

    pub fn review_payment(
        &self,
        reviewer_id: Uuid,
        payment_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, DomainError> {
        let reviewer = load_user(&self.users, reviewer_id)?;
        reviewer.require_staff()?;

        let outcome = self.repo.review_payment(&reviewer, payment_id, decision)?;
        log::info!(
            "Payment {} {} by {}; order {} is {}",
            payment_id,
            outcome.payment_status.as_str(),
            reviewer.username,
            outcome.order_id,
            outcome.order_status
        );
        Ok(outcome)
    }

    /// Pending proofs, newest first. Cashiers do not see their own.
    pub fn pending_payments(&self, reviewer_id: Uuid) -> Result<Vec<PendingPaymentView>, DomainError> {
        let reviewer = load_user(&self.users, reviewer_id)?;
        reviewer.require_staff()?;
        let hide = (reviewer.role == Role::Cashier).then_some(reviewer.id);
        self.repo.pending_payments(hide)
    }

    pub fn record_in_store_purchase(
        &self,
        operator_id: Uuid,
        purchase: InStorePurchase,
    ) -> Result<PlacedOrder, DomainError> {
        load_user(&self.users, operator_id)?.require_staff()?;
        if purchase.quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }
        if let Some(cost) = &purchase.cost_price {
            if cost < &BigDecimal::from(0) {
                return Err(DomainError::InvalidInput(
                    "cost price must not be negative".to_string(),
                ));
            }
        }
        load_user(&self.users, purchase.customer_id)?;

        let customer_id = purchase.customer_id;
        let placed = self.repo.record_in_store_purchase(purchase)?;
        log::info!(
            "In-store purchase {} recorded by {} for customer {}",
            placed.id,
            operator_id,
            customer_id
        );
        Ok(placed)
    }

    pub fn sales_summary(
        &self,
        operator_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary, DomainError> {
        load_user(&self.users, operator_id)?.require_admin()?;
        if from > to {
            return Err(DomainError::InvalidInput(
                "report window ends before it starts".to_string(),
            ));
        }
        self.repo.sales_summary(from, to)
    }

    pub fn sales_report(&self, operator_id: Uuid, now: DateTime<Utc>) -> Result<SalesReport, DomainError> {
        let (day_start, month_start) = report_windows(now);
        Ok(SalesReport {
            today: self.sales_summary(operator_id, day_start, now)?,
            month: self.sales_summary(operator_id, month_start, now)?,
        })
    }
}

/// Start of the UTC day and of the UTC month containing `now`.
fn report_windows(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    (
        today.and_time(NaiveTime::MIN).and_utc(),
        first.and_time(NaiveTime::MIN).and_utc(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;

    use super::*;
    use crate::application::fakes::{product, user, FakeUsers};
    use crate::domain::order::{OrderLineInput, PaymentStatus};
    use crate::domain::pricing::OrderTotals;
    use crate::domain::user::User;

    #[derive(Default)]
    struct FakeOrders {
        status: Mutex<Option<OrderStatus>>,
        reject_attach: bool,
        hidden: Mutex<Option<Option<Uuid>>>,
    }

    impl FakeOrders {
        fn with_order(status: OrderStatus) -> Self {
            Self {
                status: Mutex::new(Some(status)),
                ..Self::default()
            }
        }
    }

    impl OrderRepository for FakeOrders {
        fn place_order(
            &self,
            _user_id: Uuid,
            lines: Vec<OrderLineInput>,
            momo_number: &str,
        ) -> Result<PlacedOrder, DomainError> {
            if lines.iter().any(|l| l.quantity > 5) {
                return Err(DomainError::InsufficientStock {
                    product_id: lines[0].product_id,
                    available: 5,
                    requested: lines[0].quantity,
                });
            }
            Ok(PlacedOrder {
                id: Uuid::new_v4(),
                status: OrderStatus::AwaitingProof,
                totals: OrderTotals::zero(),
                momo_number: Some(momo_number.to_string()),
            })
        }

        fn find_for_user(&self, order_id: Uuid, user_id: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(self.status.lock().unwrap().map(|status| OrderView {
                id: order_id,
                user_id,
                status,
                payment_method: "momo".to_string(),
                totals: OrderTotals::zero(),
                momo_number: None,
                created_at: Utc::now(),
                items: Vec::new(),
            }))
        }

        fn list_for_user(&self, _user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
            Ok(Vec::new())
        }

        fn attach_payment_proof(
            &self,
            order_id: Uuid,
            _user_id: Uuid,
            _image_path: &str,
        ) -> Result<SubmittedProof, DomainError> {
            if self.reject_attach {
                return Err(DomainError::Internal("database unavailable".to_string()));
            }
            Ok(SubmittedProof {
                payment_id: Uuid::new_v4(),
                order_id,
                order_status: OrderStatus::PendingCashierReview,
            })
        }

        fn review_payment(
            &self,
            _reviewer: &User,
            payment_id: Uuid,
            decision: ReviewDecision,
        ) -> Result<ReviewOutcome, DomainError> {
            Ok(ReviewOutcome {
                payment_id,
                order_id: Uuid::new_v4(),
                payment_status: decision.payment_status(),
                order_status: decision.order_status(),
                points_awarded: 1,
            })
        }

        fn pending_payments(&self, hide_payer: Option<Uuid>) -> Result<Vec<PendingPaymentView>, DomainError> {
            *self.hidden.lock().unwrap() = Some(hide_payer);
            Ok(Vec::new())
        }

        fn record_in_store_purchase(&self, purchase: InStorePurchase) -> Result<PlacedOrder, DomainError> {
            Ok(PlacedOrder {
                id: Uuid::new_v4(),
                status: OrderStatus::Completed,
                totals: OrderTotals::zero(),
                momo_number: Some(purchase.customer_id.to_string()),
            })
        }

        fn sales_summary(&self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Result<SalesSummary, DomainError> {
            Ok(SalesSummary {
                orders: 0,
                revenue: BigDecimal::from(0),
                profit: BigDecimal::from(0),
            })
        }
    }

    #[derive(Default)]
    struct FakeProofs {
        stored: Mutex<Vec<String>>,
        discarded: Mutex<Vec<String>>,
    }

    impl ProofStorage for FakeProofs {
        fn store(&self, order_id: Uuid, image: &ProofImage) -> Result<String, DomainError> {
            let path = format!("pay_{}.{}", order_id.simple(), image.kind.extension());
            self.stored.lock().unwrap().push(path.clone());
            Ok(path)
        }

        fn discard(&self, path: &str) {
            self.discarded.lock().unwrap().push(path.to_string());
        }
    }

    fn service(
        orders: FakeOrders,
        users: Vec<User>,
    ) -> OrderService<FakeOrders, FakeUsers, FakeProofs> {
        OrderService::new(orders, FakeUsers::with(users), FakeProofs::default(), "+84000000000")
    }

    #[test]
    fn checkout_clears_cart_only_on_success() {
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::default(), vec![customer.clone()]);
        let perfume = product("50", 10);

        let mut cart = Cart::new();
        cart.add(&perfume, 6).unwrap();
        assert!(svc.checkout(customer.id, &mut cart).is_err());
        assert_eq!(cart.lines().len(), 1);

        cart.update_quantity(perfume.id, 2, 10).unwrap();
        let placed = svc.checkout(customer.id, &mut cart).unwrap();
        assert_eq!(placed.momo_number.as_deref(), Some("+84000000000"));
        assert!(cart.is_empty());
    }

    #[test]
    fn empty_cart_checkout_is_refused() {
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::default(), vec![customer.clone()]);
        let err = svc.checkout(customer.id, &mut Cart::new()).unwrap_err();
        assert!(matches!(err, DomainError::EmptyCart));
    }

    #[test]
    fn failed_attach_discards_stored_proof() {
        let customer = user(Role::Customer);
        let orders = FakeOrders {
            reject_attach: true,
            ..FakeOrders::with_order(OrderStatus::AwaitingProof)
        };
        let svc = service(orders, vec![customer.clone()]);

        let err = svc
            .submit_payment_proof(customer.id, Uuid::new_v4(), "image/png", vec![1])
            .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(
            *svc.proofs.stored.lock().unwrap(),
            *svc.proofs.discarded.lock().unwrap()
        );
    }

    #[test]
    fn proof_for_finished_order_is_never_stored() {
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::with_order(OrderStatus::Rejected), vec![customer.clone()]);

        let err = svc
            .submit_payment_proof(customer.id, Uuid::new_v4(), "image/jpeg", vec![1])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert!(svc.proofs.stored.lock().unwrap().is_empty());
    }

    #[test]
    fn proof_with_wrong_type_is_refused() {
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::with_order(OrderStatus::AwaitingProof), vec![customer.clone()]);
        let err = svc
            .submit_payment_proof(customer.id, Uuid::new_v4(), "application/pdf", vec![1])
            .unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedProofType(_)));
    }

    #[test]
    fn customers_cannot_review_payments() {
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::default(), vec![customer.clone()]);
        let err = svc
            .review_payment(customer.id, Uuid::new_v4(), ReviewDecision::Approve)
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn cashier_review_queue_hides_own_payments() {
        let cashier = user(Role::Cashier);
        let admin = user(Role::Admin);
        let svc = service(FakeOrders::default(), vec![cashier.clone(), admin.clone()]);

        svc.pending_payments(cashier.id).unwrap();
        assert_eq!(*svc.repo.hidden.lock().unwrap(), Some(Some(cashier.id)));
        svc.pending_payments(admin.id).unwrap();
        assert_eq!(*svc.repo.hidden.lock().unwrap(), Some(None));
    }

    #[test]
    fn approval_reports_completed_order() {
        let cashier = user(Role::Cashier);
        let svc = service(FakeOrders::default(), vec![cashier.clone()]);
        let outcome = svc
            .review_payment(cashier.id, Uuid::new_v4(), ReviewDecision::Approve)
            .unwrap();
        assert_eq!(outcome.payment_status, PaymentStatus::Approved);
        assert_eq!(outcome.order_status, OrderStatus::Completed);
    }

    #[test]
    fn sales_report_is_admin_only() {
        let cashier = user(Role::Cashier);
        let admin = user(Role::Admin);
        let svc = service(FakeOrders::default(), vec![cashier.clone(), admin.clone()]);

        assert!(matches!(
            svc.sales_report(cashier.id, Utc::now()),
            Err(DomainError::Forbidden(_))
        ));
        assert!(svc.sales_report(admin.id, Utc::now()).is_ok());
    }

    #[test]
    fn in_store_purchase_needs_positive_quantity() {
        let cashier = user(Role::Cashier);
        let customer = user(Role::Customer);
        let svc = service(FakeOrders::default(), vec![cashier.clone(), customer.clone()]);
        let err = svc
            .record_in_store_purchase(
                cashier.id,
                InStorePurchase {
                    customer_id: customer.id,
                    product_id: Uuid::new_v4(),
                    quantity: 0,
                    cost_price: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn report_windows_start_at_midnight_and_first_of_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let (day, month) = report_windows(now);
        assert_eq!(day, Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(month, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }
}
