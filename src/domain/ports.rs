use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::catalog::Product;
use super::errors::DomainError;
use super::loyalty::{LoyaltyEntry, PointsAdjustment, Redemption};
use super::order::{
    InStorePurchase, OrderLineInput, OrderView, PendingPaymentView, PlacedOrder, ReviewDecision,
    ReviewOutcome, SalesSummary, SubmittedProof,
};
use super::payment::ProofImage;
use super::user::User;

pub trait CatalogRepository: Send + Sync + 'static {
    fn available_products(&self) -> Result<Vec<Product>, DomainError>;
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, DomainError>;
    /// Products whose expiry date is on or before `today + days`, soonest first.
    fn expiring_within(&self, today: NaiveDate, days: i64) -> Result<Vec<Product>, DomainError>;
}

pub trait UserRepository: Send + Sync + 'static {
    fn find_user(&self, id: Uuid) -> Result<Option<User>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Creates the order, its items and the stock decrement atomically.
    fn place_order(
        &self,
        user_id: Uuid,
        lines: Vec<OrderLineInput>,
        momo_number: &str,
    ) -> Result<PlacedOrder, DomainError>;
    fn find_for_user(&self, order_id: Uuid, user_id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn attach_payment_proof(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        image_path: &str,
    ) -> Result<SubmittedProof, DomainError>;
    fn review_payment(
        &self,
        reviewer: &User,
        payment_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, DomainError>;
    fn pending_payments(&self, hide_payer: Option<Uuid>)
        -> Result<Vec<PendingPaymentView>, DomainError>;
    fn record_in_store_purchase(
        &self,
        purchase: InStorePurchase,
    ) -> Result<PlacedOrder, DomainError>;
    fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary, DomainError>;
}

pub trait LoyaltyRepository: Send + Sync + 'static {
    fn redeem_free_item(&self, user_id: Uuid, product_id: Uuid) -> Result<Redemption, DomainError>;
    fn adjust_points(&self, user_id: Uuid, adjustment: PointsAdjustment) -> Result<i32, DomainError>;
    fn history(&self, user_id: Uuid, limit: i64) -> Result<Vec<LoyaltyEntry>, DomainError>;
}

/// Where uploaded payment proofs are kept.
pub trait ProofStorage: Send + Sync + 'static {
    /// Persists the image and returns its path relative to the storage root.
    fn store(&self, order_id: Uuid, image: &ProofImage) -> Result<String, DomainError>;
    fn discard(&self, path: &str);
}
