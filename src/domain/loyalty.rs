use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Points earned for each completed order.
pub const POINTS_PER_ORDER: i32 = 1;
/// A free item can be redeemed once the balance exceeds this.
pub const REDEMPTION_THRESHOLD: i32 = 5;
/// Points deducted for one free item.
pub const REDEMPTION_COST: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoyaltyReason {
    OrderCompleted,
    FreeItemRedeemed,
    InStorePurchase,
    ManualAdjustment,
}

impl LoyaltyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LoyaltyReason::OrderCompleted => "order_completed",
            LoyaltyReason::FreeItemRedeemed => "free_item_redeemed",
            LoyaltyReason::InStorePurchase => "in_store_purchase",
            LoyaltyReason::ManualAdjustment => "manual_adjustment",
        }
    }
}

pub fn can_redeem(balance: i32) -> bool {
    balance > REDEMPTION_THRESHOLD
}

/// Balance left after one redemption.
pub fn redeem(balance: i32) -> Result<i32, DomainError> {
    if !can_redeem(balance) {
        return Err(DomainError::InsufficientPoints { balance });
    }
    Ok(balance - REDEMPTION_COST)
}

/// A back-office change to a customer's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsAdjustment {
    Set(i32),
    Add(i32),
}

impl PointsAdjustment {
    pub fn apply(self, balance: i32) -> Result<i32, DomainError> {
        let next = match self {
            PointsAdjustment::Set(value) => Some(value),
            PointsAdjustment::Add(delta) => balance.checked_add(delta),
        };
        match next {
            Some(value) if value >= 0 => Ok(value),
            _ => Err(DomainError::InvalidInput(
                "loyalty points cannot become negative".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Redemption {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub new_balance: i32,
}

/// One journalled change of a loyalty balance.
#[derive(Debug, Clone)]
pub struct LoyaltyEntry {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub delta: i32,
    pub balance_after: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
