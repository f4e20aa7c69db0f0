use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::loyalty::{self, LoyaltyEntry, PointsAdjustment, Redemption};
use crate::domain::ports::{LoyaltyRepository, UserRepository};

use super::load_user;

const HISTORY_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct LoyaltyBalance {
    pub user_id: Uuid,
    pub points: i32,
    pub can_redeem: bool,
    pub history: Vec<LoyaltyEntry>,
}

pub struct LoyaltyService<L, U> {
    ledger: L,
    users: U,
}

impl<L: LoyaltyRepository, U: UserRepository> LoyaltyService<L, U> {
    pub fn new(ledger: L, users: U) -> Self {
        Self { ledger, users }
    }

    pub fn balance(&self, user_id: Uuid) -> Result<LoyaltyBalance, DomainError> {
        let user = load_user(&self.users, user_id)?;
        Ok(LoyaltyBalance {
            user_id,
            points: user.loyalty_points,
            can_redeem: loyalty::can_redeem(user.loyalty_points),
            history: self.ledger.history(user_id, HISTORY_LIMIT)?,
        })
    }

    pub fn redeem_free_item(&self, user_id: Uuid, product_id: Uuid) -> Result<Redemption, DomainError> {
        let user = load_user(&self.users, user_id)?;
        // Re-checked by the repository under the user row lock.
        if !loyalty::can_redeem(user.loyalty_points) {
            return Err(DomainError::InsufficientPoints {
                balance: user.loyalty_points,
            });
        }

        let redemption = self.ledger.redeem_free_item(user_id, product_id)?;
        log::info!(
            "{} redeemed a free {} (order {}), {} point(s) left",
            user.username,
            redemption.product_name,
            redemption.order_id,
            redemption.new_balance
        );
        Ok(redemption)
    }

    pub fn adjust_points(
        &self,
        operator_id: Uuid,
        user_id: Uuid,
        adjustment: PointsAdjustment,
    ) -> Result<i32, DomainError> {
        load_user(&self.users, operator_id)?.require_staff()?;
        let balance = self.ledger.adjust_points(user_id, adjustment)?;
        log::info!(
            "Loyalty balance of {} set to {} by {} ({:?})",
            user_id,
            balance,
            operator_id,
            adjustment
        );
        Ok(balance)
    }
}
