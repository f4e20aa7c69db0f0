use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::discounted_unit_price;

/// Products at or below this stock level are reported by the low-stock alert.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Products expiring within this many days are reported by the expiry alert.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Last date that still falls inside an expiry window of `days` from `today`.
pub fn expiry_cutoff(today: NaiveDate, days: i64) -> NaiveDate {
    today + Duration::days(days)
}

/// What the back-office alerts page shows.
#[derive(Debug, Clone)]
pub struct StockAlerts {
    pub low_stock: Vec<Product>,
    pub expiring: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub discount_percent: BigDecimal,
    pub cost_price: Option<BigDecimal>,
    pub expiry_date: Option<NaiveDate>,
}

impl Product {
    pub fn unit_price(&self) -> BigDecimal {
        discounted_unit_price(&self.price, &self.discount_percent)
    }

    pub fn ensure_stock(&self, requested: i32) -> Result<(), DomainError> {
        if requested > self.stock {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested,
            });
        }
        Ok(())
    }

    /// Already expired products count as expiring.
    pub fn expires_by(&self, cutoff: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|date| date <= cutoff)
    }
}
