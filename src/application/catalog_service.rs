use chrono::Utc;
use uuid::Uuid;

use crate::domain::catalog::{
    Product, StockAlerts, DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_LOW_STOCK_THRESHOLD,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogRepository, UserRepository};

use super::load_user;

pub struct CatalogService<C, U> {
    catalog: C,
    users: U,
}

impl<C: CatalogRepository, U: UserRepository> CatalogService<C, U> {
    pub fn new(catalog: C, users: U) -> Self {
        Self { catalog, users }
    }

    pub fn available_products(&self) -> Result<Vec<Product>, DomainError> {
        self.catalog.available_products()
    }

    pub fn find_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.catalog
            .find_product(id)?
            .ok_or(DomainError::NotFound("Product"))
    }

    /// Products at or below `threshold` units, for cashiers and admins.
    pub fn low_stock(
        &self,
        requester_id: Uuid,
        threshold: Option<i32>,
    ) -> Result<Vec<Product>, DomainError> {
        load_user(&self.users, requester_id)?.require_staff()?;
        let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        if threshold < 0 {
            return Err(DomainError::InvalidInput(
                "threshold must not be negative".to_string(),
            ));
        }
        self.catalog.low_stock(threshold)
    }

    /// Products expiring within `days` (30 by default), expired ones included.
    pub fn expiring_soon(
        &self,
        requester_id: Uuid,
        days: Option<i64>,
    ) -> Result<Vec<Product>, DomainError> {
        load_user(&self.users, requester_id)?.require_staff()?;
        self.expiring(days)
    }

    /// Low-stock and expiry alerts together.
    pub fn alerts(
        &self,
        requester_id: Uuid,
        threshold: Option<i32>,
        days: Option<i64>,
    ) -> Result<StockAlerts, DomainError> {
        let low_stock = self.low_stock(requester_id, threshold)?;
        let expiring = self.expiring(days)?;
        Ok(StockAlerts {
            low_stock,
            expiring,
        })
    }

    fn expiring(&self, days: Option<i64>) -> Result<Vec<Product>, DomainError> {
        let days = days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
        if !(0..=3650).contains(&days) {
            return Err(DomainError::InvalidInput(
                "days must be between 0 and 3650".to_string(),
            ));
        }
        self.catalog.expiring_within(Utc::now().date_naive(), days)
    }
}
