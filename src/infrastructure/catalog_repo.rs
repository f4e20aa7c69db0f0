use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{expiry_cutoff, Product};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::products;

use super::models::ProductRow;

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn available_products(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::stock.gt(0))
            .select(ProductRow::as_select())
            .order(products::name.asc())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Product::from))
    }

    fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::stock.le(threshold))
            .select(ProductRow::as_select())
            .order((products::stock.asc(), products::name.asc()))
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn expiring_within(&self, today: NaiveDate, days: i64) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::expiry_date.is_not_null())
            .filter(products::expiry_date.le(expiry_cutoff(today, days)))
            .select(ProductRow::as_select())
            .order((products::expiry_date.asc(), products::name.asc()))
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::DieselCatalogRepository;
    use crate::domain::ports::CatalogRepository;
    use crate::infrastructure::test_support::{seed_product, set_expiry_date, setup_db};

    #[tokio::test]
    async fn available_products_hide_sold_out_items() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());
        let in_stock = seed_product(&pool, "30", "10", 4);
        let sold_out = seed_product(&pool, "30", "0", 0);

        let products = repo.available_products().expect("list failed");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, in_stock);
        assert_eq!(products[0].unit_price().to_string(), "27.00");

        let found = repo.find_product(sold_out).expect("find failed");
        assert_eq!(found.map(|p| p.stock), Some(0));
    }

    #[tokio::test]
    async fn low_stock_orders_by_remaining_units() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());
        let three = seed_product(&pool, "10", "0", 3);
        let zero = seed_product(&pool, "10", "0", 0);
        seed_product(&pool, "10", "0", 40);

        let low = repo.low_stock(5).expect("low stock failed");
        let ids: Vec<_> = low.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![zero, three]);
    }

    #[tokio::test]
    async fn expiring_products_are_listed_soonest_first() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool.clone());
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let in_three_weeks = seed_product(&pool, "10", "0", 8);
        set_expiry_date(&pool, in_three_weeks, NaiveDate::from_ymd_opt(2025, 6, 22).unwrap());
        let expired = seed_product(&pool, "10", "0", 2);
        set_expiry_date(&pool, expired, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        let next_year = seed_product(&pool, "10", "0", 8);
        set_expiry_date(&pool, next_year, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        seed_product(&pool, "10", "0", 8);

        let expiring = repo.expiring_within(today, 30).expect("expiring failed");
        let ids: Vec<_> = expiring.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![expired, in_three_weeks]);
        assert_eq!(
            expiring[1].expiry_date,
            NaiveDate::from_ymd_opt(2025, 6, 22)
        );

        assert!(repo.expiring_within(today, -30).expect("expiring failed").is_empty());
    }
}
