use uuid::Uuid;

use crate::domain::cart::{Cart, CartChange};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogRepository, UserRepository};

use super::load_user;

/// Cart operations against a caller-owned [`Cart`]; stock is read fresh for
/// every change.
pub struct CartService<C, U> {
    catalog: C,
    users: U,
}

impl<C: CatalogRepository, U: UserRepository> CartService<C, U> {
    pub fn new(catalog: C, users: U) -> Self {
        Self { catalog, users }
    }

    /// Only known users get a cart.
    pub fn require_user(&self, user_id: Uuid) -> Result<(), DomainError> {
        load_user(&self.users, user_id).map(|_| ())
    }

    pub fn add_item(&self, cart: &mut Cart, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let product = self
            .catalog
            .find_product(product_id)?
            .ok_or(DomainError::NotFound("Product"))?;
        cart.add(&product, quantity)
    }

    pub fn update_quantity(
        &self,
        cart: &mut Cart,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartChange, DomainError> {
        // A product deleted from the catalog counts as sold out.
        let stock = self
            .catalog
            .find_product(product_id)?
            .map(|p| p.stock)
            .unwrap_or(0);
        let result = cart.update_quantity(product_id, quantity, stock);
        if let Err(DomainError::InsufficientStock { available: 0, .. }) = &result {
            log::warn!("Dropped sold-out product {} from cart", product_id);
        }
        result
    }

    pub fn remove_item(&self, cart: &mut Cart, product_id: Uuid) -> Result<(), DomainError> {
        if cart.remove(product_id) {
            Ok(())
        } else {
            Err(DomainError::NotFound("Cart line"))
        }
    }
}
