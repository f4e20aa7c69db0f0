use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::catalog::Product;
use super::errors::DomainError;
use super::order::OrderLineInput;
use super::pricing::OrderTotals;

/// A cart line with the name, price and stock seen when it was last touched.
/// Checkout re-prices every line from the product table.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Updated,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` units, merging with an existing line for the product.
    pub fn add(&mut self, product: &Product, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "quantity must be positive".to_string(),
            ));
        }
        if product.stock <= 0 {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                available: 0,
                requested: quantity,
            });
        }
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                let wanted = line.quantity.saturating_add(quantity);
                product.ensure_stock(wanted)?;
                line.quantity = wanted;
                line.stock = product.stock;
            }
            None => {
                product.ensure_stock(quantity)?;
                self.lines.push(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.unit_price(),
                    quantity,
                    stock: product.stock,
                });
            }
        }
        Ok(())
    }

    /// Sets the quantity of a line against the product's current stock.
    ///
    /// A quantity of zero or less removes the line. A product that has sold
    /// out is dropped from the cart and reported as an error.
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        current_stock: i32,
    ) -> Result<CartChange, DomainError> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or(DomainError::NotFound("Cart line"))?;

        if quantity <= 0 {
            self.lines.remove(idx);
            return Ok(CartChange::Removed);
        }
        if current_stock <= 0 {
            self.lines.remove(idx);
            return Err(DomainError::InsufficientStock {
                product_id,
                available: 0,
                requested: quantity,
            });
        }
        if quantity > current_stock {
            return Err(DomainError::InsufficientStock {
                product_id,
                available: current_stock,
                requested: quantity,
            });
        }
        let line = &mut self.lines[idx];
        line.quantity = quantity;
        line.stock = current_stock;
        Ok(CartChange::Updated)
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn order_lines(&self) -> Vec<OrderLineInput> {
        self.lines
            .iter()
            .map(|l| OrderLineInput {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect()
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals::compute(self.lines.iter().map(|l| (&l.unit_price, l.quantity)))
    }
}
