use thiserror::Error;
use uuid::Uuid;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Only {available} unit(s) of product {product_id} in stock, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        available: i32,
        requested: i32,
    },
    #[error("Not enough loyalty points: balance is {balance}, more than 5 required")]
    InsufficientPoints { balance: i32 },
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Payment has already been reviewed")]
    PaymentAlreadyReviewed,
    #[error("Unsupported proof image type '{0}', expected JPEG, PNG or WebP")]
    UnsupportedProofType(String),
    #[error("Proof image exceeds {max} bytes")]
    ProofTooLarge { max: usize },
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),
    #[error("Internal error: {0}")]
    Internal(String),
}
