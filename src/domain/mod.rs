pub mod cart;
pub mod catalog;
pub mod errors;
pub mod loyalty;
pub mod order;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod user;
