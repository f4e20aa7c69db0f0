pub mod admin;
pub mod cart;
pub mod catalog;
pub mod identity;
pub mod loyalty;
pub mod orders;

use bigdecimal::BigDecimal;

use crate::domain::pricing::round_cents;

/// Money goes over the wire as a two-decimal string, e.g. "97.20".
pub(crate) fn money(amount: &BigDecimal) -> String {
    round_cents(amount).to_string()
}
