use bigdecimal::{BigDecimal, RoundingMode, Zero};

/// Sales tax applied to every paid order, in percent.
pub const TAX_PERCENT: i32 = 8;

pub fn round_cents(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// List price reduced by `discount_percent`, rounded to cents.
pub fn discounted_unit_price(price: &BigDecimal, discount_percent: &BigDecimal) -> BigDecimal {
    let hundred = BigDecimal::from(100);
    if *discount_percent <= BigDecimal::zero() {
        return round_cents(price);
    }
    let discount = if *discount_percent > hundred {
        hundred.clone()
    } else {
        discount_percent.clone()
    };
    round_cents(&(price * (&hundred - discount) / hundred))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
}

impl OrderTotals {
    /// Totals for `(unit_price, quantity)` pairs with tax added.
    pub fn compute<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (&'a BigDecimal, i32)>,
    {
        let subtotal = lines
            .into_iter()
            .fold(BigDecimal::zero(), |acc, (price, qty)| {
                acc + price * BigDecimal::from(qty)
            });
        let subtotal = round_cents(&subtotal);
        let tax = round_cents(&(&subtotal * BigDecimal::from(TAX_PERCENT) / BigDecimal::from(100)));
        let grand_total = round_cents(&(&subtotal + &tax));
        Self {
            subtotal,
            tax,
            grand_total,
        }
    }

    pub fn zero() -> Self {
        Self {
            subtotal: round_cents(&BigDecimal::zero()),
            tax: round_cents(&BigDecimal::zero()),
            grand_total: round_cents(&BigDecimal::zero()),
        }
    }
}
