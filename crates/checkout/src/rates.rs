//! Shipping rate and tax tables.
//!
//! Pure lookup functions; no I/O, no state.

use domain::{Address, Money, ShippingMethod};

/// Order subtotal at or above which standard shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(50_000);

const STANDARD_RATE: Money = Money::from_cents(4_900);
const EXPRESS_RATE: Money = Money::from_cents(14_900);

/// Returns the shipping cost for a method at a given order subtotal.
///
/// Standard shipping is free above the threshold; express never is.
pub fn shipping_cost(method: ShippingMethod, subtotal: Money) -> Money {
    match method {
        ShippingMethod::Standard => {
            if subtotal >= FREE_SHIPPING_THRESHOLD {
                Money::zero()
            } else {
                STANDARD_RATE
            }
        }
        ShippingMethod::Express => EXPRESS_RATE,
    }
}

/// Returns the tax rate in basis points for the destination jurisdiction.
///
/// Swedish destinations pay 25% VAT; everywhere else falls back to the 8%
/// default rate.
pub fn tax_rate_bps(address: &Address) -> u32 {
    match address.country_code().as_str() {
        "SE" | "SWEDEN" => 2_500,
        _ => 800,
    }
}
