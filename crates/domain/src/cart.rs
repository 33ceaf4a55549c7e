//! Shopping cart snapshot.

use common::{CustomerId, ProductId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A line in a customer's cart.
///
/// The unit price is captured when the line is added; it feeds the order
/// line's price snapshot at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total for this line (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A customer's cart at a point in time.
///
/// An order is produced from a cart snapshot; the cart itself is transient
/// and is cleared by the caller after a successful checkout. Orders never
/// hold a reference back to the cart they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: CustomerId,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart for a customer.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
        }
    }

    /// Creates a cart with the given lines.
    pub fn with_lines(customer_id: CustomerId, lines: Vec<CartLine>) -> Self {
        Self { customer_id, lines }
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the running subtotal across all lines.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
