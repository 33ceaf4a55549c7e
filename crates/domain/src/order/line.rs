//! Order line items.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::OrderError;

/// Maximum quantity accepted on a single order line.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// A line item on an order.
///
/// The unit price is a snapshot captured at order time; later catalog price
/// changes never affect an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    /// Creates a new order line, validating quantity and price bounds.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let product_id = product_id.into();

        if quantity == 0 || quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity {
                product_id: product_id.to_string(),
                quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if !unit_price.is_positive() {
            return Err(OrderError::InvalidPrice {
                product_id: product_id.to_string(),
                price: unit_price.cents(),
            });
        }

        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        })
    }

    /// Returns the total for this line (quantity × unit price).
    ///
    /// Pure and side-effect free; the aggregate recomputes its subtotal from
    /// this on every mutation.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_line() {
        let line = OrderLine::new("SKU-001", "Widget", 3, Money::from_cents(1000)).unwrap();
        assert_eq!(line.line_total().cents(), 3000);
    }

    #[test]
    fn zero_quantity_rejected() {
        let result = OrderLine::new("SKU-001", "Widget", 0, Money::from_cents(1000));
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn quantity_above_cap_rejected() {
        let result = OrderLine::new(
            "SKU-001",
            "Widget",
            MAX_LINE_QUANTITY + 1,
            Money::from_cents(1000),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn quantity_at_cap_accepted() {
        let line = OrderLine::new("SKU-001", "Widget", MAX_LINE_QUANTITY, Money::from_cents(1));
        assert!(line.is_ok());
    }

    #[test]
    fn non_positive_price_rejected() {
        assert!(matches!(
            OrderLine::new("SKU-001", "Widget", 1, Money::zero()),
            Err(OrderError::InvalidPrice { .. })
        ));
        assert!(matches!(
            OrderLine::new("SKU-001", "Widget", 1, Money::from_cents(-5)),
            Err(OrderError::InvalidPrice { .. })
        ));
    }
}
