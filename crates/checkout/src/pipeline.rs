//! Cart validation and quote preparation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{Address, Cart, Money, ShippingMethod};
use inventory::{InventoryError, InventoryLedger};
use serde::Serialize;
use thiserror::Error;

/// Errors from quote preparation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// An empty cart cannot be quoted.
    #[error("cart is empty")]
    EmptyCart,

    /// The destination address is unusable.
    #[error("incomplete shipping address: missing {0:?}")]
    IncompleteAddress(Vec<&'static str>),
}

/// Stock check result for one cart line.
#[derive(Debug, Clone, Serialize)]
pub struct LineStockCheck {
    pub product_id: ProductId,
    pub requested: u32,
    pub available: u32,
    pub sufficient: bool,
}

/// Outcome of cart validation: every problem found, not just the first,
/// so the storefront can show them all at once.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutValidation {
    pub valid: bool,
    pub issues: Vec<String>,
    pub line_checks: Vec<LineStockCheck>,
    pub subtotal: Money,
    pub validated_at: DateTime<Utc>,
}

/// A priced checkout quote. Purely informational: nothing is reserved and
/// stock or prices may drift before the order is created.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutQuote {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub tax_rate_bps: u32,
    pub total: Money,
    pub method: ShippingMethod,
    pub prepared_at: DateTime<Utc>,
}

/// Validates carts against live stock and prepares quotes.
pub struct CheckoutPipeline {
    ledger: Arc<dyn InventoryLedger>,
}

impl CheckoutPipeline {
    /// Creates a pipeline over the given ledger.
    pub fn new(ledger: Arc<dyn InventoryLedger>) -> Self {
        Self { ledger }
    }

    /// Checks the cart against the ledger's current availability.
    ///
    /// Advisory only: the final authority is the atomic reservation at
    /// order creation.
    #[tracing::instrument(skip(self, cart), fields(customer_id = %cart.customer_id))]
    pub async fn validate(&self, cart: &Cart) -> CheckoutValidation {
        let mut issues = Vec::new();
        let mut line_checks = Vec::new();

        if cart.is_empty() {
            issues.push("cart is empty".to_string());
        }

        for line in &cart.lines {
            let available = match self.ledger.available(&line.product_id).await {
                Ok(available) => Some(available),
                Err(InventoryError::UnknownProduct(_)) => {
                    issues.push(format!("unknown product: {}", line.product_id));
                    None
                }
                Err(err) => {
                    issues.push(err.to_string());
                    None
                }
            };

            let sufficient = available.is_some_and(|a| a >= line.quantity);
            match available {
                Some(0) => issues.push(format!("out of stock: {}", line.product_name)),
                Some(available) if !sufficient => issues.push(format!(
                    "insufficient stock for {} (requested: {}, available: {})",
                    line.product_name, line.quantity, available
                )),
                _ => {}
            }

            line_checks.push(LineStockCheck {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available: available.unwrap_or(0),
                sufficient,
            });
        }

        CheckoutValidation {
            valid: issues.is_empty(),
            issues,
            line_checks,
            subtotal: cart.subtotal(),
            validated_at: Utc::now(),
        }
    }

    /// Quotes shipping, tax, and total for the cart at a destination.
    ///
    /// Pure arithmetic over the rate tables; mutates nothing.
    pub fn prepare(
        &self,
        cart: &Cart,
        shipping_address: &Address,
        method: ShippingMethod,
    ) -> Result<CheckoutQuote, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let missing = shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::IncompleteAddress(missing));
        }

        let subtotal = cart.subtotal();
        let shipping = super::rates::shipping_cost(method, subtotal);
        let tax_rate_bps = super::rates::tax_rate_bps(shipping_address);
        let tax = subtotal.apply_rate_bps(tax_rate_bps);
        let total = subtotal + shipping + tax;

        Ok(CheckoutQuote {
            subtotal,
            shipping,
            tax,
            tax_rate_bps,
            total,
            method,
            prepared_at: Utc::now(),
        })
    }
}
