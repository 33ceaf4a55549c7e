//! Checkout pipeline for the order fulfillment core.
//!
//! Bridges a cart to an order creation request in two advisory steps:
//! `validate` checks the cart against live stock and reports every problem
//! at once, and `prepare` quotes shipping, tax, and total without touching
//! cart or inventory. Neither takes a lock: the quote and the eventual
//! order creation are deliberately not atomic, and creation-time
//! reservation remains the final authority on stock.

mod pipeline;
mod rates;

pub use pipeline::{
    CheckoutError, CheckoutPipeline, CheckoutQuote, CheckoutValidation, LineStockCheck,
};
pub use rates::{FREE_SHIPPING_THRESHOLD, shipping_cost, tax_rate_bps};
