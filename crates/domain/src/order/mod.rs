//! Order aggregate and related types.

mod aggregate;
mod line;
mod status;

pub use aggregate::{Order, OrderCharges, RETURN_WINDOW_DAYS};
pub use line::{MAX_LINE_QUANTITY, OrderLine};
pub use status::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested edge is not in the transition table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Order has no lines.
    #[error("order has no lines")]
    NoLines,

    /// Line quantity is outside the accepted range.
    #[error("invalid quantity {quantity} for {product_id} (must be 1..={max})")]
    InvalidQuantity {
        product_id: String,
        quantity: u32,
        max: u32,
    },

    /// Line unit price must be positive.
    #[error("invalid unit price {price} for {product_id} (must be greater than 0)")]
    InvalidPrice { product_id: String, price: i64 },

    /// The shipping address is unusable.
    #[error("incomplete shipping address: missing {0:?}")]
    IncompleteAddress(Vec<&'static str>),

    /// The return window has elapsed.
    #[error("return window of {window_days} days has elapsed (delivered {delivered_at})")]
    ReturnWindowElapsed {
        delivered_at: chrono::DateTime<chrono::Utc>,
        window_days: i64,
    },
}
