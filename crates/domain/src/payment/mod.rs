//! Payment aggregate and related types.

mod aggregate;
mod status;

pub use aggregate::{MAX_PAYMENT_RETRIES, Payment, RefundRecord};
pub use status::PaymentStatus;

use thiserror::Error;

use crate::money::Money;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The requested edge is not in the transition table.
    #[error("invalid payment transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Refunds are only accepted against captured payments.
    #[error("payment in {status} status is not refundable")]
    NotRefundable { status: PaymentStatus },

    /// The requested refund would push the running total past the original
    /// amount.
    #[error("refund of {requested} exceeds refundable amount {refundable}")]
    RefundExceedsPayment {
        requested: Money,
        refundable: Money,
    },

    /// Refund amounts must be positive.
    #[error("refund amount must be greater than 0")]
    InvalidRefundAmount,

    /// The retry cap has been reached; the failure is permanent.
    #[error("payment retry cap of {cap} attempts exhausted")]
    RetriesExhausted { cap: u32 },
}
