//! Fulfillment error taxonomy.

use common::Version;
use domain::{OrderError, PaymentError, ShipmentError};
use inventory::InventoryError;
use thiserror::Error;

/// Errors reported by the coordination layer.
///
/// Business-rule violations are typed results, never panics, so callers can
/// tell a rejected request from a bug. The transport layer maps each variant
/// to an HTTP status.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Order state machine violation.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Payment state machine violation.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Shipment state machine violation.
    #[error(transparent)]
    Shipment(#[from] ShipmentError),

    /// Inventory violation, including insufficient stock.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Malformed input; every problem found, not just the first.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The gateway rejected the charge or the attempt timed out.
    ///
    /// `retryable` tells the caller whether resubmitting can succeed.
    #[error("payment failure: {reason} (retryable: {retryable})")]
    PaymentFailure { reason: String, retryable: bool },

    /// An external collaborator is unreachable; transient infrastructure
    /// failure, not a business rejection.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Optimistic-concurrency conflict on save.
    #[error("concurrent modification of {kind} {id}: expected version {expected}, found {actual}")]
    Conflict {
        kind: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },
}

impl FulfillmentError {
    /// Shorthand for a not-found error.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
