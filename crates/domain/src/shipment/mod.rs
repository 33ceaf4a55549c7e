//! Shipment aggregate and related types.

mod aggregate;
mod status;

pub use aggregate::{Shipment, TrackingEvent};
pub use status::{ShipmentStatus, ShippingMethod};

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors that can occur during shipment operations.
#[derive(Debug, Error)]
pub enum ShipmentError {
    /// Carrier events must follow the sequential tracking machine.
    #[error("invalid shipment transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// Shipments exist only for confirmed orders.
    #[error("shipment requires a confirmed order, order is {status}")]
    OrderNotConfirmed { status: OrderStatus },

    /// Cancellation is only possible before the carrier takes over.
    #[error("shipment in {status} status cannot be cancelled")]
    NotCancellable { status: ShipmentStatus },
}
