//! Shipment status state machine and shipping methods.

use serde::{Deserialize, Serialize};

/// The status of a shipment, mirroring carrier event ordering.
///
/// Status transitions:
/// ```text
/// Pending ──► Prepared ──► Shipped ──► InTransit ──► OutForDelivery ──► Delivered
///    │           │                         │               │
///    └───────────┴──► Cancelled            └───────────────┴──► Returned
/// ```
///
/// Forward movement is strictly sequential; a carrier feed can never skip a
/// stage. `Cancelled` is reachable only before handover, `Returned` only
/// while the parcel is with the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipmentStatus {
    /// Created, not yet picked.
    #[default]
    Pending,

    /// Picked and packed.
    Prepared,

    /// Handed to the carrier.
    Shipped,

    /// Moving through the carrier network.
    InTransit,

    /// On the delivery vehicle.
    OutForDelivery,

    /// Delivered to the recipient (terminal).
    Delivered,

    /// Cancelled before carrier handover (terminal).
    Cancelled,

    /// Sent back while in the carrier network (terminal).
    Returned,
}

impl ShipmentStatus {
    /// Returns the next stage in the forward sequence, if any.
    pub fn next_in_sequence(self) -> Option<ShipmentStatus> {
        use ShipmentStatus::*;
        match self {
            Pending => Some(Prepared),
            Prepared => Some(Shipped),
            Shipped => Some(InTransit),
            InTransit => Some(OutForDelivery),
            OutForDelivery => Some(Delivered),
            Delivered | Cancelled | Returned => None,
        }
    }

    /// Returns true if the edge `self -> target` is legal.
    pub fn can_transition_to(self, target: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        if self.next_in_sequence() == Some(target) {
            return true;
        }
        matches!(
            (self, target),
            (Pending, Cancelled)
                | (Prepared, Cancelled)
                | (InTransit, Returned)
                | (OutForDelivery, Returned)
        )
    }

    /// Returns true if the shipment can still be cancelled.
    pub fn can_be_cancelled(&self) -> bool {
        self.can_transition_to(ShipmentStatus::Cancelled)
    }

    /// Returns true if no further event is legal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Cancelled | ShipmentStatus::Returned
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::Prepared => "Prepared",
            ShipmentStatus::Shipped => "Shipped",
            ShipmentStatus::InTransit => "InTransit",
            ShipmentStatus::OutForDelivery => "OutForDelivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Cancelled => "Cancelled",
            ShipmentStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shipping methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShippingMethod {
    /// Standard delivery, 3-5 business days.
    #[default]
    Standard,

    /// Express delivery, 1-2 business days.
    Express,
}

impl ShippingMethod {
    /// Returns the carrier contracted for this method.
    pub fn carrier(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "PostNord",
            ShippingMethod::Express => "DHL",
        }
    }

    /// Returns the (min, max) transit window in days.
    pub fn transit_days(&self) -> (u32, u32) {
        match self {
            ShippingMethod::Standard => (3, 5),
            ShippingMethod::Express => (1, 2),
        }
    }

    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "Standard",
            ShippingMethod::Express => "Express",
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
