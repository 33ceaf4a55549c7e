//! Shipment aggregate implementation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{OrderId, ShipmentId, Version};
use serde::{Deserialize, Serialize};

use crate::address::Address;

use super::{ShipmentError, ShipmentStatus, ShippingMethod};

/// A recorded carrier tracking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Shipment record for a single order (1:1).
///
/// The recipient and address are snapshots taken from the order at creation
/// time; later order or customer edits do not reach the shipment. Status
/// moves only through `apply_event`, which enforces the sequential machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    order_id: OrderId,
    carrier: String,
    method: ShippingMethod,
    tracking_number: String,
    status: ShipmentStatus,

    recipient_name: String,
    shipping_address: Address,

    estimated_delivery: Option<NaiveDate>,
    actual_delivery: Option<NaiveDate>,

    history: Vec<TrackingEvent>,

    created_at: DateTime<Utc>,
    version: Version,
}

impl Shipment {
    /// Creates a pending shipment, snapshotting recipient and address.
    ///
    /// The estimated delivery date comes from the method's outer transit
    /// window.
    pub fn new(
        order_id: OrderId,
        method: ShippingMethod,
        recipient_name: impl Into<String>,
        shipping_address: Address,
    ) -> Self {
        let id = ShipmentId::new();
        let now = Utc::now();
        let (_, max_days) = method.transit_days();
        Self {
            id,
            order_id,
            carrier: method.carrier().to_string(),
            method,
            tracking_number: generate_tracking_number(&id),
            status: ShipmentStatus::Pending,
            recipient_name: recipient_name.into(),
            shipping_address,
            estimated_delivery: Some((now + Duration::days(max_days as i64)).date_naive()),
            actual_delivery: None,
            history: Vec::new(),
            created_at: now,
            version: Version::initial(),
        }
    }

    /// Applies a carrier tracking event.
    ///
    /// Validates the edge, appends to the history, and stamps the actual
    /// delivery date when the parcel arrives.
    pub fn apply_event(
        &mut self,
        status: ShipmentStatus,
        location: Option<String>,
        note: Option<String>,
    ) -> Result<&TrackingEvent, ShipmentError> {
        if !self.status.can_transition_to(status) {
            return Err(ShipmentError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }

        let now = Utc::now();
        self.status = status;
        if status == ShipmentStatus::Delivered {
            self.actual_delivery = Some(now.date_naive());
        }
        self.history.push(TrackingEvent {
            status,
            location,
            note,
            recorded_at: now,
        });
        // Just pushed, so the history is non-empty.
        Ok(self.history.last().unwrap())
    }

    /// Cancels the shipment before carrier handover.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), ShipmentError> {
        if !self.status.can_be_cancelled() {
            return Err(ShipmentError::NotCancellable {
                status: self.status,
            });
        }
        self.apply_event(ShipmentStatus::Cancelled, None, Some(reason.into()))?;
        Ok(())
    }
}

// Query methods
impl Shipment {
    pub fn id(&self) -> ShipmentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    pub fn method(&self) -> ShippingMethod {
        self.method
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn estimated_delivery(&self) -> Option<NaiveDate> {
        self.estimated_delivery
    }

    pub fn actual_delivery(&self) -> Option<NaiveDate> {
        self.actual_delivery
    }

    pub fn history(&self) -> &[TrackingEvent] {
        &self.history
    }

    pub fn is_delivered(&self) -> bool {
        self.status == ShipmentStatus::Delivered
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

fn generate_tracking_number(id: &ShipmentId) -> String {
    format!("TRK{:010}", id.as_uuid().as_fields().0)
}
