//! Order aggregate implementation.

use chrono::{DateTime, Duration, Utc};
use common::{CustomerId, OrderId, PaymentId, ShipmentId, Version};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::money::Money;

use super::{OrderError, OrderLine, OrderStatus};

/// Days after delivery during which a return is accepted.
pub const RETURN_WINDOW_DAYS: i64 = 30;

/// Caller-supplied charges applied on top of the line subtotal.
///
/// The subtotal itself is never taken from the caller; it is recomputed from
/// the lines on every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCharges {
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
}

/// Order aggregate root.
///
/// Owns its lines by value and references the sibling payment and shipment
/// records by id only. All mutation goes through the transition methods,
/// which validate the edge against the status table and stamp the matching
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    lines: Vec<OrderLine>,
    status: OrderStatus,

    subtotal: Money,
    charges: OrderCharges,
    total: Money,

    shipping_address: Address,
    billing_address: Address,

    payment_id: Option<PaymentId>,
    shipment_id: Option<ShipmentId>,

    customer_note: Option<String>,
    cancellation_reason: Option<String>,
    return_reason: Option<String>,

    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    returned_at: Option<DateTime<Utc>>,

    version: Version,
}

impl Order {
    /// Creates a new pending order from a validated cart snapshot.
    ///
    /// The billing address defaults to the shipping address when absent,
    /// matching how most checkouts submit a single address.
    pub fn new(
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        charges: OrderCharges,
        shipping_address: Address,
        billing_address: Option<Address>,
        customer_note: Option<String>,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }

        let missing = shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::IncompleteAddress(missing));
        }

        let id = OrderId::new();
        let mut order = Self {
            id,
            order_number: generate_order_number(&id),
            customer_id,
            lines,
            status: OrderStatus::Pending,
            subtotal: Money::zero(),
            charges,
            total: Money::zero(),
            billing_address: billing_address.unwrap_or_else(|| shipping_address.clone()),
            shipping_address,
            payment_id: None,
            shipment_id: None,
            customer_note,
            cancellation_reason: None,
            return_reason: None,
            created_at: Utc::now(),
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            returned_at: None,
            version: Version::initial(),
        };
        order.recalculate_totals();
        Ok(order)
    }

    /// Recomputes the subtotal from the lines and the grand total from the
    /// charge breakdown.
    ///
    /// Invariant: `total == subtotal + tax + shipping - discount`.
    fn recalculate_totals(&mut self) {
        self.subtotal = self.lines.iter().map(OrderLine::line_total).sum();
        self.total =
            self.subtotal + self.charges.tax + self.charges.shipping - self.charges.discount;
    }

    /// Validates and performs a status transition.
    fn transition(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}

// Transition methods
impl Order {
    /// Confirms the order after a successful payment capture.
    pub fn confirm(&mut self, payment_id: PaymentId) -> Result<(), OrderError> {
        self.transition(OrderStatus::Confirmed)?;
        self.payment_id = Some(payment_id);
        self.confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the order as handed to the carrier.
    pub fn mark_shipped(&mut self, shipment_id: ShipmentId) -> Result<(), OrderError> {
        self.transition(OrderStatus::Shipped)?;
        self.shipment_id = Some(shipment_id);
        self.shipped_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the order as delivered.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Delivered)?;
        self.delivered_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels the order. Legal from Pending, Confirmed, or Shipped.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)?;
        self.cancellation_reason = Some(reason.into());
        self.cancelled_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the order as returned. Legal only from Delivered, within the
    /// return window.
    pub fn mark_returned(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if self.status == OrderStatus::Delivered
            && let Some(delivered_at) = self.delivered_at
            && Utc::now() - delivered_at > Duration::days(RETURN_WINDOW_DAYS)
        {
            return Err(OrderError::ReturnWindowElapsed {
                delivered_at,
                window_days: RETURN_WINDOW_DAYS,
            });
        }
        self.transition(OrderStatus::Returned)?;
        self.return_reason = Some(reason.into());
        self.returned_at = Some(Utc::now());
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Human-facing order number, used on confirmations and lookups.
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn charges(&self) -> OrderCharges {
        self.charges
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    pub fn payment_id(&self) -> Option<PaymentId> {
        self.payment_id
    }

    pub fn shipment_id(&self) -> Option<ShipmentId> {
        self.shipment_id
    }

    pub fn customer_note(&self) -> Option<&str> {
        self.customer_note.as_deref()
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn return_reason(&self) -> Option<&str> {
        self.return_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version; called by the store after a successful save.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn generate_order_number(id: &OrderId) -> String {
    let uuid = id.as_uuid();
    format!("ORD-{:08X}", uuid.as_fields().0)
}
