//! Shipment tracking orchestration.

use std::sync::Arc;

use common::ShipmentId;
use domain::{Order, OrderStatus, Shipment, ShipmentError, ShipmentStatus, ShippingMethod};

use crate::collaborators::{
    NotificationKind, NotificationSender, notify_best_effort,
};
use crate::error::FulfillmentError;
use crate::stores::ShipmentStore;

/// A carrier tracking update to apply to a shipment.
#[derive(Debug, Clone)]
pub struct TrackingUpdate {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub note: Option<String>,
}

impl TrackingUpdate {
    /// Creates an update with just a status.
    pub fn status(status: ShipmentStatus) -> Self {
        Self {
            status,
            location: None,
            note: None,
        }
    }
}

/// Drives shipments through the carrier event machine.
pub struct ShipmentTracker {
    shipments: Arc<dyn ShipmentStore>,
    notifier: Arc<dyn NotificationSender>,
}

impl ShipmentTracker {
    /// Creates a new tracker.
    pub fn new(shipments: Arc<dyn ShipmentStore>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self {
            shipments,
            notifier,
        }
    }

    /// Creates a shipment for a confirmed order.
    ///
    /// The recipient and shipping address are snapshotted from the order at
    /// this moment; later order or customer edits do not propagate.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn create(
        &self,
        order: &Order,
        method: ShippingMethod,
        recipient_name: impl Into<String> + std::fmt::Debug,
    ) -> Result<Shipment, FulfillmentError> {
        if order.status() != OrderStatus::Confirmed {
            return Err(ShipmentError::OrderNotConfirmed {
                status: order.status(),
            }
            .into());
        }

        let shipment = Shipment::new(
            order.id(),
            method,
            recipient_name,
            order.shipping_address().clone(),
        );
        let saved = self.shipments.insert(shipment).await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(
            shipment_id = %saved.id(),
            tracking_number = saved.tracking_number(),
            carrier = saved.carrier(),
            "shipment created",
        );
        Ok(saved)
    }

    /// Applies a carrier tracking event, notifying the customer on the
    /// milestones they care about.
    ///
    /// The customer reference comes from the caller because shipments, by
    /// design, do not point back at orders or customers.
    #[tracing::instrument(skip(self, update))]
    pub async fn apply_tracking_event(
        &self,
        shipment_id: ShipmentId,
        update: TrackingUpdate,
        notify_customer: Option<common::CustomerId>,
    ) -> Result<Shipment, FulfillmentError> {
        let mut shipment = self.get(shipment_id).await?;
        shipment.apply_event(update.status, update.location, update.note)?;
        let saved = self.shipments.save(shipment).await?;

        tracing::info!(
            %shipment_id,
            status = %saved.status(),
            "tracking event applied",
        );

        if let Some(customer_id) = notify_customer
            && let Some(kind) = notification_for(saved.status())
        {
            notify_best_effort(
                self.notifier.as_ref(),
                customer_id,
                kind,
                serde_json::json!({
                    "tracking_number": saved.tracking_number(),
                    "carrier": saved.carrier(),
                    "status": saved.status().as_str(),
                }),
            )
            .await;
        }

        Ok(saved)
    }

    /// Records delivery, stamping the actual delivery date.
    pub async fn mark_delivered(
        &self,
        shipment_id: ShipmentId,
        recipient_note: Option<String>,
        notify_customer: Option<common::CustomerId>,
    ) -> Result<Shipment, FulfillmentError> {
        self.apply_tracking_event(
            shipment_id,
            TrackingUpdate {
                status: ShipmentStatus::Delivered,
                location: None,
                note: recipient_note,
            },
            notify_customer,
        )
        .await
    }

    /// Cancels a shipment that has not yet reached the carrier.
    pub async fn cancel(
        &self,
        shipment_id: ShipmentId,
        reason: impl Into<String>,
    ) -> Result<Shipment, FulfillmentError> {
        let mut shipment = self.get(shipment_id).await?;
        shipment.cancel(reason)?;
        Ok(self.shipments.save(shipment).await?)
    }

    /// Public tracking lookup by tracking number.
    ///
    /// The one unauthenticated read: customers track parcels without a
    /// session.
    pub async fn track(&self, tracking_number: &str) -> Result<Shipment, FulfillmentError> {
        self.shipments
            .find_by_tracking(tracking_number)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("shipment", tracking_number))
    }

    /// Loads a shipment, reporting `NotFound` when absent.
    pub async fn get(&self, shipment_id: ShipmentId) -> Result<Shipment, FulfillmentError> {
        self.shipments
            .get(shipment_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("shipment", shipment_id))
    }
}

/// Maps shipment milestones to customer notifications. Internal hops
/// (`Prepared`, `InTransit`) stay quiet.
fn notification_for(status: ShipmentStatus) -> Option<NotificationKind> {
    match status {
        ShipmentStatus::Shipped => Some(NotificationKind::OrderShipped),
        ShipmentStatus::Delivered => Some(NotificationKind::OrderDelivered),
        ShipmentStatus::Returned => Some(NotificationKind::ReturnReceived),
        ShipmentStatus::Pending
        | ShipmentStatus::Prepared
        | ShipmentStatus::InTransit
        | ShipmentStatus::OutForDelivery
        | ShipmentStatus::Cancelled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecordingNotificationSender;
    use crate::stores::InMemoryShipmentStore;
    use common::{CustomerId, PaymentId};
    use domain::{Address, Money, OrderCharges, OrderLine};

    fn confirmed_order() -> Order {
        let mut order = Order::new(
            CustomerId::new(),
            vec![OrderLine::new("SKU-001", "Widget", 1, Money::from_cents(1000)).unwrap()],
            OrderCharges::default(),
            Address::new("Storgatan 1", "Stockholm", "AB", "11122", "SE"),
            None,
            None,
        )
        .unwrap();
        order.confirm(PaymentId::new()).unwrap();
        order
    }

    fn setup() -> (ShipmentTracker, RecordingNotificationSender) {
        let notifier = RecordingNotificationSender::new();
        let tracker = ShipmentTracker::new(
            Arc::new(InMemoryShipmentStore::new()),
            Arc::new(notifier.clone()),
        );
        (tracker, notifier)
    }

    #[tokio::test]
    async fn create_snapshots_order_address() {
        let (tracker, _) = setup();
        let order = confirmed_order();

        let shipment = tracker
            .create(&order, ShippingMethod::Standard, "Astrid Svensson")
            .await
            .unwrap();

        assert_eq!(shipment.order_id(), order.id());
        assert_eq!(shipment.shipping_address(), order.shipping_address());
        assert_eq!(shipment.status(), ShipmentStatus::Pending);
        assert_eq!(shipment.carrier(), "PostNord");
    }

    #[tokio::test]
    async fn create_requires_confirmed_order() {
        let (tracker, _) = setup();
        let order = Order::new(
            CustomerId::new(),
            vec![OrderLine::new("SKU-001", "Widget", 1, Money::from_cents(1000)).unwrap()],
            OrderCharges::default(),
            Address::new("Storgatan 1", "Stockholm", "AB", "11122", "SE"),
            None,
            None,
        )
        .unwrap();

        let result = tracker
            .create(&order, ShippingMethod::Standard, "Astrid Svensson")
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::Shipment(
                ShipmentError::OrderNotConfirmed { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn tracking_events_advance_and_notify_milestones() {
        let (tracker, notifier) = setup();
        let order = confirmed_order();
        let customer = order.customer_id();
        let shipment = tracker
            .create(&order, ShippingMethod::Standard, "Astrid Svensson")
            .await
            .unwrap();

        for status in [
            ShipmentStatus::Prepared,
            ShipmentStatus::Shipped,
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
        ] {
            tracker
                .apply_tracking_event(
                    shipment.id(),
                    TrackingUpdate::status(status),
                    Some(customer),
                )
                .await
                .unwrap();
        }
        let delivered = tracker
            .mark_delivered(shipment.id(), Some("left at door".to_string()), Some(customer))
            .await
            .unwrap();

        assert!(delivered.is_delivered());
        assert!(delivered.actual_delivery().is_some());
        // Only the milestones notify: Shipped and Delivered.
        assert_eq!(
            notifier.sent_kinds(),
            vec![
                NotificationKind::OrderShipped,
                NotificationKind::OrderDelivered,
            ]
        );
    }

    #[tokio::test]
    async fn skipping_stages_is_rejected() {
        let (tracker, _) = setup();
        let order = confirmed_order();
        let shipment = tracker
            .create(&order, ShippingMethod::Standard, "Astrid Svensson")
            .await
            .unwrap();

        let result = tracker
            .apply_tracking_event(
                shipment.id(),
                TrackingUpdate::status(ShipmentStatus::Delivered),
                None,
            )
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::Shipment(
                ShipmentError::InvalidStatusTransition { .. }
            ))
        ));

        let unchanged = tracker.get(shipment.id()).await.unwrap();
        assert_eq!(unchanged.status(), ShipmentStatus::Pending);
    }

    #[tokio::test]
    async fn track_by_tracking_number() {
        let (tracker, _) = setup();
        let order = confirmed_order();
        let shipment = tracker
            .create(&order, ShippingMethod::Express, "Astrid Svensson")
            .await
            .unwrap();

        let tracked = tracker.track(shipment.tracking_number()).await.unwrap();
        assert_eq!(tracked.id(), shipment.id());
        assert_eq!(tracked.carrier(), "DHL");

        let result = tracker.track("TRK0000000000").await;
        assert!(matches!(result, Err(FulfillmentError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancel_before_handover() {
        let (tracker, _) = setup();
        let order = confirmed_order();
        let shipment = tracker
            .create(&order, ShippingMethod::Standard, "Astrid Svensson")
            .await
            .unwrap();

        let cancelled = tracker
            .cancel(shipment.id(), "order cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status(), ShipmentStatus::Cancelled);
    }
}
