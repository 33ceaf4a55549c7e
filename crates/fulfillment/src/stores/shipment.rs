//! Shipment store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ShipmentId};
use domain::{Shipment, ShipmentStatus};
use tokio::sync::RwLock;

use crate::error::FulfillmentError;

/// Persistence contract for shipments.
///
/// One live (non-cancelled) shipment per order; `insert` enforces the 1:1
/// relationship the order's `shipment_id` reference assumes.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Inserts a brand-new shipment, rejecting a second live one per order.
    async fn insert(&self, shipment: Shipment) -> Result<Shipment, FulfillmentError>;

    /// Loads a shipment by id.
    async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, FulfillmentError>;

    /// Loads the live shipment for an order, if any.
    async fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Shipment>, FulfillmentError>;

    /// Loads a shipment by tracking number (the public lookup).
    async fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, FulfillmentError>;

    /// Saves a mutated shipment, enforcing the version the caller loaded.
    async fn save(&self, shipment: Shipment) -> Result<Shipment, FulfillmentError>;
}

/// In-memory shipment store.
#[derive(Clone, Default)]
pub struct InMemoryShipmentStore {
    shipments: Arc<RwLock<HashMap<ShipmentId, Shipment>>>,
}

impl InMemoryShipmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, mut shipment: Shipment) -> Result<Shipment, FulfillmentError> {
        let mut shipments = self.shipments.write().await;

        let has_live = shipments.values().any(|s| {
            s.order_id() == shipment.order_id() && s.status() != ShipmentStatus::Cancelled
        });
        if has_live {
            return Err(FulfillmentError::Validation(vec![format!(
                "order {} already has a live shipment",
                shipment.order_id()
            )]));
        }

        shipment.set_version(shipment.version().next());
        shipments.insert(shipment.id(), shipment.clone());
        Ok(shipment)
    }

    async fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, FulfillmentError> {
        Ok(self.shipments.read().await.get(&id).cloned())
    }

    async fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Shipment>, FulfillmentError> {
        Ok(self
            .shipments
            .read()
            .await
            .values()
            .find(|s| s.order_id() == order_id && s.status() != ShipmentStatus::Cancelled)
            .cloned())
    }

    async fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, FulfillmentError> {
        Ok(self
            .shipments
            .read()
            .await
            .values()
            .find(|s| s.tracking_number() == tracking_number)
            .cloned())
    }

    async fn save(&self, mut shipment: Shipment) -> Result<Shipment, FulfillmentError> {
        let mut shipments = self.shipments.write().await;
        let current = shipments
            .get(&shipment.id())
            .ok_or_else(|| FulfillmentError::not_found("shipment", shipment.id()))?;

        if current.version() != shipment.version() {
            return Err(FulfillmentError::Conflict {
                kind: "shipment",
                id: shipment.id().to_string(),
                expected: shipment.version(),
                actual: current.version(),
            });
        }

        shipment.set_version(shipment.version().next());
        shipments.insert(shipment.id(), shipment.clone());
        Ok(shipment)
    }
}
