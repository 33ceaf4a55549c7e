//! Order store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId};
use domain::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::error::FulfillmentError;

/// Persistence contract for orders.
///
/// Orders are never deleted; cancellation is a status, not a removal.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a brand-new order.
    async fn insert(&self, order: Order) -> Result<Order, FulfillmentError>;

    /// Loads an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, FulfillmentError>;

    /// Loads an order by its human-facing order number.
    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, FulfillmentError>;

    /// Saves a mutated order, enforcing the version the caller loaded.
    ///
    /// Returns the order with its version bumped.
    async fn save(&self, order: Order) -> Result<Order, FulfillmentError>;

    /// Lists orders in a given status, oldest first.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, FulfillmentError>;

    /// Lists a customer's orders, oldest first.
    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, FulfillmentError>;
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<Order, FulfillmentError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(FulfillmentError::Conflict {
                kind: "order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: order.version().next(),
            });
        }
        order.set_version(order.version().next());
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, FulfillmentError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, FulfillmentError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.order_number() == order_number)
            .cloned())
    }

    async fn save(&self, mut order: Order) -> Result<Order, FulfillmentError> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id())
            .ok_or_else(|| FulfillmentError::not_found("order", order.id()))?;

        if current.version() != order.version() {
            return Err(FulfillmentError::Conflict {
                kind: "order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: current.version(),
            });
        }

        order.set_version(order.version().next());
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, FulfillmentError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.status() == status)
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.created_at());
        Ok(matching)
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, FulfillmentError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.created_at());
        Ok(matching)
    }
}
