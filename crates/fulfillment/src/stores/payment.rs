//! Payment store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId};
use domain::Payment;
use tokio::sync::RwLock;

use crate::error::FulfillmentError;

/// Persistence contract for payments.
///
/// A payment belongs to exactly one order; the latest record per order wins
/// the `find_by_order` lookup (a cancelled payment may be superseded by a
/// fresh attempt).
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a brand-new payment.
    async fn insert(&self, payment: Payment) -> Result<Payment, FulfillmentError>;

    /// Loads a payment by id.
    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, FulfillmentError>;

    /// Loads the most recent payment for an order.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Payment>, FulfillmentError>;

    /// Saves a mutated payment, enforcing the version the caller loaded.
    async fn save(&self, payment: Payment) -> Result<Payment, FulfillmentError>;
}

/// In-memory payment store.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, mut payment: Payment) -> Result<Payment, FulfillmentError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id()) {
            return Err(FulfillmentError::Conflict {
                kind: "payment",
                id: payment.id().to_string(),
                expected: payment.version(),
                actual: payment.version().next(),
            });
        }
        payment.set_version(payment.version().next());
        payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, FulfillmentError> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Payment>, FulfillmentError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.order_id() == order_id)
            .max_by_key(|p| p.created_at())
            .cloned())
    }

    async fn save(&self, mut payment: Payment) -> Result<Payment, FulfillmentError> {
        let mut payments = self.payments.write().await;
        let current = payments
            .get(&payment.id())
            .ok_or_else(|| FulfillmentError::not_found("payment", payment.id()))?;

        if current.version() != payment.version() {
            return Err(FulfillmentError::Conflict {
                kind: "payment",
                id: payment.id().to_string(),
                expected: payment.version(),
                actual: current.version(),
            });
        }

        payment.set_version(payment.version().next());
        payments.insert(payment.id(), payment.clone());
        Ok(payment)
    }
}
