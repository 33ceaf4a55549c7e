//! Deferred side-effect queue.
//!
//! A status transition that has committed is the source of truth; an external
//! side effect that fails afterwards (a refund against an unreachable
//! gateway, say) lands here for retry instead of being rolled back into the
//! status. This stands in for an outbox without binding a broker.

use std::sync::{Arc, Mutex};

use common::{OrderId, PaymentId, ShipmentId};
use domain::Money;

/// A side effect that failed after its transition committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// A refund that must eventually be issued.
    Refund {
        payment_id: PaymentId,
        order_id: OrderId,
        amount: Money,
        reason: String,
    },

    /// A shipment cancellation that must eventually reach the carrier.
    CancelShipment {
        shipment_id: ShipmentId,
        reason: String,
    },
}

/// In-process queue of deferred actions.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    actions: Arc<Mutex<Vec<DeferredAction>>>,
}

impl DeferredQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a failed side effect for later retry.
    pub fn push(&self, action: DeferredAction) {
        tracing::warn!(?action, "side effect deferred for retry");
        metrics::counter!("side_effects_deferred_total").increment(1);
        self.actions.lock().unwrap().push(action);
    }

    /// Takes every queued action, leaving the queue empty.
    pub fn drain(&self) -> Vec<DeferredAction> {
        self.actions.lock().unwrap().drain(..).collect()
    }

    /// Returns the number of queued actions.
    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
