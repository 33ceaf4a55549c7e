//! Notification sender contract and in-memory implementation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::CustomerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification templates triggered by lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderConfirmation,
    PaymentReceived,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
    RefundIssued,
    ReturnReceived,
}

/// Delivery failure. Logged by callers, never propagated into a transition.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget customer notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends a notification; the context carries template variables.
    async fn notify(
        &self,
        customer_id: CustomerId,
        kind: NotificationKind,
        context: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

/// Sends a notification and logs the outcome instead of returning it.
///
/// A failed notification must never block or roll back the transition that
/// triggered it.
pub async fn notify_best_effort(
    sender: &dyn NotificationSender,
    customer_id: CustomerId,
    kind: NotificationKind,
    context: serde_json::Value,
) {
    if let Err(err) = sender.notify(customer_id, kind, context).await {
        tracing::warn!(%customer_id, ?kind, error = %err, "notification dropped");
        metrics::counter!("notifications_dropped_total").increment(1);
    }
}

/// In-memory sender that records what would have been sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSender {
    sent: Arc<Mutex<Vec<(CustomerId, NotificationKind)>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingNotificationSender {
    /// Creates a sender that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail, for exercising the fire-and-forget path.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Returns the kinds sent so far, in order.
    pub fn sent_kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(|(_, k)| *k).collect()
    }

    /// Returns the number of notifications sent.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn notify(
        &self,
        customer_id: CustomerId,
        kind: NotificationKind,
        _context: serde_json::Value,
    ) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError("smtp unavailable".to_string()));
        }
        self.sent.lock().unwrap().push((customer_id, kind));
        Ok(())
    }
}
