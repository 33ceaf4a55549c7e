//! Payment aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, Version};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::{PaymentError, PaymentStatus};

/// Maximum number of charge attempts before a failure becomes permanent.
pub const MAX_PAYMENT_RETRIES: u32 = 3;

/// One refund applied against a payment. The list is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub amount: Money,
    pub reason: String,
    pub refunded_at: DateTime<Utc>,
}

/// Payment record for a single order (1:1).
///
/// The running refunded total can never exceed the captured amount, and the
/// status reaches `Refunded` only when the totals are exactly equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    amount: Money,
    currency: String,
    status: PaymentStatus,

    /// Our reference passed to the gateway on every attempt.
    transaction_id: String,
    /// The gateway's id for the settled charge.
    gateway_payment_id: Option<String>,

    refunded: Money,
    refunds: Vec<RefundRecord>,

    retry_count: u32,
    failure_reason: Option<String>,

    created_at: DateTime<Utc>,
    captured_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,

    version: Version,
}

impl Payment {
    /// Creates a new pending payment for an order.
    pub fn new(order_id: OrderId, amount: Money, currency: impl Into<String>) -> Self {
        let id = PaymentId::new();
        Self {
            id,
            order_id,
            amount,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            transaction_id: generate_transaction_id(&id),
            gateway_payment_id: None,
            refunded: Money::zero(),
            refunds: Vec::new(),
            retry_count: 0,
            failure_reason: None,
            created_at: Utc::now(),
            captured_at: None,
            refunded_at: None,
            version: Version::initial(),
        }
    }

    fn transition(&mut self, target: PaymentStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(target) {
            return Err(PaymentError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Records the gateway authorization.
    pub fn authorize(&mut self) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Authorized)
    }

    /// Records the capture, storing the gateway's settlement id.
    pub fn complete(&mut self, gateway_payment_id: impl Into<String>) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Completed)?;
        self.gateway_payment_id = Some(gateway_payment_id.into());
        self.failure_reason = None;
        self.captured_at = Some(Utc::now());
        Ok(())
    }

    /// Records a failed attempt, incrementing the retry counter.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Failed)?;
        self.retry_count += 1;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Returns the payment to Pending for another attempt.
    ///
    /// The only backward edge in the machine, guarded by the retry cap.
    pub fn retry(&mut self) -> Result<(), PaymentError> {
        if self.status == PaymentStatus::Failed && self.retry_count >= MAX_PAYMENT_RETRIES {
            return Err(PaymentError::RetriesExhausted {
                cap: MAX_PAYMENT_RETRIES,
            });
        }
        self.transition(PaymentStatus::Pending)
    }

    /// Abandons an unsettled payment.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Cancelled)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Applies a refund against the captured amount.
    ///
    /// The status becomes `Refunded` only when the running total reaches the
    /// original amount exactly; otherwise `PartiallyRefunded`.
    pub fn apply_refund(
        &mut self,
        amount: Money,
        reason: impl Into<String>,
    ) -> Result<(), PaymentError> {
        if !self.status.is_refundable() {
            return Err(PaymentError::NotRefundable {
                status: self.status,
            });
        }
        if !amount.is_positive() {
            return Err(PaymentError::InvalidRefundAmount);
        }
        let refundable = self.refundable_amount();
        if amount > refundable {
            return Err(PaymentError::RefundExceedsPayment {
                requested: amount,
                refundable,
            });
        }

        self.refunded += amount;
        let now = Utc::now();
        self.refunds.push(RefundRecord {
            amount,
            reason: reason.into(),
            refunded_at: now,
        });
        self.refunded_at = Some(now);

        let target = if self.refunded == self.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        // PartiallyRefunded -> PartiallyRefunded is not an edge; only move
        // when the status actually changes.
        if self.status != target {
            self.transition(target)?;
        }
        Ok(())
    }
}

// Query methods
impl Payment {
    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.gateway_payment_id.as_deref()
    }

    /// Running total of all refunds applied so far.
    pub fn refunded(&self) -> Money {
        self.refunded
    }

    /// Append-only audit trail of refunds.
    pub fn refunds(&self) -> &[RefundRecord] {
        &self.refunds
    }

    /// Amount still available for refund.
    pub fn refundable_amount(&self) -> Money {
        if self.status.is_refundable() {
            self.amount - self.refunded
        } else {
            Money::zero()
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns true if another charge attempt is allowed.
    pub fn can_retry(&self) -> bool {
        self.status == PaymentStatus::Failed && self.retry_count < MAX_PAYMENT_RETRIES
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

fn generate_transaction_id(id: &PaymentId) -> String {
    format!("TXN-{:08X}", id.as_uuid().as_fields().0)
}
