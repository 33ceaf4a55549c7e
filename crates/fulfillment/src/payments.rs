//! Payment orchestration against the external gateway.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{OrderId, PaymentId};
use domain::{Money, Order, Payment, PaymentError, PaymentStatus};

use crate::collaborators::{
    GatewaySettlement, NotificationKind, NotificationSender, PaymentGateway, notify_best_effort,
};
use crate::error::FulfillmentError;
use crate::stores::PaymentStore;

/// Minutes after which a payment still pending is re-checked against the
/// gateway instead of assumed lost.
pub const STALENESS_THRESHOLD_MINUTES: i64 = 5;

/// How long a gateway charge may take before the attempt is abandoned.
///
/// On timeout the payment is left pending for reconciliation — a
/// slow-but-successful remote charge must not be retried blindly, or the
/// customer is charged twice.
const DEFAULT_CHARGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Caller-supplied details for a charge attempt.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Tokenized payment method from the payment form.
    pub method_token: String,
    /// Currency override; defaults to USD.
    pub currency: Option<String>,
}

impl PaymentRequest {
    /// Creates a request for the given method token.
    pub fn new(method_token: impl Into<String>) -> Self {
        Self {
            method_token: method_token.into(),
            currency: None,
        }
    }

    fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }
}

/// Drives payments through their state machine against the gateway.
pub struct PaymentOrchestrator {
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSender>,
    charge_timeout: Duration,
    staleness_threshold: chrono::Duration,
}

impl PaymentOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            payments,
            gateway,
            notifier,
            charge_timeout: DEFAULT_CHARGE_TIMEOUT,
            staleness_threshold: chrono::Duration::minutes(STALENESS_THRESHOLD_MINUTES),
        }
    }

    /// Overrides the gateway charge timeout.
    pub fn with_charge_timeout(mut self, timeout: Duration) -> Self {
        self.charge_timeout = timeout;
        self
    }

    /// Overrides the staleness threshold for `verify_status`.
    pub fn with_staleness_threshold(mut self, threshold: chrono::Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Charges the order total, driving the payment record.
    ///
    /// Idempotent per order: an already-captured payment is returned as-is
    /// without touching the gateway; a failed one is retried through the
    /// capped `Failed -> Pending` edge. On timeout the payment stays pending
    /// and the caller gets a retryable failure — `verify_status` reconciles
    /// it later.
    #[tracing::instrument(skip(self, order, request), fields(order_id = %order.id()))]
    pub async fn process(
        &self,
        order: &Order,
        request: &PaymentRequest,
    ) -> Result<Payment, FulfillmentError> {
        let payment = match self.payments.find_by_order(order.id()).await? {
            Some(existing) => match existing.status() {
                PaymentStatus::Completed
                | PaymentStatus::Refunded
                | PaymentStatus::PartiallyRefunded => {
                    tracing::info!(payment_id = %existing.id(), "payment already captured");
                    return Ok(existing);
                }
                PaymentStatus::Failed => {
                    let mut retried = existing;
                    retried.retry().map_err(|err| match err {
                        PaymentError::RetriesExhausted { cap } => {
                            FulfillmentError::PaymentFailure {
                                reason: format!("retry cap of {cap} attempts exhausted"),
                                retryable: false,
                            }
                        }
                        other => other.into(),
                    })?;
                    self.payments.save(retried).await?
                }
                PaymentStatus::Pending | PaymentStatus::Authorized => existing,
                PaymentStatus::Cancelled => {
                    self.payments
                        .insert(Payment::new(order.id(), order.total(), request.currency()))
                        .await?
                }
            },
            None => {
                self.payments
                    .insert(Payment::new(order.id(), order.total(), request.currency()))
                    .await?
            }
        };

        self.charge(order, payment, request).await
    }

    async fn charge(
        &self,
        order: &Order,
        mut payment: Payment,
        request: &PaymentRequest,
    ) -> Result<Payment, FulfillmentError> {
        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            self.charge_timeout,
            self.gateway.charge(
                payment.transaction_id(),
                payment.amount(),
                payment.currency(),
                &request.method_token,
            ),
        )
        .await;
        metrics::histogram!("payment_gateway_seconds").record(started.elapsed().as_secs_f64());

        let charge = match outcome {
            Err(_elapsed) => {
                // The remote call may still have succeeded; leave the
                // payment pending and reconcile through verify_status.
                tracing::warn!(payment_id = %payment.id(), "gateway charge timed out");
                return Err(FulfillmentError::PaymentFailure {
                    reason: "payment gateway timed out".to_string(),
                    retryable: true,
                });
            }
            Ok(Err(err)) => {
                tracing::warn!(payment_id = %payment.id(), error = %err, "gateway unreachable");
                return Err(FulfillmentError::DependencyUnavailable(err.to_string()));
            }
            Ok(Ok(charge)) => charge,
        };

        if charge.success {
            if payment.status() == PaymentStatus::Pending {
                payment.authorize()?;
            }
            payment.complete(charge.transaction_id)?;
            let saved = self.payments.save(payment).await?;

            metrics::counter!("payments_captured_total").increment(1);
            tracing::info!(payment_id = %saved.id(), amount = %saved.amount(), "payment captured");

            notify_best_effort(
                self.notifier.as_ref(),
                order.customer_id(),
                NotificationKind::PaymentReceived,
                serde_json::json!({
                    "order_number": order.order_number(),
                    "amount": saved.amount().to_string(),
                    "currency": saved.currency(),
                }),
            )
            .await;

            Ok(saved)
        } else {
            let reason = charge
                .failure_reason
                .unwrap_or_else(|| "declined".to_string());
            payment.fail(&reason)?;
            let retryable = payment.can_retry();
            self.payments.save(payment).await?;

            metrics::counter!("payments_failed_total").increment(1);
            Err(FulfillmentError::PaymentFailure { reason, retryable })
        }
    }

    /// Refunds part or all of a captured payment.
    ///
    /// Bounds are validated before the gateway is involved; the running
    /// refunded total can never exceed the captured amount.
    #[tracing::instrument(skip(self, reason))]
    pub async fn refund(
        &self,
        payment_id: PaymentId,
        amount: Money,
        reason: impl Into<String> + std::fmt::Debug,
    ) -> Result<Payment, FulfillmentError> {
        let mut payment = self.get(payment_id).await?;

        if !payment.status().is_refundable() {
            return Err(PaymentError::NotRefundable {
                status: payment.status(),
            }
            .into());
        }
        if !amount.is_positive() {
            return Err(PaymentError::InvalidRefundAmount.into());
        }
        let refundable = payment.refundable_amount();
        if amount > refundable {
            return Err(PaymentError::RefundExceedsPayment {
                requested: amount,
                refundable,
            }
            .into());
        }

        let gateway_id = payment
            .gateway_payment_id()
            .ok_or_else(|| {
                FulfillmentError::Validation(vec![format!(
                    "payment {payment_id} has no gateway settlement id"
                )])
            })?
            .to_string();

        let accepted = self
            .gateway
            .refund(&gateway_id, amount)
            .await
            .map_err(|err| FulfillmentError::DependencyUnavailable(err.to_string()))?;
        if !accepted {
            return Err(FulfillmentError::PaymentFailure {
                reason: "gateway refused the refund".to_string(),
                retryable: true,
            });
        }

        payment.apply_refund(amount, reason.into())?;
        let saved = self.payments.save(payment).await?;

        metrics::counter!("payments_refunded_total").increment(1);
        tracing::info!(
            %payment_id,
            amount = %amount,
            status = %saved.status(),
            "refund applied",
        );
        Ok(saved)
    }

    /// Re-queries the gateway for a payment stuck pending beyond the
    /// staleness threshold and reconciles the local record.
    ///
    /// This is the recovery path for lost gateway callbacks.
    #[tracing::instrument(skip(self))]
    pub async fn verify_status(&self, payment_id: PaymentId) -> Result<Payment, FulfillmentError> {
        let mut payment = self.get(payment_id).await?;

        if payment.status() != PaymentStatus::Pending {
            return Ok(payment);
        }
        if Utc::now() - payment.created_at() < self.staleness_threshold {
            return Ok(payment);
        }

        let settlement = self
            .gateway
            .lookup(payment.transaction_id())
            .await
            .map_err(|err| FulfillmentError::DependencyUnavailable(err.to_string()))?;

        match settlement {
            GatewaySettlement::Completed => {
                let reference = payment.transaction_id().to_string();
                payment.authorize()?;
                payment.complete(reference)?;
                let saved = self.payments.save(payment).await?;
                metrics::counter!("payments_reconciled_total").increment(1);
                tracing::info!(%payment_id, "stale pending payment reconciled as captured");
                Ok(saved)
            }
            GatewaySettlement::Failed => {
                payment.fail("reported failed by gateway on reconciliation")?;
                Ok(self.payments.save(payment).await?)
            }
            GatewaySettlement::Pending => Ok(payment),
        }
    }

    /// Abandons an unsettled payment.
    pub async fn cancel(
        &self,
        payment_id: PaymentId,
        reason: impl Into<String>,
    ) -> Result<Payment, FulfillmentError> {
        let mut payment = self.get(payment_id).await?;
        payment.cancel(reason)?;
        Ok(self.payments.save(payment).await?)
    }

    /// Loads a payment, reporting `NotFound` when absent.
    pub async fn get(&self, payment_id: PaymentId) -> Result<Payment, FulfillmentError> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("payment", payment_id))
    }

    /// Loads the most recent payment for an order.
    pub async fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, FulfillmentError> {
        self.payments.find_by_order(order_id).await
    }
}
