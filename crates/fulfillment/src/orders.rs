//! Order lifecycle management.
//!
//! Every transition follows the same discipline: validate the edge, stage
//! the status change and timestamp, commit through the store's optimistic
//! concurrency check, then run the side effects that hang off the
//! transition. Local inventory moves happen with the commit; external
//! effects (refunds, notifications) run after it and are deferred on
//! failure rather than rolled back — the committed status is the source of
//! truth.

use std::sync::Arc;

use common::{CustomerId, OrderId};
use domain::{
    Cart, Order, OrderCharges, OrderError, OrderLine, OrderStatus, Payment, PaymentStatus,
    ShippingMethod,
};
use inventory::{InventoryLedger, StockLine};

use crate::collaborators::{
    CustomerDirectory, NotificationKind, NotificationSender, notify_best_effort,
};
use crate::deferred::{DeferredAction, DeferredQueue};
use crate::error::FulfillmentError;
use crate::payments::{PaymentOrchestrator, PaymentRequest};
use crate::shipments::ShipmentTracker;
use crate::stores::OrderStore;

/// Everything needed to materialize an order from a validated cart.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub cart: Cart,
    /// Shipping address; falls back to the customer's default address.
    pub shipping_address: Option<domain::Address>,
    /// Billing address; falls back to the shipping address.
    pub billing_address: Option<domain::Address>,
    /// Tax, shipping, and discount from the checkout quote.
    pub charges: OrderCharges,
    pub customer_note: Option<String>,
}

/// Owns the order state machine and coordinates the other components on
/// every transition.
pub struct OrderLifecycleManager {
    orders: Arc<dyn OrderStore>,
    ledger: Arc<dyn InventoryLedger>,
    payments: PaymentOrchestrator,
    shipments: ShipmentTracker,
    customers: Arc<dyn CustomerDirectory>,
    notifier: Arc<dyn NotificationSender>,
    deferred: DeferredQueue,
}

impl OrderLifecycleManager {
    /// Creates a new lifecycle manager.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        ledger: Arc<dyn InventoryLedger>,
        payments: PaymentOrchestrator,
        shipments: ShipmentTracker,
        customers: Arc<dyn CustomerDirectory>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            orders,
            ledger,
            payments,
            shipments,
            customers,
            notifier,
            deferred: DeferredQueue::new(),
        }
    }

    /// Returns the payment orchestrator for direct payment operations.
    pub fn payments(&self) -> &PaymentOrchestrator {
        &self.payments
    }

    /// Returns the shipment tracker for direct shipment operations.
    pub fn shipments(&self) -> &ShipmentTracker {
        &self.shipments
    }

    /// Returns the deferred side-effect queue.
    pub fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    /// Creates a pending order from a cart snapshot, reserving inventory
    /// for every line.
    ///
    /// Reservation is all-or-nothing: if any line cannot be reserved, holds
    /// already placed for earlier lines are released and no order is
    /// persisted.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.cart.customer_id))]
    pub async fn create(&self, request: CreateOrderRequest) -> Result<Order, FulfillmentError> {
        let customer_id = request.cart.customer_id;
        let customer = self
            .customers
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("customer", customer_id))?;

        // Aggregate every problem instead of stopping at the first, so the
        // storefront can show them all at once.
        let mut issues = Vec::new();
        if request.cart.is_empty() {
            issues.push("cart is empty".to_string());
        }

        let shipping_address = request
            .shipping_address
            .or(customer.default_address)
            .unwrap_or_else(|| {
                issues.push("no shipping address provided and customer has no default".to_string());
                domain::Address::new("", "", "", "", "")
            });
        for field in shipping_address.missing_fields() {
            issues.push(format!("shipping address is missing {field}"));
        }

        let mut lines = Vec::with_capacity(request.cart.lines.len());
        for cart_line in &request.cart.lines {
            match OrderLine::new(
                cart_line.product_id.clone(),
                cart_line.product_name.clone(),
                cart_line.quantity,
                cart_line.unit_price,
            ) {
                Ok(line) => lines.push(line),
                Err(err) => issues.push(err.to_string()),
            }
        }

        if !issues.is_empty() {
            return Err(FulfillmentError::Validation(issues));
        }

        let stock_lines: Vec<StockLine> = lines
            .iter()
            .map(|l| StockLine::new(l.product_id.clone(), l.quantity))
            .collect();
        self.ledger.reserve_all(&stock_lines).await?;

        let order = match Order::new(
            customer_id,
            lines,
            request.charges,
            shipping_address,
            request.billing_address,
            request.customer_note,
        ) {
            Ok(order) => order,
            Err(err) => {
                self.release_lines(&stock_lines).await;
                return Err(err.into());
            }
        };

        let saved = match self.orders.insert(order).await {
            Ok(saved) => saved,
            Err(err) => {
                self.release_lines(&stock_lines).await;
                return Err(err);
            }
        };

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %saved.id(),
            order_number = saved.order_number(),
            total = %saved.total(),
            "order created",
        );

        notify_best_effort(
            self.notifier.as_ref(),
            customer_id,
            NotificationKind::OrderConfirmation,
            serde_json::json!({
                "order_number": saved.order_number(),
                "total": saved.total().to_string(),
            }),
        )
        .await;

        Ok(saved)
    }

    /// Captures payment for a pending order and confirms it.
    ///
    /// A payment that settles after the order was concurrently cancelled is
    /// refunded automatically — never dropped, never kept as revenue.
    #[tracing::instrument(skip(self, request))]
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        request: &PaymentRequest,
    ) -> Result<Order, FulfillmentError> {
        let order = self.get_order(order_id).await?;
        if !order.status().can_transition_to(OrderStatus::Confirmed) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status(),
                to: OrderStatus::Confirmed,
            }
            .into());
        }

        let payment = self.payments.process(&order, request).await?;

        // Reload: the order may have moved while the gateway call was in
        // flight.
        let mut order = self.get_order(order_id).await?;
        match order.confirm(payment.id()) {
            Ok(()) => {
                let saved = self.orders.save(order).await?;

                for line in saved.lines() {
                    if let Err(err) = self.ledger.confirm(&line.product_id, line.quantity).await {
                        tracing::error!(
                            order_id = %saved.id(),
                            product_id = %line.product_id,
                            error = %err,
                            "reservation confirm failed",
                        );
                    }
                }

                metrics::counter!("orders_confirmed_total").increment(1);
                tracing::info!(order_id = %saved.id(), "order confirmed");
                Ok(saved)
            }
            Err(err) => {
                if order.status() == OrderStatus::Cancelled {
                    // Compensating action: the charge settled but the order
                    // is gone.
                    self.refund_in_full(&payment, "payment settled after order cancellation")
                        .await;
                    metrics::counter!("payments_compensated_total").increment(1);
                }
                Err(err.into())
            }
        }
    }

    /// Cancels an order, releasing its inventory and refunding any captured
    /// payment.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        reason: impl Into<String> + std::fmt::Debug,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.get_order(order_id).await?;
        order.cancel(reason)?;
        let saved = self.orders.save(order).await?;

        let stock_lines: Vec<StockLine> = saved
            .lines()
            .iter()
            .map(|l| StockLine::new(l.product_id.clone(), l.quantity))
            .collect();
        self.release_lines(&stock_lines).await;

        if let Some(payment) = self.payments.find_by_order(order_id).await? {
            match payment.status() {
                PaymentStatus::Completed | PaymentStatus::PartiallyRefunded => {
                    self.refund_in_full(&payment, "order cancelled").await;
                }
                PaymentStatus::Pending | PaymentStatus::Authorized => {
                    // The attempt may still settle remotely. Leave the
                    // record for reconcile_payment, which refunds a charge
                    // that lands after the cancellation instead of keeping
                    // it as revenue.
                    tracing::info!(
                        payment_id = %payment.id(),
                        "in-flight payment left for reconciliation",
                    );
                }
                PaymentStatus::Failed | PaymentStatus::Cancelled | PaymentStatus::Refunded => {}
            }
        }

        if let Some(shipment_id) = saved.shipment_id() {
            match self.shipments.cancel(shipment_id, "order cancelled").await {
                Ok(_) => {}
                Err(FulfillmentError::Shipment(err)) => {
                    // Already with the carrier; the return flow handles it.
                    tracing::warn!(%shipment_id, error = %err, "shipment not cancellable");
                }
                Err(_) => {
                    self.deferred.push(DeferredAction::CancelShipment {
                        shipment_id,
                        reason: "order cancelled".to_string(),
                    });
                }
            }
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %saved.id(), "order cancelled");

        notify_best_effort(
            self.notifier.as_ref(),
            saved.customer_id(),
            NotificationKind::OrderCancelled,
            serde_json::json!({ "order_number": saved.order_number() }),
        )
        .await;

        Ok(saved)
    }

    /// Creates the shipment and marks a confirmed order as shipped.
    #[tracing::instrument(skip(self))]
    pub async fn mark_shipped(
        &self,
        order_id: OrderId,
        method: ShippingMethod,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.get_order(order_id).await?;
        if !order.status().can_transition_to(OrderStatus::Shipped) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status(),
                to: OrderStatus::Shipped,
            }
            .into());
        }

        let recipient = match self.customers.get_customer(order.customer_id()).await? {
            Some(customer) => customer.name,
            None => "Customer".to_string(),
        };
        let shipment = self.shipments.create(&order, method, recipient).await?;

        order.mark_shipped(shipment.id())?;
        let saved = self.orders.save(order).await?;

        tracing::info!(
            order_id = %saved.id(),
            tracking_number = shipment.tracking_number(),
            "order shipped",
        );

        notify_best_effort(
            self.notifier.as_ref(),
            saved.customer_id(),
            NotificationKind::OrderShipped,
            serde_json::json!({
                "order_number": saved.order_number(),
                "tracking_number": shipment.tracking_number(),
                "carrier": shipment.carrier(),
            }),
        )
        .await;

        Ok(saved)
    }

    /// Marks a shipped order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        let mut order = self.get_order(order_id).await?;
        order.mark_delivered()?;
        let saved = self.orders.save(order).await?;

        tracing::info!(order_id = %saved.id(), "order delivered");

        notify_best_effort(
            self.notifier.as_ref(),
            saved.customer_id(),
            NotificationKind::OrderDelivered,
            serde_json::json!({ "order_number": saved.order_number() }),
        )
        .await;

        Ok(saved)
    }

    /// Processes a return of a delivered order: stock goes back to the
    /// warehouse and the payment is refunded.
    #[tracing::instrument(skip(self, reason))]
    pub async fn process_return(
        &self,
        order_id: OrderId,
        reason: impl Into<String> + std::fmt::Debug,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.get_order(order_id).await?;
        order.mark_returned(reason)?;
        let saved = self.orders.save(order).await?;

        for line in saved.lines() {
            if let Err(err) = self
                .ledger
                .return_to_stock(&line.product_id, line.quantity)
                .await
            {
                tracing::error!(
                    order_id = %saved.id(),
                    product_id = %line.product_id,
                    error = %err,
                    "return to stock failed",
                );
            }
        }

        if let Some(payment) = self.payments.find_by_order(order_id).await?
            && payment.status().is_refundable()
        {
            self.refund_in_full(&payment, "order returned").await;
        }

        metrics::counter!("orders_returned_total").increment(1);
        tracing::info!(order_id = %saved.id(), "order returned");

        notify_best_effort(
            self.notifier.as_ref(),
            saved.customer_id(),
            NotificationKind::ReturnReceived,
            serde_json::json!({ "order_number": saved.order_number() }),
        )
        .await;

        Ok(saved)
    }

    /// Generic status update used by admin tooling.
    ///
    /// Dispatches to the specific transition handlers; payment-gated edges
    /// are rejected here because confirmation must go through the payment
    /// path.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        note: Option<String>,
    ) -> Result<Order, FulfillmentError> {
        match target {
            OrderStatus::Confirmed => Err(FulfillmentError::Validation(vec![
                "confirmation requires payment; use the payment endpoint".to_string(),
            ])),
            OrderStatus::Shipped => self.mark_shipped(order_id, ShippingMethod::Standard).await,
            OrderStatus::Delivered => self.mark_delivered(order_id).await,
            OrderStatus::Cancelled => {
                self.cancel(order_id, note.unwrap_or_else(|| "status update".to_string()))
                    .await
            }
            OrderStatus::Returned => {
                self.process_return(order_id, note.unwrap_or_else(|| "status update".to_string()))
                    .await
            }
            OrderStatus::Pending => {
                let order = self.get_order(order_id).await?;
                Err(OrderError::InvalidStatusTransition {
                    from: order.status(),
                    to: OrderStatus::Pending,
                }
                .into())
            }
        }
    }

    /// Re-checks a stuck payment against the gateway and applies the
    /// order-side consequences.
    ///
    /// A payment found settled for a cancelled order triggers an automatic
    /// compensating refund; one found settled for a still-pending order
    /// confirms it.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_payment(&self, order_id: OrderId) -> Result<Payment, FulfillmentError> {
        let order = self.get_order(order_id).await?;
        let payment = self
            .payments
            .find_by_order(order_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("payment", order_id))?;

        let payment = self.payments.verify_status(payment.id()).await?;
        if payment.status() != PaymentStatus::Completed {
            return Ok(payment);
        }

        match order.status() {
            OrderStatus::Cancelled => {
                self.refund_in_full(&payment, "payment settled after order cancellation")
                    .await;
                metrics::counter!("payments_compensated_total").increment(1);
                self.payments.get(payment.id()).await
            }
            OrderStatus::Pending => {
                let mut order = order;
                order.confirm(payment.id())?;
                let saved = self.orders.save(order).await?;
                for line in saved.lines() {
                    if let Err(err) = self.ledger.confirm(&line.product_id, line.quantity).await {
                        tracing::error!(
                            order_id = %saved.id(),
                            product_id = %line.product_id,
                            error = %err,
                            "reservation confirm failed",
                        );
                    }
                }
                tracing::info!(order_id = %saved.id(), "order confirmed via reconciliation");
                Ok(payment)
            }
            _ => Ok(payment),
        }
    }

    /// Retries side effects that failed after their transition committed.
    pub async fn retry_deferred(&self) -> usize {
        let actions = self.deferred.drain();
        let mut retried = 0;
        for action in actions {
            match action {
                DeferredAction::Refund {
                    payment_id,
                    order_id,
                    amount,
                    reason,
                } => match self.payments.refund(payment_id, amount, reason.clone()).await {
                    Ok(_) => retried += 1,
                    Err(err) => {
                        tracing::warn!(%payment_id, error = %err, "deferred refund failed again");
                        self.deferred.push(DeferredAction::Refund {
                            payment_id,
                            order_id,
                            amount,
                            reason,
                        });
                    }
                },
                DeferredAction::CancelShipment {
                    shipment_id,
                    reason,
                } => match self.shipments.cancel(shipment_id, reason.clone()).await {
                    Ok(_) => retried += 1,
                    Err(FulfillmentError::Shipment(err)) => {
                        tracing::warn!(%shipment_id, error = %err, "deferred cancel no longer legal");
                    }
                    Err(err) => {
                        tracing::warn!(%shipment_id, error = %err, "deferred cancel failed again");
                        self.deferred
                            .push(DeferredAction::CancelShipment { shipment_id, reason });
                    }
                },
            }
        }
        retried
    }

    /// Issues a refund for everything still refundable on a payment,
    /// deferring on failure.
    async fn refund_in_full(&self, payment: &Payment, reason: &str) {
        // Reload for the current refundable amount and version.
        let current = match self.payments.get(payment.id()).await {
            Ok(current) => current,
            Err(err) => {
                tracing::error!(payment_id = %payment.id(), error = %err, "refund lookup failed");
                return;
            }
        };
        let amount = current.refundable_amount();
        if !amount.is_positive() {
            return;
        }

        if let Err(err) = self.payments.refund(current.id(), amount, reason).await {
            tracing::warn!(
                payment_id = %current.id(),
                error = %err,
                "refund failed, deferring",
            );
            self.deferred.push(DeferredAction::Refund {
                payment_id: current.id(),
                order_id: current.order_id(),
                amount,
                reason: reason.to_string(),
            });
        }
    }

    async fn release_lines(&self, lines: &[StockLine]) {
        for line in lines {
            if let Err(err) = self.ledger.release(&line.product_id, line.quantity).await {
                tracing::error!(
                    product_id = %line.product_id,
                    error = %err,
                    "inventory release failed",
                );
            }
        }
    }
}

// Query operations
impl OrderLifecycleManager {
    /// Loads an order, reporting `NotFound` when absent.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("order", order_id))
    }

    /// Loads an order by its human-facing number.
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Order, FulfillmentError> {
        self.orders
            .find_by_number(order_number)
            .await?
            .ok_or_else(|| FulfillmentError::not_found("order", order_number))
    }

    /// Lists orders in a status, oldest first.
    pub async fn list_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, FulfillmentError> {
        self.orders.list_by_status(status).await
    }

    /// Lists a customer's orders, oldest first.
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, FulfillmentError> {
        self.orders.list_by_customer(customer_id).await
    }
}
