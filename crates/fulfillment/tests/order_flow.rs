//! End-to-end order lifecycle scenarios across all components.

use std::sync::Arc;

use common::CustomerId;
use domain::{
    Address, Cart, CartLine, Money, OrderCharges, OrderStatus, PaymentStatus, ShipmentStatus,
    ShippingMethod,
};
use fulfillment::{
    CreateOrderRequest, FulfillmentError, InMemoryCustomerDirectory, InMemoryOrderStore,
    InMemoryPaymentGateway, InMemoryPaymentStore, InMemoryShipmentStore, NotificationKind,
    OrderLifecycleManager, PaymentOrchestrator, PaymentRequest, RecordingNotificationSender,
    ShipmentTracker, TrackingUpdate,
};
use inventory::{InMemoryInventoryLedger, InventoryError, InventoryLedger};

struct Harness {
    manager: OrderLifecycleManager,
    ledger: InMemoryInventoryLedger,
    gateway: InMemoryPaymentGateway,
    notifier: RecordingNotificationSender,
    directory: InMemoryCustomerDirectory,
}

fn setup() -> Harness {
    let ledger = InMemoryInventoryLedger::new();
    let gateway = InMemoryPaymentGateway::new();
    let notifier = RecordingNotificationSender::new();
    let directory = InMemoryCustomerDirectory::new();

    let payments = PaymentOrchestrator::new(
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(gateway.clone()),
        Arc::new(notifier.clone()),
    )
    .with_staleness_threshold(chrono::Duration::zero());
    let shipments = ShipmentTracker::new(
        Arc::new(InMemoryShipmentStore::new()),
        Arc::new(notifier.clone()),
    );
    let manager = OrderLifecycleManager::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(ledger.clone()),
        payments,
        shipments,
        Arc::new(directory.clone()),
        Arc::new(notifier.clone()),
    );

    Harness {
        manager,
        ledger,
        gateway,
        notifier,
        directory,
    }
}

fn address() -> Address {
    Address::new("Storgatan 1", "Stockholm", "AB", "11122", "SE")
}

fn customer(harness: &Harness) -> CustomerId {
    harness
        .directory
        .register_new("Astrid Svensson", "astrid@example.com", Some(address()))
}

fn cart_for(customer_id: CustomerId, lines: Vec<CartLine>) -> CreateOrderRequest {
    CreateOrderRequest {
        cart: Cart::with_lines(customer_id, lines),
        shipping_address: Some(address()),
        billing_address: None,
        charges: OrderCharges::default(),
        customer_note: None,
    }
}

#[tokio::test]
async fn checkout_reserves_stock_and_cancel_restores_it() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);

    // Cart with 2 units of a product with stock 5.
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 2, Money::from_cents(1000))],
        ))
        .await
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(
        harness.ledger.available(&"SKU-P".into()).await.unwrap(),
        3
    );

    // Pay, then cancel: stock returns to 5 and the payment is refunded.
    harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();

    let cancelled = harness
        .manager
        .cancel(order.id(), "changed my mind")
        .await
        .unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(
        harness.ledger.available(&"SKU-P".into()).await.unwrap(),
        5
    );

    let payment = harness
        .manager
        .payments()
        .find_by_order(order.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Refunded);
    assert_eq!(harness.gateway.refunds().len(), 1);
}

#[tokio::test]
async fn insufficient_stock_leaves_no_partial_state() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-A", 10);
    harness.ledger.set_stock("SKU-B", 1);

    let result = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![
                CartLine::new("SKU-A", "Widget", 2, Money::from_cents(1000)),
                CartLine::new("SKU-B", "Gadget", 2, Money::from_cents(500)),
            ],
        ))
        .await;

    assert!(matches!(
        result,
        Err(FulfillmentError::Inventory(
            InventoryError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ))
    ));

    // No order and no reservation survive.
    assert_eq!(harness.ledger.available(&"SKU-A".into()).await.unwrap(), 10);
    assert_eq!(harness.ledger.available(&"SKU-B".into()).await.unwrap(), 1);
    assert!(harness
        .manager
        .list_by_customer(customer_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn full_happy_path_to_delivery() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);

    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(9900))],
        ))
        .await
        .unwrap();

    let order = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Confirmed);
    assert!(order.payment_id().is_some());

    let order = harness
        .manager
        .mark_shipped(order.id(), ShippingMethod::Express)
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Shipped);
    let shipment_id = order.shipment_id().unwrap();

    let order = harness.manager.mark_delivered(order.id()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Delivered);

    // The shipment snapshot carries the address and the public lookup works.
    let shipment = harness.manager.shipments().get(shipment_id).await.unwrap();
    assert_eq!(shipment.shipping_address(), order.shipping_address());
    let tracked = harness
        .manager
        .shipments()
        .track(shipment.tracking_number())
        .await
        .unwrap();
    assert_eq!(tracked.id(), shipment_id);

    assert_eq!(
        harness.notifier.sent_kinds(),
        vec![
            NotificationKind::OrderConfirmation,
            NotificationKind::PaymentReceived,
            NotificationKind::OrderShipped,
            NotificationKind::OrderDelivered,
        ]
    );
}

#[tokio::test]
async fn pending_to_delivered_directly_is_rejected() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);

    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();

    let result = harness.manager.mark_delivered(order.id()).await;
    assert!(matches!(result, Err(FulfillmentError::Order(_))));

    let unchanged = harness.manager.get_order(order.id()).await.unwrap();
    assert_eq!(unchanged.status(), OrderStatus::Pending);
}

#[tokio::test]
async fn declined_payment_leaves_order_pending() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();

    harness.gateway.fail_next_charge("card declined");
    let result = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::PaymentFailure { retryable: true, .. })
    ));

    let order = harness.manager.get_order(order.id()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);

    // A second attempt succeeds.
    let order = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn payment_settling_after_cancellation_is_refunded() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(2000))],
        ))
        .await
        .unwrap();

    // The charge settles remotely but the response is lost, so the payment
    // sits pending while the customer cancels.
    harness.gateway.settle_silently(true);
    let result = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await;
    assert!(result.is_err());

    harness.gateway.settle_silently(false);
    harness
        .manager
        .cancel(order.id(), "took too long")
        .await
        .unwrap();

    // Reconciliation discovers the settled charge and refunds it rather
    // than keeping it as revenue.
    let payment = harness
        .manager
        .reconcile_payment(order.id())
        .await
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Refunded);
    assert_eq!(harness.gateway.refunds().len(), 1);

    let order = harness.manager.get_order(order.id()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Cancelled);
}

#[tokio::test]
async fn reconciliation_confirms_a_still_pending_order() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(2000))],
        ))
        .await
        .unwrap();

    harness.gateway.settle_silently(true);
    let _ = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await;
    harness.gateway.settle_silently(false);

    let payment = harness
        .manager
        .reconcile_payment(order.id())
        .await
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Completed);

    let order = harness.manager.get_order(order.id()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn return_restocks_and_refunds() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 2, Money::from_cents(1500))],
        ))
        .await
        .unwrap();

    let order = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();
    let order = harness
        .manager
        .mark_shipped(order.id(), ShippingMethod::Standard)
        .await
        .unwrap();
    let order = harness.manager.mark_delivered(order.id()).await.unwrap();
    assert_eq!(harness.ledger.available(&"SKU-P".into()).await.unwrap(), 3);

    let returned = harness
        .manager
        .process_return(order.id(), "wrong size")
        .await
        .unwrap();
    assert_eq!(returned.status(), OrderStatus::Returned);
    assert_eq!(harness.ledger.available(&"SKU-P".into()).await.unwrap(), 5);

    let payment = harness
        .manager
        .payments()
        .find_by_order(order.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Refunded);
}

#[tokio::test]
async fn return_of_undelivered_order_rejected() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();

    let result = harness.manager.process_return(order.id(), "too soon").await;
    assert!(matches!(result, Err(FulfillmentError::Order(_))));
}

#[tokio::test]
async fn refund_failure_is_deferred_not_rolled_back() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(3000))],
        ))
        .await
        .unwrap();
    harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();

    // The gateway goes dark, then the customer cancels.
    harness.gateway.set_unreachable(true);
    let cancelled = harness
        .manager
        .cancel(order.id(), "changed my mind")
        .await
        .unwrap();

    // The cancellation committed even though the refund could not run...
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(harness.ledger.available(&"SKU-P".into()).await.unwrap(), 5);
    assert_eq!(harness.manager.deferred().len(), 1);

    // ...and the deferred refund succeeds once the gateway is back.
    harness.gateway.set_unreachable(false);
    let retried = harness.manager.retry_deferred().await;
    assert_eq!(retried, 1);
    assert!(harness.manager.deferred().is_empty());

    let payment = harness
        .manager
        .payments()
        .find_by_order(order.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status(), PaymentStatus::Refunded);
}

#[tokio::test]
async fn shipment_machine_rejects_skips_via_tracker() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();
    let order = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await
        .unwrap();
    let order = harness
        .manager
        .mark_shipped(order.id(), ShippingMethod::Standard)
        .await
        .unwrap();
    let shipment_id = order.shipment_id().unwrap();

    // Drive the carrier feed to Shipped.
    for status in [ShipmentStatus::Prepared, ShipmentStatus::Shipped] {
        harness
            .manager
            .shipments()
            .apply_tracking_event(shipment_id, TrackingUpdate::status(status), None)
            .await
            .unwrap();
    }

    // Shipped -> Delivered skips two stages and must fail.
    let result = harness
        .manager
        .shipments()
        .apply_tracking_event(
            shipment_id,
            TrackingUpdate::status(ShipmentStatus::Delivered),
            None,
        )
        .await;
    assert!(matches!(result, Err(FulfillmentError::Shipment(_))));

    // The ordered path works.
    for status in [ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery] {
        harness
            .manager
            .shipments()
            .apply_tracking_event(shipment_id, TrackingUpdate::status(status), None)
            .await
            .unwrap();
    }
    let shipment = harness
        .manager
        .shipments()
        .mark_delivered(shipment_id, None, None)
        .await
        .unwrap();
    assert!(shipment.is_delivered());
}

#[tokio::test]
async fn create_aggregates_all_validation_failures() {
    let harness = setup();
    let customer_id = harness
        .directory
        .register_new("No Address", "noaddr@example.com", None);

    let result = harness
        .manager
        .create(CreateOrderRequest {
            cart: Cart::new(customer_id),
            shipping_address: None,
            billing_address: None,
            charges: OrderCharges::default(),
            customer_note: None,
        })
        .await;

    match result {
        Err(FulfillmentError::Validation(issues)) => {
            assert!(issues.iter().any(|i| i.contains("cart is empty")));
            assert!(issues.iter().any(|i| i.contains("no shipping address")));
        }
        other => panic!("expected aggregated validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let harness = setup();
    let result = harness
        .manager
        .create(cart_for(
            CustomerId::new(),
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await;
    assert!(matches!(result, Err(FulfillmentError::NotFound { .. })));
}

#[tokio::test]
async fn cancelled_order_rejects_payment_without_charging() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 5);
    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();
    harness.manager.cancel(order.id(), "gone").await.unwrap();

    let result = harness
        .manager
        .confirm_payment(order.id(), &PaymentRequest::new("tok_visa"))
        .await;
    assert!(matches!(result, Err(FulfillmentError::Order(_))));
    assert_eq!(harness.gateway.charge_count(), 0);
}

#[tokio::test]
async fn totals_follow_the_breakdown_invariant() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 10);

    let mut request = cart_for(
        customer_id,
        vec![CartLine::new("SKU-P", "Widget", 3, Money::from_cents(2000))],
    );
    request.charges = OrderCharges {
        tax: Money::from_cents(1500),
        shipping: Money::from_cents(4900),
        discount: Money::from_cents(1000),
    };

    let order = harness.manager.create(request).await.unwrap();
    assert_eq!(order.subtotal().cents(), 6000);
    assert_eq!(order.total().cents(), 6000 + 1500 + 4900 - 1000);
}

#[tokio::test]
async fn lookup_by_order_number_and_listings() {
    let harness = setup();
    let customer_id = customer(&harness);
    harness.ledger.set_stock("SKU-P", 10);

    let order = harness
        .manager
        .create(cart_for(
            customer_id,
            vec![CartLine::new("SKU-P", "Widget", 1, Money::from_cents(1000))],
        ))
        .await
        .unwrap();

    let by_number = harness
        .manager
        .get_order_by_number(order.order_number())
        .await
        .unwrap();
    assert_eq!(by_number.id(), order.id());

    let pending = harness
        .manager
        .list_by_status(OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let mine = harness.manager.list_by_customer(customer_id).await.unwrap();
    assert_eq!(mine.len(), 1);
}
