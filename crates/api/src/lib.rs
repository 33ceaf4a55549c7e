//! HTTP API server with observability for the order fulfillment core.
//!
//! Thin transport layer: handlers translate requests into lifecycle
//! operations and map the error taxonomy onto HTTP statuses. Structured
//! logging via `tracing`, Prometheus metrics at `/metrics`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::CheckoutPipeline;
use fulfillment::{
    InMemoryCustomerDirectory, InMemoryOrderStore, InMemoryPaymentGateway, InMemoryPaymentStore,
    InMemoryShipmentStore, OrderLifecycleManager, PaymentOrchestrator, RecordingNotificationSender,
    ShipmentTracker,
};
use inventory::InMemoryInventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub lifecycle: OrderLifecycleManager,
    pub checkout: CheckoutPipeline,
    pub ledger: InMemoryInventoryLedger,
    pub directory: InMemoryCustomerDirectory,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/payment", post(routes::orders::confirm_payment))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/orders/{id}/ship", post(routes::orders::ship))
        .route("/orders/{id}/deliver", post(routes::orders::deliver))
        .route("/orders/{id}/return", post(routes::orders::process_return))
        .route("/orders/{id}/status", post(routes::orders::update_status))
        .route(
            "/orders/{id}/reconcile-payment",
            post(routes::orders::reconcile_payment),
        )
        .route("/payments/{id}", get(routes::payments::get))
        .route("/payments/{id}/refund", post(routes::payments::refund))
        .route("/payments/{id}/verify", post(routes::payments::verify))
        .route("/shipments/{id}", get(routes::shipments::get))
        .route("/shipments/{id}/events", post(routes::shipments::apply_event))
        .route("/track/{tracking_number}", get(routes::shipments::track))
        .route("/checkout/validate", post(routes::checkout::validate))
        .route("/checkout/quote", post(routes::checkout::quote))
        .route("/customers", post(routes::customers::register))
        .route("/customers/{id}", get(routes::customers::get))
        .route("/inventory/low-stock", get(routes::stock::low_stock))
        .route("/inventory/{product_id}", put(routes::stock::set_stock))
        .route("/inventory/{product_id}", get(routes::stock::get_stock))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the default application state: in-memory stores, ledger, gateway,
/// and directory.
pub fn create_default_state(config: &config::Config) -> Arc<AppState> {
    let ledger = InMemoryInventoryLedger::new();
    let gateway = InMemoryPaymentGateway::new();
    let notifier = RecordingNotificationSender::new();
    let directory = InMemoryCustomerDirectory::new();

    let payments = PaymentOrchestrator::new(
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(gateway),
        Arc::new(notifier.clone()),
    )
    .with_charge_timeout(config.gateway_timeout);
    let shipments = ShipmentTracker::new(
        Arc::new(InMemoryShipmentStore::new()),
        Arc::new(notifier.clone()),
    );
    let lifecycle = OrderLifecycleManager::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(ledger.clone()),
        payments,
        shipments,
        Arc::new(directory.clone()),
        Arc::new(notifier),
    );

    Arc::new(AppState {
        lifecycle,
        checkout: CheckoutPipeline::new(Arc::new(ledger.clone())),
        ledger,
        directory,
    })
}
