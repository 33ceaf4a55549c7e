//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<api::AppState>) {
    let state = api::create_default_state(&api::config::Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register_customer(app: &axum::Router) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/customers",
        Some(serde_json::json!({
            "name": "Astrid Svensson",
            "email": "astrid@example.com",
            "default_address": {
                "line1": "Storgatan 1",
                "line2": null,
                "city": "Stockholm",
                "state": "AB",
                "postal_code": "11122",
                "country": "SE"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

fn order_body(customer_id: &str) -> serde_json::Value {
    serde_json::json!({
        "customer_id": customer_id,
        "items": [{
            "product_id": "SKU-001",
            "product_name": "Widget",
            "quantity": 2,
            "unit_price_cents": 10_000
        }],
        "method": "Standard"
    })
}

#[tokio::test]
async fn health_check() {
    let (app, _) = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn create_order_quotes_charges_and_reserves_stock() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-001", 5);

    let (status, json) = send(&app, "POST", "/orders", Some(order_body(&customer_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["subtotal_cents"], 20_000);
    // Swedish VAT at 25% on the subtotal, standard shipping below the
    // free-shipping threshold.
    assert_eq!(json["tax_cents"], 5_000);
    assert_eq!(json["shipping_cents"], 4_900);
    assert_eq!(json["total_cents"], 29_900);

    let (status, stock) = send(&app, "GET", "/inventory/SKU-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["available"], 3);
}

#[tokio::test]
async fn insufficient_stock_returns_conflict_with_quantities() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-001", 1);

    let (status, json) = send(&app, "POST", "/orders", Some(order_body(&customer_id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["requested"], 2);
    assert_eq!(json["available"], 1);
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-001", 5);

    let (_, order) = send(&app, "POST", "/orders", Some(order_body(&customer_id))).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, order) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/payment"),
        Some(serde_json::json!({ "method_token": "tok_visa" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Confirmed");

    let (status, order) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/ship"),
        Some(serde_json::json!({ "method": "Express" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Shipped");
    let shipment_id = order["shipment_id"].as_str().unwrap().to_string();

    let (status, order) = send(&app, "POST", &format!("/orders/{order_id}/deliver"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Delivered");

    // Public tracking lookup without a session.
    let (status, shipment) = send(&app, "GET", &format!("/shipments/{shipment_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let tracking_number = shipment["tracking_number"].as_str().unwrap();
    let (status, tracked) = send(&app, "GET", &format!("/track/{tracking_number}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["carrier"], "DHL");
}

#[tokio::test]
async fn illegal_transition_returns_conflict() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-001", 5);

    let (_, order) = send(&app, "POST", "/orders", Some(order_body(&customer_id))).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Pending -> Delivered skips the table.
    let (status, _) = send(&app, "POST", &format!("/orders/{order_id}/deliver"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn checkout_validate_reports_every_issue() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-LOW", 1);

    let (status, json) = send(
        &app,
        "POST",
        "/checkout/validate",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [
                {
                    "product_id": "SKU-LOW",
                    "product_name": "Gadget",
                    "quantity": 3,
                    "unit_price_cents": 500
                },
                {
                    "product_id": "SKU-404",
                    "product_name": "Ghost",
                    "quantity": 1,
                    "unit_price_cents": 100
                }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    assert_eq!(json["issues"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (app, _) = setup();
    let (status, _) = send(
        &app,
        "GET",
        "/orders/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_refunds_and_restocks_over_http() {
    let (app, state) = setup();
    let customer_id = register_customer(&app).await;
    state.ledger.set_stock("SKU-001", 5);

    let (_, order) = send(&app, "POST", "/orders", Some(order_body(&customer_id))).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    send(
        &app,
        "POST",
        &format!("/orders/{order_id}/payment"),
        Some(serde_json::json!({ "method_token": "tok_visa" })),
    )
    .await;

    let (status, order) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        Some(serde_json::json!({ "reason": "changed my mind" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Cancelled");

    let (_, stock) = send(&app, "GET", "/inventory/SKU-001", None).await;
    assert_eq!(stock["available"], 5);

    let payment_id = order["payment_id"].as_str().unwrap().to_string();
    let (status, payment) = send(&app, "GET", &format!("/payments/{payment_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "Refunded");
}
