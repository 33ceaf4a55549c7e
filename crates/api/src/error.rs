//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{OrderError, PaymentError};
use fulfillment::FulfillmentError;
use inventory::InventoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Coordination-layer error.
    Fulfillment(FulfillmentError),
    /// Checkout quote error.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Checkout(err) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": err.to_string() }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, serde_json::Value) {
    match &err {
        FulfillmentError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": err.to_string() }),
        ),

        // Illegal edges and stale versions are conflicts, never silently
        // coerced.
        FulfillmentError::Order(OrderError::InvalidStatusTransition { .. })
        | FulfillmentError::Order(OrderError::ReturnWindowElapsed { .. })
        | FulfillmentError::Payment(PaymentError::InvalidStatusTransition { .. })
        | FulfillmentError::Payment(PaymentError::NotRefundable { .. })
        | FulfillmentError::Payment(PaymentError::RefundExceedsPayment { .. })
        | FulfillmentError::Payment(PaymentError::RetriesExhausted { .. })
        | FulfillmentError::Shipment(_)
        | FulfillmentError::Conflict { .. } => (
            StatusCode::CONFLICT,
            serde_json::json!({ "error": err.to_string() }),
        ),

        FulfillmentError::Inventory(InventoryError::InsufficientStock {
            product_id,
            requested,
            available,
        }) => (
            StatusCode::CONFLICT,
            serde_json::json!({
                "error": err.to_string(),
                "product_id": product_id.to_string(),
                "requested": requested,
                "available": available,
            }),
        ),
        FulfillmentError::Inventory(InventoryError::UnknownProduct(_)) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": err.to_string() }),
        ),

        FulfillmentError::Validation(issues) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "validation failed",
                "issues": issues,
            }),
        ),

        FulfillmentError::PaymentFailure { reason, retryable } => (
            StatusCode::PAYMENT_REQUIRED,
            serde_json::json!({
                "error": reason,
                "retryable": retryable,
            }),
        ),

        // Transient infrastructure failure: tell the caller to retry,
        // without internal detail.
        FulfillmentError::DependencyUnavailable(_) => {
            tracing::error!(error = %err, "dependency unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "error": "a downstream service is unavailable, please retry",
                    "retryable": true,
                }),
            )
        }

        FulfillmentError::Order(_) | FulfillmentError::Payment(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": err.to_string() }),
        ),
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
