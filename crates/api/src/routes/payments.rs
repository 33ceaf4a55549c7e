//! Payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::PaymentId;
use domain::{Money, Payment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RefundBody {
    pub amount_cents: i64,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub amount_cents: i64,
    pub currency: String,
    pub transaction_id: String,
    pub gateway_payment_id: Option<String>,
    pub refunded_cents: i64,
    pub refundable_cents: i64,
    pub retry_count: u32,
    pub failure_reason: Option<String>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id().to_string(),
            order_id: payment.order_id().to_string(),
            status: payment.status().as_str().to_string(),
            amount_cents: payment.amount().cents(),
            currency: payment.currency().to_string(),
            transaction_id: payment.transaction_id().to_string(),
            gateway_payment_id: payment.gateway_payment_id().map(str::to_string),
            refunded_cents: payment.refunded().cents(),
            refundable_cents: payment.refundable_amount().cents(),
            retry_count: payment.retry_count(),
            failure_reason: payment.failure_reason().map(str::to_string),
        }
    }
}

/// GET /payments/{id} — load a payment.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state
        .lifecycle
        .payments()
        .get(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// POST /payments/{id}/refund — refund part or all of a captured payment.
#[tracing::instrument(skip(state, body))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RefundBody>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let reason = body
        .reason
        .unwrap_or_else(|| "customer requested refund".to_string());
    let payment = state
        .lifecycle
        .payments()
        .refund(
            PaymentId::from_uuid(id),
            Money::from_cents(body.amount_cents),
            reason,
        )
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// POST /payments/{id}/verify — reconcile a stale pending payment against
/// the gateway.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state
        .lifecycle
        .payments()
        .verify_status(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}
