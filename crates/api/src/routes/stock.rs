//! Inventory management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use inventory::InventoryLedger;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SetStockBody {
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<u32>,
}

/// PUT /inventory/{product_id} — set the available quantity.
pub async fn set_stock(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(body): Json<SetStockBody>,
) -> Json<serde_json::Value> {
    state.ledger.set_stock(product_id.as_str(), body.quantity);
    Json(serde_json::json!({
        "product_id": product_id,
        "available": body.quantity,
    }))
}

/// GET /inventory/{product_id} — read the available quantity.
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let available = state
        .ledger
        .available(&ProductId::new(product_id.as_str()))
        .await
        .map_err(fulfillment::FulfillmentError::from)?;
    Ok(Json(serde_json::json!({
        "product_id": product_id,
        "available": available,
    })))
}

/// GET /inventory/low-stock — products at or below the threshold.
pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LowStockQuery>,
) -> Json<serde_json::Value> {
    let low = state.ledger.low_stock(query.threshold.unwrap_or(10));
    Json(serde_json::json!(
        low.iter()
            .map(|(id, qty)| serde_json::json!({
                "product_id": id.to_string(),
                "available": qty,
            }))
            .collect::<Vec<_>>()
    ))
}
