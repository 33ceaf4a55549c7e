//! Customer directory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::Address;
use fulfillment::{Customer, CustomerDirectory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterCustomerBody {
    pub name: String,
    pub email: String,
    pub default_address: Option<Address>,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub default_address: Option<Address>,
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            default_address: customer.default_address.clone(),
        }
    }
}

/// POST /customers — register a customer in the directory.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterCustomerBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let id = state
        .directory
        .register_new(body.name, body.email, body.default_address);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    )
}

/// GET /customers/{id} — look up a customer.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state
        .directory
        .get_customer(CustomerId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("customer not found: {id}")))?;
    Ok(Json(CustomerResponse::from(&customer)))
}
