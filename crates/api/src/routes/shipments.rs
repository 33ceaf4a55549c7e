//! Shipment tracking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CustomerId, ShipmentId};
use domain::{Shipment, ShipmentStatus};
use fulfillment::TrackingUpdate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct TrackingEventBody {
    pub status: String,
    pub location: Option<String>,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub carrier: String,
    pub method: String,
    pub tracking_number: String,
    pub recipient_name: String,
    pub estimated_delivery: Option<String>,
    pub actual_delivery: Option<String>,
    pub events: Vec<TrackingEventResponse>,
}

#[derive(Serialize)]
pub struct TrackingEventResponse {
    pub status: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub recorded_at: String,
}

impl From<&Shipment> for ShipmentResponse {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id().to_string(),
            order_id: shipment.order_id().to_string(),
            status: shipment.status().as_str().to_string(),
            carrier: shipment.carrier().to_string(),
            method: shipment.method().as_str().to_string(),
            tracking_number: shipment.tracking_number().to_string(),
            recipient_name: shipment.recipient_name().to_string(),
            estimated_delivery: shipment.estimated_delivery().map(|d| d.to_string()),
            actual_delivery: shipment.actual_delivery().map(|d| d.to_string()),
            events: shipment
                .history()
                .iter()
                .map(|event| TrackingEventResponse {
                    status: event.status.as_str().to_string(),
                    location: event.location.clone(),
                    note: event.note.clone(),
                    recorded_at: event.recorded_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

fn parse_shipment_status(status: &str) -> Result<ShipmentStatus, ApiError> {
    match status {
        "Pending" => Ok(ShipmentStatus::Pending),
        "Prepared" => Ok(ShipmentStatus::Prepared),
        "Shipped" => Ok(ShipmentStatus::Shipped),
        "InTransit" => Ok(ShipmentStatus::InTransit),
        "OutForDelivery" => Ok(ShipmentStatus::OutForDelivery),
        "Delivered" => Ok(ShipmentStatus::Delivered),
        "Cancelled" => Ok(ShipmentStatus::Cancelled),
        "Returned" => Ok(ShipmentStatus::Returned),
        other => Err(ApiError::BadRequest(format!(
            "unknown shipment status: {other}"
        ))),
    }
}

/// POST /shipments/{id}/events — apply a carrier tracking event.
///
/// Looks up the owning order so milestone notifications reach the customer.
#[tracing::instrument(skip(state, body))]
pub async fn apply_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<TrackingEventBody>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = ShipmentId::from_uuid(id);
    let status = parse_shipment_status(&body.status)?;

    let shipment = state.lifecycle.shipments().get(shipment_id).await?;
    let customer: Option<CustomerId> = state
        .lifecycle
        .get_order(shipment.order_id())
        .await
        .ok()
        .map(|order| order.customer_id());

    let shipment = state
        .lifecycle
        .shipments()
        .apply_tracking_event(
            shipment_id,
            TrackingUpdate {
                status,
                location: body.location,
                note: body.note,
            },
            customer,
        )
        .await?;
    Ok(Json(ShipmentResponse::from(&shipment)))
}

/// GET /shipments/{id} — load a shipment.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment = state
        .lifecycle
        .shipments()
        .get(ShipmentId::from_uuid(id))
        .await?;
    Ok(Json(ShipmentResponse::from(&shipment)))
}

/// GET /track/{tracking_number} — public tracking lookup.
///
/// The one unauthenticated read: customers track parcels without a session.
pub async fn track(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment = state
        .lifecycle
        .shipments()
        .track(&tracking_number)
        .await?;
    Ok(Json(ShipmentResponse::from(&shipment)))
}
