//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId};
use domain::{Address, Cart, CartLine, Money, Order, OrderStatus, ShippingMethod};
use fulfillment::{CreateOrderRequest, CustomerDirectory, PaymentRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub customer_id: Uuid,
    pub items: Vec<OrderItemBody>,
    /// Falls back to the customer's default address when absent.
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub method: ShippingMethod,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderItemBody {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentBody {
    pub method_token: String,
    pub currency: Option<String>,
}

#[derive(Deserialize)]
pub struct ReasonBody {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ShipBody {
    #[serde(default)]
    pub method: ShippingMethod,
}

#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub number: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub shipping_address: Address,
    pub payment_id: Option<String>,
    pub shipment_id: Option<String>,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub returned_at: Option<String>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let charges = order.charges();
        Self {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().as_str().to_string(),
            lines: order
                .lines()
                .iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id.to_string(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    line_total_cents: line.line_total().cents(),
                })
                .collect(),
            subtotal_cents: order.subtotal().cents(),
            tax_cents: charges.tax.cents(),
            shipping_cents: charges.shipping.cents(),
            discount_cents: charges.discount.cents(),
            total_cents: order.total().cents(),
            shipping_address: order.shipping_address().clone(),
            payment_id: order.payment_id().map(|id| id.to_string()),
            shipment_id: order.shipment_id().map(|id| id.to_string()),
            created_at: order.created_at().to_rfc3339(),
            confirmed_at: order.confirmed_at().map(|t| t.to_rfc3339()),
            shipped_at: order.shipped_at().map(|t| t.to_rfc3339()),
            delivered_at: order.delivered_at().map(|t| t.to_rfc3339()),
            cancelled_at: order.cancelled_at().map(|t| t.to_rfc3339()),
            returned_at: order.returned_at().map(|t| t.to_rfc3339()),
        }
    }
}

pub(crate) fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    match status {
        "Pending" => Ok(OrderStatus::Pending),
        "Confirmed" => Ok(OrderStatus::Confirmed),
        "Shipped" => Ok(OrderStatus::Shipped),
        "Delivered" => Ok(OrderStatus::Delivered),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        "Returned" => Ok(OrderStatus::Returned),
        other => Err(ApiError::BadRequest(format!("unknown status: {other}"))),
    }
}

fn cart_from_items(customer_id: CustomerId, items: &[OrderItemBody]) -> Cart {
    Cart::with_lines(
        customer_id,
        items
            .iter()
            .map(|item| {
                CartLine::new(
                    item.product_id.as_str(),
                    item.product_name.as_str(),
                    item.quantity,
                    Money::from_cents(item.unit_price_cents),
                )
            })
            .collect(),
    )
}

// -- Handlers --

/// POST /orders — quote charges and create an order from a cart snapshot.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = CustomerId::from_uuid(body.customer_id);
    let cart = cart_from_items(customer_id, &body.items);

    // Resolve the destination up front; the quote needs it.
    let shipping_address = match body.shipping_address.clone() {
        Some(address) => address,
        None => state
            .directory
            .get_customer(customer_id)
            .await?
            .and_then(|c| c.default_address)
            .ok_or_else(|| {
                ApiError::BadRequest("no shipping address and no customer default".to_string())
            })?,
    };

    let quote = state.checkout.prepare(&cart, &shipping_address, body.method)?;

    let order = state
        .lifecycle
        .create(CreateOrderRequest {
            cart,
            shipping_address: Some(shipping_address),
            billing_address: body.billing_address,
            charges: domain::OrderCharges {
                tax: quote.tax,
                shipping: quote.shipping,
                discount: Money::zero(),
            },
            customer_note: body.note,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/{id} — load an order by id.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.lifecycle.get_order(OrderId::from_uuid(id)).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders — list by status, customer, or order number.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    if let Some(number) = query.number {
        let order = state.lifecycle.get_order_by_number(&number).await?;
        return Ok(Json(vec![OrderResponse::from(&order)]));
    }

    let orders = if let Some(status) = query.status {
        state
            .lifecycle
            .list_by_status(parse_status(&status)?)
            .await?
    } else if let Some(customer_id) = query.customer_id {
        state
            .lifecycle
            .list_by_customer(CustomerId::from_uuid(customer_id))
            .await?
    } else {
        return Err(ApiError::BadRequest(
            "provide status, customer_id, or number".to_string(),
        ));
    };

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// POST /orders/{id}/payment — capture payment and confirm the order.
#[tracing::instrument(skip(state, body))]
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConfirmPaymentBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let request = PaymentRequest {
        method_token: body.method_token,
        currency: body.currency,
    };
    let order = state
        .lifecycle
        .confirm_payment(OrderId::from_uuid(id), &request)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel — cancel with compensation.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let reason = body.reason.unwrap_or_else(|| "customer request".to_string());
    let order = state
        .lifecycle
        .cancel(OrderId::from_uuid(id), reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/ship — create the shipment and mark shipped.
pub async fn ship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ShipBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .lifecycle
        .mark_shipped(OrderId::from_uuid(id), body.method)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/deliver — mark delivered.
pub async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.lifecycle.mark_delivered(OrderId::from_uuid(id)).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/return — process a return of a delivered order.
pub async fn process_return(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let reason = body.reason.unwrap_or_else(|| "customer return".to_string());
    let order = state
        .lifecycle
        .process_return(OrderId::from_uuid(id), reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/status — generic status update for admin tooling.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let target = parse_status(&body.status)?;
    let order = state
        .lifecycle
        .update_status(OrderId::from_uuid(id), target, body.note)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/reconcile-payment — re-check a stuck payment.
pub async fn reconcile_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<super::payments::PaymentResponse>, ApiError> {
    let payment = state
        .lifecycle
        .reconcile_payment(OrderId::from_uuid(id))
        .await?;
    Ok(Json(super::payments::PaymentResponse::from(&payment)))
}
