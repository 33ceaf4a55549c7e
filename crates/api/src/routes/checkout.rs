//! Checkout validation and quote endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::{CheckoutQuote, CheckoutValidation};
use common::CustomerId;
use domain::{Address, Cart, CartLine, Money, ShippingMethod};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CartBody {
    pub customer_id: Uuid,
    pub items: Vec<CartItemBody>,
}

#[derive(Deserialize)]
pub struct CartItemBody {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct QuoteBody {
    #[serde(flatten)]
    pub cart: CartBody,
    pub shipping_address: Address,
    #[serde(default)]
    pub method: ShippingMethod,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub tax_rate_bps: u32,
    pub total_cents: i64,
    pub method: String,
}

impl From<&CheckoutQuote> for QuoteResponse {
    fn from(quote: &CheckoutQuote) -> Self {
        Self {
            subtotal_cents: quote.subtotal.cents(),
            shipping_cents: quote.shipping.cents(),
            tax_cents: quote.tax.cents(),
            tax_rate_bps: quote.tax_rate_bps,
            total_cents: quote.total.cents(),
            method: quote.method.as_str().to_string(),
        }
    }
}

fn cart_from_body(body: &CartBody) -> Cart {
    Cart::with_lines(
        CustomerId::from_uuid(body.customer_id),
        body.items
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

/// POST /checkout/validate — check the cart against live stock.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CartBody>,
) -> Result<Json<CheckoutValidation>, ApiError> {
    let cart = cart_from_body(&body);
    Ok(Json(state.checkout.validate(&cart).await))
}

/// POST /checkout/quote — price the cart for a destination and method.
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuoteBody>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let cart = cart_from_body(&body.cart);
    let quote = state
        .checkout
        .prepare(&cart, &body.shipping_address, body.method)?;
    Ok(Json(QuoteResponse::from(&quote)))
}
