//! Checkout and order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::CatalogLookup;
use domain::{Order, OrderDetails, OrderStatus, ShippingAddress};
use serde::{Deserialize, Serialize};
use store::{CartStore, OrderStore};

use crate::AppState;
use crate::auth::{ActorIdentity, require_buyer};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub seller_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub reference: String,
    pub buyer_id: String,
    pub status: String,
    pub payment_status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

fn order_response(order: &Order) -> OrderResponse {
    let items = order
        .items()
        .iter()
        .map(|item| OrderItemResponse {
            product_id: item.product_id.to_string(),
            seller_id: item.seller_id.to_string(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.subtotal.cents(),
        })
        .collect();

    OrderResponse {
        reference: order.reference().to_string(),
        buyer_id: order.buyer_id().to_string(),
        status: order.status().to_string(),
        payment_status: order.payment_status().to_string(),
        items,
        total_cents: order.total_amount().cents(),
        shipping_address: order.shipping_address().cloned(),
        payment_method: order.payment_method().map(|m| m.to_string()),
        notes: order.notes().map(String::from),
        cancel_reason: order.cancel_reason().map(String::from),
        created_at: order.created_at().to_rfc3339(),
        completed_at: order.completed_at().map(|t| t.to_rfc3339()),
    }
}

/// `?status=` narrows to an exact status; absent or `all` means no filter.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, ApiError> {
    match raw {
        None | Some("all") => Ok(None),
        Some(s) => serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid status: {s}"))),
    }
}

// -- Handlers --

/// POST /orders — convert the buyer's cart into an order.
#[tracing::instrument(skip(state, details))]
pub async fn checkout<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Json(details): Json<OrderDetails>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    let order = state.checkout_service.checkout(buyer_id, details).await?;
    Ok((StatusCode::CREATED, Json(order_response(&order))))
}

/// GET /orders — the actor's role-scoped listing, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let status = parse_status_filter(params.status.as_deref())?;
    let orders = state.order_service.list(&actor, status).await?;
    Ok(Json(orders.iter().map(order_response).collect()))
}

/// GET /orders/{reference} — one order, gated and seller-projected.
#[tracing::instrument(skip(state))]
pub async fn get<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Path(reference): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let order = state.order_service.get(&actor, &reference).await?;
    Ok(Json(order_response(&order)))
}

/// PUT /orders/{reference} — apply a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Path(reference): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let order = state
        .order_service
        .update_status(&actor, &reference, req.status, req.cancel_reason)
        .await?;
    Ok(Json(order_response(&order)))
}
