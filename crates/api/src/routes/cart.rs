//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use catalog::CatalogLookup;
use common::{BuyerId, ProductId};
use serde::{Deserialize, Serialize};
use service::CartView;
use store::{CartStore, OrderStore};

use crate::AppState;
use crate::auth::{ActorIdentity, require_buyer};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemParams {
    pub product_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub title: String,
    pub seller_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub added_at: String,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub buyer_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct CartCountResponse {
    pub count: u32,
}

fn cart_response(view: CartView) -> CartResponse {
    let items = view
        .items
        .into_iter()
        .map(|item| CartItemResponse {
            product_id: item.product.id.to_string(),
            title: item.product.title,
            seller_id: item.product.seller_id.to_string(),
            quantity: item.quantity,
            unit_price_cents: item.product.price.cents(),
            line_total_cents: item.line_total.cents(),
            added_at: item.added_at.to_rfc3339(),
        })
        .collect();

    CartResponse {
        buyer_id: view.buyer_id.to_string(),
        items,
        total_cents: view.total_amount.cents(),
    }
}

/// Mutations answer with the freshly resolved cart, like the reads do.
async fn resolved_cart<C, CS, OS>(
    state: &AppState<C, CS, OS>,
    buyer_id: BuyerId,
) -> Result<Json<CartResponse>, ApiError>
where
    C: CatalogLookup,
    CS: CartStore,
{
    let view = state.cart_service.get(buyer_id).await?;
    Ok(Json(cart_response(view)))
}

// -- Handlers --

/// GET /cart — the buyer's cart, entries resolved against the catalog.
#[tracing::instrument(skip(state))]
pub async fn get_cart<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<Json<CartResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    resolved_cart(&state, buyer_id).await
}

/// GET /cart/count — total item quantity, for the cart badge.
#[tracing::instrument(skip(state))]
pub async fn count<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
) -> Result<Json<CartCountResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    let count = state.cart_service.count(buyer_id).await?;
    Ok(Json(CartCountResponse { count }))
}

/// POST /cart — add a product.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    if req.product_id.is_empty() {
        return Err(ApiError::BadRequest("Product ID is required".to_string()));
    }

    state
        .cart_service
        .add_item(buyer_id, ProductId::new(req.product_id), req.quantity)
        .await?;
    resolved_cart(&state, buyer_id).await
}

/// PUT /cart — overwrite an entry's quantity; zero or less removes it.
#[tracing::instrument(skip(state, req))]
pub async fn update_quantity<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    if req.product_id.is_empty() {
        return Err(ApiError::BadRequest("Product ID is required".to_string()));
    }

    state
        .cart_service
        .set_quantity(buyer_id, ProductId::new(req.product_id), req.quantity)
        .await?;
    resolved_cart(&state, buyer_id).await
}

/// DELETE /cart?product_id= — remove a product; idempotent.
#[tracing::instrument(skip(state))]
pub async fn remove_item<C, CS, OS>(
    State(state): State<Arc<AppState<C, CS, OS>>>,
    ActorIdentity(actor): ActorIdentity,
    Query(params): Query<RemoveItemParams>,
) -> Result<Json<CartResponse>, ApiError>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let buyer_id = require_buyer(actor)?;
    state
        .cart_service
        .remove_item(buyer_id, ProductId::new(params.product_id))
        .await?;
    resolved_cart(&state, buyer_id).await
}
