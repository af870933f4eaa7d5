//! HTTP API server with observability for the marketplace core.
//!
//! Exposes the cart and order operations over REST, with structured
//! logging (tracing) and Prometheus metrics. Actor identity arrives in
//! headers; every order operation re-runs the authorization gate.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use catalog::CatalogLookup;
use metrics_exporter_prometheus::PrometheusHandle;
use service::{CartService, CheckoutService, OrderService};
use store::{CartStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<C, CS, OS> {
    pub cart_service: CartService<C, CS>,
    pub checkout_service: CheckoutService<C, CS, OS>,
    pub order_service: OrderService<OS>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, CS, OS>(
    state: Arc<AppState<C, CS, OS>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get_cart::<C, CS, OS>))
        .route("/cart", post(routes::cart::add_item::<C, CS, OS>))
        .route("/cart", put(routes::cart::update_quantity::<C, CS, OS>))
        .route("/cart", delete(routes::cart::remove_item::<C, CS, OS>))
        .route("/cart/count", get(routes::cart::count::<C, CS, OS>))
        .route("/orders", post(routes::orders::checkout::<C, CS, OS>))
        .route("/orders", get(routes::orders::list::<C, CS, OS>))
        .route("/orders/{reference}", get(routes::orders::get::<C, CS, OS>))
        .route(
            "/orders/{reference}",
            put(routes::orders::update_status::<C, CS, OS>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the services over the given catalog and stores.
pub fn create_default_state<C, CS, OS>(catalog: C, carts: CS, orders: OS) -> Arc<AppState<C, CS, OS>>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore + Clone + Send + Sync + 'static,
    OS: OrderStore + Clone + Send + Sync + 'static,
{
    Arc::new(AppState {
        cart_service: CartService::new(catalog.clone(), carts.clone()),
        checkout_service: CheckoutService::new(catalog, carts, orders.clone()),
        order_service: OrderService::new(orders),
    })
}
