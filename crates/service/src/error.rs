//! Service error taxonomy.

use catalog::CatalogError;
use common::ProductId;
use domain::{AccessError, CartError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the application services.
///
/// Validation, not-found, and forbidden errors are surfaced verbatim and
/// never retried automatically; `Conflict` and `Unavailable` are retryable
/// by the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced product does not exist in the catalog.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// The product exists but its listing is not purchasable.
    #[error("product is not active: {product_id}")]
    ProductInactive { product_id: ProductId },

    /// Checkout requires a cart with at least one item.
    #[error("cart is empty")]
    EmptyCart,

    /// No order with this reference.
    #[error("order not found: {reference}")]
    OrderNotFound { reference: String },

    /// The authorization gate rejected the actor.
    #[error(transparent)]
    Forbidden(#[from] AccessError),

    /// A cart-level validation failure (bad quantity, item not in cart).
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An order-level failure (invalid transition, empty order).
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A concurrent mutation won; re-read and retry.
    #[error("conflicting update for {key}, retry")]
    Conflict { key: String },

    /// A downstream store or the catalog is unreachable. Retryable.
    #[error("downstream unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict { key, .. } => ServiceError::Conflict { key },
            StoreError::DuplicateReference(reference) => {
                ServiceError::Conflict { key: reference }
            }
            StoreError::NotFound { key } => ServiceError::OrderNotFound { reference: key },
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
            StoreError::Database(e) => ServiceError::Unavailable(e.to_string()),
            StoreError::Migration(e) => ServiceError::Internal(e.to_string()),
            StoreError::Serialization(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}
