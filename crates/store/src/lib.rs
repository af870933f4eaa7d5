//! Persistence layer for carts and orders.
//!
//! Two backends provide the same trait surface: in-memory for tests and
//! local runs, PostgreSQL for durable storage. Both serialize mutations
//! per resource key through optimistic version checks; a stale write fails
//! with [`StoreError::VersionConflict`] instead of silently losing an
//! update.

mod cart_store;
mod error;
mod memory;
mod order_store;
mod postgres;

pub use cart_store::CartStore;
pub use error::{Result, StoreError};
pub use memory::{InMemoryCartStore, InMemoryOrderStore};
pub use order_store::OrderStore;
pub use postgres::PostgresStore;
