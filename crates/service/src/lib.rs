//! Application services for the marketplace transaction core.
//!
//! Each service composes the catalog boundary, the stores, and the pure
//! domain model into the operations the HTTP surface exposes: cart
//! mutations, the cart-to-order conversion, and gated order reads/writes.

mod cart;
mod checkout;
mod error;
mod orders;
pub mod sales;

pub use cart::{CartService, CartView, ResolvedCartItem};
pub use checkout::CheckoutService;
pub use error::ServiceError;
pub use orders::OrderService;
