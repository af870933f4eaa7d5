//! Pure domain model for the marketplace transaction core.
//!
//! Everything here is synchronous and storage-free: carts, orders, the
//! status state machine, the authorization gate, and the seller view
//! projection. Persistence and orchestration live in the `store` and
//! `service` crates.

pub mod access;
pub mod cart;
pub mod order;
pub mod projection;

pub use access::{AccessError, Actor, ReadScope, Role, authorize_read, authorize_status_change};
pub use cart::{Cart, CartError, CartItem};
pub use order::{
    LineItem, Order, OrderDetails, OrderError, OrderReference, OrderStatus, PaymentMethod,
    PaymentStatus, ShippingAddress,
};
pub use projection::project_for_seller;
