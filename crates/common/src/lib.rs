//! Shared types used across the marketplace core.
//!
//! Identifier newtypes keep buyer, seller, order, and product ids from being
//! mixed up at compile time; [`Money`] keeps amounts in integer cents.

mod types;

pub use types::{BuyerId, Money, OrderId, ProductId, SellerId};
