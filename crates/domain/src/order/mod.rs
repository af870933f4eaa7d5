//! Order record and related types.

mod record;
mod status;
mod value_objects;

pub use record::Order;
pub use status::{OrderStatus, PaymentStatus};
pub use value_objects::{
    LineItem, OrderDetails, OrderReference, PaymentMethod, ShippingAddress,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An order cannot be created without line items.
    #[error("order has no items")]
    NoItems,

    /// The requested status change is not on the transition graph.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A line item carried a quantity below 1.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// A line item carried a negative unit price.
    #[error("invalid price: {price} cents (must not be negative)")]
    InvalidPrice { price: i64 },
}
