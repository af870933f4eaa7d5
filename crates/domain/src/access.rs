//! The authorization gate.
//!
//! A pure decision layer consulted by every order-facing operation. Role
//! and ownership are checked per resource, per call; nothing here is ever
//! cached against a session. Admins bypass authorization, not the status
//! state machine — an off-graph transition still fails downstream.

use common::{BuyerId, SellerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{Order, OrderStatus};

/// Actor roles known to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    /// Parses a wire role name.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "buyer" => Some(Role::Buyer),
            "seller" => Some(Role::Seller),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated actor, as handed to this core by the credential layer.
///
/// Identity is opaque here; verification happened upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Buyer(BuyerId),
    Seller(SellerId),
    Admin,
}

impl Actor {
    /// Returns the actor's role.
    pub fn role(&self) -> Role {
        match self {
            Actor::Buyer(_) => Role::Buyer,
            Actor::Seller(_) => Role::Seller,
            Actor::Admin => Role::Admin,
        }
    }
}

/// How much of an order a permitted read may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    /// The full order, unfiltered.
    Full,

    /// Only the given seller's slice; callers must project before returning.
    SellerSlice(SellerId),
}

/// Authorization rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The actor's identity resolved but their scope is insufficient.
    #[error("actor is not permitted to access this order")]
    Forbidden,
}

/// Transitions a seller may initiate on orders containing their items.
const SELLER_TRANSITIONS: [(OrderStatus, OrderStatus); 4] = [
    (OrderStatus::Pending, OrderStatus::Confirmed),
    (OrderStatus::Pending, OrderStatus::Cancelled),
    (OrderStatus::Confirmed, OrderStatus::InProgress),
    (OrderStatus::InProgress, OrderStatus::Completed),
];

/// Decides whether an actor may read an order, and at what scope.
///
/// Buyers read their own orders in full; sellers read orders containing at
/// least one of their line items, restricted to their slice; admins read
/// everything.
pub fn authorize_read(actor: &Actor, order: &Order) -> Result<ReadScope, AccessError> {
    match actor {
        Actor::Admin => Ok(ReadScope::Full),
        Actor::Buyer(buyer_id) if order.buyer_id() == *buyer_id => Ok(ReadScope::Full),
        Actor::Seller(seller_id) if order.contains_seller(*seller_id) => {
            Ok(ReadScope::SellerSlice(*seller_id))
        }
        _ => Err(AccessError::Forbidden),
    }
}

/// Decides whether an actor may move an order to `new_status`.
///
/// Checked against the order's current status: a buyer may only cancel
/// their own order while it is still `pending`; a seller may only drive the
/// forward transitions (and pending-cancellation) on orders containing
/// their items. Whether the transition itself is on the graph is the state
/// machine's concern, checked after this gate.
pub fn authorize_status_change(
    actor: &Actor,
    order: &Order,
    new_status: OrderStatus,
) -> Result<(), AccessError> {
    match actor {
        Actor::Admin => Ok(()),
        Actor::Buyer(buyer_id) => {
            let own = order.buyer_id() == *buyer_id;
            if own && order.status() == OrderStatus::Pending && new_status == OrderStatus::Cancelled
            {
                Ok(())
            } else {
                Err(AccessError::Forbidden)
            }
        }
        Actor::Seller(seller_id) => {
            if order.contains_seller(*seller_id)
                && SELLER_TRANSITIONS.contains(&(order.status(), new_status))
            {
                Ok(())
            } else {
                Err(AccessError::Forbidden)
            }
        }
    }
}
