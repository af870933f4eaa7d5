//! Actor identity extraction.
//!
//! Credential issuance and verification live outside this core; requests
//! arrive carrying an already-verified opaque identity in the
//! `x-actor-id` and `x-actor-role` headers, which this extractor turns
//! into a typed [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{BuyerId, SellerId};
use domain::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The authenticated actor, extracted per request.
#[derive(Debug, Clone, Copy)]
pub struct ActorIdentity(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for ActorIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, ACTOR_ID_HEADER)?;
        let id: Uuid = id
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("Invalid {ACTOR_ID_HEADER} header")))?;

        let role = header_value(parts, ACTOR_ROLE_HEADER)?;
        let role = Role::parse(role)
            .ok_or_else(|| ApiError::Unauthorized(format!("Unknown role: {role}")))?;

        let actor = match role {
            Role::Buyer => Actor::Buyer(BuyerId::from_uuid(id)),
            Role::Seller => Actor::Seller(SellerId::from_uuid(id)),
            Role::Admin => Actor::Admin,
        };
        Ok(ActorIdentity(actor))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {name} header")))
}

/// Narrows an actor to the buyer role, for buyer-only operations.
pub fn require_buyer(actor: Actor) -> Result<BuyerId, ApiError> {
    match actor {
        Actor::Buyer(buyer_id) => Ok(buyer_id),
        _ => Err(ApiError::Forbidden("Buyer role required".to_string())),
    }
}
