//! Gated order reads and writes.

use chrono::Utc;
use domain::{
    Actor, Order, OrderStatus, ReadScope, authorize_read, authorize_status_change,
    project_for_seller,
};
use store::OrderStore;

use crate::ServiceError;

/// Service for order access, mediated by the authorization gate.
///
/// Every operation re-evaluates the gate against the loaded order; nothing
/// is cached against a session. Seller reads always pass through the
/// seller view projection before leaving this service.
pub struct OrderService<S> {
    orders: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service over an order store.
    pub fn new(orders: S) -> Self {
        Self { orders }
    }

    /// Fetches one order by reference, scoped to the actor.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, actor: &Actor, reference: &str) -> Result<Order, ServiceError> {
        let order = self
            .orders
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound {
                reference: reference.to_string(),
            })?;

        match authorize_read(actor, &order)? {
            ReadScope::Full => Ok(order),
            ReadScope::SellerSlice(seller_id) => Ok(project_for_seller(&order, seller_id)),
        }
    }

    /// Lists orders visible to the actor, optionally narrowed by status.
    ///
    /// Buyers see their own orders, sellers see projections of orders
    /// containing their items, admins see everything. Newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, ServiceError> {
        let orders = match actor {
            Actor::Admin => self.orders.list_all(status).await?,
            Actor::Buyer(buyer_id) => self.orders.list_for_buyer(*buyer_id, status).await?,
            Actor::Seller(seller_id) => self
                .orders
                .list_for_seller(*seller_id, status)
                .await?
                .iter()
                .map(|order| project_for_seller(order, *seller_id))
                .collect(),
        };
        Ok(orders)
    }

    /// Applies a status transition on behalf of the actor.
    ///
    /// The gate is checked against the order's current status before the
    /// state machine: an actor without the right to make the move gets
    /// `Forbidden`, an off-graph move gets `InvalidTransition` (admins
    /// included). The update is version-checked; a concurrent writer
    /// surfaces as `Conflict`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        reference: &str,
        new_status: OrderStatus,
        cancel_reason: Option<String>,
    ) -> Result<Order, ServiceError> {
        let mut order = self
            .orders
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound {
                reference: reference.to_string(),
            })?;

        authorize_status_change(actor, &order, new_status)?;
        order.transition(new_status, cancel_reason, Utc::now())?;

        let updated = self.orders.update(&order).await?;
        tracing::info!(
            reference = %updated.reference(),
            status = %updated.status(),
            role = %actor.role(),
            "order status updated"
        );
        metrics::counter!("order_status_updates_total", "status" => new_status.as_str())
            .increment(1);

        match actor {
            Actor::Seller(seller_id) => Ok(project_for_seller(&updated, *seller_id)),
            _ => Ok(updated),
        }
    }
}
