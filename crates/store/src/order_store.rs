use async_trait::async_trait;
use common::{BuyerId, SellerId};
use domain::{Order, OrderReference, OrderStatus};

use crate::Result;

/// Persistence for orders.
///
/// Orders are append-only apart from version-checked updates to their
/// mutable fields; listings are newest-first and never block writes.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Allocates the next order reference from a strictly increasing,
    /// store-scoped sequence.
    ///
    /// Safe under concurrent checkout; allocated references are unique even
    /// when the subsequent create fails (gaps are fine, duplicates are not).
    async fn allocate_reference(&self) -> Result<OrderReference>;

    /// Inserts a freshly created order.
    ///
    /// Fails with [`crate::StoreError::DuplicateReference`] if an order
    /// with the same reference or id already exists.
    async fn create(&self, order: Order) -> Result<Order>;

    /// Fetches an order by its external reference.
    async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>>;

    /// Persists changes to an order's mutable fields under an optimistic
    /// version check.
    async fn update(&self, order: &Order) -> Result<Order>;

    /// Lists every order, optionally narrowed to an exact status.
    async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>>;

    /// Lists a buyer's orders, optionally narrowed to an exact status.
    async fn list_for_buyer(
        &self,
        buyer_id: BuyerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;

    /// Lists orders containing at least one line item from the seller,
    /// optionally narrowed to an exact status.
    ///
    /// Returns full orders; the caller is responsible for projecting them
    /// down to the seller's slice before exposing them.
    async fn list_for_seller(
        &self,
        seller_id: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;
}
