use async_trait::async_trait;
use common::BuyerId;
use domain::Cart;

use crate::Result;

/// Persistence for per-buyer carts.
///
/// One cart record per buyer. Writes are serialized per buyer through the
/// cart's version: `save` succeeds only when the cart's version matches the
/// stored one (zero for a cart that has never been saved), then stores the
/// cart with the version bumped. A mismatch fails with
/// [`crate::StoreError::VersionConflict`], which callers resolve by
/// re-reading and reapplying.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetches a buyer's cart.
    ///
    /// Returns `None` for buyers who have never stored one; the service
    /// layer creates carts lazily on first add.
    async fn fetch(&self, buyer_id: BuyerId) -> Result<Option<Cart>>;

    /// Saves a cart under an optimistic version check.
    ///
    /// Returns the stored cart carrying the new version.
    async fn save(&self, cart: &Cart) -> Result<Cart>;
}
