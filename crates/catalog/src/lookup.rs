use async_trait::async_trait;
use common::ProductId;

use crate::{Product, Result};

/// Resolves product ids against the external catalog.
///
/// All implementations must be thread-safe (Send + Sync). Lookups are
/// expected to carry caller-supplied timeouts; a timeout surfaces as
/// [`crate::CatalogError::Unavailable`], never as a missing product.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Resolves a product by id.
    ///
    /// Returns `Ok(None)` when the product does not exist (deleted listings
    /// included); `Err(Unavailable)` is reserved for catalog outages.
    async fn product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Increments a product's cumulative sales counter.
    ///
    /// Called once per distinct product after an order is durably created.
    /// A missing product is ignored; the order is already authoritative.
    async fn record_sales(&self, id: &ProductId, quantity: u32) -> Result<()>;
}
