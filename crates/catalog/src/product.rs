use common::{Money, ProductId, SellerId};
use serde::{Deserialize, Serialize};

/// A catalog product as seen by the transaction core.
///
/// Read-only here apart from the cumulative `sales` counter, which the
/// checkout path increments through [`crate::CatalogLookup::record_sales`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// The product identifier.
    pub id: ProductId,

    /// Human-readable product title.
    pub title: String,

    /// The seller who owns this listing.
    pub seller_id: SellerId,

    /// Current listed price. Non-negative.
    pub price: Money,

    /// Whether the listing is currently purchasable.
    pub is_active: bool,

    /// Cumulative units sold across all orders.
    pub sales: u64,
}

impl Product {
    /// Creates an active product with zero sales.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        seller_id: SellerId,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            seller_id,
            price,
            is_active: true,
            sales: 0,
        }
    }

    /// Returns a copy of this product marked inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}
