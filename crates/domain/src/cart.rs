//! Per-buyer shopping cart.

use chrono::{DateTime, Utc};
use common::{BuyerId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when mutating a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be at least 1 when adding.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// The product has no entry in this cart.
    #[error("item not in cart: {product_id}")]
    ItemNotInCart { product_id: ProductId },
}

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product this entry refers to.
    pub product_id: ProductId,

    /// How many units the buyer wants. Always >= 1 once stored.
    pub quantity: u32,

    /// When the entry was first added.
    pub added_at: DateTime<Utc>,
}

/// A buyer's staging list of product/quantity pairs, pre-purchase.
///
/// Entries are ordered by insertion and unique by product id; re-adding a
/// product increments its quantity instead of duplicating the entry. The
/// `version` field is the optimistic concurrency token managed by the
/// cart store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    buyer_id: BuyerId,

    #[serde(default)]
    version: u64,

    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart for a buyer.
    pub fn new(buyer_id: BuyerId) -> Self {
        Self {
            buyer_id,
            version: 0,
            items: Vec::new(),
        }
    }

    /// Returns the owning buyer.
    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    /// Returns the store-managed version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the store-managed version.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Returns the entries in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the entry for a product, if present.
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Returns true if the cart holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total quantity across all entries.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Adds a product to the cart.
    ///
    /// If the product already has an entry, its quantity is incremented and
    /// the original `added_at` is kept; otherwise a new entry is appended.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        added_at: DateTime<Utc>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity += quantity;
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
                added_at,
            });
        }
        Ok(())
    }

    /// Overwrites an entry's quantity.
    ///
    /// A quantity of zero or less removes the entry; an entry is never
    /// stored with a non-positive quantity. Fails if the product has no
    /// entry in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        let Some(position) = self.items.iter().position(|i| &i.product_id == product_id) else {
            return Err(CartError::ItemNotInCart {
                product_id: product_id.clone(),
            });
        };

        if quantity <= 0 {
            self.items.remove(position);
        } else {
            self.items[position].quantity = quantity as u32;
        }
        Ok(())
    }

    /// Removes an entry if present. Absence is not an error.
    ///
    /// Returns true if an entry was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() != before
    }

    /// Empties the items list, preserving the cart record itself.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
