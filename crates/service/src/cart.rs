//! Cart operations.

use catalog::{CatalogLookup, Product};
use chrono::{DateTime, Utc};
use common::{BuyerId, Money, ProductId};
use domain::{Cart, CartError};
use serde::Serialize;
use store::{CartStore, StoreError};

use crate::ServiceError;

/// How many times a cart mutation re-reads and reapplies after losing a
/// version race before giving up with `Conflict`.
const MAX_SAVE_ATTEMPTS: usize = 3;

/// A cart entry joined with its current catalog product, for display.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCartItem {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Money,
    pub added_at: DateTime<Utc>,
}

/// A cart as returned to callers: entries resolved against the catalog,
/// with a display total over the resolved entries.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub buyer_id: BuyerId,
    pub items: Vec<ResolvedCartItem>,
    pub total_amount: Money,
}

/// Service for cart mutations and resolved reads.
pub struct CartService<C, S> {
    catalog: C,
    carts: S,
}

impl<C: CatalogLookup, S: CartStore> CartService<C, S> {
    /// Creates a new cart service over a catalog and a cart store.
    pub fn new(catalog: C, carts: S) -> Self {
        Self { catalog, carts }
    }

    /// Adds a product to the buyer's cart.
    ///
    /// Validates that the product exists and is active; re-adding an
    /// already-carted product increments its quantity. Creates the cart
    /// lazily on first add.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        let product = self
            .catalog
            .product(&product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound {
                product_id: product_id.clone(),
            })?;
        if !product.is_active {
            return Err(ServiceError::ProductInactive { product_id });
        }

        self.mutate(buyer_id, |cart| {
            cart.add_item(product_id.clone(), quantity, Utc::now())
        })
        .await
    }

    /// Overwrites an entry's quantity; zero or less removes the entry.
    ///
    /// Fails with `ItemNotInCart` when the product has no entry.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        self.mutate(buyer_id, |cart| cart.set_quantity(&product_id, quantity))
            .await
    }

    /// Removes a product from the cart. Absence is a no-op, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Cart, ServiceError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let Some(mut cart) = self.carts.fetch(buyer_id).await? else {
                return Ok(Cart::new(buyer_id));
            };
            if !cart.remove_item(&product_id) {
                return Ok(cart);
            }
            match self.carts.save(&cart).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Conflict {
            key: buyer_id.to_string(),
        })
    }

    /// Empties the buyer's cart, preserving the record.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, buyer_id: BuyerId) -> Result<Cart, ServiceError> {
        match self.carts.fetch(buyer_id).await? {
            None => Ok(Cart::new(buyer_id)),
            Some(_) => {
                self.mutate(buyer_id, |cart| {
                    cart.clear();
                    Ok(())
                })
                .await
            }
        }
    }

    /// Returns the cart with entries resolved against the catalog.
    ///
    /// Entries whose product has vanished are filtered from the view but
    /// left in storage; a catalog outage fails the whole read instead.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, buyer_id: BuyerId) -> Result<CartView, ServiceError> {
        let cart = self
            .carts
            .fetch(buyer_id)
            .await?
            .unwrap_or_else(|| Cart::new(buyer_id));

        let mut items = Vec::with_capacity(cart.items().len());
        for entry in cart.items() {
            match self.catalog.product(&entry.product_id).await? {
                Some(product) => {
                    let line_total = product.price.multiply(entry.quantity);
                    items.push(ResolvedCartItem {
                        product,
                        quantity: entry.quantity,
                        line_total,
                        added_at: entry.added_at,
                    });
                }
                None => {
                    tracing::debug!(
                        product_id = %entry.product_id,
                        "cart entry points at a vanished product, hidden from view"
                    );
                }
            }
        }

        let total_amount = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total);

        Ok(CartView {
            buyer_id,
            items,
            total_amount,
        })
    }

    /// Returns the total item quantity in the buyer's cart.
    #[tracing::instrument(skip(self))]
    pub async fn count(&self, buyer_id: BuyerId) -> Result<u32, ServiceError> {
        Ok(self
            .carts
            .fetch(buyer_id)
            .await?
            .map(|cart| cart.total_quantity())
            .unwrap_or(0))
    }

    /// Read-modify-write loop: losing a version race re-reads and reapplies
    /// the mutation, since cart operations are idempotent or commutative at
    /// the entry level.
    async fn mutate<F>(&self, buyer_id: BuyerId, mut apply: F) -> Result<Cart, ServiceError>
    where
        F: FnMut(&mut Cart) -> Result<(), CartError>,
    {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut cart = self
                .carts
                .fetch(buyer_id)
                .await?
                .unwrap_or_else(|| Cart::new(buyer_id));
            apply(&mut cart)?;
            match self.carts.save(&cart).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Conflict {
            key: buyer_id.to_string(),
        })
    }
}
