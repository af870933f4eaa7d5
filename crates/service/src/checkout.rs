//! The cart-to-order converter.

use catalog::CatalogLookup;
use chrono::Utc;
use common::{BuyerId, OrderId, ProductId};
use domain::{LineItem, Order, OrderDetails};
use store::{CartStore, OrderStore, StoreError};

use crate::{ServiceError, sales};

/// Converts a buyer's cart into a persisted order.
///
/// The ordering of effects is the defining safety property: the cart is
/// cleared only after the order is durably created, and the sales tally
/// runs after both, never affecting the checkout result.
pub struct CheckoutService<C, CS, OS> {
    catalog: C,
    carts: CS,
    orders: OS,
}

impl<C, CS, OS> CheckoutService<C, CS, OS>
where
    C: CatalogLookup + Clone + Send + Sync + 'static,
    CS: CartStore,
    OS: OrderStore,
{
    /// Creates a new checkout service.
    pub fn new(catalog: C, carts: CS, orders: OS) -> Self {
        Self {
            catalog,
            carts,
            orders,
        }
    }

    /// Runs the conversion for a buyer.
    ///
    /// 1. Fetches the cart; empty or missing fails `EmptyCart`.
    /// 2. Re-resolves every entry against the catalog; a vanished product
    ///    fails the whole conversion with `ProductNotFound`, cart untouched.
    /// 3. Freezes seller, unit price and subtotal per line item.
    /// 4. Creates the order (`pending`/`pending`) under a fresh reference.
    /// 5. Clears the converted entries from the cart.
    /// 6. Tallies per-product sales, detached from this call.
    #[tracing::instrument(skip(self, details))]
    pub async fn checkout(
        &self,
        buyer_id: BuyerId,
        details: OrderDetails,
    ) -> Result<Order, ServiceError> {
        let started = std::time::Instant::now();

        let cart = self
            .carts
            .fetch(buyer_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(ServiceError::EmptyCart)?;

        let mut items = Vec::with_capacity(cart.items().len());
        for entry in cart.items() {
            let product = self
                .catalog
                .product(&entry.product_id)
                .await?
                .ok_or_else(|| ServiceError::ProductNotFound {
                    product_id: entry.product_id.clone(),
                })?;
            items.push(LineItem::new(
                entry.product_id.clone(),
                product.seller_id,
                entry.quantity,
                product.price,
            ));
        }

        let reference = self.orders.allocate_reference().await?;
        let order = Order::create(
            OrderId::new(),
            reference,
            buyer_id,
            items,
            details,
            Utc::now(),
        )?;
        let order = self.orders.create(order).await?;

        tracing::info!(
            reference = %order.reference(),
            total_cents = order.total_amount().cents(),
            line_items = order.items().len(),
            "order created from cart"
        );
        metrics::counter!("orders_created_total").increment(1);

        // The order exists; everything below is cleanup and best-effort.
        let converted: Vec<ProductId> = order
            .items()
            .iter()
            .map(|item| item.product_id.clone())
            .collect();
        self.clear_converted(buyer_id, &converted).await;

        let tallies: Vec<(ProductId, u32)> = order
            .items()
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect();
        sales::spawn_tally(self.catalog.clone(), tallies);

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(order)
    }

    /// Removes the converted entries from the buyer's cart.
    ///
    /// Removal (rather than a blanket clear) preserves entries added
    /// concurrently during the conversion; a lost version race re-reads and
    /// reapplies. Failures are logged, never unwound — the order is already
    /// authoritative.
    async fn clear_converted(&self, buyer_id: BuyerId, product_ids: &[ProductId]) {
        for _ in 0..3 {
            let mut cart = match self.carts.fetch(buyer_id).await {
                Ok(Some(cart)) => cart,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, %buyer_id, "cart fetch after checkout failed");
                    return;
                }
            };
            for product_id in product_ids {
                cart.remove_item(product_id);
            }
            match self.carts.save(&cart).await {
                Ok(_) => return,
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, %buyer_id, "cart clear after checkout failed");
                    return;
                }
            }
        }
        tracing::warn!(%buyer_id, "cart clear after checkout kept losing version races");
    }
}
