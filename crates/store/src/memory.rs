use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use common::{BuyerId, OrderId, SellerId};
use domain::{Cart, Order, OrderReference, OrderStatus};
use tokio::sync::RwLock;

use crate::{CartStore, OrderStore, Result, StoreError};

/// In-memory cart store.
///
/// Mutations run under a single write lock, so concurrent saves for the
/// same buyer serialize and the version check catches stale writers. The
/// `set_unavailable` switch simulates an outage for tests.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<BuyerId, Cart>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn fetch(&self, buyer_id: BuyerId) -> Result<Option<Cart>> {
        self.check_available()?;
        Ok(self.carts.read().await.get(&buyer_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<Cart> {
        self.check_available()?;
        let mut carts = self.carts.write().await;

        let current_version = carts.get(&cart.buyer_id()).map(|c| c.version()).unwrap_or(0);
        if cart.version() != current_version {
            return Err(StoreError::VersionConflict {
                key: cart.buyer_id().to_string(),
                expected: cart.version(),
                actual: current_version,
            });
        }

        let mut stored = cart.clone();
        stored.set_version(current_version + 1);
        carts.insert(stored.buyer_id(), stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
struct OrderState {
    orders: HashMap<OrderId, Order>,
    references: HashMap<String, OrderId>,
}

/// In-memory order store.
///
/// References come from an atomic counter; creates and updates run under a
/// single write lock. Listings scan and sort newest-first, matching the
/// Postgres backend's ordering.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
    sequence: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

fn sort_newest_first(orders: &mut Vec<Order>) {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn allocate_reference(&self) -> Result<OrderReference> {
        self.check_available()?;
        let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderReference::from_sequence(next))
    }

    async fn create(&self, order: Order) -> Result<Order> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let reference = order.reference().as_str().to_string();
        if state.orders.contains_key(&order.id()) || state.references.contains_key(&reference) {
            return Err(StoreError::DuplicateReference(reference));
        }

        let mut stored = order;
        stored.set_version(1);
        state.references.insert(reference, stored.id());
        state.orders.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .references
            .get(reference)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn update(&self, order: &Order) -> Result<Order> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let Some(current) = state.orders.get(&order.id()) else {
            return Err(StoreError::NotFound {
                key: order.reference().to_string(),
            });
        };
        if current.version() != order.version() {
            return Err(StoreError::VersionConflict {
                key: order.reference().to_string(),
                expected: order.version(),
                actual: current.version(),
            });
        }

        let mut stored = order.clone();
        stored.set_version(current.version() + 1);
        state.orders.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_for_buyer(
        &self,
        buyer_id: BuyerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.buyer_id() == buyer_id)
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_for_seller(
        &self,
        seller_id: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.contains_seller(seller_id))
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Money, OrderId, ProductId};
    use domain::{LineItem, OrderDetails};

    fn order_for(buyer_id: BuyerId, seller_id: SellerId, reference: u64) -> Order {
        Order::create(
            OrderId::new(),
            OrderReference::from_sequence(reference),
            buyer_id,
            vec![LineItem::new(
                "SKU-001",
                seller_id,
                1,
                Money::from_dollars(10),
            )],
            OrderDetails::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn cart_save_and_fetch_roundtrip() {
        let store = InMemoryCartStore::new();
        let buyer_id = BuyerId::new();

        assert!(store.fetch(buyer_id).await.unwrap().is_none());

        let mut cart = Cart::new(buyer_id);
        cart.add_item(ProductId::new("SKU-001"), 2, Utc::now())
            .unwrap();
        let stored = store.save(&cart).await.unwrap();
        assert_eq!(stored.version(), 1);

        let fetched = store.fetch(buyer_id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn stale_cart_save_conflicts() {
        let store = InMemoryCartStore::new();
        let buyer_id = BuyerId::new();

        let cart = Cart::new(buyer_id);
        store.save(&cart).await.unwrap();

        // A writer holding the pre-save copy loses.
        let result = store.save(&cart).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn concurrent_cart_saves_keep_both_increments() {
        let store = InMemoryCartStore::new();
        let buyer_id = BuyerId::new();
        let product_id = ProductId::new("SKU-001");

        // Two tasks race to add one unit each; the version check forces the
        // loser to re-read, so neither increment is lost.
        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            let product_id = product_id.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let mut cart = store
                        .fetch(buyer_id)
                        .await
                        .unwrap()
                        .unwrap_or_else(|| Cart::new(buyer_id));
                    cart.add_item(product_id.clone(), 1, Utc::now()).unwrap();
                    match store.save(&cart).await {
                        Ok(_) => break,
                        Err(StoreError::VersionConflict { .. }) => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let cart = store.fetch(buyer_id).await.unwrap().unwrap();
        assert_eq!(cart.item(&product_id).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn references_are_unique_and_increasing() {
        let store = InMemoryOrderStore::new();
        let first = store.allocate_reference().await.unwrap();
        let second = store.allocate_reference().await.unwrap();

        assert_eq!(first.as_str(), "ORD-000001");
        assert_eq!(second.as_str(), "ORD-000002");
    }

    #[tokio::test]
    async fn create_and_get_by_reference() {
        let store = InMemoryOrderStore::new();
        let order = order_for(BuyerId::new(), SellerId::new(), 1);

        let stored = store.create(order).await.unwrap();
        assert_eq!(stored.version(), 1);

        let fetched = store.get_by_reference("ORD-000001").await.unwrap().unwrap();
        assert_eq!(fetched, stored);

        assert!(store.get_by_reference("ORD-999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_reference_is_rejected() {
        let store = InMemoryOrderStore::new();
        store
            .create(order_for(BuyerId::new(), SellerId::new(), 1))
            .await
            .unwrap();

        let result = store
            .create(order_for(BuyerId::new(), SellerId::new(), 1))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateReference(_))));
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writers() {
        let store = InMemoryOrderStore::new();
        let stored = store
            .create(order_for(BuyerId::new(), SellerId::new(), 1))
            .await
            .unwrap();

        let mut fresh = stored.clone();
        fresh
            .transition(OrderStatus::Confirmed, None, Utc::now())
            .unwrap();
        let updated = store.update(&fresh).await.unwrap();
        assert_eq!(updated.version(), 2);
        assert_eq!(updated.status(), OrderStatus::Confirmed);

        // The original copy is now stale.
        let result = store.update(&stored).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn update_of_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let order = order_for(BuyerId::new(), SellerId::new(), 1);
        let result = store.update(&order).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn listings_are_role_scoped_and_status_filtered() {
        let store = InMemoryOrderStore::new();
        let buyer_a = BuyerId::new();
        let buyer_b = BuyerId::new();
        let seller = SellerId::new();

        store.create(order_for(buyer_a, seller, 1)).await.unwrap();
        store
            .create(order_for(buyer_b, SellerId::new(), 2))
            .await
            .unwrap();

        assert_eq!(store.list_all(None).await.unwrap().len(), 2);
        assert_eq!(store.list_for_buyer(buyer_a, None).await.unwrap().len(), 1);
        assert_eq!(store.list_for_seller(seller, None).await.unwrap().len(), 1);
        assert_eq!(
            store
                .list_for_seller(SellerId::new(), None)
                .await
                .unwrap()
                .len(),
            0
        );

        assert_eq!(
            store
                .list_all(Some(OrderStatus::Pending))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store
                .list_all(Some(OrderStatus::Completed))
                .await
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryOrderStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.allocate_reference().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.get_by_reference("ORD-000001").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(false);
        assert!(store.allocate_reference().await.is_ok());
    }
}
