use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;

use crate::{CatalogError, CatalogLookup, Product, Result};

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    unavailable: bool,
    fail_next_sales: u32,
}

/// In-memory catalog for tests and local runs.
///
/// Provides the same interface as a real catalog client, plus fault
/// injection: `set_unavailable` fails every call, `fail_next_sales` fails
/// the next N sales tallies and then recovers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub fn upsert(&self, product: Product) {
        let mut state = self.state.write().unwrap();
        state.products.insert(product.id.clone(), product);
    }

    /// Removes a product entirely, as if the listing had been deleted.
    pub fn remove(&self, id: &ProductId) {
        self.state.write().unwrap().products.remove(id);
    }

    /// Overwrites a product's price, leaving everything else untouched.
    pub fn set_price(&self, id: &ProductId, price: common::Money) {
        let mut state = self.state.write().unwrap();
        if let Some(product) = state.products.get_mut(id) {
            product.price = price;
        }
    }

    /// Returns the cumulative sales recorded for a product.
    pub fn sales(&self, id: &ProductId) -> u64 {
        self.state
            .read()
            .unwrap()
            .products
            .get(id)
            .map(|p| p.sales)
            .unwrap_or(0)
    }

    /// Makes every catalog call fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Fails the next `count` sales tallies, then recovers.
    pub fn fail_next_sales(&self, count: u32) {
        self.state.write().unwrap().fail_next_sales = count;
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(CatalogError::Unavailable("simulated outage".to_string()));
        }
        Ok(state.products.get(id).cloned())
    }

    async fn record_sales(&self, id: &ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.unavailable {
            return Err(CatalogError::Unavailable("simulated outage".to_string()));
        }
        if state.fail_next_sales > 0 {
            state.fail_next_sales -= 1;
            return Err(CatalogError::Unavailable(
                "simulated tally failure".to_string(),
            ));
        }
        if let Some(product) = state.products.get_mut(id) {
            product.sales += quantity as u64;
        }
        Ok(())
    }
}
