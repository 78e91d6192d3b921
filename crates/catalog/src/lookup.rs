use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use warefront_core::ProductId;

use crate::product::ProductSnapshot;

/// Read-only access to current product price and sale status.
///
/// Implementations may perform IO (database, remote service); callers treat
/// every lookup as a suspension point. `None` means the product does not
/// exist from the caller's perspective.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn product(&self, product_id: ProductId) -> Option<ProductSnapshot>;
}

/// In-memory catalog.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product entry.
    pub fn upsert(&self, snapshot: ProductSnapshot) {
        if let Ok(mut products) = self.products.write() {
            products.insert(snapshot.product_id, snapshot);
        }
    }

    /// Flip a product's sale status, if the product exists.
    pub fn set_active(&self, product_id: ProductId, active: bool) {
        if let Ok(mut products) = self.products.write() {
            if let Some(snapshot) = products.get_mut(&product_id) {
                snapshot.active = active;
            }
        }
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn product(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        self.products.read().ok()?.get(&product_id).copied()
    }
}
