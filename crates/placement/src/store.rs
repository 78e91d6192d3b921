use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use warefront_core::{Entity, OrderId};
use warefront_orders::Order;

/// Durable-write failure, split by whether a retry can help.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("durable store temporarily unavailable: {0}")]
    Retryable(String),

    #[error("durable store rejected the order: {0}")]
    Fatal(String),
}

/// Durable order storage.
///
/// `persist` must write the order header and all line items as one atomic
/// unit: a partially written order must never become visible to readers.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn persist(&self, order: &Order) -> Result<(), PersistenceError>;
}

/// In-memory order store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.orders.read().map(|orders| orders.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn persist(&self, order: &Order) -> Result<(), PersistenceError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| PersistenceError::Fatal("order store lock poisoned".to_string()))?;

        if orders.contains_key(order.id()) {
            return Err(PersistenceError::Fatal(format!(
                "order {} already persisted",
                order.id()
            )));
        }

        orders.insert(order.id_typed(), order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use warefront_catalog::{InMemoryCatalog, ProductSnapshot};
    use warefront_core::{CustomerId, ProductId, StoreId};
    use warefront_orders::{LineRequest, OrderAssembler};

    async fn sample_order() -> Order {
        let product_id = ProductId::new();
        let catalog = InMemoryCatalog::new();
        catalog.upsert(ProductSnapshot::new(product_id, 100, true));
        let assembler = OrderAssembler::new(Arc::new(catalog));

        let assembled = assembler
            .assemble(
                StoreId::new(),
                &[LineRequest {
                    product_id,
                    quantity: 1,
                }],
            )
            .await
            .unwrap();
        assembled.into_order(OrderId::new(), CustomerId::new(), Utc::now())
    }

    #[tokio::test]
    async fn persisted_order_is_readable() {
        let store = InMemoryOrderStore::new();
        let order = sample_order().await;

        store.persist(&order).await.unwrap();
        assert_eq!(store.get(order.id_typed()), Some(order));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_order_id_is_fatal() {
        let store = InMemoryOrderStore::new();
        let order = sample_order().await;

        store.persist(&order).await.unwrap();
        let err = store.persist(&order).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Fatal(_)));
        assert_eq!(store.len(), 1);
    }
}
