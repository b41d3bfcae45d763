use crate::domain::order::{Order, PaymentSource};
use crate::domain::ports::{OrderStore, PaymentSourceStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for orders, keyed by order number.
///
/// Clones share the same underlying map.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.number.clone(), order);
        Ok(())
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.get(number).cloned())
    }
}

/// A thread-safe in-memory store for payment sources, keyed by order id.
#[derive(Default, Clone)]
pub struct InMemoryPaymentSourceStore {
    sources: Arc<RwLock<HashMap<u64, PaymentSource>>>,
}

impl InMemoryPaymentSourceStore {
    /// Creates a new, empty in-memory payment source store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentSourceStore for InMemoryPaymentSourceStore {
    async fn save(&self, source: PaymentSource) -> Result<(), StoreError> {
        let mut sources = self.sources.write().await;
        sources.insert(source.order_id, source);
        Ok(())
    }

    async fn get_for_order(&self, order_id: u64) -> Result<Option<PaymentSource>, StoreError> {
        let sources = self.sources.read().await;
        Ok(sources.get(&order_id).cloned())
    }
}
