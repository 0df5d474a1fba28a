//! In-memory order repository.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::order_lifecycle::{Order, OrderQuery, OrderRepository, RepositoryError};
use crate::domain::shared::OrderId;

/// In-memory implementation of `OrderRepository`.
///
/// Each save replaces the whole record under a write lock, so a single save
/// is atomic. Pending domain events are not stored.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of orders in the repository, archived included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    /// Add an order to the repository (for setup), dropping its pending events.
    pub fn add(&self, mut order: Order) {
        order.drain_events();
        self.orders.write().insert(order.id().clone(), order);
    }

    /// Fetch an order without going through the async port.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<Order> {
        self.orders.read().get(id).cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut stored = order.clone();
        stored.drain_events();
        self.orders.write().insert(order.id().clone(), stored);
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find(&self, query: &OrderQuery) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read();
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        found.sort_by_key(Order::created_at);
        Ok(found)
    }
}
