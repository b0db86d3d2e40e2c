use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Clock, OrderId, SystemClock};
use tokio::sync::RwLock;

use super::{NewOrder, Order};
use crate::error::{DomainError, Result};

/// Storage for customer orders, keyed by `(email, id)`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order, assigning its id and creation time.
    async fn create(&self, order: NewOrder) -> Result<Order>;

    /// Returns every order.
    async fn get_all(&self) -> Result<Vec<Order>>;

    /// Returns the orders of one customer.
    async fn get_by_email(&self, email: &str) -> Result<Vec<Order>>;

    /// Returns one order, or `None` if absent.
    async fn get(&self, email: &str, id: &OrderId) -> Result<Option<Order>>;

    /// Removes an order and returns its last state.
    ///
    /// Fails with `WriteFailure` when the order does not exist.
    async fn delete(&self, email: &str, id: &OrderId) -> Result<Order>;
}

type OrderKey = (String, OrderId);

/// In-memory order repository.
#[derive(Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<BTreeMap<OrderKey, Order>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository stamping orders with wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty repository stamping orders with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(BTreeMap::new())),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(OrderId::generate(), self.clock.now());
        self.orders
            .write()
            .await
            .insert((order.email.clone(), order.id.clone()), order.clone());
        Ok(order)
    }

    async fn get_all(&self) -> Result<Vec<Order>> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn get_by_email(&self, email: &str) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.email == email)
            .cloned()
            .collect())
    }

    async fn get(&self, email: &str, id: &OrderId) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .get(&(email.to_string(), id.clone()))
            .cloned())
    }

    async fn delete(&self, email: &str, id: &OrderId) -> Result<Order> {
        self.orders
            .write()
            .await
            .remove(&(email.to_string(), id.clone()))
            .ok_or_else(|| DomainError::missing_on_write("Order", id.as_str()))
    }
}
