use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use order_pipeline::database::{InMemoryOrderStore, OrderStore, StoreError, StoreResult};
use order_pipeline::models::Order;
use order_pipeline::state_machine::OrderStatus;

/// In-memory store whose writes can be made to fail like a lost database
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: InMemoryOrderStore,
    failing: AtomicBool,
    write_attempts: AtomicU32,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> StoreResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::query(operation, "connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for FailingStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.check("insert_order")?;
        self.inner.insert_order(order).await
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()> {
        self.check("update_status")?;
        self.inner.update_status(order_id, status).await
    }

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        self.inner.find_order(order_id).await
    }

    async fn order_ids_by_topic(&self, topic: &str) -> StoreResult<Vec<String>> {
        self.inner.order_ids_by_topic(topic).await
    }

    fn store_type(&self) -> &'static str {
        "failing"
    }
}
