use async_trait::async_trait;

use super::errors::StoreResult;
use crate::models::Order;
use crate::state_machine::OrderStatus;

/// Document store operations the pipeline needs for orders.
///
/// Implementations must be safe to share between tasks: the consumer loop and
/// the query service hold the same handle.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order.
    ///
    /// Atomic insert-if-absent: fails with `StoreError::DuplicateOrder` and
    /// leaves the existing record untouched when `order_id` is taken.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    /// Set the status of an existing order; `StoreError::OrderNotFound` if absent
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()>;

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>>;

    /// Ids of the orders created from `topic`, in insertion order
    async fn order_ids_by_topic(&self, topic: &str) -> StoreResult<Vec<String>>;

    /// Get the store type name for logging
    fn store_type(&self) -> &'static str;
}
