//! # In-Memory Order Store
//!
//! `OrderStore` backed by a `DashMap`, used by tests and local runs without
//! PostgreSQL. Insertion order is tracked with a sequence number so
//! topic listings come back in the same order as from the database.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::{StoreError, StoreResult};
use super::store::OrderStore;
use crate::models::Order;
use crate::state_machine::OrderStatus;

#[derive(Debug, Clone)]
struct StoredOrder {
    sequence: u64,
    order: Order,
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, StoredOrder>,
    next_sequence: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        match self.orders.entry(order.order_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::duplicate_order(&order.order_id)),
            Entry::Vacant(slot) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredOrder {
                    sequence,
                    order: order.clone(),
                });
                Ok(())
            }
        }
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()> {
        match self.orders.get_mut(order_id) {
            Some(mut stored) => {
                stored.order.status = status;
                Ok(())
            }
            None => Err(StoreError::order_not_found(order_id)),
        }
    }

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(order_id).map(|stored| stored.order.clone()))
    }

    async fn order_ids_by_topic(&self, topic: &str) -> StoreResult<Vec<String>> {
        let mut matching: Vec<(u64, String)> = self
            .orders
            .iter()
            .filter(|entry| entry.order.topic_name == topic)
            .map(|entry| (entry.sequence, entry.order.order_id.clone()))
            .collect();
        matching.sort_by_key(|(sequence, _)| *sequence);

        Ok(matching.into_iter().map(|(_, order_id)| order_id).collect())
    }

    fn store_type(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::NewOrder;
    use serde_json::Map;

    fn order(order_id: &str, topic: &str) -> Order {
        Order::create(
            NewOrder {
                order_id: order_id.to_string(),
                items_num: 1,
                total_amount: 10.0,
                attributes: Map::new(),
            },
            topic,
        )
    }

    #[tokio::test]
    async fn test_insert_is_unique() {
        let store = InMemoryOrderStore::new();
        store.insert_order(&order("A1", "orders")).await.unwrap();

        let err = store.insert_order(&order("A1", "other")).await.unwrap_err();
        assert_eq!(err, StoreError::duplicate_order("A1"));
        assert_eq!(
            store.find_order("A1").await.unwrap().unwrap().topic_name,
            "orders"
        );
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryOrderStore::new();
        store.insert_order(&order("A1", "orders")).await.unwrap();

        store
            .update_status("A1", OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(
            store.find_order("A1").await.unwrap().unwrap().status,
            OrderStatus::Pending
        );

        let err = store
            .update_status("missing", OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::order_not_found("missing"));
    }

    #[tokio::test]
    async fn test_order_ids_by_topic_keeps_insertion_order() {
        let store = InMemoryOrderStore::new();
        for (id, topic) in [("C3", "orders"), ("A1", "orders"), ("B2", "other"), ("D4", "orders")] {
            store.insert_order(&order(id, topic)).await.unwrap();
        }

        assert_eq!(
            store.order_ids_by_topic("orders").await.unwrap(),
            vec!["C3", "A1", "D4"]
        );
        assert!(store.order_ids_by_topic("empty").await.unwrap().is_empty());
    }
}
