//! # Order Queries
//!
//! Read side of the order-service: look up a single stored order, or list the
//! ids of the orders created from a given topic.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::database::{OrderStore, StoreError};
use crate::models::Order;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Missing required parameter: {parameter}")]
    MissingParameter { parameter: &'static str },

    #[error("OrderId '{order_id}' does not exist.")]
    OrderNotFound { order_id: String },

    #[error("No orders found for topic '{topic}'")]
    NoOrdersForTopic { topic: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Clone)]
pub struct OrderQueryService {
    store: Arc<dyn OrderStore>,
}

impl std::fmt::Debug for OrderQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderQueryService")
            .field("store", &self.store.store_type())
            .finish()
    }
}

impl OrderQueryService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// The stored order with id `order_id`
    pub async fn order_details(&self, order_id: &str) -> QueryResult<Order> {
        if order_id.trim().is_empty() {
            return Err(QueryError::MissingParameter {
                parameter: "order_id",
            });
        }

        debug!(order_id = %order_id, "🔍 QUERY: Looking up order");
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| QueryError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Ids of the orders created from `topic`, oldest first
    pub async fn order_ids_for_topic(&self, topic: &str) -> QueryResult<Vec<String>> {
        if topic.trim().is_empty() {
            return Err(QueryError::MissingParameter {
                parameter: "topic_name",
            });
        }

        let order_ids = self.store.order_ids_by_topic(topic).await?;
        debug!(topic = %topic, count = order_ids.len(), "🔍 QUERY: Listed orders for topic");

        if order_ids.is_empty() {
            return Err(QueryError::NoOrdersForTopic {
                topic: topic.to_string(),
            });
        }
        Ok(order_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryOrderStore;
    use crate::state_machine::{NewOrder, OrderStatus};
    use serde_json::Map;

    async fn seeded() -> OrderQueryService {
        let store = Arc::new(InMemoryOrderStore::new());
        for (order_id, topic) in [("A1", "orders"), ("B2", "orders"), ("C3", "other")] {
            let order = Order::create(
                NewOrder {
                    order_id: order_id.to_string(),
                    items_num: 1,
                    total_amount: 10.0,
                    attributes: Map::new(),
                },
                topic,
            );
            store.insert_order(&order).await.unwrap();
        }
        OrderQueryService::new(store)
    }

    #[tokio::test]
    async fn test_order_details() {
        let service = seeded().await;

        let order = service.order_details("A1").await.unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.topic_name, "orders");

        let err = service.order_details("Z9").await.unwrap_err();
        assert_eq!(err.to_string(), "OrderId 'Z9' does not exist.");

        assert_eq!(
            service.order_details("").await.unwrap_err(),
            QueryError::MissingParameter {
                parameter: "order_id"
            }
        );
    }

    #[tokio::test]
    async fn test_order_ids_for_topic_in_insertion_order() {
        let service = seeded().await;

        assert_eq!(
            service.order_ids_for_topic("orders").await.unwrap(),
            vec!["A1".to_string(), "B2".to_string()]
        );
        assert!(matches!(
            service.order_ids_for_topic("missing").await,
            Err(QueryError::NoOrdersForTopic { .. })
        ));
        assert!(matches!(
            service.order_ids_for_topic(" ").await,
            Err(QueryError::MissingParameter { .. })
        ));
    }
}
