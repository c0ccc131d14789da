//! # Order State Machine
//!
//! Applies decoded order events to the document store. Creates insert a new
//! order with its derived fields; updates move an existing order to a new
//! status. Nothing here retries: every failure goes back to the consumer loop.
//!
//! ```rust
//! use std::sync::Arc;
//! use order_pipeline::database::{InMemoryOrderStore, OrderStore};
//! use order_pipeline::state_machine::{OrderStateMachine, OrderStatus};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryOrderStore::new());
//! let machine = OrderStateMachine::new(store.clone());
//!
//! machine
//!     .handle(br#"{"orderId":"A1","itemsNum":2,"totalAmount":150,"status":"new"}"#, "orders")
//!     .await
//!     .unwrap();
//! machine
//!     .handle(br#"{"orderId":"A1","status":"confirmed"}"#, "orders")
//!     .await
//!     .unwrap();
//!
//! let order = store.find_order("A1").await.unwrap().unwrap();
//! assert_eq!(order.status, OrderStatus::Confirmed);
//! assert_eq!(order.shipping_cost, 3.0);
//! # });
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    errors::{ProcessingError, ProcessingResult},
    events::OrderEvent,
    states::OrderStatus,
};
use crate::database::OrderStore;
use crate::models::Order;

/// Result of applying one order event to the store
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTransition {
    /// A new order document was inserted
    Created(Order),
    /// An existing order moved from `from` to `to`
    Updated {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl OrderTransition {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Created(order) => &order.order_id,
            Self::Updated { order_id, .. } => order_id,
        }
    }
}

/// Applies decoded order messages to the document store.
///
/// Never retries: every failure is returned to the caller, which decides
/// what happens to the message.
pub struct OrderStateMachine {
    store: Arc<dyn OrderStore>,
}

impl OrderStateMachine {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Decode a message payload received on `topic` and apply it
    pub async fn handle(&self, payload: &[u8], topic: &str) -> ProcessingResult<OrderTransition> {
        let event = OrderEvent::decode(payload)?;
        debug!(
            order_id = %event.order_id(),
            event_type = event.event_type(),
            status = %event.status(),
            topic = %topic,
            "🔄 STATE_MACHINE: Decoded order event"
        );
        self.apply(event, topic).await
    }

    /// Apply an already decoded event
    pub async fn apply(&self, event: OrderEvent, topic: &str) -> ProcessingResult<OrderTransition> {
        match event {
            OrderEvent::Create(new_order) => {
                let order = Order::create(new_order, topic);
                self.store.insert_order(&order).await?;

                info!(
                    order_id = %order.order_id,
                    shipping_cost = order.shipping_cost,
                    topic = %topic,
                    "✅ STATE_MACHINE: Order created"
                );
                Ok(OrderTransition::Created(order))
            }
            OrderEvent::Update { order_id, status } => {
                let current = self
                    .store
                    .find_order(&order_id)
                    .await?
                    .ok_or_else(|| ProcessingError::OrderNotFound {
                        order_id: order_id.clone(),
                    })?;

                self.store.update_status(&order_id, status).await?;

                info!(
                    order_id = %order_id,
                    from = %current.status,
                    to = %status,
                    "✅ STATE_MACHINE: Order status updated"
                );
                Ok(OrderTransition::Updated {
                    order_id,
                    from: current.status,
                    to: status,
                })
            }
        }
    }
}
