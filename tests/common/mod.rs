#![allow(dead_code)]

pub mod failing_store;
pub mod strategies;

pub use failing_store::FailingStore;

use std::sync::Arc;
use std::time::Duration;

use order_pipeline::consumer::{CycleOutcome, OrderConsumer};
use order_pipeline::database::{InMemoryOrderStore, OrderStore};
use order_pipeline::messaging::clients::InMemoryBroker;
use order_pipeline::messaging::{DeadLetterRecord, DeadLetterRouter, OrderProducer};
use order_pipeline::resilience::RetryPolicy;
use order_pipeline::state_machine::OrderStateMachine;

pub const ORDERS: &str = "orders";
pub const DEAD_LETTER: &str = "dead_letter_queue";

/// Same schedule as production, measured in milliseconds instead of seconds
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::exponential(max_attempts, 2).with_unit(Duration::from_millis(1))
}

/// Producer, broker, consumer and store wired together in memory
pub struct PipelineHarness {
    pub broker: Arc<InMemoryBroker>,
    pub store: Arc<dyn OrderStore>,
    pub producer: OrderProducer,
    pub consumer: OrderConsumer,
}

impl PipelineHarness {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(InMemoryOrderStore::new())).await
    }

    pub async fn with_store(store: Arc<dyn OrderStore>) -> Self {
        let broker = InMemoryBroker::new();
        let producer = OrderProducer::new(
            broker.clone(),
            ORDERS,
            fast_retry(5),
            Duration::from_secs(1),
        );
        let consumer = OrderConsumer::new(
            Arc::new(broker.consumer()),
            OrderStateMachine::new(Arc::clone(&store)),
            DeadLetterRouter::new(broker.clone(), DEAD_LETTER),
            ORDERS,
        )
        .with_timing(Duration::from_millis(20), Duration::from_millis(1));
        consumer
            .subscribe()
            .await
            .expect("in-memory subscribe cannot fail");

        Self {
            broker,
            store,
            producer,
            consumer,
        }
    }

    /// Append a raw message to the orders topic, bypassing the producer
    pub fn send_raw(&self, key: Option<&str>, payload: &str) -> i64 {
        self.broker
            .inject(ORDERS, key.map(str::as_bytes), Some(payload.as_bytes()))
    }

    /// Run consumer cycles until it reports it has caught up
    pub async fn drain(&self) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.consumer.process_next().await {
                CycleOutcome::Idle | CycleOutcome::PartitionEof { .. } => return outcomes,
                outcome => outcomes.push(outcome),
            }
        }
    }

    pub fn dead_letters(&self) -> Vec<DeadLetterRecord> {
        self.broker
            .messages(DEAD_LETTER)
            .iter()
            .map(|message| {
                serde_json::from_slice(message.payload_bytes()).expect("dead-letter record is JSON")
            })
            .collect()
    }

    pub fn committed_offsets(&self) -> Vec<i64> {
        self.broker
            .commits()
            .into_iter()
            .map(|commit| commit.offset)
            .collect()
    }
}
