pub mod order_consumer;

pub use order_consumer::{ConsumerStats, ConsumerStatsSnapshot, CycleOutcome, OrderConsumer};
