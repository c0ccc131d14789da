//! # Broker Clients
//!
//! - `traits.rs` - [`MessagePublisher`] / [`MessageSource`] abstractions
//! - `kafka_client.rs` - rdkafka implementations
//! - `in_memory_client.rs` - in-process broker for tests

pub mod in_memory_client;
pub mod kafka_client;
pub mod traits;

// Re-export the main types for convenience
pub use in_memory_client::{CommittedOffset, InMemoryBroker, InMemoryConsumer};
pub use kafka_client::{KafkaPublisher, KafkaSource};
pub use traits::{MessagePublisher, MessageSource};
