//! # Messaging Module
//!
//! Broker-facing half of the pipeline: clients for Kafka (and an in-memory
//! stand-in), connection establishment, the order producer and the
//! dead-letter router.

pub mod clients;
pub mod connection;
pub mod dead_letter;
pub mod errors;
pub mod message;
pub mod producer;

pub use clients::{InMemoryBroker, InMemoryConsumer, KafkaPublisher, KafkaSource};
pub use clients::{MessagePublisher, MessageSource};
pub use connection::{ConnectionManager, ConnectionState};
pub use dead_letter::DeadLetterRouter;
pub use errors::{ConnectionError, MessagingError, MessagingResult, PublishError};
pub use message::{DeadLetterRecord, DeliveryReceipt, InboundMessage, OrderMessage, PollOutcome};
pub use producer::{OrderProducer, PublishFailure, PublishFailureHook, SubmitError};
