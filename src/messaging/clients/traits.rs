//! Client traits for the two sides of the broker.
//!
//! Kafka implementations live in `kafka_client`, in-memory ones used by tests
//! in `in_memory_client`.

use async_trait::async_trait;
use std::time::Duration;

use crate::messaging::errors::MessagingResult;
use crate::messaging::message::{DeliveryReceipt, InboundMessage, PollOutcome};

/// Publishing side of a broker connection.
///
/// Must be safe for concurrent use: one handle is shared by every publish call.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Send one message and wait for the broker acknowledgment
    async fn publish(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
    ) -> MessagingResult<DeliveryReceipt>;

    /// Block until every queued message is delivered or `timeout` passes
    async fn flush(&self, timeout: Duration) -> MessagingResult<()>;

    /// Get the client type name for logging
    fn client_type(&self) -> &'static str;
}

/// Consuming side of a broker connection
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn subscribe(&self, topic: &str) -> MessagingResult<()>;

    /// Wait up to `timeout` for the next message
    async fn poll(&self, timeout: Duration) -> MessagingResult<PollOutcome>;

    /// Commit the offset after `message`, so it is not redelivered
    async fn commit(&self, message: &InboundMessage) -> MessagingResult<()>;

    async fn close(&self) -> MessagingResult<()>;

    /// Get the client type name for logging
    fn client_type(&self) -> &'static str;
}
