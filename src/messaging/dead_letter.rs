//! # Dead-Letter Router
//!
//! Forwards messages the consumer could not process to the dead-letter topic
//! as a [`DeadLetterRecord`], keyed by the original message key.
//!
//! Routing is best-effort and never fails towards the caller: a dead-letter
//! publish that fails is logged and counted, with no further fallback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

use super::clients::MessagePublisher;
use super::message::{DeadLetterRecord, InboundMessage};
use crate::logging::log_message_operation;

pub struct DeadLetterRouter {
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    routed: AtomicU64,
    failed: AtomicU64,
}

impl std::fmt::Debug for DeadLetterRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadLetterRouter")
            .field("topic", &self.topic)
            .field("routed", &self.routed_count())
            .field("failed", &self.failed_count())
            .finish_non_exhaustive()
    }
}

impl DeadLetterRouter {
    pub fn new(publisher: Arc<dyn MessagePublisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            routed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Records published to the dead-letter topic
    pub fn routed_count(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Records that could not be published
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Publish `message` with `reason` to the dead-letter topic
    pub async fn route(&self, message: &InboundMessage, reason: &str) {
        let record = DeadLetterRecord::from_message(message, reason);
        let body = match serde_json::to_vec(&record) {
            Ok(body) => body,
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    topic = %message.topic,
                    offset = message.offset,
                    error = %e,
                    "❌ DEAD_LETTER: Failed to serialize dead-letter record"
                );
                return;
            }
        };

        match self
            .publisher
            .publish(&self.topic, message.key.as_deref(), &body)
            .await
        {
            Ok(receipt) => {
                self.routed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    source_topic = %message.topic,
                    source_partition = message.partition,
                    source_offset = message.offset,
                    reason = %reason,
                    "🪦 DEAD_LETTER: Message routed to dead-letter topic"
                );
                log_message_operation(
                    "dead_letter",
                    &receipt.topic,
                    record.original_key.as_deref(),
                    Some(receipt.partition),
                    Some(receipt.offset),
                    "delivered",
                );
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    dead_letter_topic = %self.topic,
                    source_topic = %message.topic,
                    source_offset = message.offset,
                    reason = %reason,
                    error = %e,
                    "❌ DEAD_LETTER: Failed to publish dead-letter record"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::clients::InMemoryBroker;

    fn message(key: Option<&[u8]>, payload: &[u8]) -> InboundMessage {
        InboundMessage {
            topic: "orders".to_string(),
            partition: 0,
            offset: 3,
            key: key.map(<[u8]>::to_vec),
            payload: Some(payload.to_vec()),
        }
    }

    #[tokio::test]
    async fn test_route_publishes_record_keyed_by_original_key() {
        let broker = InMemoryBroker::new();
        let router = DeadLetterRouter::new(broker.clone(), "dead_letter_queue");

        router
            .route(&message(Some(b"A1"), b"not json"), "Failed to decode message")
            .await;

        let routed = broker.messages("dead_letter_queue");
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].key.as_deref(), Some(&b"A1"[..]));

        let record: DeadLetterRecord = serde_json::from_slice(routed[0].payload_bytes()).unwrap();
        assert_eq!(
            record,
            DeadLetterRecord {
                original_key: Some("A1".to_string()),
                original_value: "not json".to_string(),
                error: "Failed to decode message".to_string(),
            }
        );
        assert_eq!(router.routed_count(), 1);
    }

    #[tokio::test]
    async fn test_route_failure_is_swallowed() {
        let broker = InMemoryBroker::new();
        broker.fail_topic("dead_letter_queue");
        let router = DeadLetterRouter::new(broker.clone(), "dead_letter_queue");

        router.route(&message(None, b"{}"), "Message key is missing").await;

        assert!(broker.messages("dead_letter_queue").is_empty());
        assert_eq!(router.failed_count(), 1);
        assert_eq!(router.routed_count(), 0);
    }
}
