//! # Order Producer
//!
//! Publishes order events to the orders topic, keyed by order id so that all
//! events of one order land on the same partition.
//!
//! Each publish sends the message, waits for the broker acknowledgment and
//! flushes, retrying under the producer's [`RetryPolicy`]. When the budget is
//! spent the message is abandoned: the failure is logged, counted and handed
//! to the optional [`PublishFailureHook`], and the caller still gets `Ok(())`.
//! The only error a caller can see is [`PublishError::NotInitialized`], for a
//! producer whose broker connection was never established.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::clients::MessagePublisher;
use super::errors::{MessagingError, PublishError};
use super::message::OrderMessage;
use crate::logging::log_message_operation;
use crate::resilience::RetryPolicy;
use crate::validation::{CreateOrderRequest, UpdateOrderRequest, ValidationError};

/// A message abandoned after exhausting its publish attempts
#[derive(Debug, Clone, PartialEq)]
pub struct PublishFailure {
    pub topic: String,
    pub key: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Called once for every abandoned message
pub type PublishFailureHook = Arc<dyn Fn(&PublishFailure) + Send + Sync>;

/// Errors from the request-level submit helpers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Failed to serialize order message: {0}")]
    Serialization(String),
}

pub struct OrderProducer {
    publisher: Option<Arc<dyn MessagePublisher>>,
    topic: String,
    retry: RetryPolicy,
    flush_timeout: Duration,
    failure_hook: Option<PublishFailureHook>,
    abandoned: AtomicU64,
}

impl std::fmt::Debug for OrderProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderProducer")
            .field("ready", &self.is_ready())
            .field("topic", &self.topic)
            .field("retry", &self.retry)
            .field("abandoned", &self.abandoned_count())
            .finish_non_exhaustive()
    }
}

impl OrderProducer {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        topic: impl Into<String>,
        retry: RetryPolicy,
        flush_timeout: Duration,
    ) -> Self {
        Self {
            publisher: Some(publisher),
            topic: topic.into(),
            retry,
            flush_timeout,
            failure_hook: None,
            abandoned: AtomicU64::new(0),
        }
    }

    /// Producer without a broker connection; every publish fails fast
    pub fn unready(topic: impl Into<String>, retry: RetryPolicy, flush_timeout: Duration) -> Self {
        Self {
            publisher: None,
            topic: topic.into(),
            retry,
            flush_timeout,
            failure_hook: None,
            abandoned: AtomicU64::new(0),
        }
    }

    pub fn with_failure_hook(mut self, hook: PublishFailureHook) -> Self {
        self.failure_hook = Some(hook);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.publisher.is_some()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Messages given up on since creation
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Publish `message` keyed by `key`.
    ///
    /// Blocks until the broker acknowledged the message or the retry budget is
    /// spent. Exhausting the budget is not an error for the caller.
    pub async fn publish(&self, message: &str, key: &str) -> Result<(), PublishError> {
        let publisher = self.publisher.as_ref().ok_or_else(|| {
            error!(topic = %self.topic, key = %key, "❌ PRODUCER: Producer not initialized");
            PublishError::NotInitialized
        })?;

        let result = self
            .retry
            .run("publish_order", |attempt| {
                let publisher = Arc::clone(publisher);
                async move {
                    let receipt = publisher
                        .publish(&self.topic, Some(key.as_bytes()), message.as_bytes())
                        .await?;
                    debug!(
                        topic = %receipt.topic,
                        partition = receipt.partition,
                        offset = receipt.offset,
                        key = %key,
                        attempt = attempt + 1,
                        "📨 PRODUCER: Message delivered"
                    );
                    publisher.flush(self.flush_timeout).await?;
                    Ok::<_, MessagingError>(receipt)
                }
            })
            .await;

        match result {
            Ok(receipt) => {
                log_message_operation(
                    "publish",
                    &receipt.topic,
                    Some(key),
                    Some(receipt.partition),
                    Some(receipt.offset),
                    "delivered",
                );
            }
            Err(exhausted) => {
                let failure = PublishFailure {
                    topic: self.topic.clone(),
                    key: key.to_string(),
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error.to_string(),
                };
                self.abandoned.fetch_add(1, Ordering::Relaxed);
                warn!(
                    topic = %failure.topic,
                    key = %failure.key,
                    attempts = failure.attempts,
                    error = %failure.last_error,
                    "⚠️ PRODUCER: Message abandoned after exhausting publish attempts"
                );
                if let Some(hook) = &self.failure_hook {
                    hook(&failure);
                }
            }
        }

        Ok(())
    }

    /// Serialize and publish `message`, keyed by its order id
    pub async fn publish_order(&self, message: &OrderMessage) -> Result<(), SubmitError> {
        let body = message
            .to_json()
            .map_err(|e| SubmitError::Serialization(e.to_string()))?;
        self.publish(&body, &message.order_id).await?;
        Ok(())
    }

    /// Validate a create request and publish it as a `new` order event
    pub async fn submit_create(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderMessage, SubmitError> {
        let message = request.into_message()?;
        self.publish_order(&message).await?;
        Ok(message)
    }

    /// Validate an update request and publish it as a status event
    pub async fn submit_update(
        &self,
        request: UpdateOrderRequest,
    ) -> Result<OrderMessage, SubmitError> {
        let message = request.into_message()?;
        self.publish_order(&message).await?;
        Ok(message)
    }
}
