//! # In-Memory Broker
//!
//! Single-process stand-in for Kafka used by tests and local runs. Each topic
//! is one partition (partition 0) whose offsets are indexes into an
//! append-only log.
//!
//! ## Key Features
//!
//! - **Both sides**: the broker is a [`MessagePublisher`]; [`InMemoryBroker::consumer`]
//!   hands out [`MessageSource`]s over the same logs
//! - **Latest-offset subscriptions**: a consumer only sees messages published
//!   after it subscribed, unless created with `consumer_from_earliest`
//! - **Partition EOF**: reported once each time a consumer catches up
//! - **Failure injection**: publish, flush, poll and commit can be made to fail
//! - **Inspection**: published messages and committed offsets can be read back
//!
//! ## Usage
//!
//! ```rust
//! use order_pipeline::messaging::clients::{InMemoryBroker, MessagePublisher, MessageSource};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = InMemoryBroker::new();
//! let consumer = broker.consumer();
//! consumer.subscribe("orders").await?;
//! broker.publish("orders", Some(b"A1"), br#"{"orderId":"A1"}"#).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use super::traits::{MessagePublisher, MessageSource};
use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::message::{DeliveryReceipt, InboundMessage, PollOutcome};

const PARTITION: i32 = 0;

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Option<Vec<u8>>,
    payload: Option<Vec<u8>>,
}

/// A committed offset as recorded by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedOffset {
    pub topic: String,
    pub partition: i32,
    /// Offset of the message that was committed (the next read starts after it)
    pub offset: i64,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<StoredRecord>>,
    commits: Vec<CommittedOffset>,
    publish_calls: u64,
    failing_publishes: u32,
    failing_topics: HashSet<String>,
    failing_flushes: u32,
    failing_polls: u32,
    failing_commits: u32,
}

#[derive(Debug, Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    published: Notify,
}

impl InMemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Consumer that starts at the end of the topic it subscribes to
    pub fn consumer(self: &Arc<Self>) -> InMemoryConsumer {
        InMemoryConsumer::new(Arc::clone(self), false)
    }

    /// Consumer that starts at the beginning of the topic it subscribes to
    pub fn consumer_from_earliest(self: &Arc<Self>) -> InMemoryConsumer {
        InMemoryConsumer::new(Arc::clone(self), true)
    }

    /// Messages currently stored in `topic`
    pub fn messages(&self, topic: &str) -> Vec<InboundMessage> {
        let state = self.state.lock();
        state
            .topics
            .get(topic)
            .map(|log| {
                log.iter()
                    .enumerate()
                    .map(|(offset, record)| InboundMessage {
                        topic: topic.to_string(),
                        partition: PARTITION,
                        offset: offset as i64,
                        key: record.key.clone(),
                        payload: record.payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn commits(&self) -> Vec<CommittedOffset> {
        self.state.lock().commits.clone()
    }

    /// Number of publish calls, failed ones included
    pub fn publish_calls(&self) -> u64 {
        self.state.lock().publish_calls
    }

    /// Fail the next `count` publish calls
    pub fn fail_next_publishes(&self, count: u32) {
        self.state.lock().failing_publishes = count;
    }

    /// Fail every publish to `topic` until [`restore_topic`](Self::restore_topic)
    pub fn fail_topic(&self, topic: &str) {
        self.state.lock().failing_topics.insert(topic.to_string());
    }

    pub fn restore_topic(&self, topic: &str) {
        self.state.lock().failing_topics.remove(topic);
    }

    pub fn fail_next_flushes(&self, count: u32) {
        self.state.lock().failing_flushes = count;
    }

    pub fn fail_next_polls(&self, count: u32) {
        self.state.lock().failing_polls = count;
    }

    pub fn fail_next_commits(&self, count: u32) {
        self.state.lock().failing_commits = count;
    }

    /// Append a message directly, bypassing failure injection. Unlike
    /// `publish`, the payload may be absent (a tombstone).
    pub fn inject(&self, topic: &str, key: Option<&[u8]>, payload: Option<&[u8]>) -> i64 {
        let offset = {
            let mut state = self.state.lock();
            let log = state.topics.entry(topic.to_string()).or_default();
            log.push(StoredRecord {
                key: key.map(<[u8]>::to_vec),
                payload: payload.map(<[u8]>::to_vec),
            });
            (log.len() - 1) as i64
        };
        self.published.notify_waiters();
        offset
    }

    fn take_injected(&self, select: impl FnOnce(&mut BrokerState) -> &mut u32) -> bool {
        let mut state = self.state.lock();
        take_failure(select(&mut state))
    }

    fn log_len(&self, topic: &str) -> usize {
        self.state.lock().topics.get(topic).map_or(0, Vec::len)
    }
}

fn take_failure(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
    ) -> MessagingResult<DeliveryReceipt> {
        let offset = {
            let mut state = self.state.lock();
            state.publish_calls += 1;
            if state.failing_topics.contains(topic) || take_failure(&mut state.failing_publishes) {
                return Err(MessagingError::publish(topic, "injected publish failure"));
            }

            let log = state.topics.entry(topic.to_string()).or_default();
            log.push(StoredRecord {
                key: key.map(<[u8]>::to_vec),
                payload: Some(payload.to_vec()),
            });
            (log.len() - 1) as i64
        };
        self.published.notify_waiters();

        Ok(DeliveryReceipt {
            topic: topic.to_string(),
            partition: PARTITION,
            offset,
        })
    }

    async fn flush(&self, _timeout: Duration) -> MessagingResult<()> {
        if self.take_injected(|state| &mut state.failing_flushes) {
            return Err(MessagingError::flush("injected flush failure"));
        }
        Ok(())
    }

    fn client_type(&self) -> &'static str {
        "in_memory"
    }
}

#[derive(Debug, Default)]
struct ConsumerPosition {
    topic: Option<String>,
    next_offset: usize,
    /// Caught up since the last EOF report
    eof_pending: bool,
}

/// [`MessageSource`] over an [`InMemoryBroker`]
#[derive(Debug)]
pub struct InMemoryConsumer {
    broker: Arc<InMemoryBroker>,
    from_earliest: bool,
    position: Mutex<ConsumerPosition>,
    closed: AtomicBool,
}

impl InMemoryConsumer {
    fn new(broker: Arc<InMemoryBroker>, from_earliest: bool) -> Self {
        Self {
            broker,
            from_earliest,
            position: Mutex::new(ConsumerPosition::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Next stored message or EOF marker, if any
    fn next_outcome(&self) -> Option<PollOutcome> {
        let mut position = self.position.lock();
        let topic = position.topic.clone()?;

        let state = self.broker.state.lock();
        let log = state.topics.get(&topic);
        match log.and_then(|log| log.get(position.next_offset)) {
            Some(record) => {
                let message = InboundMessage {
                    topic,
                    partition: PARTITION,
                    offset: position.next_offset as i64,
                    key: record.key.clone(),
                    payload: record.payload.clone(),
                };
                position.next_offset += 1;
                position.eof_pending = true;
                Some(PollOutcome::Message(message))
            }
            None if position.eof_pending => {
                position.eof_pending = false;
                Some(PollOutcome::PartitionEof {
                    topic,
                    partition: PARTITION,
                })
            }
            None => None,
        }
    }
}

#[async_trait]
impl MessageSource for InMemoryConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<()> {
        if self.is_closed() {
            return Err(MessagingError::subscribe(topic, "consumer is closed"));
        }
        let next_offset = if self.from_earliest {
            0
        } else {
            self.broker.log_len(topic)
        };

        *self.position.lock() = ConsumerPosition {
            topic: Some(topic.to_string()),
            next_offset,
            eof_pending: false,
        };
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> MessagingResult<PollOutcome> {
        if self.is_closed() {
            return Err(MessagingError::poll("consumer is closed"));
        }
        if self.broker.take_injected(|state| &mut state.failing_polls) {
            return Err(MessagingError::poll("injected poll failure"));
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // registered before checking, so a publish in between is not missed
            let published = self.broker.published.notified();

            if let Some(outcome) = self.next_outcome() {
                return Ok(outcome);
            }

            if tokio::time::timeout_at(deadline, published).await.is_err() {
                return Ok(PollOutcome::Empty);
            }
        }
    }

    async fn commit(&self, message: &InboundMessage) -> MessagingResult<()> {
        let mut state = self.broker.state.lock();
        if take_failure(&mut state.failing_commits) {
            return Err(MessagingError::commit(
                &message.topic,
                message.partition,
                message.offset,
                "injected commit failure",
            ));
        }

        state.commits.push(CommittedOffset {
            topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
        });
        Ok(())
    }

    async fn close(&self) -> MessagingResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.position.lock().topic = None;
        Ok(())
    }

    fn client_type(&self) -> &'static str {
        "in_memory"
    }
}
