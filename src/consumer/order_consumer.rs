//! # Order Consumer Loop
//!
//! Sequential poll → handle → commit loop over the orders topic.
//!
//! ## Cycle
//!
//! 1. Poll with a short timeout. Nothing, or a partition EOF, is not an error.
//! 2. A message without a key is dead-lettered and never reaches the handler.
//! 3. Otherwise the state machine handles it; the offset is committed only
//!    after the handler succeeded.
//! 4. Any processing failure (commit failure included) dead-letters the
//!    message and the loop moves on. Failed messages are not committed.
//!
//! Messages are handled one at a time so per-key ordering is preserved.
//! Shutdown is observed while waiting on a poll or pausing, never while a
//! polled message is being handled.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::constants;
use crate::logging::{log_error, log_order_operation};
use crate::messaging::{
    DeadLetterRouter, InboundMessage, MessageSource, MessagingError, MessagingResult, PollOutcome,
};
use crate::state_machine::{OrderStateMachine, OrderTransition, ProcessingError};

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No message within the poll timeout
    Idle,
    /// Caught up with a partition
    PartitionEof { partition: i32 },
    /// Message handled and its offset committed
    Committed { offset: i64, transition: OrderTransition },
    /// Message forwarded to the dead-letter topic
    DeadLettered { offset: i64, error: ProcessingError },
    /// Poll failed without yielding a message
    BrokerError(MessagingError),
}

/// Counters over the lifetime of a consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    cycles: AtomicU64,
    idle_polls: AtomicU64,
    partition_eofs: AtomicU64,
    committed: AtomicU64,
    dead_lettered: AtomicU64,
    broker_errors: AtomicU64,
}

/// Point-in-time copy of [`ConsumerStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConsumerStatsSnapshot {
    pub cycles: u64,
    pub idle_polls: u64,
    pub partition_eofs: u64,
    pub committed: u64,
    pub dead_lettered: u64,
    pub broker_errors: u64,
}

impl ConsumerStats {
    fn record(&self, outcome: &CycleOutcome) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            CycleOutcome::Idle => &self.idle_polls,
            CycleOutcome::PartitionEof { .. } => &self.partition_eofs,
            CycleOutcome::Committed { .. } => &self.committed,
            CycleOutcome::DeadLettered { .. } => &self.dead_lettered,
            CycleOutcome::BrokerError(_) => &self.broker_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            partition_eofs: self.partition_eofs.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            broker_errors: self.broker_errors.load(Ordering::Relaxed),
        }
    }
}

pub struct OrderConsumer {
    source: Arc<dyn MessageSource>,
    state_machine: OrderStateMachine,
    dead_letter: DeadLetterRouter,
    topic: String,
    poll_timeout: Duration,
    idle_pause: Duration,
    stats: Arc<ConsumerStats>,
}

impl OrderConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        state_machine: OrderStateMachine,
        dead_letter: DeadLetterRouter,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            source,
            state_machine,
            dead_letter,
            topic: topic.into(),
            poll_timeout: constants::consumer::POLL_TIMEOUT,
            idle_pause: constants::consumer::IDLE_PAUSE,
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    pub fn with_timing(mut self, poll_timeout: Duration, idle_pause: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self.idle_pause = idle_pause;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    pub fn dead_letter(&self) -> &DeadLetterRouter {
        &self.dead_letter
    }

    pub async fn subscribe(&self) -> MessagingResult<()> {
        self.source.subscribe(&self.topic).await
    }

    /// Poll once and handle whatever arrived
    pub async fn process_next(&self) -> CycleOutcome {
        let polled = self.source.poll(self.poll_timeout).await;
        self.process_polled(polled).await
    }

    async fn process_polled(&self, polled: MessagingResult<PollOutcome>) -> CycleOutcome {
        let outcome = match polled {
            Ok(PollOutcome::Empty) => {
                debug!(topic = %self.topic, "⏳ CONSUMER: No new messages");
                CycleOutcome::Idle
            }
            Ok(PollOutcome::PartitionEof { topic, partition }) => {
                debug!(topic = %topic, partition, "🏁 CONSUMER: Reached end of partition");
                CycleOutcome::PartitionEof { partition }
            }
            Ok(PollOutcome::Message(message)) => self.handle_message(message).await,
            Err(e) => {
                log_error("order_consumer", "poll", &e.to_string(), Some(&self.topic));
                CycleOutcome::BrokerError(e)
            }
        };

        self.stats.record(&outcome);
        outcome
    }

    async fn handle_message(&self, message: InboundMessage) -> CycleOutcome {
        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "📥 CONSUMER: Received message"
        );

        let result = match message.present_key() {
            None => Err(ProcessingError::MissingKey),
            Some(_) => self.handle_and_commit(&message).await,
        };

        match result {
            Ok(transition) => {
                log_order_operation(
                    "consume",
                    transition.order_id(),
                    None,
                    "committed",
                    None,
                );
                CycleOutcome::Committed {
                    offset: message.offset,
                    transition,
                }
            }
            Err(error) => {
                warn!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error_kind = error.kind(),
                    error = %error,
                    "⚠️ CONSUMER: Failed to process message"
                );
                self.dead_letter.route(&message, &error.to_string()).await;
                CycleOutcome::DeadLettered {
                    offset: message.offset,
                    error,
                }
            }
        }
    }

    async fn handle_and_commit(
        &self,
        message: &InboundMessage,
    ) -> Result<OrderTransition, ProcessingError> {
        let transition = self
            .state_machine
            .handle(message.payload_bytes(), &message.topic)
            .await?;
        self.source.commit(message).await?;
        Ok(transition)
    }

    /// Run cycles until `shutdown` fires (or its sender is dropped), then
    /// close the source
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> MessagingResult<()> {
        info!(
            topic = %self.topic,
            source = self.source.client_type(),
            store = self.state_machine.store().store_type(),
            "🚀 CONSUMER: Starting order consumer loop"
        );

        loop {
            let polled = tokio::select! {
                _ = shutdown.recv() => break,
                polled = self.source.poll(self.poll_timeout) => polled,
            };
            self.process_polled(polled).await;

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.idle_pause) => {}
            }
        }

        info!(
            topic = %self.topic,
            stats = ?self.stats.snapshot(),
            "🛑 CONSUMER: Shutdown signal received, closing consumer"
        );
        self.source.close().await
    }
}
