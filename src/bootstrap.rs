//! # Service Bootstrap
//!
//! Builds the long-lived components of the two services from a
//! [`PipelineConfig`]:
//!
//! - **cart-service**: [`bootstrap_producer`] connects the order producer. A
//!   broker that stays unreachable is not fatal here; the producer is returned
//!   unready and every publish fails fast with `NotInitialized`.
//! - **order-service**: [`bootstrap_consumer`] connects the document store,
//!   ensures its schema, then connects the consumer and the dead-letter
//!   producer. Any failure is returned to the caller, which is expected to
//!   exit.
//!
//! [`ConsumerSystem`] owns the consumer loop task and its shutdown channel.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::consumer::{ConsumerStatsSnapshot, OrderConsumer};
use crate::database::{OrderStore, PgOrderStore};
use crate::error::{PipelineError, PipelineResult};
use crate::messaging::{
    ConnectionManager, DeadLetterRouter, KafkaPublisher, KafkaSource, MessagingError,
    MessagingResult, OrderProducer,
};
use crate::services::OrderQueryService;
use crate::state_machine::OrderStateMachine;

/// Connect the order producer, falling back to an unready producer
pub async fn bootstrap_producer(config: &PipelineConfig) -> OrderProducer {
    info!(
        bootstrap_servers = %config.broker.bootstrap_servers,
        topic = %config.broker.orders_topic,
        "🚀 BOOTSTRAP: Starting order producer"
    );

    let connection = ConnectionManager::new("order-producer", config.producer.connect_retry());
    let publish_retry = config.producer.publish_retry();
    let flush_timeout = config.producer.flush_timeout();

    match connection
        .connect(|_| KafkaPublisher::connect(&config.broker, &config.producer))
        .await
    {
        Ok(publisher) => OrderProducer::new(
            Arc::new(publisher),
            &config.broker.orders_topic,
            publish_retry,
            flush_timeout,
        ),
        Err(e) => {
            warn!(
                error = %e,
                "⚠️ BOOTSTRAP: Producer unavailable, publishes will be rejected"
            );
            OrderProducer::unready(&config.broker.orders_topic, publish_retry, flush_timeout)
        }
    }
}

/// Connect the document store and the consumer side of the broker
pub async fn bootstrap_consumer(config: &PipelineConfig) -> PipelineResult<ConsumerSystem> {
    info!(
        environment = %config.environment,
        bootstrap_servers = %config.broker.bootstrap_servers,
        topic = %config.broker.orders_topic,
        "🚀 BOOTSTRAP: Starting order consumer"
    );

    let store = PgOrderStore::connect(
        &config.database.url,
        config.database.max_connections,
        &config.database.connect_retry(),
    )
    .await?;
    store.ensure_schema().await?;
    let store: Arc<dyn OrderStore> = Arc::new(store);

    let connection = ConnectionManager::new("order-consumer", config.consumer.connect_retry());
    let dead_letter_client_id = format!("{}-dead-letter", config.consumer.group_id);
    let client_id = dead_letter_client_id.as_str();
    let delivery_timeout = config.producer.delivery_timeout();
    let (broker, consumer_config) = (&config.broker, &config.consumer);
    let (source, dead_letter_publisher) = connection
        .connect(|_| async move {
            let source = KafkaSource::connect(broker, consumer_config).await?;
            let publisher = KafkaPublisher::connect_as(broker, client_id, delivery_timeout).await?;
            Ok::<_, MessagingError>((source, publisher))
        })
        .await?;

    let consumer = OrderConsumer::new(
        Arc::new(source),
        OrderStateMachine::new(Arc::clone(&store)),
        DeadLetterRouter::new(
            Arc::new(dead_letter_publisher),
            &config.broker.dead_letter_topic,
        ),
        &config.broker.orders_topic,
    )
    .with_timing(config.consumer.poll_timeout(), config.consumer.idle_pause());
    consumer.subscribe().await?;

    info!(
        topic = %config.broker.orders_topic,
        dead_letter_topic = %config.broker.dead_letter_topic,
        "✅ BOOTSTRAP: Order consumer ready"
    );

    Ok(ConsumerSystem::new(consumer, store).with_connection(connection))
}

/// Point-in-time view of a [`ConsumerSystem`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerStatus {
    pub running: bool,
    pub broker_ready: bool,
    pub stats: ConsumerStatsSnapshot,
    pub dead_letters_routed: u64,
    pub dead_letters_failed: u64,
}

/// Handle over the consumer loop task
pub struct ConsumerSystem {
    consumer: Arc<OrderConsumer>,
    store: Arc<dyn OrderStore>,
    connection: Option<ConnectionManager>,
    shutdown_sender: Option<broadcast::Sender<()>>,
    task: Option<JoinHandle<MessagingResult<()>>>,
}

impl std::fmt::Debug for ConsumerSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerSystem")
            .field("topic", &self.consumer.topic())
            .field("store", &self.store.store_type())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ConsumerSystem {
    pub fn new(consumer: OrderConsumer, store: Arc<dyn OrderStore>) -> Self {
        Self {
            consumer: Arc::new(consumer),
            store,
            connection: None,
            shutdown_sender: None,
            task: None,
        }
    }

    pub fn with_connection(mut self, connection: ConnectionManager) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn consumer(&self) -> &OrderConsumer {
        &self.consumer
    }

    /// Read access to the orders this consumer persists
    pub fn queries(&self) -> OrderQueryService {
        OrderQueryService::new(Arc::clone(&self.store))
    }

    /// Spawn the consumer loop. Starting a running system is a no-op.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Consumer system already running");
            return;
        }

        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let consumer = Arc::clone(&self.consumer);
        self.task = Some(tokio::spawn(async move {
            consumer.run(shutdown_receiver).await
        }));
        self.shutdown_sender = Some(shutdown_sender);
        info!(topic = %self.consumer.topic(), "▶️ BOOTSTRAP: Consumer loop started");
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the loop to stop and wait for it to close the consumer
    pub async fn shutdown(&mut self) -> PipelineResult<()> {
        let Some(task) = self.task.take() else {
            warn!("Consumer system already stopped");
            return Ok(());
        };

        if let Some(sender) = self.shutdown_sender.take() {
            // a send error only means the loop already exited
            let _ = sender.send(());
        }
        info!("🛑 BOOTSTRAP: Consumer shutdown requested");

        let result = task
            .await
            .map_err(|e| PipelineError::ConsumerTask(e.to_string()))?;
        if let Some(connection) = &self.connection {
            connection.mark_unavailable();
        }

        match result {
            Ok(()) => {
                info!(stats = ?self.consumer.stats().snapshot(), "✅ BOOTSTRAP: Consumer stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "❌ BOOTSTRAP: Consumer failed to close cleanly");
                Err(e.into())
            }
        }
    }

    pub fn status(&self) -> ConsumerStatus {
        ConsumerStatus {
            running: self.is_running(),
            broker_ready: self
                .connection
                .as_ref()
                .is_some_and(ConnectionManager::is_ready),
            stats: self.consumer.stats().snapshot(),
            dead_letters_routed: self.consumer.dead_letter().routed_count(),
            dead_letters_failed: self.consumer.dead_letter().failed_count(),
        }
    }
}
