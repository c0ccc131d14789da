//! # Kafka Clients
//!
//! rdkafka-backed [`MessagePublisher`] and [`MessageSource`].
//!
//! The publisher always runs with `acks=all` and `enable.idempotence=true`;
//! these are not configurable. The source never auto-commits: offsets are
//! committed explicitly, one message at a time, after successful handling.
//!
//! librdkafka calls that block (metadata probe, flush, commit) run on the
//! blocking thread pool.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::{Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::{MessagePublisher, MessageSource};
use crate::config::{BrokerConfig, ConsumerConfig, ProducerConfig};
use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::message::{DeliveryReceipt, InboundMessage, PollOutcome};

/// Idempotent, all-replica-acknowledged Kafka producer
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl std::fmt::Debug for KafkaPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaPublisher")
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaPublisher {
    /// Client settings for a publisher; acknowledgment and idempotence are fixed
    pub fn client_config(bootstrap_servers: &str, client_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("client.id", client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("retries", "1")
            .set("retry.backoff.ms", "1000");
        config
    }

    /// Create the producer and confirm the cluster answers a metadata request
    pub async fn connect(broker: &BrokerConfig, producer: &ProducerConfig) -> MessagingResult<Self> {
        Self::connect_as(broker, &producer.client_id, producer.delivery_timeout()).await
    }

    /// Same as [`connect`](Self::connect) with an explicit client id, used for
    /// the dead-letter producer of the consumer side
    pub async fn connect_as(
        broker: &BrokerConfig,
        client_id: &str,
        delivery_timeout: Duration,
    ) -> MessagingResult<Self> {
        let producer: FutureProducer =
            Self::client_config(&broker.bootstrap_servers, client_id).create()?;

        let probe = producer.clone();
        let metadata_timeout = broker.metadata_timeout();
        tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, Timeout::After(metadata_timeout))
                .map(|_| ())
        })
        .await
        .map_err(|e| MessagingError::broker(format!("metadata probe task failed: {e}")))??;

        info!(
            bootstrap_servers = %broker.bootstrap_servers,
            client_id = %client_id,
            "✅ KAFKA: Producer connected"
        );

        Ok(Self {
            producer,
            delivery_timeout,
        })
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: &[u8],
    ) -> MessagingResult<DeliveryReceipt> {
        let mut record = FutureRecord::<[u8], [u8]>::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        match self
            .producer
            .send(record, Timeout::After(self.delivery_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(
                    topic = %topic,
                    partition,
                    offset,
                    "📨 KAFKA: Message delivered"
                );
                Ok(DeliveryReceipt {
                    topic: topic.to_string(),
                    partition,
                    offset,
                })
            }
            Err((e, _)) => Err(MessagingError::publish(topic, e.to_string())),
        }
    }

    async fn flush(&self, timeout: Duration) -> MessagingResult<()> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| MessagingError::flush(format!("flush task failed: {e}")))?
            .map_err(|e| MessagingError::flush(e.to_string()))
    }

    fn client_type(&self) -> &'static str {
        "kafka"
    }
}

/// Kafka consumer with manual, per-message offset commits
pub struct KafkaSource {
    consumer: Arc<StreamConsumer>,
    topic: parking_lot::RwLock<Option<String>>,
}

impl std::fmt::Debug for KafkaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSource")
            .field("topic", &*self.topic.read())
            .finish_non_exhaustive()
    }
}

impl KafkaSource {
    pub fn client_config(bootstrap_servers: &str, consumer: &ConsumerConfig) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", &consumer.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &consumer.auto_offset_reset)
            .set("enable.partition.eof", "true");
        config
    }

    /// Create the consumer and confirm the cluster answers a metadata request
    pub async fn connect(broker: &BrokerConfig, consumer: &ConsumerConfig) -> MessagingResult<Self> {
        let stream_consumer: StreamConsumer =
            Self::client_config(&broker.bootstrap_servers, consumer).create()?;
        let stream_consumer = Arc::new(stream_consumer);

        let probe = Arc::clone(&stream_consumer);
        let metadata_timeout = broker.metadata_timeout();
        tokio::task::spawn_blocking(move || {
            probe
                .fetch_metadata(None, Timeout::After(metadata_timeout))
                .map(|_| ())
        })
        .await
        .map_err(|e| MessagingError::broker(format!("metadata probe task failed: {e}")))??;

        info!(
            bootstrap_servers = %broker.bootstrap_servers,
            group_id = %consumer.group_id,
            "✅ KAFKA: Consumer connected"
        );

        Ok(Self {
            consumer: stream_consumer,
            topic: parking_lot::RwLock::new(None),
        })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn subscribe(&self, topic: &str) -> MessagingResult<()> {
        self.consumer
            .subscribe(&[topic])
            .map_err(|e| MessagingError::subscribe(topic, e.to_string()))?;
        *self.topic.write() = Some(topic.to_string());

        info!(topic = %topic, "📥 KAFKA: Subscribed");
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> MessagingResult<PollOutcome> {
        let received = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_elapsed) => return Ok(PollOutcome::Empty),
            Ok(received) => received,
        };

        match received {
            Ok(message) => Ok(PollOutcome::Message(InboundMessage {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                key: message.key().map(<[u8]>::to_vec),
                payload: message.payload().map(<[u8]>::to_vec),
            })),
            Err(KafkaError::PartitionEOF(partition)) => Ok(PollOutcome::PartitionEof {
                topic: self.topic.read().clone().unwrap_or_default(),
                partition,
            }),
            Err(e) => Err(MessagingError::poll(e.to_string())),
        }
    }

    async fn commit(&self, message: &InboundMessage) -> MessagingResult<()> {
        let commit_error = |reason: String| {
            MessagingError::commit(&message.topic, message.partition, message.offset, reason)
        };

        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset + 1),
            )
            .map_err(|e| commit_error(e.to_string()))?;

        let consumer = Arc::clone(&self.consumer);
        tokio::task::spawn_blocking(move || consumer.commit(&offsets, CommitMode::Sync))
            .await
            .map_err(|e| commit_error(format!("commit task failed: {e}")))?
            .map_err(|e| commit_error(e.to_string()))
    }

    async fn close(&self) -> MessagingResult<()> {
        self.consumer.unsubscribe();
        *self.topic.write() = None;
        info!("🔌 KAFKA: Consumer closed");
        Ok(())
    }

    fn client_type(&self) -> &'static str {
        "kafka"
    }
}
