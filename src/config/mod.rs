//! # Pipeline Configuration
//!
//! Layered configuration for both services. Every field has a default equal to
//! the matching value in [`crate::constants`], so an empty configuration
//! directory yields a working development setup.
//!
//! ## Sources (later wins)
//!
//! 1. `<config_dir>/base.toml`
//! 2. `<config_dir>/environments/<environment>.toml`
//! 3. `ORDERS_*` environment variables, `__` separating sections
//!    (`ORDERS_BROKER__BOOTSTRAP_SERVERS=localhost:9092`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use order_pipeline::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let servers = &manager.config().broker.bootstrap_servers;
//! let poll_timeout = manager.config().consumer.poll_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants;
use crate::resilience::RetryPolicy;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration shared by `order-service` and `cart-service`
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Environment name the configuration was loaded for
    pub environment: String,
    pub broker: BrokerConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub bootstrap_servers: String,
    pub orders_topic: String,
    pub dead_letter_topic: String,
    pub metadata_timeout_ms: u64,
}

impl BrokerConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: constants::broker::DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            orders_topic: constants::topics::ORDERS.to_string(),
            dead_letter_topic: constants::topics::DEAD_LETTER_QUEUE.to_string(),
            metadata_timeout_ms: constants::broker::METADATA_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Publishing side (cart-service)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub client_id: String,
    pub connect_attempts: u32,
    pub publish_attempts: u32,
    /// delay = backoff_factor^attempt seconds
    pub backoff_factor: u32,
    pub delivery_timeout_ms: u64,
    pub flush_timeout_ms: u64,
}

impl ProducerConfig {
    pub fn connect_retry(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.connect_attempts, self.backoff_factor)
    }

    pub fn publish_retry(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.publish_attempts, self.backoff_factor)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            client_id: constants::broker::PRODUCER_CLIENT_ID.to_string(),
            connect_attempts: constants::retry::PRODUCER_CONNECT_ATTEMPTS,
            publish_attempts: constants::retry::PUBLISH_ATTEMPTS,
            backoff_factor: constants::retry::BACKOFF_FACTOR,
            delivery_timeout_ms: constants::producer::DELIVERY_TIMEOUT.as_millis() as u64,
            flush_timeout_ms: constants::producer::FLUSH_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Consuming side (order-service)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub group_id: String,
    /// `latest` or `earliest`
    pub auto_offset_reset: String,
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
    pub poll_timeout_ms: u64,
    pub idle_pause_ms: u64,
}

impl ConsumerConfig {
    pub fn connect_retry(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.connect_attempts, Duration::from_millis(self.connect_delay_ms))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn idle_pause(&self) -> Duration {
        Duration::from_millis(self.idle_pause_ms)
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group_id: constants::broker::CONSUMER_GROUP_ID.to_string(),
            auto_offset_reset: constants::broker::AUTO_OFFSET_RESET.to_string(),
            connect_attempts: constants::retry::CONSUMER_CONNECT_ATTEMPTS,
            connect_delay_ms: constants::retry::CONSUMER_CONNECT_DELAY.as_millis() as u64,
            poll_timeout_ms: constants::consumer::POLL_TIMEOUT.as_millis() as u64,
            idle_pause_ms: constants::consumer::IDLE_PAUSE.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
}

impl DatabaseConfig {
    pub fn connect_retry(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.connect_attempts, Duration::from_millis(self.connect_delay_ms))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: constants::store::DEFAULT_DATABASE_URL.to_string(),
            max_connections: constants::store::DEFAULT_MAX_CONNECTIONS,
            connect_attempts: constants::retry::STORE_CONNECT_ATTEMPTS,
            connect_delay_ms: constants::retry::STORE_CONNECT_DELAY.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence, environment default otherwise
    pub level: Option<String>,
    pub format: LogFormat,
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        fn non_empty(field: &str, value: &str) -> ConfigResult<()> {
            if value.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(field, "must not be empty"));
            }
            Ok(())
        }

        fn positive(field: &str, value: u64) -> ConfigResult<()> {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(field, "must be greater than 0"));
            }
            Ok(())
        }

        non_empty("broker.bootstrap_servers", &self.broker.bootstrap_servers)?;
        non_empty("broker.orders_topic", &self.broker.orders_topic)?;
        non_empty("broker.dead_letter_topic", &self.broker.dead_letter_topic)?;
        if self.broker.orders_topic == self.broker.dead_letter_topic {
            return Err(ConfigurationError::invalid_value(
                "broker.dead_letter_topic",
                "must differ from broker.orders_topic",
            ));
        }

        non_empty("producer.client_id", &self.producer.client_id)?;
        positive("producer.connect_attempts", self.producer.connect_attempts.into())?;
        positive("producer.publish_attempts", self.producer.publish_attempts.into())?;
        positive("producer.backoff_factor", self.producer.backoff_factor.into())?;

        non_empty("consumer.group_id", &self.consumer.group_id)?;
        if !matches!(self.consumer.auto_offset_reset.as_str(), "latest" | "earliest") {
            return Err(ConfigurationError::invalid_value(
                "consumer.auto_offset_reset",
                format!(
                    "expected 'latest' or 'earliest', got '{}'",
                    self.consumer.auto_offset_reset
                ),
            ));
        }
        positive("consumer.connect_attempts", self.consumer.connect_attempts.into())?;
        positive("consumer.poll_timeout_ms", self.consumer.poll_timeout_ms)?;

        non_empty("database.url", &self.database.url)?;
        positive("database.max_connections", self.database.max_connections.into())?;
        positive("database.connect_attempts", self.database.connect_attempts.into())?;

        Ok(())
    }

    /// Configuration with localhost endpoints, handy for tests and local runs
    pub fn for_local() -> Self {
        let mut config = Self {
            environment: "test".to_string(),
            ..Self::default()
        };
        config.broker.bootstrap_servers = "localhost:9092".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = PipelineConfig::default();

        assert_eq!(config.broker.bootstrap_servers, "kafka:9092");
        assert_eq!(config.broker.orders_topic, "orders");
        assert_eq!(config.broker.dead_letter_topic, "dead_letter_queue");
        assert_eq!(config.producer.client_id, "cart-service-group");
        assert_eq!(config.producer.publish_attempts, 5);
        assert_eq!(config.consumer.group_id, "order-service-group");
        assert_eq!(config.consumer.auto_offset_reset, "latest");
        assert_eq!(config.consumer.poll_timeout(), Duration::from_secs(1));
        assert_eq!(config.consumer.idle_pause(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_policies() {
        let config = PipelineConfig::default();

        let producer = config.producer.connect_retry();
        assert_eq!(producer.max_attempts(), 5);
        assert_eq!(producer.delay_for(2), Duration::from_secs(4));

        let consumer = config.consumer.connect_retry();
        assert_eq!(consumer.delay_for(0), Duration::from_secs(5));
        assert_eq!(consumer.delay_for(3), Duration::from_secs(5));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = PipelineConfig::default();
        config.consumer.auto_offset_reset = "smallest".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { field, .. }) if field == "consumer.auto_offset_reset"
        ));

        let mut config = PipelineConfig::default();
        config.producer.publish_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.broker.dead_letter_topic = "orders".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.broker.bootstrap_servers = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
