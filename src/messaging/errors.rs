//! # Messaging Error Types
//!
//! Structured errors for broker operations. Individual client calls return
//! [`MessagingError`]; connection establishment and the producer front door
//! have their own narrower types.

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors from individual broker client operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessagingError {
    #[error("Publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },

    #[error("Flush failed: {message}")]
    Flush { message: String },

    #[error("Poll failed: {message}")]
    Poll { message: String },

    #[error("Commit failed for {topic}[{partition}]@{offset}: {message}")]
    Commit {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },

    #[error("Subscribe to {topic} failed: {message}")]
    Subscribe { topic: String, message: String },

    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Broker error: {message}")]
    Broker { message: String },
}

impl MessagingError {
    /// Create a publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a flush error
    pub fn flush(message: impl Into<String>) -> Self {
        Self::Flush {
            message: message.into(),
        }
    }

    /// Create a poll error
    pub fn poll(message: impl Into<String>) -> Self {
        Self::Poll {
            message: message.into(),
        }
    }

    /// Create a commit error
    pub fn commit(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::Commit {
            topic: topic.into(),
            partition,
            offset,
            message: message.into(),
        }
    }

    /// Create a subscribe error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a message serialization error
    pub fn message_serialization(message: impl Into<String>) -> Self {
        Self::MessageSerialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic broker error
    pub fn broker(message: impl Into<String>) -> Self {
        Self::Broker {
            message: message.into(),
        }
    }
}

/// Conversion from rdkafka's KafkaError to MessagingError
impl From<KafkaError> for MessagingError {
    fn from(err: KafkaError) -> Self {
        match err {
            KafkaError::ClientConfig(..) | KafkaError::ClientCreation(..) => {
                MessagingError::configuration("kafka", err.to_string())
            }
            KafkaError::Flush(..) => MessagingError::flush(err.to_string()),
            KafkaError::MessageConsumption(..) => MessagingError::poll(err.to_string()),
            _ => MessagingError::broker(err.to_string()),
        }
    }
}

/// Conversion from serde_json::Error to MessagingError
impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::message_serialization(err.to_string())
    }
}

/// Result type for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Broker connection could not be established within the retry budget
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to connect {component} to the broker after {attempts} attempts: {message}")]
pub struct ConnectionError {
    pub component: String,
    pub attempts: u32,
    pub message: String,
}

/// The only error a producer surfaces to its callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Producer not initialized")]
    NotInitialized,
}
