//! # Message Structures
//!
//! Broker-agnostic shapes for messages flowing through the pipeline: what a
//! poll yields, what a publish returns, and the JSON bodies put on the
//! `orders` and `dead_letter_queue` topics.

use serde::{Deserialize, Serialize};

use crate::state_machine::OrderStatus;

/// A raw message read from a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

impl InboundMessage {
    /// Key bytes, treating an empty key the same as no key
    pub fn present_key(&self) -> Option<&[u8]> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }

    /// Key as text, replacing invalid UTF-8
    pub fn key_utf8(&self) -> Option<String> {
        self.present_key()
            .map(|key| String::from_utf8_lossy(key).into_owned())
    }

    /// Payload as text, replacing invalid UTF-8; empty when absent
    pub fn payload_utf8(&self) -> String {
        self.payload
            .as_deref()
            .map(|payload| String::from_utf8_lossy(payload).into_owned())
            .unwrap_or_default()
    }

    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }
}

/// Outcome of one poll that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing arrived within the poll timeout
    Empty,
    /// Consumer reached the current end of a partition
    PartitionEof { topic: String, partition: i32 },
    Message(InboundMessage),
}

/// Where the broker stored a published message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Body published to the dead-letter topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub original_key: Option<String>,
    pub original_value: String,
    pub error: String,
}

impl DeadLetterRecord {
    pub fn from_message(message: &InboundMessage, error: impl Into<String>) -> Self {
        Self {
            original_key: message.key_utf8(),
            original_value: message.payload_utf8(),
            error: error.into(),
        }
    }
}

/// Order event body as published on the `orders` topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    pub status: OrderStatus,
}

impl OrderMessage {
    pub fn create(order_id: impl Into<String>, items_num: i64, total_amount: f64) -> Self {
        Self {
            order_id: order_id.into(),
            items_num: Some(items_num),
            total_amount: Some(total_amount),
            status: OrderStatus::New,
        }
    }

    pub fn update(order_id: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            items_num: None,
            total_amount: None,
            status,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
