//! # Processing Error Types
//!
//! Every way a consumed order message can fail. None of these are retried
//! locally: the consumer loop routes the offending message to the dead-letter
//! topic and moves on.

use thiserror::Error;

use crate::database::StoreError;
use crate::messaging::MessagingError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Message key is missing")]
    MissingKey,

    #[error("Failed to decode message: {message}")]
    Decode { message: String },

    #[error("Unexpected status: {status}")]
    UnexpectedStatus { status: String },

    #[error("Order with ID {order_id} already exists.")]
    DuplicateOrder { order_id: String },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Document store error: {message}")]
    Store { message: String },

    #[error("Broker error: {message}")]
    Broker { message: String },
}

impl ProcessingError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn unexpected_status(status: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status: status.into(),
        }
    }

    pub fn broker(message: impl Into<String>) -> Self {
        Self::Broker {
            message: message.into(),
        }
    }

    /// Stable label for logs and dead-letter diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::Decode { .. } => "decode",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::DuplicateOrder { .. } => "duplicate_order",
            Self::OrderNotFound { .. } => "order_not_found",
            Self::Store { .. } => "store",
            Self::Broker { .. } => "broker",
        }
    }
}

impl From<StoreError> for ProcessingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateOrder { order_id } => Self::DuplicateOrder { order_id },
            StoreError::OrderNotFound { order_id } => Self::OrderNotFound { order_id },
            other => Self::Store {
                message: other.to_string(),
            },
        }
    }
}

impl From<MessagingError> for ProcessingError {
    fn from(err: MessagingError) -> Self {
        Self::broker(err.to_string())
    }
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
