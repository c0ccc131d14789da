//! # Document Store Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Order with ID {order_id} already exists.")]
    DuplicateOrder { order_id: String },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("Document store connection error: {message}")]
    Connection { message: String },

    #[error("Document store query error: {operation}: {message}")]
    Query { operation: String, message: String },

    #[error("Invalid order record {order_id}: {message}")]
    InvalidRecord { order_id: String, message: String },
}

impl StoreError {
    pub fn duplicate_order(order_id: impl Into<String>) -> Self {
        Self::DuplicateOrder {
            order_id: order_id.into(),
        }
    }

    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        Self::OrderNotFound {
            order_id: order_id.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_record(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            order_id: order_id.into(),
            message: message.into(),
        }
    }

    /// Classify a driver error raised by `operation`; pool and transport
    /// failures are connection errors, everything else a query error
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::connection("Connection pool timed out"),
            sqlx::Error::PoolClosed => Self::connection("Connection pool is closed"),
            sqlx::Error::Io(io_err) => Self::connection(io_err.to_string()),
            sqlx::Error::Tls(tls_err) => Self::connection(tls_err.to_string()),
            sqlx::Error::Configuration(config_err) => Self::connection(config_err.to_string()),
            other => Self::query(operation, other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_error_classification() {
        let err = StoreError::from_sqlx("find_order", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Connection { .. }));

        let err = StoreError::from_sqlx("find_order", sqlx::Error::RowNotFound);
        assert_eq!(
            err,
            StoreError::query("find_order", sqlx::Error::RowNotFound.to_string())
        );
    }
}
