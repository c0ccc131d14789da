use thiserror::Error;

use crate::config::ConfigurationError;
use crate::database::StoreError;
use crate::messaging::{ConnectionError, MessagingError, PublishError};
use crate::services::QueryError;
use crate::validation::ValidationError;

/// Top-level error of the two services
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Consumer task failed: {0}")]
    ConsumerTask(String),
}

impl PipelineError {
    /// Whether the broker could not be reached at startup
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
