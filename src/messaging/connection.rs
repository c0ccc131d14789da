//! # Broker Connection Manager
//!
//! Establishes broker connections under a [`RetryPolicy`] and tracks whether
//! the component it serves currently has one.
//!
//! The producer side uses exponential backoff and degrades to an unready
//! producer when the budget runs out; the consumer side uses a fixed delay and
//! treats exhaustion as fatal. Both outcomes surface here as a
//! [`ConnectionError`]; what to do with it is up to the caller.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{error, info};

use super::errors::{ConnectionError, MessagingResult};
use crate::resilience::RetryPolicy;

/// Connection lifecycle of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No attempt made yet, or attempts in progress
    Connecting = 0,
    /// Connected and usable
    Ready = 1,
    /// Retry budget exhausted
    Unavailable = 2,
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Ready,
            _ => ConnectionState::Unavailable,
        }
    }
}

#[derive(Debug)]
pub struct ConnectionManager {
    /// Component name for logging and errors
    component: String,
    retry: RetryPolicy,
    state: AtomicU8,
}

impl ConnectionManager {
    pub fn new(component: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            component: component.into(),
            retry,
            state: AtomicU8::new(ConnectionState::Connecting as u8),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Mark the connection as gone, e.g. after the client was closed
    pub fn mark_unavailable(&self) {
        self.state
            .store(ConnectionState::Unavailable as u8, Ordering::Release);
    }

    /// Run `attempt_connect` under the retry policy.
    ///
    /// The closure receives the zero-based attempt number and should create
    /// the client and verify the broker answers.
    pub async fn connect<T, F, Fut>(&self, attempt_connect: F) -> Result<T, ConnectionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = MessagingResult<T>>,
    {
        self.state
            .store(ConnectionState::Connecting as u8, Ordering::Release);
        info!(
            component = %self.component,
            max_attempts = self.retry.max_attempts(),
            "🔌 CONNECTION: Connecting to broker"
        );

        match self.retry.run(&self.component, attempt_connect).await {
            Ok(connection) => {
                self.state.store(ConnectionState::Ready as u8, Ordering::Release);
                info!(component = %self.component, "✅ CONNECTION: Broker connection ready");
                Ok(connection)
            }
            Err(exhausted) => {
                self.mark_unavailable();
                error!(
                    component = %self.component,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "❌ CONNECTION: Giving up on broker connection"
                );
                Err(ConnectionError {
                    component: self.component.clone(),
                    attempts: exhausted.attempts,
                    message: exhausted.last_error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::MessagingError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_success_after_retries() {
        let manager = ConnectionManager::new(
            "producer",
            RetryPolicy::exponential(5, 2).with_unit(Duration::from_millis(1)),
        );
        assert_eq!(manager.state(), ConnectionState::Connecting);

        let connection = manager
            .connect(|attempt| async move {
                if attempt < 3 {
                    Err(MessagingError::broker("broker down"))
                } else {
                    Ok("connection")
                }
            })
            .await
            .unwrap();

        assert_eq!(connection, "connection");
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_connect_exhaustion() {
        let manager = ConnectionManager::new(
            "consumer",
            RetryPolicy::fixed(5, Duration::from_millis(1)),
        );

        let err = manager
            .connect(|_| async { Err::<(), _>(MessagingError::broker("no brokers")) })
            .await
            .unwrap_err();

        assert_eq!(err.component, "consumer");
        assert_eq!(err.attempts, 5);
        assert!(err.message.contains("no brokers"));
        assert_eq!(manager.state(), ConnectionState::Unavailable);
    }
}
