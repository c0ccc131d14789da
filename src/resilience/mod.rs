//! # Resilience Module
//!
//! Retry policies for the connection and publish paths.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use order_pipeline::resilience::RetryPolicy;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // 5 attempts, 1s, 2s, 4s, 8s between them
//! let policy = RetryPolicy::exponential(5, 2);
//!
//! let value = policy
//!     .run("broker_connect", |_attempt| async {
//!         Ok::<&str, std::io::Error>("connected")
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{Backoff, RetryExhausted, RetryPolicy};
