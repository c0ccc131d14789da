#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Order Pipeline
//!
//! Kafka-backed order processing: a producer publishes order events, a
//! consumer applies the order state machine and persists orders as documents
//! in PostgreSQL, and messages that cannot be processed are routed to a
//! dead-letter topic.
//!
//! ## Architecture
//!
//! ```text
//! cart-service ──► OrderProducer ──► "orders" ──► OrderConsumer ──► OrderStateMachine ──► OrderStore
//!                                                      │
//!                                                      └─ on failure ──► DeadLetterRouter ──► "dead_letter_queue"
//! ```
//!
//! ## Delivery Semantics
//!
//! - **Producer**: `acks=all` with idempotence, every publish is flushed and
//!   retried with exponential backoff. Messages that exhaust their budget are
//!   abandoned and reported through a hook, never returned as errors.
//! - **Consumer**: manual commits strictly after successful handling, so a
//!   crash between persist and commit redelivers the message (at-least-once).
//!   Redelivered creates surface as duplicates and are dead-lettered.
//!
//! ## Module Organization
//!
//! - [`messaging`] - Broker clients, connection retry, producer, dead-letter router
//! - [`consumer`] - Sequential poll/handle/commit loop
//! - [`state_machine`] - Order events, statuses and the persistence handler
//! - [`database`] - Order document store (PostgreSQL and in-memory)
//! - [`services`] - Order queries
//! - [`bootstrap`] - Service wiring and consumer lifecycle
//! - [`config`] - Layered TOML/environment configuration
//! - [`resilience`] - Retry policies
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use order_pipeline::bootstrap::bootstrap_producer;
//! use order_pipeline::config::ConfigManager;
//! use order_pipeline::validation::CreateOrderRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let producer = bootstrap_producer(manager.config()).await;
//!
//! producer
//!     .submit_create(CreateOrderRequest {
//!         order_id: "A1".to_string(),
//!         items_num: 2,
//!         total_amount: 100.0,
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod consumer;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod resilience;
pub mod services;
pub mod state_machine;
pub mod validation;

pub use bootstrap::{bootstrap_consumer, bootstrap_producer, ConsumerStatus, ConsumerSystem};
pub use config::{ConfigManager, PipelineConfig};
pub use consumer::{CycleOutcome, OrderConsumer};
pub use database::{InMemoryOrderStore, OrderStore, PgOrderStore, StoreError};
pub use error::{PipelineError, PipelineResult};
pub use messaging::{
    ConnectionError, DeadLetterRouter, MessagingError, OrderMessage, OrderProducer, PublishError,
};
pub use models::Order;
pub use services::{OrderQueryService, QueryError};
pub use state_machine::{OrderEvent, OrderStateMachine, OrderStatus, ProcessingError};
pub use validation::{CreateOrderRequest, UpdateOrderRequest, ValidationError};
