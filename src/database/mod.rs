//! # Document Store
//!
//! Persistence for order documents.
//!
//! ## Key Components
//!
//! - [`store::OrderStore`] - async trait the state machine and query service use
//! - [`pg_store::PgOrderStore`] - PostgreSQL implementation over an `sqlx::PgPool`
//! - [`in_memory_store::InMemoryOrderStore`] - `DashMap` implementation for tests
//!
//! ## Invariants
//!
//! - `insert_order` is an atomic insert-if-absent keyed by `orderId`
//! - `update_status` fails with `OrderNotFound` when no order matches
//! - nothing in the pipeline deletes orders

pub mod errors;
pub mod in_memory_store;
pub mod pg_store;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use in_memory_store::InMemoryOrderStore;
pub use pg_store::PgOrderStore;
pub use store::OrderStore;
