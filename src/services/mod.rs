pub mod order_queries;

pub use order_queries::{OrderQueryService, QueryError, QueryResult};
