//! # PostgreSQL Order Store
//!
//! Orders live in a single `orders` table; the extra fields of a creation
//! message are kept in a JSONB `attributes` column so the stored row is the
//! full order document.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, info};

use super::errors::{StoreError, StoreResult};
use super::store::OrderStore;
use crate::models::Order;
use crate::resilience::RetryPolicy;
use crate::state_machine::OrderStatus;

const CREATE_ORDERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS orders (
        seq BIGSERIAL NOT NULL,
        order_id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        items_num BIGINT NOT NULL,
        total_amount DOUBLE PRECISION NOT NULL,
        shipping_cost DOUBLE PRECISION NOT NULL,
        topic_name TEXT NOT NULL,
        attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_TOPIC_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_orders_topic_name ON orders (topic_name, seq)";

/// Row shape of the `orders` table
#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: String,
    status: String,
    items_num: i64,
    total_amount: f64,
    shipping_cost: f64,
    topic_name: String,
    attributes: Json<Map<String, Value>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::invalid_record(&row.order_id, e))?;

        Ok(Order {
            order_id: row.order_id,
            status,
            items_num: row.items_num,
            total_amount: row.total_amount,
            shipping_cost: row.shipping_cost,
            topic_name: row.topic_name,
            attributes: row.attributes.0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the connection pool, retrying per `retry` until the database answers
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        retry: &RetryPolicy,
    ) -> StoreResult<Self> {
        let pool = retry
            .run("document_store_connect", |attempt| async move {
                debug!(attempt = attempt + 1, "🔌 DATABASE: Connecting to document store");
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect(database_url)
                    .await
            })
            .await
            .map_err(|exhausted| {
                StoreError::connection(format!(
                    "gave up after {} attempts: {}",
                    exhausted.attempts, exhausted.last_error
                ))
            })?;

        info!(max_connections, "✅ DATABASE: Connected to document store");
        Ok(Self { pool })
    }

    /// Create the `orders` table and its topic index if they do not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_ORDERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("ensure_schema", e))?;
        sqlx::query(CREATE_TOPIC_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx("ensure_schema", e))?;

        debug!("📋 DATABASE: Order schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders
                (order_id, status, items_num, total_amount, shipping_cost, topic_name, attributes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(&order.order_id)
        .bind(order.status.as_str())
        .bind(order.items_num)
        .bind(order.total_amount)
        .bind(order.shipping_cost)
        .bind(&order.topic_name)
        .bind(Json(order.attributes.clone()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("insert_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::duplicate_order(&order.order_id));
        }
        Ok(())
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE order_id = $1",
        )
        .bind(order_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("update_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::order_not_found(order_id));
        }
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, status, items_num, total_amount, shipping_cost, topic_name, attributes
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("find_order", e))?;

        row.map(Order::try_from).transpose()
    }

    async fn order_ids_by_topic(&self, topic: &str) -> StoreResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT order_id FROM orders WHERE topic_name = $1 ORDER BY seq",
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx("order_ids_by_topic", e))?;

        Ok(ids)
    }

    fn store_type(&self) -> &'static str {
        "postgres"
    }
}
