//! # Order Model
//!
//! The central entity of the pipeline: one order document per `orderId`.
//!
//! ## Overview
//!
//! An `Order` is created exactly once, from a `new`-status message, and later
//! mutated only through its `status` by `pending`/`confirmed` messages. The
//! pipeline never deletes orders.
//!
//! ## Derived Fields
//!
//! - `shippingCost`: 2% of `totalAmount`, rounded to 2 decimal places, computed
//!   at creation and never recomputed.
//! - `topicName`: the broker topic the creation message arrived on, used for
//!   topic-scoped order listing.
//!
//! ## Document Schema
//!
//! Maps to the `orders` table:
//! ```sql
//! CREATE TABLE orders (
//!   seq BIGSERIAL NOT NULL,          -- insertion order
//!   order_id TEXT PRIMARY KEY,
//!   status TEXT NOT NULL,
//!   items_num BIGINT NOT NULL,
//!   total_amount DOUBLE PRECISION NOT NULL,
//!   shipping_cost DOUBLE PRECISION NOT NULL,
//!   topic_name TEXT NOT NULL,
//!   attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
//!   -- created_at / updated_at timestamps
//! );
//! ```
//!
//! Any fields of the creation message beyond the known ones are kept in
//! `attributes` and flattened back into the JSON form of the order.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::pricing::SHIPPING_RATE;
use crate::state_machine::{NewOrder, OrderStatus};

/// Stored order document.
///
/// Serializes with the camelCase keys used on the wire:
/// ```json
/// {
///   "orderId": "A1",
///   "status": "new",
///   "itemsNum": 2,
///   "totalAmount": 100.0,
///   "shippingCost": 2.0,
///   "topicName": "orders"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub status: OrderStatus,
    pub items_num: i64,
    pub total_amount: f64,
    pub shipping_cost: f64,
    pub topic_name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Fields the pipeline computes itself; client-supplied values are discarded
const DERIVED_FIELDS: [&str; 3] = ["shippingCost", "topicName", "topic_name"];

impl Order {
    /// Build the order document for a creation message received on `topic`.
    pub fn create(new_order: NewOrder, topic: &str) -> Self {
        let NewOrder {
            order_id,
            items_num,
            total_amount,
            mut attributes,
        } = new_order;

        for field in DERIVED_FIELDS {
            attributes.remove(field);
        }

        Self {
            order_id,
            status: OrderStatus::New,
            items_num,
            total_amount,
            shipping_cost: calculate_shipping_cost(total_amount),
            topic_name: topic.to_string(),
            attributes,
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Shipping cost for an order total: 2%, rounded to 2 decimal places.
///
/// The product is rounded once, from its exact binary value, with exact
/// midpoints going to the even cent. `0.75 * 0.02` is slightly below
/// `0.015` and so costs `0.01`; `6.25 * 0.02` is exactly `0.125` and
/// costs `0.12`.
pub fn calculate_shipping_cost(total_amount: f64) -> f64 {
    round_to_cents(total_amount * SHIPPING_RATE)
}

fn round_to_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|exact| exact.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|cents| cents.to_f64())
        .unwrap_or(value)
}
