use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::{ProcessingError, ProcessingResult};
use super::states::OrderStatus;

/// Body of a creation message (`status: "new"`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_id: String,
    pub items_num: i64,
    pub total_amount: f64,
    /// Any further fields of the message, kept with the stored order
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody {
    order_id: String,
}

/// Decoded order message, classified by its `status` field
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    /// Create a new order
    Create(NewOrder),
    /// Move an existing order to `status`
    Update { order_id: String, status: OrderStatus },
}

impl OrderEvent {
    /// Decode a raw message payload.
    ///
    /// An unknown `status` is rejected here, before any store access, with
    /// [`ProcessingError::UnexpectedStatus`]. Everything else that prevents
    /// decoding is a [`ProcessingError::Decode`].
    pub fn decode(payload: &[u8]) -> ProcessingResult<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| ProcessingError::decode(format!("payload is not valid UTF-8: {e}")))?;
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> ProcessingResult<Self> {
        let mut body = match value {
            Value::Object(body) => body,
            other => {
                return Err(ProcessingError::decode(format!(
                    "expected a JSON object, got {other}"
                )))
            }
        };

        let status = match body.remove("status") {
            Some(Value::String(status)) => status
                .parse::<OrderStatus>()
                .map_err(|_| ProcessingError::unexpected_status(status))?,
            Some(other) => return Err(ProcessingError::unexpected_status(other.to_string())),
            None => return Err(ProcessingError::decode("missing field `status`")),
        };

        match status {
            OrderStatus::New => {
                let new_order: NewOrder = serde_json::from_value(Value::Object(body))?;
                Ok(Self::Create(new_order))
            }
            OrderStatus::Pending | OrderStatus::Confirmed => {
                let update: UpdateBody = serde_json::from_value(Value::Object(body))?;
                Ok(Self::Update {
                    order_id: update.order_id,
                    status,
                })
            }
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            Self::Create(new_order) => &new_order.order_id,
            Self::Update { order_id, .. } => order_id,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match self {
            Self::Create(_) => OrderStatus::New,
            Self::Update { status, .. } => *status,
        }
    }

    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_create() {
        let event = OrderEvent::decode(
            br#"{"orderId":"A1","itemsNum":2,"totalAmount":100,"status":"new","channel":"web"}"#,
        )
        .unwrap();

        match event {
            OrderEvent::Create(new_order) => {
                assert_eq!(new_order.order_id, "A1");
                assert_eq!(new_order.items_num, 2);
                assert_eq!(new_order.total_amount, 100.0);
                assert_eq!(new_order.attributes.get("channel"), Some(&Value::from("web")));
                assert!(!new_order.attributes.contains_key("status"));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_update() {
        let event = OrderEvent::decode(br#"{"orderId":"A1","status":"confirmed"}"#).unwrap();
        assert_eq!(
            event,
            OrderEvent::Update {
                order_id: "A1".to_string(),
                status: OrderStatus::Confirmed
            }
        );
        assert_eq!(event.event_type(), "update");
        assert_eq!(event.order_id(), "A1");
    }

    #[test]
    fn test_unexpected_status_is_distinct_from_decode_errors() {
        let err = OrderEvent::decode(br#"{"orderId":"A1","status":"shipped"}"#).unwrap_err();
        assert_eq!(err, ProcessingError::unexpected_status("shipped"));

        let err = OrderEvent::decode(br#"{"orderId":"A1","status":7}"#).unwrap_err();
        assert_eq!(err, ProcessingError::unexpected_status("7"));
    }

    #[test]
    fn test_decode_failures() {
        let err = OrderEvent::decode(b"{not json").unwrap_err();
        assert_eq!(err.kind(), "decode");

        let err = OrderEvent::decode(br#"{"orderId":"A1"}"#).unwrap_err();
        assert_eq!(err, ProcessingError::decode("missing field `status`"));

        // creation requires the order content
        let err = OrderEvent::decode(br#"{"orderId":"A1","status":"new"}"#).unwrap_err();
        assert_eq!(err.kind(), "decode");

        let err = OrderEvent::decode(br#"["orderId"]"#).unwrap_err();
        assert_eq!(err.kind(), "decode");

        let err = OrderEvent::decode(&[0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
