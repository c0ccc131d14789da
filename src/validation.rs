//! Request validation for the cart-service side
//!
//! Create and update requests are checked here before anything is published,
//! then turned into the [`OrderMessage`] that goes on the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messaging::OrderMessage;
use crate::state_machine::OrderStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field 'orderId' must not be empty")]
    EmptyOrderId,

    #[error("Number of items must be at least 1")]
    ItemsNum { items_num: i64 },

    #[error("Field 'totalAmount' must be a non-negative number, got {total_amount}")]
    TotalAmount { total_amount: f64 },

    #[error("Input should be 'pending' or 'confirmed', got '{status}'")]
    Status { status: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Request to create an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub items_num: i64,
    pub total_amount: f64,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_order_id(&self.order_id)?;
        if self.items_num < 1 {
            return Err(ValidationError::ItemsNum {
                items_num: self.items_num,
            });
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(ValidationError::TotalAmount {
                total_amount: self.total_amount,
            });
        }
        Ok(())
    }

    /// Validate and build the `new`-status message
    pub fn into_message(self) -> ValidationResult<OrderMessage> {
        self.validate()?;
        Ok(OrderMessage::create(
            self.order_id,
            self.items_num,
            self.total_amount,
        ))
    }
}

/// Request to move an order to `pending` or `confirmed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_id: String,
    pub status: String,
}

impl UpdateOrderRequest {
    /// Check the request and return the parsed target status
    pub fn validate(&self) -> ValidationResult<OrderStatus> {
        validate_order_id(&self.order_id)?;
        match self.status.parse::<OrderStatus>() {
            Ok(status) if status.is_update() => Ok(status),
            _ => Err(ValidationError::Status {
                status: self.status.clone(),
            }),
        }
    }

    pub fn into_message(self) -> ValidationResult<OrderMessage> {
        let status = self.validate()?;
        Ok(OrderMessage::update(self.order_id, status))
    }
}

fn validate_order_id(order_id: &str) -> ValidationResult<()> {
    if order_id.trim().is_empty() {
        return Err(ValidationError::EmptyOrderId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(order_id: &str, items_num: i64, total_amount: f64) -> CreateOrderRequest {
        CreateOrderRequest {
            order_id: order_id.to_string(),
            items_num,
            total_amount,
        }
    }

    #[test]
    fn test_valid_create_request() {
        let message = create("A1", 2, 100.0).into_message().unwrap();
        assert_eq!(message.status, OrderStatus::New);
        assert_eq!(message.items_num, Some(2));
    }

    #[test]
    fn test_items_num_must_be_positive() {
        let err = create("A1", 0, 100.0).validate().unwrap_err();
        assert_eq!(err.to_string(), "Number of items must be at least 1");
    }

    #[test]
    fn test_invalid_create_requests() {
        assert_eq!(
            create(" ", 1, 1.0).validate(),
            Err(ValidationError::EmptyOrderId)
        );
        assert!(create("A1", 1, -0.5).validate().is_err());
        assert!(create("A1", 1, f64::NAN).validate().is_err());
        assert!(create("A1", 1, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_update_request_status() {
        let request = UpdateOrderRequest {
            order_id: "A1".to_string(),
            status: "confirmed".to_string(),
        };
        assert_eq!(request.validate(), Ok(OrderStatus::Confirmed));

        for status in ["new", "shipped", ""] {
            let request = UpdateOrderRequest {
                order_id: "A1".to_string(),
                status: status.to_string(),
            };
            assert!(matches!(
                request.validate(),
                Err(ValidationError::Status { .. })
            ));
        }
    }

    #[test]
    fn test_request_json_shape() {
        let request: CreateOrderRequest =
            serde_json::from_str(r#"{"orderId":"A1","itemsNum":3,"totalAmount":12.5}"#).unwrap();
        assert_eq!(request, create("A1", 3, 12.5));
    }
}
