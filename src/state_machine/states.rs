use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::status;

/// Order status values carried on the wire and stored with each order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Only status an order can be created with
    New,
    /// Order acknowledged, awaiting confirmation
    Pending,
    /// Order confirmed
    Confirmed,
}

impl OrderStatus {
    /// Check if a message with this status creates an order
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::New)
    }

    /// Check if a message with this status updates an existing order
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => status::NEW,
            Self::Pending => status::PENDING,
            Self::Confirmed => status::CONFIRMED,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            status::NEW => Ok(Self::New),
            status::PENDING => Ok(Self::Pending),
            status::CONFIRMED => Ok(Self::Confirmed),
            _ => Err(format!("Unexpected status: {s}")),
        }
    }
}

/// Default status for new orders
impl Default for OrderStatus {
    fn default() -> Self {
        Self::New
    }
}
