pub mod order;

pub use order::{calculate_shipping_cost, Order};
