// Order state machine
//
// Decodes order messages into create/update events and applies them to the
// document store, enforcing uniqueness on create and existence on update.

pub mod errors;
pub mod events;
pub mod order_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{ProcessingError, ProcessingResult};
pub use events::{NewOrder, OrderEvent};
pub use order_state_machine::{OrderStateMachine, OrderTransition};
pub use states::OrderStatus;
