//! Order Lifecycle Value Objects
//!
//! Immutable types for paper order management.

mod activation;
mod execution_report;
mod order_side;
mod order_status;
mod order_type;
mod reasons;
mod time_in_force;

pub use activation::{Activation, ActivationCause};
pub use execution_report::{ExecutionReport, PAPER_VENUE};
pub use order_side::OrderSide;
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use reasons::CancelReason;
pub use time_in_force::TimeInForce;
