//! Order Lifecycle Bounded Context
//!
//! The canonical order entity that the simulator, the risk gate and the
//! trigger evaluator operate on, plus its legal status transitions.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: owns status, fills and the audit trail
//! - **Activation**: token required to enter TRIGGERED
//! - **Domain Events**: one per transition, drained after persistence

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{CreateOrderCommand, Order, ReconstitutedOrderParams, StatusChange};
pub use errors::OrderError;
pub use events::OrderEvent;
pub use repository::{OrderQuery, OrderRepository, RepositoryError};
pub use services::OrderStateMachine;
pub use value_objects::{
    Activation, ActivationCause, CancelReason, ExecutionReport, OrderSide, OrderStatus, OrderType,
    PAPER_VENUE, TimeInForce,
};
