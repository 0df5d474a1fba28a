//! Conditional Triggers Bounded Context
//!
//! Declarative conditions attached to dormant orders and the evaluator that
//! decides, against a market snapshot, whether the order may activate.

pub mod services;
pub mod value_objects;

pub use services::TriggerEvaluator;
pub use value_objects::{
    ConditionalTrigger, LogicalOperator, TriggerCondition, TriggerType, TriggerValue,
};
