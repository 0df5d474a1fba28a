//! Conditional Trigger Value Objects

mod trigger;

pub use trigger::{
    ConditionalTrigger, LogicalOperator, TriggerCondition, TriggerType, TriggerValue,
};
