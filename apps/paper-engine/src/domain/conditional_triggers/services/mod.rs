//! Conditional Trigger Domain Services

mod trigger_evaluator;

pub use trigger_evaluator::TriggerEvaluator;
