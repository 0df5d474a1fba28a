//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod process_order;
mod validate_risk;

pub use process_order::{
    ProcessOrderError, ProcessOrderOutcome, ProcessOrderUseCase, publish_order_events,
};
pub use validate_risk::{
    EXPECTED_RETURN_INDICATOR, RiskError, VOLATILITY_INDICATOR, ValidateOrderRiskUseCase,
    stock_snapshot,
};
