//! Risk Management Bounded Context
//!
//! Validates a proposed order against portfolio-level limits before a fill is
//! finalized.
//!
//! # Key Concepts
//!
//! - **Risk Gate**: Fixed pipeline of independent checks with a capped score
//! - **Snapshots**: Read-only portfolio, position and stock views
//! - **Day Trades**: Round-trip counting for pattern day trader rules

pub mod services;
pub mod value_objects;

pub use services::{RiskGate, count_day_trades, count_day_trades_in_window, kelly_fraction};
pub use value_objects::{
    ExecutionRecord, MAX_RISK_SCORE, PortfolioSnapshot, PositionSnapshot, ProposedOrder,
    RiskApproval, RiskCheck, RiskLimits, RiskValidationResult, RiskViolation, StockSnapshot,
};
