//! Execution Simulation Bounded Context
//!
//! Prices and fills orders against market quotes: slippage for market and
//! stop orders, limit executability, commission schedule, and partial fills
//! driven by a pluggable liquidity model.

mod commission;
mod config;
mod liquidity;
mod result;
mod simulator;
mod slippage;

pub use commission::calculate_commission;
pub use config::{CommissionConfig, LiquidityConfig, SlippageConfig};
pub use liquidity::{FixedLiquidity, LiquidityModel, RandomLiquidity};
pub use result::{ExecutionResult, ExecutionStatus};
pub use simulator::{ExecutionSimulator, FillPlan, PlannedOutcome};
pub use slippage::{apply_slippage, slippage_amount};
