//! Risk Management Services

mod day_trades;
mod risk_gate;

pub use day_trades::{count_day_trades, count_day_trades_in_window};
pub use risk_gate::{RiskGate, kelly_fraction};
