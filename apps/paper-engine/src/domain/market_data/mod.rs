//! Market Data
//!
//! Point-in-time quote snapshots consumed by the simulator, the risk gate and
//! the trigger evaluator.

mod quote;

pub use quote::Quote;
