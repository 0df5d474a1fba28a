//! Execution simulation configuration.

use serde::{Deserialize, Serialize};

use crate::domain::execution_simulation::{CommissionConfig, LiquidityConfig, SlippageConfig};

/// Fill simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    /// Commission schedule.
    #[serde(default)]
    pub commission: CommissionConfig,
    /// Slippage model.
    #[serde(default)]
    pub slippage: SlippageConfig,
    /// Partial-fill liquidity model.
    #[serde(default)]
    pub liquidity: LiquidityConfig,
}
