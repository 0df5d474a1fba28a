//! Execution simulation configuration.
//!
//! Commission, slippage and liquidity parameters are injected at
//! construction; nothing here is a hard-coded constant of the simulator.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Quantity;

/// Commission schedule.
///
/// `commission = clamp(base + qty * per_share + value * percentage, min, max)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// Flat fee per fill.
    #[serde(default)]
    pub base_fee: Decimal,
    /// Fee per share.
    #[serde(default = "default_per_share_fee")]
    pub per_share_fee: Decimal,
    /// Fraction of trade value (0.001 = 0.1%).
    #[serde(default = "default_percentage_fee")]
    pub percentage_fee: Decimal,
    /// Floor.
    #[serde(default = "default_minimum_fee")]
    pub minimum_fee: Decimal,
    /// Cap.
    #[serde(default = "default_maximum_fee")]
    pub maximum_fee: Decimal,
}

const fn default_per_share_fee() -> Decimal {
    dec!(0.005)
}

const fn default_percentage_fee() -> Decimal {
    dec!(0.001)
}

const fn default_minimum_fee() -> Decimal {
    dec!(1.00)
}

const fn default_maximum_fee() -> Decimal {
    dec!(65.00)
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            base_fee: Decimal::ZERO,
            per_share_fee: default_per_share_fee(),
            percentage_fee: default_percentage_fee(),
            minimum_fee: default_minimum_fee(),
            maximum_fee: default_maximum_fee(),
        }
    }
}

/// Fixed basis-point slippage with an absolute cap per share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageConfig {
    /// Slippage in basis points of the quote price.
    #[serde(default = "default_basis_points")]
    pub basis_points: Decimal,
    /// Maximum slippage per share in dollars.
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
}

const fn default_basis_points() -> Decimal {
    dec!(5)
}

const fn default_max_slippage() -> Decimal {
    dec!(0.50)
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            basis_points: default_basis_points(),
            max_slippage: default_max_slippage(),
        }
    }
}

/// Partial-fill liquidity parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityConfig {
    /// Orders with more shares outstanding than this may fill partially.
    #[serde(default = "default_partial_fill_threshold")]
    pub partial_fill_threshold: Quantity,
    /// Lower bound of the random fill ratio.
    #[serde(default = "default_min_fill_ratio")]
    pub min_fill_ratio: Decimal,
    /// Upper bound of the random fill ratio.
    #[serde(default = "default_max_fill_ratio")]
    pub max_fill_ratio: Decimal,
}

fn default_partial_fill_threshold() -> Quantity {
    Quantity::from_i64(1_000)
}

const fn default_min_fill_ratio() -> Decimal {
    dec!(0.80)
}

const fn default_max_fill_ratio() -> Decimal {
    dec!(0.95)
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            partial_fill_threshold: default_partial_fill_threshold(),
            min_fill_ratio: default_min_fill_ratio(),
            max_fill_ratio: default_max_fill_ratio(),
        }
    }
}
