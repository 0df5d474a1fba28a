//! Liquidity models deciding how much of a large order fills.

use std::fmt::Debug;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::shared::Quantity;

use super::config::LiquidityConfig;

/// Source of fill ratios for orders above the partial-fill threshold.
///
/// Injected into the simulator so tests can use a deterministic ratio.
pub trait LiquidityModel: Send + Sync + Debug {
    /// Fraction of `requested` that fills now, in `(0, 1]`.
    fn fill_ratio(&self, requested: Quantity) -> Decimal;
}

/// Uniform random ratio between the configured bounds.
///
/// Draws whole basis points so the ratio stays an exact decimal.
#[derive(Debug, Clone)]
pub struct RandomLiquidity {
    min_bps: u32,
    max_bps: u32,
}

impl RandomLiquidity {
    /// Build from configuration. Swapped bounds are reordered.
    #[must_use]
    pub fn new(config: &LiquidityConfig) -> Self {
        let to_bps = |ratio: Decimal| {
            (ratio * Decimal::from(10_000))
                .round()
                .to_u32()
                .unwrap_or(10_000)
                .min(10_000)
        };
        let a = to_bps(config.min_fill_ratio);
        let b = to_bps(config.max_fill_ratio);
        Self {
            min_bps: a.min(b),
            max_bps: a.max(b),
        }
    }
}

impl LiquidityModel for RandomLiquidity {
    fn fill_ratio(&self, _requested: Quantity) -> Decimal {
        let bps = rand::rng().random_range(self.min_bps..=self.max_bps);
        Decimal::new(i64::from(bps), 4)
    }
}

/// Constant ratio.
#[derive(Debug, Clone, Copy)]
pub struct FixedLiquidity(pub Decimal);

impl LiquidityModel for FixedLiquidity {
    fn fill_ratio(&self, _requested: Quantity) -> Decimal {
        self.0
    }
}
