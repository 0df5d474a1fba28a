//! Portfolio risk limits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Limits the risk gate validates against.
///
/// Monetary limits are in dollars; ratios are fractions (0.25 = 25%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum value of a single order.
    #[serde(default = "default_max_order_size")]
    pub max_order_size: Decimal,
    /// Buying power multiple applied to cash for BUY orders.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: Decimal,
    /// Maximum share of portfolio value in one symbol.
    #[serde(default = "default_max_portfolio_concentration")]
    pub max_portfolio_concentration: Decimal,
    /// Maximum absolute exposure to one symbol.
    #[serde(default = "default_max_single_stock_exposure")]
    pub max_single_stock_exposure: Decimal,
    /// Maximum realized plus unrealized loss for the day.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Equity below which pattern day trader rules apply.
    #[serde(default = "default_pdt_equity_threshold")]
    pub pdt_equity_threshold: Decimal,
    /// Day trades allowed inside the rolling window.
    #[serde(default = "default_max_day_trades")]
    pub max_day_trades: u32,
    /// Length of the rolling day-trade window in calendar days.
    #[serde(default = "default_day_trade_window_days")]
    pub day_trade_window_days: u32,
    /// Cap on the Kelly fraction recommendation.
    #[serde(default = "default_kelly_fraction_cap")]
    pub kelly_fraction_cap: Decimal,
    /// Share of `max_order_size` above which a market impact note is added.
    #[serde(default = "default_large_order_ratio")]
    pub large_order_ratio: Decimal,
    /// Share of the concentration limit above which a warning is added.
    #[serde(default = "default_concentration_warning_ratio")]
    pub concentration_warning_ratio: Decimal,
}

const fn default_max_order_size() -> Decimal {
    dec!(10000)
}

const fn default_max_leverage() -> Decimal {
    dec!(1)
}

const fn default_max_portfolio_concentration() -> Decimal {
    dec!(0.25)
}

const fn default_max_single_stock_exposure() -> Decimal {
    dec!(50000)
}

const fn default_max_daily_loss() -> Decimal {
    dec!(2000)
}

const fn default_pdt_equity_threshold() -> Decimal {
    dec!(25000)
}

const fn default_max_day_trades() -> u32 {
    3
}

const fn default_day_trade_window_days() -> u32 {
    5
}

const fn default_kelly_fraction_cap() -> Decimal {
    dec!(0.25)
}

const fn default_large_order_ratio() -> Decimal {
    dec!(0.8)
}

const fn default_concentration_warning_ratio() -> Decimal {
    dec!(0.8)
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: default_max_order_size(),
            max_leverage: default_max_leverage(),
            max_portfolio_concentration: default_max_portfolio_concentration(),
            max_single_stock_exposure: default_max_single_stock_exposure(),
            max_daily_loss: default_max_daily_loss(),
            pdt_equity_threshold: default_pdt_equity_threshold(),
            max_day_trades: default_max_day_trades(),
            day_trade_window_days: default_day_trade_window_days(),
            kelly_fraction_cap: default_kelly_fraction_cap(),
            large_order_ratio: default_large_order_ratio(),
            concentration_warning_ratio: default_concentration_warning_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let limits: RiskLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(limits, RiskLimits::default());
        assert_eq!(limits.max_order_size, dec!(10000));
        assert_eq!(limits.max_day_trades, 3);
    }
}
