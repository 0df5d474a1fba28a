//! Risk gate.
//!
//! Runs a fixed pipeline of independent checks over read-only snapshots.
//! Every failed check adds its weight to a score capped at 100; warnings and
//! recommendations never block.

use rust_decimal::Decimal;

use crate::domain::order_lifecycle::OrderSide;
use crate::domain::risk_management::value_objects::{
    PortfolioSnapshot, ProposedOrder, RiskCheck, RiskLimits, RiskValidationResult, RiskViolation,
    StockSnapshot,
};
use crate::domain::shared::{Money, Quantity};

use super::day_trades::count_day_trades_in_window;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Multiple of equity a small account may commit in one order.
const PDT_EQUITY_MULTIPLE: Decimal = Decimal::TWO;

/// Validates proposed orders against portfolio risk limits.
///
/// Stateless and side-effect free, so it can be called any number of times
/// for the same inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskGate;

impl RiskGate {
    /// Create a risk gate.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validate `order` against `portfolio` under `limits`.
    #[must_use]
    pub fn validate(
        &self,
        order: &ProposedOrder,
        portfolio: &PortfolioSnapshot,
        stock: &StockSnapshot,
        limits: &RiskLimits,
    ) -> RiskValidationResult {
        let mut result = RiskValidationResult::passed();

        check_order_size(order, limits, &mut result);
        check_buying_power(order, portfolio, limits, &mut result);
        check_concentration(order, portfolio, limits, &mut result);
        check_pattern_day_trading(order, portfolio, limits, &mut result);
        check_daily_loss(portfolio, limits, &mut result);
        recommend_position_size(order, portfolio, limits, &mut result);
        recommend_kelly_size(order, portfolio, stock, limits, &mut result);

        result
    }
}

// ============================================================================
// Checks
// ============================================================================

fn check_order_size(order: &ProposedOrder, limits: &RiskLimits, result: &mut RiskValidationResult) {
    let value = order.value().amount();
    if value > limits.max_order_size {
        result.add_violation(RiskViolation::new(
            RiskCheck::OrderSize,
            format!(
                "Order value {} exceeds maximum order size {}",
                Money::new(value),
                Money::new(limits.max_order_size)
            ),
        ));
    } else if value > limits.max_order_size * limits.large_order_ratio {
        result.add_recommendation(format!(
            "Large order of {} is {} of the maximum order size; consider splitting it to limit market impact",
            Money::new(value),
            percent(value / limits.max_order_size)
        ));
    }
}

fn check_buying_power(
    order: &ProposedOrder,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    if order.side != OrderSide::Buy {
        return;
    }
    let buying_power = portfolio.cash.amount() * limits.max_leverage;
    let value = order.value().amount();
    if value > buying_power {
        result.add_violation(RiskViolation::new(
            RiskCheck::BuyingPower,
            format!(
                "Insufficient buying power: order value {} exceeds available {}",
                Money::new(value),
                Money::new(buying_power)
            ),
        ));
    }
}

fn check_concentration(
    order: &ProposedOrder,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    let proposed_shares = portfolio.shares_in(&order.symbol) + order.signed_quantity();
    let exposure = proposed_shares.abs() * order.price.amount();
    let total_value = portfolio.total_value.amount();

    if total_value > Decimal::ZERO {
        let share = exposure / total_value;
        if share > limits.max_portfolio_concentration {
            result.add_violation(RiskViolation::new(
                RiskCheck::Concentration,
                format!(
                    "Position in {} would be {} of portfolio, above the {} concentration limit",
                    order.symbol,
                    percent(share),
                    percent(limits.max_portfolio_concentration)
                ),
            ));
        } else if share > limits.max_portfolio_concentration * limits.concentration_warning_ratio {
            result.add_warning(format!(
                "Position in {} would be {} of portfolio, approaching the {} limit",
                order.symbol,
                percent(share),
                percent(limits.max_portfolio_concentration)
            ));
        }
    } else if exposure > Decimal::ZERO {
        result.add_warning("Portfolio value is not positive; concentration was not checked");
    }

    if exposure > limits.max_single_stock_exposure {
        result.add_violation(RiskViolation::new(
            RiskCheck::Exposure,
            format!(
                "Exposure to {} of {} exceeds the single stock limit {}",
                order.symbol,
                Money::new(exposure),
                Money::new(limits.max_single_stock_exposure)
            ),
        ));
    }
}

fn check_pattern_day_trading(
    order: &ProposedOrder,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    let equity = portfolio.equity.amount();
    if equity >= limits.pdt_equity_threshold {
        return;
    }

    let value = order.value().amount();
    if value > equity * PDT_EQUITY_MULTIPLE {
        result.add_violation(RiskViolation::new(
            RiskCheck::PdtOrderSize,
            format!(
                "Order value {} exceeds twice the account equity {} for an account below {}",
                Money::new(value),
                portfolio.equity,
                Money::new(limits.pdt_equity_threshold)
            ),
        ));
    }

    let day_trades = count_day_trades_in_window(
        &portfolio.executions,
        portfolio.as_of.date(),
        limits.day_trade_window_days,
    );
    if day_trades >= limits.max_day_trades {
        result.add_violation(RiskViolation::new(
            RiskCheck::PdtDayTrades,
            format!(
                "Pattern day trader limit reached: {day_trades} day trades in the last {} days with equity below {}",
                limits.day_trade_window_days,
                Money::new(limits.pdt_equity_threshold)
            ),
        ));
    } else if day_trades + 1 == limits.max_day_trades {
        result.add_warning(format!(
            "One day trade remaining in the {}-day window",
            limits.day_trade_window_days
        ));
    }
}

fn check_daily_loss(
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    if !portfolio.daily_pnl.is_negative() {
        return;
    }
    let loss = portfolio.daily_pnl.abs().amount();
    if loss > limits.max_daily_loss {
        result.add_violation(RiskViolation::new(
            RiskCheck::DailyLoss,
            format!(
                "Daily loss {} exceeds the limit {}",
                Money::new(loss),
                Money::new(limits.max_daily_loss)
            ),
        ));
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Suggest a quantity cap when an exposure-increasing order exceeds the
/// concentration budget.
fn recommend_position_size(
    order: &ProposedOrder,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    let price = order.price.amount();
    let total_value = portfolio.total_value.amount();
    if price <= Decimal::ZERO || total_value <= Decimal::ZERO {
        return;
    }

    let current = portfolio.shares_in(&order.symbol);
    let proposed = current + order.signed_quantity();
    if proposed.abs() <= current.abs() {
        return;
    }

    let cap = Quantity::new(total_value * limits.max_portfolio_concentration / price).floor();
    if order.quantity > cap {
        result.adjusted_quantity = Some(cap);
        result.add_recommendation(format!(
            "Reduce quantity from {} to {cap} shares to stay within the {} concentration limit",
            order.quantity,
            percent(limits.max_portfolio_concentration)
        ));
    }
}

/// Informational Kelly sizing. Never a violation.
fn recommend_kelly_size(
    order: &ProposedOrder,
    portfolio: &PortfolioSnapshot,
    stock: &StockSnapshot,
    limits: &RiskLimits,
    result: &mut RiskValidationResult,
) {
    let (Some(expected_return), Some(volatility)) = (stock.expected_return, stock.volatility)
    else {
        return;
    };
    let Some(fraction) = kelly_fraction(expected_return, volatility, limits.kelly_fraction_cap)
    else {
        return;
    };

    if fraction <= Decimal::ZERO {
        result.add_recommendation(format!(
            "Kelly criterion does not support a position in {}: expected return {} does not cover volatility",
            order.symbol,
            percent(expected_return)
        ));
        return;
    }

    let allocation = portfolio.total_value.amount() * fraction;
    let price = order.price.amount();
    let shares = if price > Decimal::ZERO {
        Quantity::new(allocation / price).floor()
    } else {
        Quantity::ZERO
    };
    result.add_recommendation(format!(
        "Kelly criterion suggests at most {} of portfolio ({}, about {shares} shares) in {}",
        percent(fraction),
        Money::new(allocation).round_to_cent(),
        order.symbol
    ));
}

/// `expected_return / volatility²`, capped at `cap`. `None` without volatility.
#[must_use]
pub fn kelly_fraction(
    expected_return: Decimal,
    volatility: Decimal,
    cap: Decimal,
) -> Option<Decimal> {
    if volatility <= Decimal::ZERO {
        return None;
    }
    let variance = volatility * volatility;
    let raw = expected_return.checked_div(variance)?;
    Some(raw.min(cap))
}

fn percent(ratio: Decimal) -> String {
    format!("{}%", (ratio * HUNDRED).round_dp(1).normalize())
}
