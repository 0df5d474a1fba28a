//! Paper execution simulator.
//!
//! Execution is split into two steps so a caller can consult the risk gate
//! and the settlement ledger between deciding a fill and recording it:
//!
//! 1. [`ExecutionSimulator::plan`] is pure. It reads the order and the quote
//!    and decides what would happen: a fill at a price and size, a queued
//!    order, a time-in-force cancellation, or a failure.
//! 2. [`ExecutionSimulator::apply`] records the plan on the order. It works on
//!    a staged copy and only commits when every transition succeeds, so a
//!    failed apply leaves the order exactly as it was.
//!
//! [`ExecutionSimulator::execute`] runs both steps back to back.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::market_data::Quote;
use crate::domain::order_lifecycle::{
    Activation, CancelReason, ExecutionReport, Order, OrderError, OrderSide, OrderStatus,
    OrderType, TimeInForce,
};
use crate::domain::shared::{ExecutionId, Money, OrderId, Quantity};

use super::commission::calculate_commission;
use super::config::{CommissionConfig, LiquidityConfig, SlippageConfig};
use super::liquidity::{LiquidityModel, RandomLiquidity};
use super::result::ExecutionResult;
use super::slippage::apply_slippage;

/// What the simulator decided for one order against one quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOutcome {
    /// Execute `quantity` shares at `price`.
    Fill {
        /// Identifier the fill will be recorded and settled under.
        execution_id: ExecutionId,
        /// Shares to execute now.
        quantity: Quantity,
        /// Execution price after slippage or limit improvement.
        price: Money,
        /// Commission for this fill.
        commission: Money,
        /// Set for IOC orders that cannot fill completely.
        cancel_remainder: Option<CancelReason>,
    },
    /// Not executable at this quote; try again later.
    Queued(String),
    /// Cancel the order because of its time in force.
    Cancel(CancelReason),
    /// The attempt cannot proceed; the order is left untouched.
    Failed(String),
}

/// A plan produced by [`ExecutionSimulator::plan`].
#[derive(Debug, Clone)]
pub struct FillPlan {
    order_id: OrderId,
    activation: Option<Activation>,
    outcome: PlannedOutcome,
}

impl FillPlan {
    fn new(order: &Order, activation: Option<Activation>, outcome: PlannedOutcome) -> Self {
        Self {
            order_id: order.id().clone(),
            activation,
            outcome,
        }
    }

    /// Order this plan was computed for.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// The planned outcome.
    #[must_use]
    pub const fn outcome(&self) -> &PlannedOutcome {
        &self.outcome
    }

    /// True when the plan arms the order's stop.
    #[must_use]
    pub const fn reaches_stop(&self) -> bool {
        self.activation.is_some()
    }

    /// Shares and price of the planned fill, if any.
    #[must_use]
    pub const fn fill(&self) -> Option<(Quantity, Money)> {
        match &self.outcome {
            PlannedOutcome::Fill {
                quantity, price, ..
            } => Some((*quantity, *price)),
            _ => None,
        }
    }

    /// Identifier of the planned fill, if any.
    #[must_use]
    pub const fn execution_id(&self) -> Option<&ExecutionId> {
        match &self.outcome {
            PlannedOutcome::Fill { execution_id, .. } => Some(execution_id),
            _ => None,
        }
    }

    /// Commission of the planned fill, if any.
    #[must_use]
    pub const fn commission(&self) -> Option<Money> {
        match &self.outcome {
            PlannedOutcome::Fill { commission, .. } => Some(*commission),
            _ => None,
        }
    }

    /// Replace the planned fill's size and price with the ones a ledger
    /// already booked under this plan's execution id.
    ///
    /// Plans without a fill are returned unchanged.
    #[must_use]
    pub fn with_booked_fill(self, quantity: Quantity, price: Money, commission: Money) -> Self {
        let outcome = match self.outcome {
            PlannedOutcome::Fill {
                execution_id,
                cancel_remainder,
                ..
            } => PlannedOutcome::Fill {
                execution_id,
                quantity,
                price,
                commission,
                cancel_remainder,
            },
            other => other,
        };
        Self { outcome, ..self }
    }

    /// Replace the outcome with a failure, keeping any stop activation.
    #[must_use]
    pub fn into_failed(self, message: impl Into<String>) -> Self {
        Self {
            outcome: PlannedOutcome::Failed(message.into()),
            ..self
        }
    }
}

/// Prices and fills orders against quotes.
#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    commission: CommissionConfig,
    slippage: SlippageConfig,
    liquidity: LiquidityConfig,
    liquidity_model: Arc<dyn LiquidityModel>,
}

impl ExecutionSimulator {
    /// Create a simulator with an explicit liquidity model.
    #[must_use]
    pub fn new(
        commission: CommissionConfig,
        slippage: SlippageConfig,
        liquidity: LiquidityConfig,
        liquidity_model: Arc<dyn LiquidityModel>,
    ) -> Self {
        Self {
            commission,
            slippage,
            liquidity,
            liquidity_model,
        }
    }

    /// Create a simulator that draws random partial-fill ratios from the
    /// liquidity configuration.
    #[must_use]
    pub fn with_random_liquidity(
        commission: CommissionConfig,
        slippage: SlippageConfig,
        liquidity: LiquidityConfig,
    ) -> Self {
        let model = Arc::new(RandomLiquidity::new(&liquidity));
        Self::new(commission, slippage, liquidity, model)
    }

    /// Plan then apply in one step.
    pub fn execute(&self, order: &mut Order, quote: Option<&Quote>) -> ExecutionResult {
        let plan = self.plan(order, quote);
        self.apply(order, plan)
    }

    /// Decide what would happen to `order` at `quote` without changing it.
    #[must_use]
    pub fn plan(&self, order: &Order, quote: Option<&Quote>) -> FillPlan {
        let Some(quote) = quote else {
            return FillPlan::new(
                order,
                None,
                PlannedOutcome::Failed(format!("Stock not found: {}", order.symbol())),
            );
        };
        if quote.symbol != *order.symbol() {
            return FillPlan::new(
                order,
                None,
                PlannedOutcome::Failed(format!(
                    "Quote for {} does not match order symbol {}",
                    quote.symbol,
                    order.symbol()
                )),
            );
        }
        if !quote.has_valid_price() {
            return FillPlan::new(
                order,
                None,
                PlannedOutcome::Failed(format!(
                    "Invalid price {} for {}",
                    quote.price,
                    order.symbol()
                )),
            );
        }
        if !order.status().is_working() {
            return FillPlan::new(
                order,
                None,
                PlannedOutcome::Failed(format!("Order is {} and cannot execute", order.status())),
            );
        }
        if order.is_conditional() && order.status() == OrderStatus::Pending {
            return FillPlan::new(
                order,
                None,
                PlannedOutcome::Queued("Awaiting conditional triggers".to_string()),
            );
        }

        let mut activation = None;
        if order.order_type().requires_stop_price() && !order.stop_reached() {
            match order.stop_price() {
                Some(stop) if Self::stop_crossed(order.side(), stop, quote.price) => {
                    activation = Some(Activation::stop_reached(stop, quote.price));
                }
                Some(stop) => {
                    return FillPlan::new(
                        order,
                        None,
                        PlannedOutcome::Queued(format!(
                            "Stop price {stop} not reached at {}",
                            quote.price
                        )),
                    );
                }
                None => {
                    return FillPlan::new(
                        order,
                        None,
                        PlannedOutcome::Failed("Stop order has no stop price".to_string()),
                    );
                }
            }
        }

        let outcome = self.price_and_size(order, quote);
        FillPlan::new(order, activation, outcome)
    }

    /// Record a plan on the order.
    ///
    /// A plan computed for another order, or one whose transitions the order
    /// rejects, yields a failed result and leaves the order unchanged.
    pub fn apply(&self, order: &mut Order, plan: FillPlan) -> ExecutionResult {
        if plan.order_id != *order.id() {
            return ExecutionResult::failed(
                order.remaining_quantity(),
                format!("Plan for {} applied to order {}", plan.order_id, order.id()),
            );
        }

        let mut staged = order.clone();
        match Self::apply_staged(&mut staged, plan) {
            Ok(result) => {
                *order = staged;
                result
            }
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id(),
                    error = %e,
                    "Failed to apply execution plan"
                );
                ExecutionResult::failed(order.remaining_quantity(), e.to_string())
            }
        }
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    fn apply_staged(order: &mut Order, plan: FillPlan) -> Result<ExecutionResult, OrderError> {
        if let Some(activation) = plan.activation {
            order.activate(activation)?;
        }

        match plan.outcome {
            PlannedOutcome::Fill {
                execution_id,
                quantity,
                price,
                commission,
                cancel_remainder,
            } => {
                let report = ExecutionReport::paper(quantity, price, commission)
                    .with_execution_id(execution_id.clone());
                order.apply_fill(report)?;

                let remaining = order.remaining_quantity();
                let mut result =
                    ExecutionResult::filled(execution_id, price, quantity, commission, remaining);
                if let Some(reason) = cancel_remainder
                    && remaining.is_positive()
                {
                    result.message = format!("{}; {}", result.message, reason.message);
                    order.cancel(reason)?;
                }
                Ok(result)
            }
            PlannedOutcome::Queued(message) => {
                Ok(ExecutionResult::queued(order.remaining_quantity(), message))
            }
            PlannedOutcome::Cancel(reason) => {
                let message = reason.message.clone();
                order.cancel(reason)?;
                Ok(ExecutionResult::cancelled(order.remaining_quantity(), message))
            }
            PlannedOutcome::Failed(message) => {
                Ok(ExecutionResult::failed(order.remaining_quantity(), message))
            }
        }
    }

    fn price_and_size(&self, order: &Order, quote: &Quote) -> PlannedOutcome {
        let tif = order.time_in_force();
        let price = match order.order_type() {
            OrderType::Market | OrderType::Stop => {
                apply_slippage(&self.slippage, quote.price, order.side())
            }
            OrderType::Limit | OrderType::StopLimit => {
                let Some(limit) = order.limit_price() else {
                    return PlannedOutcome::Failed("Limit order has no limit price".to_string());
                };
                match Self::limit_fill_price(order.side(), limit, quote.price) {
                    Some(price) => price,
                    None if tif.is_immediate() => {
                        return PlannedOutcome::Cancel(CancelReason::not_marketable());
                    }
                    None => {
                        return PlannedOutcome::Queued(format!(
                            "Limit not reached: limit {limit}, market {}",
                            quote.price
                        ));
                    }
                }
            }
        };

        let remaining = order.remaining_quantity();
        let quantity = self.available_quantity(remaining);
        let short = quantity < remaining;

        if short && tif == TimeInForce::Fok {
            return PlannedOutcome::Cancel(CancelReason::fok_unfilled());
        }
        let cancel_remainder = (short && tif == TimeInForce::Ioc).then(CancelReason::ioc_remainder);

        PlannedOutcome::Fill {
            execution_id: ExecutionId::for_fill(order.id(), order.fill_count() + 1),
            quantity,
            price,
            commission: calculate_commission(&self.commission, quantity, price),
            cancel_remainder,
        }
    }

    /// Shares the simulated book can absorb right now.
    fn available_quantity(&self, remaining: Quantity) -> Quantity {
        if remaining <= self.liquidity.partial_fill_threshold {
            return remaining;
        }
        let ratio = self
            .liquidity_model
            .fill_ratio(remaining)
            .max(Decimal::ZERO);
        if ratio >= Decimal::ONE {
            return remaining;
        }
        Quantity::new(remaining.amount() * ratio)
            .floor()
            .max(Quantity::from_i64(1))
            .min(remaining)
    }

    /// Execution price of a marketable limit order, or `None` when the quote
    /// is on the wrong side of the limit.
    fn limit_fill_price(side: OrderSide, limit: Money, market: Money) -> Option<Money> {
        match side {
            OrderSide::Buy if market <= limit => Some(market.min(limit)),
            OrderSide::Sell if market >= limit => Some(market.max(limit)),
            _ => None,
        }
    }

    fn stop_crossed(side: OrderSide, stop: Money, market: Money) -> bool {
        match side {
            OrderSide::Buy => market >= stop,
            OrderSide::Sell => market <= stop,
        }
    }
}
