//! Process Order Use Case
//!
//! One execution attempt for one order: trigger evaluation, pricing, the risk
//! gate, settlement, and the state change. The simulator plans without
//! touching the order; the plan is only applied once settlement succeeded, so
//! a failed settlement leaves both the ledger and the order unchanged.
//!
//! Fill ids are derived from the order and its fill count. When the order
//! save after a settlement is lost, the next attempt finds the booked trade
//! under the same id and records it instead of settling again.

use std::sync::Arc;

use chrono::Utc;

use super::validate_risk::stock_snapshot;
use crate::application::ports::{
    MarketDataError, MarketDataPort, NotificationSink, PortfolioError, PortfolioRepository,
    SettlementError, TradeConfirmation, TradeRequest, TradeSettlementPort,
};
use crate::domain::conditional_triggers::TriggerEvaluator;
use crate::domain::execution_simulation::{
    ExecutionResult, ExecutionSimulator, FillPlan, PlannedOutcome,
};
use crate::domain::order_lifecycle::{
    CancelReason, Order, OrderError, OrderRepository, RepositoryError,
};
use crate::domain::risk_management::{ProposedOrder, RiskGate, RiskLimits, RiskValidationResult};

/// Error raised when an order cannot be processed at all.
///
/// Execution outcomes that leave the order working (queued, failed pricing,
/// failed settlement) are reported through [`ExecutionResult`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ProcessOrderError {
    /// Market data failure other than an unknown symbol.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Portfolio store failure.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// The order's portfolio does not exist.
    #[error("Portfolio not found: {portfolio_id}")]
    PortfolioNotFound {
        /// The unknown portfolio.
        portfolio_id: String,
    },

    /// Order store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Illegal order transition.
    #[error("Order transition failed: {0}")]
    Order(#[from] OrderError),
}

/// Result of processing one order.
#[derive(Debug, Clone)]
pub struct ProcessOrderOutcome {
    /// The order as persisted after this attempt.
    pub order: Order,
    /// What the attempt did.
    pub result: ExecutionResult,
    /// Risk verdict, when the attempt reached the gate.
    pub risk: Option<RiskValidationResult>,
    /// True when conditional triggers fired during this attempt.
    pub activated: bool,
}

impl ProcessOrderOutcome {
    /// True when the risk gate rejected the fill.
    #[must_use]
    pub fn rejected(&self) -> bool {
        self.risk.as_ref().is_some_and(|r| !r.is_valid)
    }
}

/// Publish and clear the order's pending domain events.
pub fn publish_order_events(sink: &dyn NotificationSink, order: &mut Order) {
    for event in order.drain_events() {
        match serde_json::to_value(&event) {
            Ok(payload) => sink.broadcast(event.event_type(), payload),
            Err(e) => {
                tracing::warn!(
                    order_id = %event.order_id(),
                    error = %e,
                    "Failed to serialize order event"
                );
            }
        }
    }
}

/// Use case for processing a single working order.
pub struct ProcessOrderUseCase<O, M, P, S>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
{
    orders: Arc<O>,
    market_data: Arc<M>,
    portfolios: Arc<P>,
    settlement: Arc<S>,
    notifications: Arc<dyn NotificationSink>,
    simulator: ExecutionSimulator,
    evaluator: TriggerEvaluator,
    gate: RiskGate,
    limits: RiskLimits,
}

impl<O, M, P, S> ProcessOrderUseCase<O, M, P, S>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
{
    /// Create a new `ProcessOrderUseCase`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<O>,
        market_data: Arc<M>,
        portfolios: Arc<P>,
        settlement: Arc<S>,
        notifications: Arc<dyn NotificationSink>,
        simulator: ExecutionSimulator,
        limits: RiskLimits,
    ) -> Self {
        Self {
            orders,
            market_data,
            portfolios,
            settlement,
            notifications,
            simulator,
            evaluator: TriggerEvaluator::new(),
            gate: RiskGate::new(),
            limits,
        }
    }

    /// The order store this use case persists to.
    #[must_use]
    pub const fn orders(&self) -> &Arc<O> {
        &self.orders
    }

    /// The notification sink events are published to.
    #[must_use]
    pub const fn notifications(&self) -> &Arc<dyn NotificationSink> {
        &self.notifications
    }

    /// Run one execution attempt for `order`.
    ///
    /// # Errors
    ///
    /// Returns error if market data, the portfolio store or the order store
    /// fails, the portfolio is unknown, or the order rejects a transition.
    pub async fn execute(
        &self,
        mut order: Order,
    ) -> Result<ProcessOrderOutcome, ProcessOrderError> {
        let quote = match self.market_data.get_quote(order.symbol()).await {
            Ok(quote) => Some(quote),
            Err(MarketDataError::SymbolNotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let mut activated = false;
        let activation = quote
            .as_ref()
            .and_then(|quote| self.evaluator.try_activate(&order, quote, Utc::now()));
        if let Some(activation) = activation {
            order.activate(activation)?;
            self.persist(&mut order).await?;
            activated = true;
        }

        let mut plan = self.simulator.plan(&order, quote.as_ref());
        let mut risk = None;

        if let (Some((quantity, price)), Some(quote)) = (plan.fill(), quote.as_ref()) {
            let portfolio = self
                .portfolios
                .find_snapshot(order.portfolio_id())
                .await?
                .ok_or_else(|| ProcessOrderError::PortfolioNotFound {
                    portfolio_id: order.portfolio_id().to_string(),
                })?;

            match self.booked_fill(&order, &plan).await {
                Ok(Some(booked)) => {
                    tracing::info!(
                        order_id = %order.id(),
                        execution_id = %booked.execution_id,
                        quantity = %booked.quantity,
                        "Fill already settled, recording booked trade"
                    );
                    plan = plan.with_booked_fill(booked.quantity, booked.price, booked.commission);
                }
                Ok(None) => {
                    let proposed = ProposedOrder::from_order(&order, quantity, price);
                    let verdict = self.gate.validate(
                        &proposed,
                        &portfolio,
                        &stock_snapshot(quote),
                        &self.limits,
                    );

                    if !verdict.is_valid {
                        let messages = verdict.violation_messages();
                        tracing::info!(
                            order_id = %order.id(),
                            risk_score = verdict.risk_score,
                            violations = %messages.join("; "),
                            "Order rejected by risk gate"
                        );
                        order.cancel(CancelReason::risk_rejected(&messages))?;
                        self.persist(&mut order).await?;
                        let result = ExecutionResult::cancelled(
                            order.remaining_quantity(),
                            format!("Risk rejected: {}", messages.join("; ")),
                        );
                        return Ok(ProcessOrderOutcome {
                            order,
                            result,
                            risk: Some(verdict),
                            activated,
                        });
                    }

                    for warning in &verdict.warnings {
                        tracing::debug!(order_id = %order.id(), warning = %warning, "Risk warning");
                    }
                    risk = Some(verdict);

                    if let Err(e) = self.settle(&order, &plan).await {
                        tracing::warn!(
                            order_id = %order.id(),
                            error = %e,
                            "Settlement failed, order left working"
                        );
                        plan = plan.into_failed(format!("Settlement failed: {e}"));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %order.id(),
                        error = %e,
                        "Settlement lookup failed, order left working"
                    );
                    plan = plan.into_failed(format!("Settlement failed: {e}"));
                }
            }
        }

        let changes_order = plan.reaches_stop()
            || !matches!(
                plan.outcome(),
                PlannedOutcome::Queued(_) | PlannedOutcome::Failed(_)
            );
        let result = self.simulator.apply(&mut order, plan);
        if changes_order {
            self.persist(&mut order).await?;
        }

        tracing::debug!(
            order_id = %order.id(),
            status = %result.status,
            quantity = %result.quantity,
            "Execution attempt complete"
        );

        Ok(ProcessOrderOutcome {
            order,
            result,
            risk,
            activated,
        })
    }

    /// Trade the ledger already booked for this plan's fill. An earlier
    /// attempt may have settled and then failed to save the order.
    async fn booked_fill(
        &self,
        order: &Order,
        plan: &FillPlan,
    ) -> Result<Option<TradeConfirmation>, SettlementError> {
        match plan.execution_id() {
            Some(execution_id) => {
                self.settlement
                    .find_confirmation(order.portfolio_id(), execution_id)
                    .await
            }
            None => Ok(None),
        }
    }

    async fn settle(&self, order: &Order, plan: &FillPlan) -> Result<(), SettlementError> {
        let (
            Some((quantity, price)),
            Some(execution_id),
            Some(commission),
        ) = (plan.fill(), plan.execution_id(), plan.commission())
        else {
            return Ok(());
        };
        let request = TradeRequest {
            execution_id: execution_id.clone(),
            order_id: order.id().clone(),
            portfolio_id: order.portfolio_id().clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            quantity,
            price,
            commission,
        };
        self.settlement.execute_trade(&request).await?;
        Ok(())
    }

    async fn persist(&self, order: &mut Order) -> Result<(), ProcessOrderError> {
        self.orders.save(order).await?;
        publish_order_events(self.notifications.as_ref(), order);
        Ok(())
    }
}
