//! Order Aggregate Root
//!
//! The Order aggregate owns the paper order lifecycle: creation in PENDING,
//! activation into TRIGGERED, fills, and the three terminal states.
//!
//! The requested `quantity` is never mutated. Fills accumulate into
//! `executed_quantity` and the outstanding amount is derived from both.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::conditional_triggers::ConditionalTrigger;
use crate::domain::order_lifecycle::errors::OrderError;
use crate::domain::order_lifecycle::events::{
    OrderCancelled, OrderEvent, OrderExecuted, OrderExpired, OrderPartiallyFilled, OrderTriggered,
};
use crate::domain::order_lifecycle::services::OrderStateMachine;
use crate::domain::order_lifecycle::value_objects::{
    Activation, ActivationCause, CancelReason, ExecutionReport, OrderSide, OrderStatus, OrderType,
    TimeInForce,
};
use crate::domain::shared::{Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp};

/// Tolerance used when checking the stored average price against the reports.
const AVG_PRICE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// One entry of the order's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Previous status; `None` for the creation entry.
    pub from: Option<OrderStatus>,
    /// New status.
    pub to: OrderStatus,
    /// When the change happened.
    pub at: Timestamp,
    /// Human-readable reason.
    pub reason: String,
}

/// Parameters for reconstituting an Order from storage.
///
/// No domain events are generated during reconstitution.
#[derive(Debug, Clone)]
pub struct ReconstitutedOrderParams {
    /// Order identifier.
    pub id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Limit price.
    pub limit_price: Option<Money>,
    /// Stop price.
    pub stop_price: Option<Money>,
    /// Reference trigger price.
    pub trigger_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Expiry date.
    pub expiry_date: Option<Timestamp>,
    /// Conditional triggers.
    pub triggers: Vec<ConditionalTrigger>,
    /// Current status.
    pub status: OrderStatus,
    /// Shares executed so far.
    pub executed_quantity: Quantity,
    /// Price of the most recent fill.
    pub executed_price: Option<Money>,
    /// Quantity-weighted average fill price.
    pub avg_execution_price: Option<Money>,
    /// Total commission charged.
    pub commission: Money,
    /// Fills received.
    pub execution_reports: Vec<ExecutionReport>,
    /// When the order entered TRIGGERED.
    pub triggered_at: Option<Timestamp>,
    /// When the stop price was reached.
    pub stop_reached_at: Option<Timestamp>,
    /// When the order was fully executed.
    pub executed_at: Option<Timestamp>,
    /// When the order was cancelled or expired.
    pub cancelled_at: Option<Timestamp>,
    /// Reason for cancellation or expiry.
    pub cancellation_reason: Option<CancelReason>,
    /// Parent of a bracket or child order.
    pub parent_order_id: Option<OrderId>,
    /// Audit trail.
    pub status_history: Vec<StatusChange>,
    /// When the order was logically archived.
    pub archived_at: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity to trade.
    pub quantity: Quantity,
    /// Limit price (required for Limit/StopLimit).
    pub limit_price: Option<Money>,
    /// Stop price (required for Stop/StopLimit).
    pub stop_price: Option<Money>,
    /// Reference price recorded with conditional orders.
    pub trigger_price: Option<Money>,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Optional expiry.
    pub expiry_date: Option<Timestamp>,
    /// Conditional triggers; an order with triggers stays dormant until they pass.
    pub triggers: Vec<ConditionalTrigger>,
    /// Parent order for bracket legs.
    pub parent_order_id: Option<OrderId>,
}

impl CreateOrderCommand {
    /// Create a DAY command with no prices or triggers.
    #[must_use]
    pub fn new(
        portfolio_id: PortfolioId,
        symbol: Symbol,
        side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
    ) -> Self {
        Self {
            portfolio_id,
            symbol,
            side,
            order_type,
            quantity,
            limit_price: None,
            stop_price: None,
            trigger_price: None,
            time_in_force: TimeInForce::Day,
            expiry_date: None,
            triggers: Vec::new(),
            parent_order_id: None,
        }
    }

    /// Set the limit price.
    #[must_use]
    pub const fn with_limit_price(mut self, price: Money) -> Self {
        self.limit_price = Some(price);
        self
    }

    /// Set the stop price.
    #[must_use]
    pub const fn with_stop_price(mut self, price: Money) -> Self {
        self.stop_price = Some(price);
        self
    }

    /// Set the reference trigger price.
    #[must_use]
    pub const fn with_trigger_price(mut self, price: Money) -> Self {
        self.trigger_price = Some(price);
        self
    }

    /// Set the time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set the expiry date.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: Timestamp) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    /// Attach conditional triggers.
    #[must_use]
    pub fn with_triggers(mut self, triggers: Vec<ConditionalTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Link to a parent order.
    #[must_use]
    pub fn with_parent(mut self, parent: OrderId) -> Self {
        self.parent_order_id = Some(parent);
        self
    }

    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if required parameters are missing or invalid.
    pub fn validate(&self) -> Result<(), OrderError> {
        self.symbol.validate()?;
        self.quantity.validate_for_order()?;

        if self.order_type.requires_limit_price() && self.limit_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "limit_price".to_string(),
                message: format!("Limit price required for {} orders", self.order_type),
            });
        }

        if self.order_type.requires_stop_price() && self.stop_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "stop_price".to_string(),
                message: format!("Stop price required for {} orders", self.order_type),
            });
        }

        if let Some(price) = &self.limit_price {
            price.validate_as_price("limit_price")?;
        }
        if let Some(price) = &self.stop_price {
            price.validate_as_price("stop_price")?;
        }
        if let Some(price) = &self.trigger_price {
            price.validate_as_price("trigger_price")?;
        }

        Ok(())
    }
}

/// Order Aggregate Root.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    portfolio_id: PortfolioId,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Quantity,
    limit_price: Option<Money>,
    stop_price: Option<Money>,
    trigger_price: Option<Money>,
    time_in_force: TimeInForce,
    expiry_date: Option<Timestamp>,
    triggers: Vec<ConditionalTrigger>,
    status: OrderStatus,
    executed_quantity: Quantity,
    executed_price: Option<Money>,
    avg_execution_price: Option<Money>,
    commission: Money,
    execution_reports: Vec<ExecutionReport>,
    triggered_at: Option<Timestamp>,
    stop_reached_at: Option<Timestamp>,
    executed_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
    cancellation_reason: Option<CancelReason>,
    parent_order_id: Option<OrderId>,
    status_history: Vec<StatusChange>,
    archived_at: Option<Timestamp>,
    #[serde(skip)]
    events: Vec<OrderEvent>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Create a new PENDING order from a command.
    ///
    /// # Errors
    ///
    /// Returns error if command validation fails.
    pub fn new(cmd: CreateOrderCommand) -> Result<Self, OrderError> {
        cmd.validate()?;

        let now = Timestamp::now();

        Ok(Self {
            id: OrderId::generate(),
            portfolio_id: cmd.portfolio_id,
            symbol: cmd.symbol,
            side: cmd.side,
            order_type: cmd.order_type,
            quantity: cmd.quantity,
            limit_price: cmd.limit_price,
            stop_price: cmd.stop_price,
            trigger_price: cmd.trigger_price,
            time_in_force: cmd.time_in_force,
            expiry_date: cmd.expiry_date,
            triggers: cmd.triggers,
            status: OrderStatus::Pending,
            executed_quantity: Quantity::ZERO,
            executed_price: None,
            avg_execution_price: None,
            commission: Money::ZERO,
            execution_reports: Vec::new(),
            triggered_at: None,
            stop_reached_at: None,
            executed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            parent_order_id: cmd.parent_order_id,
            status_history: vec![StatusChange {
                from: None,
                to: OrderStatus::Pending,
                at: now,
                reason: "Order created".to_string(),
            }],
            archived_at: None,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute an order from stored state (no events generated).
    #[must_use]
    pub fn reconstitute(params: ReconstitutedOrderParams) -> Self {
        Self {
            id: params.id,
            portfolio_id: params.portfolio_id,
            symbol: params.symbol,
            side: params.side,
            order_type: params.order_type,
            quantity: params.quantity,
            limit_price: params.limit_price,
            stop_price: params.stop_price,
            trigger_price: params.trigger_price,
            time_in_force: params.time_in_force,
            expiry_date: params.expiry_date,
            triggers: params.triggers,
            status: params.status,
            executed_quantity: params.executed_quantity,
            executed_price: params.executed_price,
            avg_execution_price: params.avg_execution_price,
            commission: params.commission,
            execution_reports: params.execution_reports,
            triggered_at: params.triggered_at,
            stop_reached_at: params.stop_reached_at,
            executed_at: params.executed_at,
            cancelled_at: params.cancelled_at,
            cancellation_reason: params.cancellation_reason,
            parent_order_id: params.parent_order_id,
            status_history: params.status_history,
            archived_at: params.archived_at,
            events: Vec::new(),
            created_at: params.created_at,
            updated_at: params.updated_at,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the order ID.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Get the owning portfolio.
    #[must_use]
    pub const fn portfolio_id(&self) -> &PortfolioId {
        &self.portfolio_id
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Originally requested quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Get the limit price.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Money> {
        self.limit_price
    }

    /// Get the stop price.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Money> {
        self.stop_price
    }

    /// Get the reference trigger price.
    #[must_use]
    pub const fn trigger_price(&self) -> Option<Money> {
        self.trigger_price
    }

    /// Get the time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Get the expiry date.
    #[must_use]
    pub const fn expiry_date(&self) -> Option<Timestamp> {
        self.expiry_date
    }

    /// Get the conditional triggers.
    #[must_use]
    pub fn triggers(&self) -> &[ConditionalTrigger] {
        &self.triggers
    }

    /// Returns true if the order waits on conditional triggers.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        !self.triggers.is_empty()
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Shares executed so far.
    #[must_use]
    pub const fn executed_quantity(&self) -> Quantity {
        self.executed_quantity
    }

    /// Shares still outstanding.
    #[must_use]
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.executed_quantity
    }

    /// Price of the most recent fill.
    #[must_use]
    pub const fn executed_price(&self) -> Option<Money> {
        self.executed_price
    }

    /// Quantity-weighted average fill price.
    #[must_use]
    pub const fn avg_execution_price(&self) -> Option<Money> {
        self.avg_execution_price
    }

    /// Total commission charged.
    #[must_use]
    pub const fn commission(&self) -> Money {
        self.commission
    }

    /// Number of fills received.
    #[must_use]
    pub fn fill_count(&self) -> usize {
        self.execution_reports.len()
    }

    /// Fills received, oldest first.
    #[must_use]
    pub fn execution_reports(&self) -> &[ExecutionReport] {
        &self.execution_reports
    }

    /// When the order entered TRIGGERED.
    #[must_use]
    pub const fn triggered_at(&self) -> Option<Timestamp> {
        self.triggered_at
    }

    /// Returns true once the stop price has been reached.
    #[must_use]
    pub const fn stop_reached(&self) -> bool {
        self.stop_reached_at.is_some()
    }

    /// When the order was fully executed.
    #[must_use]
    pub const fn executed_at(&self) -> Option<Timestamp> {
        self.executed_at
    }

    /// When the order was cancelled or expired.
    #[must_use]
    pub const fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    /// Message of the cancellation or expiry reason.
    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_ref().map(|r| r.message.as_str())
    }

    /// Parent order, for bracket legs.
    #[must_use]
    pub const fn parent_order_id(&self) -> Option<&OrderId> {
        self.parent_order_id.as_ref()
    }

    /// Audit trail of status changes.
    #[must_use]
    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    /// When the order was logically archived.
    #[must_use]
    pub const fn archived_at(&self) -> Option<Timestamp> {
        self.archived_at
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Timestamp of the terminal transition, if any.
    #[must_use]
    pub fn terminal_at(&self) -> Option<Timestamp> {
        self.executed_at.or(self.cancelled_at)
    }

    /// Returns true if the expiry date lies strictly before `as_of`.
    #[must_use]
    pub fn is_expired_at(&self, as_of: Timestamp) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < as_of)
    }

    /// Returns true if the order can be filled right now as far as its own
    /// lifecycle is concerned (triggers passed, stop reached).
    #[must_use]
    pub fn is_armed(&self) -> bool {
        if !self.status.is_working() {
            return false;
        }
        if self.is_conditional() && self.status == OrderStatus::Pending {
            return false;
        }
        !self.order_type.requires_stop_price() || self.stop_reached()
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Activate the order with a token from the trigger evaluator or the stop check.
    ///
    /// A conditional order must be activated by its triggers before a stop
    /// activation is accepted; that second activation records the stop without
    /// changing status.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not working or the activation does not
    /// match the order's kind.
    pub fn activate(&mut self, activation: Activation) -> Result<(), OrderError> {
        match activation.cause() {
            ActivationCause::ConditionalTrigger => {
                if !self.is_conditional() {
                    return Err(self.transition_error(
                        OrderStatus::Triggered,
                        "Order has no conditional triggers",
                    ));
                }
                if self.status != OrderStatus::Pending {
                    return Err(self.transition_error(
                        OrderStatus::Triggered,
                        "Conditional orders can only be triggered from PENDING",
                    ));
                }
            }
            ActivationCause::StopPrice { .. } => {
                if !self.order_type.requires_stop_price() {
                    return Err(self.transition_error(
                        OrderStatus::Triggered,
                        "Order has no stop price",
                    ));
                }
                if self.stop_reached() {
                    return Err(
                        self.transition_error(OrderStatus::Triggered, "Stop already reached")
                    );
                }
                if self.is_conditional() && self.status == OrderStatus::Pending {
                    return Err(self.transition_error(
                        OrderStatus::Triggered,
                        "Conditional triggers must pass before the stop is armed",
                    ));
                }
                if !self.status.is_working() {
                    return Err(self.transition_error(
                        OrderStatus::Triggered,
                        "Order is no longer working",
                    ));
                }
                self.stop_reached_at = Some(activation.at());
                if self.status == OrderStatus::Triggered {
                    self.updated_at = activation.at();
                    return Ok(());
                }
            }
        }

        self.transition(OrderStatus::Triggered, activation.describe(), activation.at())?;
        self.triggered_at = Some(activation.at());
        self.events.push(OrderEvent::Triggered(OrderTriggered {
            order_id: self.id.clone(),
            portfolio_id: self.portfolio_id.clone(),
            cause: activation.cause(),
            occurred_at: activation.at(),
        }));
        Ok(())
    }

    /// Apply a simulated fill.
    ///
    /// Only the execution simulator calls this, so every fill has passed the
    /// pricing, liquidity and commission models.
    pub(crate) fn apply_fill(&mut self, report: ExecutionReport) -> Result<(), OrderError> {
        if !self.status.is_working() {
            return Err(self.transition_error(OrderStatus::Executed, "Order is not working"));
        }
        if !self.is_armed() {
            return Err(self.transition_error(
                OrderStatus::Executed,
                "Order has not been activated by its trigger or stop",
            ));
        }

        let remaining = self.remaining_quantity();
        if !report.quantity.is_positive() || report.quantity > remaining {
            return Err(OrderError::FillExceedsRemaining {
                fill_qty: report.quantity.to_string(),
                remaining_qty: remaining.to_string(),
            });
        }

        let at = report.timestamp;
        let fill_quantity = report.quantity;
        let fill_price = report.price;

        let target = if fill_quantity >= remaining {
            OrderStatus::Executed
        } else {
            OrderStatus::Triggered
        };
        OrderStateMachine::validate_transition(self.status, target)?;

        self.execution_reports.push(report);
        self.executed_quantity += fill_quantity;
        self.executed_price = Some(fill_price);
        self.avg_execution_price = Self::weighted_average(&self.execution_reports);
        self.commission = self.execution_reports.iter().map(|r| r.commission).sum();

        if target == OrderStatus::Executed {
            self.transition(target, "Order fully executed".to_string(), at)?;
            self.executed_at = Some(at);
            self.events.push(OrderEvent::Executed(OrderExecuted {
                order_id: self.id.clone(),
                portfolio_id: self.portfolio_id.clone(),
                symbol: self.symbol.clone(),
                executed_quantity: self.executed_quantity,
                avg_execution_price: self.avg_execution_price.unwrap_or(fill_price),
                commission: self.commission,
                occurred_at: at,
            }));
        } else {
            let reason = format!("Partial fill of {fill_quantity} at {fill_price}");
            self.transition(target, reason, at)?;
            if self.triggered_at.is_none() {
                self.triggered_at = Some(at);
            }
            self.events
                .push(OrderEvent::PartiallyFilled(OrderPartiallyFilled {
                    order_id: self.id.clone(),
                    portfolio_id: self.portfolio_id.clone(),
                    symbol: self.symbol.clone(),
                    fill_quantity,
                    fill_price,
                    remaining_quantity: self.remaining_quantity(),
                    occurred_at: at,
                }));
        }

        Ok(())
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn cancel(&mut self, reason: CancelReason) -> Result<(), OrderError> {
        let now = Timestamp::now();
        self.transition(OrderStatus::Cancelled, reason.message.clone(), now)?;
        self.cancelled_at = Some(now);
        self.events.push(OrderEvent::Cancelled(OrderCancelled {
            order_id: self.id.clone(),
            portfolio_id: self.portfolio_id.clone(),
            reason: reason.clone(),
            executed_quantity: self.executed_quantity,
            occurred_at: now,
        }));
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    /// Mark the order as expired.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn expire(&mut self) -> Result<(), OrderError> {
        let now = Timestamp::now();
        let reason = CancelReason::expired();
        self.transition(OrderStatus::Expired, reason.message.clone(), now)?;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        self.events.push(OrderEvent::Expired(OrderExpired {
            order_id: self.id.clone(),
            portfolio_id: self.portfolio_id.clone(),
            expiry_date: self.expiry_date,
            occurred_at: now,
        }));
        Ok(())
    }

    /// Flag a terminal order as archived. The record itself is kept.
    ///
    /// # Errors
    ///
    /// Returns error if the order is still working.
    pub fn mark_archived(&mut self) -> Result<(), OrderError> {
        if !self.status.is_terminal() {
            return Err(OrderError::InvalidParameters {
                field: "status".to_string(),
                message: format!("Cannot archive a {} order", self.status),
            });
        }
        let now = Timestamp::now();
        self.archived_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Describe every execution-state invariant this order currently violates.
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.executed_quantity > self.quantity {
            issues.push(format!(
                "executed quantity {} exceeds quantity {}",
                self.executed_quantity, self.quantity
            ));
        }

        let reported: Quantity = self.execution_reports.iter().map(|r| r.quantity).sum();
        if reported != self.executed_quantity {
            issues.push(format!(
                "executed quantity {} differs from reported fills {reported}",
                self.executed_quantity
            ));
        }

        let expected_avg = Self::weighted_average(&self.execution_reports);
        let avg_consistent = match (self.avg_execution_price, expected_avg) {
            (Some(stored), Some(expected)) => {
                (stored.amount() - expected.amount()).abs() <= AVG_PRICE_TOLERANCE
            }
            (None, None) => true,
            _ => false,
        };
        if !avg_consistent {
            issues.push("average execution price inconsistent with fills".to_string());
        }

        if self.status.is_working() && self.remaining_quantity() <= Quantity::ZERO {
            issues.push(format!("fully filled order still {}", self.status));
        }
        if self.status == OrderStatus::Executed && self.remaining_quantity() > Quantity::ZERO {
            issues.push("executed order has quantity outstanding".to_string());
        }

        issues
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Drain accumulated domain events.
    pub fn drain_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get pending events without draining.
    #[must_use]
    pub fn pending_events(&self) -> &[OrderEvent] {
        &self.events
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    fn transition(
        &mut self,
        to: OrderStatus,
        reason: String,
        at: Timestamp,
    ) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, to)?;
        self.status_history.push(StatusChange {
            from: Some(self.status),
            to,
            at,
            reason,
        });
        self.status = to;
        self.updated_at = at;
        Ok(())
    }

    fn transition_error(&self, to: OrderStatus, reason: &str) -> OrderError {
        OrderError::InvalidStateTransition {
            from: self.status,
            to,
            reason: reason.to_string(),
        }
    }

    fn weighted_average(reports: &[ExecutionReport]) -> Option<Money> {
        let total_quantity: Decimal = reports.iter().map(|r| r.quantity.amount()).sum();
        if total_quantity.is_zero() {
            return None;
        }
        let total_value: Decimal = reports
            .iter()
            .map(|r| r.quantity.amount() * r.price.amount())
            .sum();
        Some(Money::new(total_value / total_quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conditional_triggers::TriggerCondition;
    use rust_decimal_macros::dec;

    fn make_command(order_type: OrderType) -> CreateOrderCommand {
        let cmd = CreateOrderCommand::new(
            PortfolioId::new("pf-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            order_type,
            Quantity::from_i64(100),
        );
        match order_type {
            OrderType::Market => cmd,
            OrderType::Limit => cmd.with_limit_price(Money::new(dec!(150))),
            OrderType::Stop => cmd.with_stop_price(Money::new(dec!(155))),
            OrderType::StopLimit => cmd
                .with_stop_price(Money::new(dec!(155)))
                .with_limit_price(Money::new(dec!(156))),
        }
    }

    fn make_fill(qty: i64, price: Decimal) -> ExecutionReport {
        ExecutionReport::paper(Quantity::from_i64(qty), Money::new(price), Money::new(dec!(1)))
    }

    #[test]
    fn new_order_is_pending_with_creation_history() {
        let order = Order::new(make_command(OrderType::Market)).unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.remaining_quantity(), Quantity::from_i64(100));
        assert_eq!(order.status_history().len(), 1);
        assert_eq!(order.status_history()[0].from, None);
        assert!(order.pending_events().is_empty());
    }

    #[test]
    fn trigger_price_and_parent_are_carried_and_validated() {
        let parent = OrderId::new("ord-parent");
        let cmd = make_command(OrderType::Market)
            .with_trigger_price(Money::new(dec!(148)))
            .with_parent(parent.clone());
        let order = Order::new(cmd).unwrap();
        assert_eq!(order.trigger_price(), Some(Money::new(dec!(148))));
        assert_eq!(order.parent_order_id(), Some(&parent));

        let bad = make_command(OrderType::Market).with_trigger_price(Money::ZERO);
        assert!(Order::new(bad).is_err());
    }

    #[test]
    fn validation_requires_prices_per_type() {
        let mut cmd = make_command(OrderType::Limit);
        cmd.limit_price = None;
        assert!(Order::new(cmd).is_err());

        let mut cmd = make_command(OrderType::StopLimit);
        cmd.stop_price = None;
        assert!(Order::new(cmd).is_err());

        let cmd = make_command(OrderType::Limit).with_limit_price(Money::ZERO);
        assert!(Order::new(cmd).is_err());
    }

    #[test]
    fn validation_rejects_zero_quantity() {
        let mut cmd = make_command(OrderType::Market);
        cmd.quantity = Quantity::ZERO;
        let err = Order::new(cmd).unwrap_err();
        assert!(matches!(err, OrderError::InvalidParameters { ref field, .. } if field == "quantity"));
    }

    #[test]
    fn full_fill_from_pending_executes() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.apply_fill(make_fill(100, dec!(150.075))).unwrap();

        assert_eq!(order.status(), OrderStatus::Executed);
        assert_eq!(order.executed_quantity(), Quantity::from_i64(100));
        assert_eq!(order.quantity(), Quantity::from_i64(100));
        assert_eq!(order.fill_count(), 1);
        assert!(order.executed_at().is_some());
        assert!(matches!(order.pending_events()[0], OrderEvent::Executed(_)));
    }

    #[test]
    fn partial_fill_moves_to_triggered_without_touching_quantity() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.apply_fill(make_fill(60, dec!(100))).unwrap();

        assert_eq!(order.status(), OrderStatus::Triggered);
        assert_eq!(order.quantity(), Quantity::from_i64(100));
        assert_eq!(order.remaining_quantity(), Quantity::from_i64(40));
        assert!(order.triggered_at().is_some());

        order.apply_fill(make_fill(40, dec!(110))).unwrap();
        assert_eq!(order.status(), OrderStatus::Executed);
        assert_eq!(order.avg_execution_price(), Some(Money::new(dec!(104))));
        assert_eq!(order.commission(), Money::new(dec!(2)));
        assert_eq!(order.executed_price(), Some(Money::new(dec!(110))));
    }

    #[test]
    fn overfill_is_rejected_and_state_unchanged() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        let err = order.apply_fill(make_fill(101, dec!(100))).unwrap_err();
        assert!(matches!(err, OrderError::FillExceedsRemaining { .. }));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.fill_count(), 0);
    }

    #[test]
    fn conditional_order_cannot_fill_before_activation() {
        let cmd = make_command(OrderType::Market).with_triggers(vec![ConditionalTrigger::price(
            TriggerCondition::GreaterThan,
            dec!(100),
        )]);
        let mut order = Order::new(cmd).unwrap();
        assert!(!order.is_armed());
        assert!(order.apply_fill(make_fill(10, dec!(100))).is_err());

        order.activate(Activation::conditional()).unwrap();
        assert_eq!(order.status(), OrderStatus::Triggered);
        assert!(order.is_armed());
        order.apply_fill(make_fill(100, dec!(101))).unwrap();
        assert_eq!(order.status(), OrderStatus::Executed);
    }

    #[test]
    fn stop_activation_rules() {
        let mut market = Order::new(make_command(OrderType::Market)).unwrap();
        let token = Activation::stop_reached(Money::new(dec!(1)), Money::new(dec!(1)));
        assert!(market.activate(token).is_err());
        assert!(market.activate(Activation::conditional()).is_err());

        let mut stop = Order::new(make_command(OrderType::Stop)).unwrap();
        assert!(!stop.is_armed());
        let token = Activation::stop_reached(Money::new(dec!(155)), Money::new(dec!(155.5)));
        stop.activate(token).unwrap();
        assert_eq!(stop.status(), OrderStatus::Triggered);
        assert!(stop.stop_reached());
        assert!(stop.activate(token).is_err());
    }

    #[test]
    fn conditional_stop_needs_triggers_first() {
        let cmd = make_command(OrderType::Stop).with_triggers(vec![ConditionalTrigger::volume(
            TriggerCondition::GreaterThan,
            dec!(1000),
        )]);
        let mut order = Order::new(cmd).unwrap();
        let stop = Activation::stop_reached(Money::new(dec!(155)), Money::new(dec!(156)));
        assert!(order.activate(stop).is_err());

        order.activate(Activation::conditional()).unwrap();
        assert!(!order.is_armed());
        order.activate(stop).unwrap();
        assert_eq!(order.status(), OrderStatus::Triggered);
        assert!(order.is_armed());
        assert_eq!(order.status_history().len(), 2);
    }

    #[test]
    fn cancel_records_reason_and_timestamp() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.cancel(CancelReason::market_close()).unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            order.cancellation_reason(),
            Some("Day order cancelled at market close")
        );
        assert!(order.cancelled_at().is_some());
        assert_eq!(order.terminal_at(), order.cancelled_at());
        assert!(order.cancel(CancelReason::user_requested()).is_err());
    }

    #[test]
    fn expire_records_reason() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.expire().unwrap();
        assert_eq!(order.status(), OrderStatus::Expired);
        assert_eq!(order.cancellation_reason(), Some("Order expired"));
        assert!(matches!(order.pending_events()[0], OrderEvent::Expired(_)));
    }

    #[test]
    fn executed_order_never_returns() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.apply_fill(make_fill(100, dec!(10))).unwrap();
        assert!(order.expire().is_err());
        assert!(order.cancel(CancelReason::user_requested()).is_err());
        assert!(order.apply_fill(make_fill(1, dec!(10))).is_err());
    }

    #[test]
    fn is_expired_at_is_strict() {
        let expiry = Timestamp::parse("2026-01-19T21:00:00Z").unwrap();
        let order = Order::new(make_command(OrderType::Market).with_expiry(expiry)).unwrap();
        assert!(!order.is_expired_at(expiry));
        assert!(order.is_expired_at(Timestamp::parse("2026-01-19T21:00:01Z").unwrap()));
    }

    #[test]
    fn archive_requires_terminal_status() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        assert!(order.mark_archived().is_err());
        order.cancel(CancelReason::user_requested()).unwrap();
        order.mark_archived().unwrap();
        assert!(order.archived_at().is_some());
    }

    #[test]
    fn integrity_clean_after_fills() {
        let mut order = Order::new(make_command(OrderType::Market)).unwrap();
        order.apply_fill(make_fill(30, dec!(149))).unwrap();
        order.apply_fill(make_fill(50, dec!(150))).unwrap();
        assert!(order.integrity_issues().is_empty());
    }

    #[test]
    fn integrity_detects_reconstituted_corruption() {
        let order = Order::new(make_command(OrderType::Market)).unwrap();
        let corrupt = Order::reconstitute(ReconstitutedOrderParams {
            id: order.id().clone(),
            portfolio_id: order.portfolio_id().clone(),
            symbol: order.symbol().clone(),
            side: order.side(),
            order_type: order.order_type(),
            quantity: order.quantity(),
            limit_price: None,
            stop_price: None,
            trigger_price: None,
            time_in_force: order.time_in_force(),
            expiry_date: None,
            triggers: Vec::new(),
            status: OrderStatus::Pending,
            executed_quantity: Quantity::from_i64(120),
            executed_price: None,
            avg_execution_price: Some(Money::new(dec!(10))),
            commission: Money::ZERO,
            execution_reports: Vec::new(),
            triggered_at: None,
            stop_reached_at: None,
            executed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            parent_order_id: None,
            status_history: Vec::new(),
            archived_at: None,
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        });
        let issues = corrupt.integrity_issues();
        assert!(issues.iter().any(|i| i.contains("exceeds quantity")));
        assert!(issues.iter().any(|i| i.contains("reported fills")));
        assert!(issues.iter().any(|i| i.contains("average execution price")));
        assert!(issues.iter().any(|i| i.contains("still PENDING")));
    }

    #[test]
    fn serde_roundtrip_skips_events() {
        let mut order = Order::new(make_command(OrderType::Limit)).unwrap();
        order.cancel(CancelReason::user_requested()).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id(), order.id());
        assert_eq!(parsed.status(), OrderStatus::Cancelled);
        assert!(parsed.pending_events().is_empty());
    }
}
