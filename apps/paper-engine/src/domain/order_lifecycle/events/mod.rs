//! Domain events for the order lifecycle.
//!
//! The aggregate records one event per transition; the application layer
//! drains them after saving and forwards them to the notification sink.

use serde::{Deserialize, Serialize};

use super::value_objects::{ActivationCause, CancelReason};
use crate::domain::shared::{Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp};

/// All possible order events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Order entered TRIGGERED.
    Triggered(OrderTriggered),
    /// Fill that left quantity outstanding.
    PartiallyFilled(OrderPartiallyFilled),
    /// Final fill.
    Executed(OrderExecuted),
    /// Order cancelled.
    Cancelled(OrderCancelled),
    /// Order expired.
    Expired(OrderExpired),
}

impl OrderEvent {
    /// Get the order ID for this event.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        match self {
            Self::Triggered(e) => &e.order_id,
            Self::PartiallyFilled(e) => &e.order_id,
            Self::Executed(e) => &e.order_id,
            Self::Cancelled(e) => &e.order_id,
            Self::Expired(e) => &e.order_id,
        }
    }

    /// Get the event type name used on the notification sink.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Triggered(_) => "order_triggered",
            Self::PartiallyFilled(_) => "order_partially_filled",
            Self::Executed(_) => "order_executed",
            Self::Cancelled(_) => "order_cancelled",
            Self::Expired(_) => "order_expired",
        }
    }
}

/// Event: order activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTriggered {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// What activated it.
    pub cause: ActivationCause,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: order partially filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPartiallyFilled {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// Symbol.
    pub symbol: Symbol,
    /// Shares in this fill.
    pub fill_quantity: Quantity,
    /// Price of this fill.
    pub fill_price: Money,
    /// Shares still outstanding.
    pub remaining_quantity: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: order fully executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecuted {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// Symbol.
    pub symbol: Symbol,
    /// Total shares executed.
    pub executed_quantity: Quantity,
    /// Quantity-weighted average price.
    pub avg_execution_price: Money,
    /// Total commission.
    pub commission: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: order cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// Reason for cancellation.
    pub reason: CancelReason,
    /// Shares filled before cancellation.
    pub executed_quantity: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Event: order expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    /// Order ID.
    pub order_id: OrderId,
    /// Owning portfolio.
    pub portfolio_id: PortfolioId,
    /// The expiry date that passed.
    pub expiry_date: Option<Timestamp>,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_and_order_id() {
        let event = OrderEvent::Expired(OrderExpired {
            order_id: OrderId::new("ord-1"),
            portfolio_id: PortfolioId::new("pf-1"),
            expiry_date: None,
            occurred_at: Timestamp::now(),
        });
        assert_eq!(event.event_type(), "order_expired");
        assert_eq!(event.order_id().as_str(), "ord-1");
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = OrderEvent::Cancelled(OrderCancelled {
            order_id: OrderId::new("ord-2"),
            portfolio_id: PortfolioId::new("pf-1"),
            reason: CancelReason::market_close(),
            executed_quantity: Quantity::ZERO,
            occurred_at: Timestamp::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CANCELLED");
        assert_eq!(json["reason"]["code"], "MARKET_CLOSE");
    }
}
