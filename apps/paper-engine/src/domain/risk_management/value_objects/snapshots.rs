//! Read-only views of portfolio and stock state handed to the risk gate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::{Order, OrderSide};
use crate::domain::shared::{Money, PortfolioId, Quantity, Symbol, Timestamp};

/// The order being validated, reduced to what the checks need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedOrder {
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Shares.
    pub quantity: Quantity,
    /// Expected execution price.
    pub price: Money,
}

impl ProposedOrder {
    /// Create a proposed order.
    #[must_use]
    pub const fn new(symbol: Symbol, side: OrderSide, quantity: Quantity, price: Money) -> Self {
        Self {
            symbol,
            side,
            quantity,
            price,
        }
    }

    /// Propose `quantity` shares of an existing order at `price`.
    #[must_use]
    pub fn from_order(order: &Order, quantity: Quantity, price: Money) -> Self {
        Self::new(order.symbol().clone(), order.side(), quantity, price)
    }

    /// Order value at the proposed price.
    #[must_use]
    pub fn value(&self) -> Money {
        self.quantity.notional(self.price)
    }

    /// Signed share change this order applies to the position.
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity.amount() * self.side.sign()
    }
}

/// An open position. Negative `shares` is a short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Symbol.
    pub symbol: Symbol,
    /// Signed share count.
    pub shares: Decimal,
    /// Average cost per share.
    pub average_cost: Money,
}

/// An executed fill used for day-trade counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Shares executed.
    pub quantity: Quantity,
    /// Execution time.
    pub executed_at: Timestamp,
}

impl ExecutionRecord {
    /// Signed share change.
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity.amount() * self.side.sign()
    }
}

/// Portfolio state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Portfolio.
    pub portfolio_id: PortfolioId,
    /// Cash balance.
    pub cash: Money,
    /// Cash plus market value of positions.
    pub total_value: Money,
    /// Account equity used for pattern day trader rules.
    pub equity: Money,
    /// Profit or loss since the session opened.
    pub daily_pnl: Money,
    /// Open positions.
    #[serde(default)]
    pub positions: Vec<PositionSnapshot>,
    /// Recent fills in any order.
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
    /// When the snapshot was taken.
    pub as_of: Timestamp,
}

impl PortfolioSnapshot {
    /// Empty portfolio holding only cash.
    #[must_use]
    pub fn with_cash(portfolio_id: PortfolioId, cash: Money) -> Self {
        Self {
            portfolio_id,
            cash,
            total_value: cash,
            equity: cash,
            daily_pnl: Money::ZERO,
            positions: Vec::new(),
            executions: Vec::new(),
            as_of: Timestamp::now(),
        }
    }

    /// Position in `symbol`, if any.
    #[must_use]
    pub fn position(&self, symbol: &Symbol) -> Option<&PositionSnapshot> {
        self.positions.iter().find(|p| &p.symbol == symbol)
    }

    /// Signed shares held in `symbol`.
    #[must_use]
    pub fn shares_in(&self, symbol: &Symbol) -> Decimal {
        self.position(symbol).map_or(Decimal::ZERO, |p| p.shares)
    }
}

/// Price and return statistics for the traded stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Symbol.
    pub symbol: Symbol,
    /// Last price.
    pub price: Money,
    /// Expected return over the sizing horizon, as a fraction.
    #[serde(default)]
    pub expected_return: Option<Decimal>,
    /// Return volatility over the same horizon, as a fraction.
    #[serde(default)]
    pub volatility: Option<Decimal>,
}

impl StockSnapshot {
    /// Stock with a price and no statistics.
    #[must_use]
    pub const fn priced(symbol: Symbol, price: Money) -> Self {
        Self {
            symbol,
            price,
            expected_return: None,
            volatility: None,
        }
    }

    /// Attach return statistics.
    #[must_use]
    pub const fn with_statistics(mut self, expected_return: Decimal, volatility: Decimal) -> Self {
        self.expected_return = Some(expected_return);
        self.volatility = Some(volatility);
        self
    }
}
