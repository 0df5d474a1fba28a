//! Trade Settlement Port (Driven Port)
//!
//! Cash and position bookkeeping for simulated fills. Settlement must be
//! idempotent per execution id: settling the same request twice returns the
//! original confirmation without booking the trade again.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::OrderSide;
use crate::domain::shared::{ExecutionId, Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp};

/// A fill to book against a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Idempotency key.
    pub execution_id: ExecutionId,
    /// Order the fill belongs to.
    pub order_id: OrderId,
    /// Portfolio to book against.
    pub portfolio_id: PortfolioId,
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Shares.
    pub quantity: Quantity,
    /// Execution price.
    pub price: Money,
    /// Commission charged.
    pub commission: Money,
}

impl TradeRequest {
    /// Cash leaving the portfolio for a buy, or entering it for a sell,
    /// commission included. Positive is a debit.
    #[must_use]
    pub fn cash_debit(&self) -> Money {
        let notional = self.quantity.notional(self.price);
        match self.side {
            OrderSide::Buy => notional + self.commission,
            OrderSide::Sell => -notional + self.commission,
        }
    }
}

/// Booked trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeConfirmation {
    /// Idempotency key of the request.
    pub execution_id: ExecutionId,
    /// Portfolio.
    pub portfolio_id: PortfolioId,
    /// Shares booked.
    pub quantity: Quantity,
    /// Price booked.
    pub price: Money,
    /// Commission booked.
    pub commission: Money,
    /// Cash after the trade.
    pub cash_after: Money,
    /// Signed shares held after the trade.
    pub position_after: Decimal,
    /// When the trade was booked.
    pub settled_at: Timestamp,
}

/// Settlement error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    /// Unknown portfolio.
    #[error("Portfolio not found: {portfolio_id}")]
    PortfolioNotFound {
        /// The unknown portfolio.
        portfolio_id: String,
    },

    /// The request is malformed.
    #[error("Trade rejected: {reason}")]
    Rejected {
        /// Why.
        reason: String,
    },

    /// The ledger could not answer.
    #[error("Settlement unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for booking fills.
#[async_trait]
pub trait TradeSettlementPort: Send + Sync {
    /// Book `request`.
    ///
    /// # Errors
    ///
    /// Returns error if the portfolio is unknown, the request is malformed, or
    /// the ledger fails. No state changes on error.
    async fn execute_trade(
        &self,
        request: &TradeRequest,
    ) -> Result<TradeConfirmation, SettlementError>;

    /// Confirmation of a trade already booked under `execution_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the ledger cannot be queried.
    async fn find_confirmation(
        &self,
        portfolio_id: &PortfolioId,
        execution_id: &ExecutionId,
    ) -> Result<Option<TradeConfirmation>, SettlementError>;
}
