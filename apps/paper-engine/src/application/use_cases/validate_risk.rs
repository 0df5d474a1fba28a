//! Validate Order Risk Use Case

use std::sync::Arc;

use crate::application::ports::{
    MarketDataError, MarketDataPort, PortfolioError, PortfolioRepository,
};
use crate::domain::market_data::Quote;
use crate::domain::order_lifecycle::Order;
use crate::domain::risk_management::{
    ProposedOrder, RiskGate, RiskLimits, RiskValidationResult, StockSnapshot,
};

/// Indicator name carrying the expected return used for Kelly sizing.
pub const EXPECTED_RETURN_INDICATOR: &str = "expected_return";
/// Indicator name carrying the return volatility used for Kelly sizing.
pub const VOLATILITY_INDICATOR: &str = "volatility";

/// Lookup failures at the risk validation entry point.
///
/// Rule failures are not errors; they are reported in the
/// [`RiskValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskError {
    /// The order references an unknown portfolio.
    #[error("Portfolio not found: {portfolio_id}")]
    PortfolioNotFound {
        /// The unknown portfolio.
        portfolio_id: String,
    },

    /// No quote exists for the order's symbol.
    #[error("Stock not found: {symbol}")]
    StockNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// Portfolio store failure.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Market data failure other than an unknown symbol.
    #[error(transparent)]
    MarketData(MarketDataError),
}

/// Build the stock view the risk gate consumes from a quote.
#[must_use]
pub fn stock_snapshot(quote: &Quote) -> StockSnapshot {
    let snapshot = StockSnapshot::priced(quote.symbol.clone(), quote.price);
    match (
        quote.indicators.get(EXPECTED_RETURN_INDICATOR),
        quote.indicators.get(VOLATILITY_INDICATOR),
    ) {
        (Some(expected_return), Some(volatility)) => {
            snapshot.with_statistics(*expected_return, *volatility)
        }
        _ => snapshot,
    }
}

/// Use case for validating an order against the risk gate.
pub struct ValidateOrderRiskUseCase<P, M>
where
    P: PortfolioRepository,
    M: MarketDataPort,
{
    portfolios: Arc<P>,
    market_data: Arc<M>,
    limits: RiskLimits,
    gate: RiskGate,
}

impl<P, M> ValidateOrderRiskUseCase<P, M>
where
    P: PortfolioRepository,
    M: MarketDataPort,
{
    /// Create a new `ValidateOrderRiskUseCase`.
    pub const fn new(portfolios: Arc<P>, market_data: Arc<M>, limits: RiskLimits) -> Self {
        Self {
            portfolios,
            market_data,
            limits,
            gate: RiskGate::new(),
        }
    }

    /// Validate the outstanding quantity of `order`.
    ///
    /// Limit orders are valued at their limit price, everything else at the
    /// last quote.
    ///
    /// # Errors
    ///
    /// Returns error if the portfolio or the stock cannot be found, or a
    /// store fails.
    pub async fn execute(&self, order: &Order) -> Result<RiskValidationResult, RiskError> {
        let portfolio = self
            .portfolios
            .find_snapshot(order.portfolio_id())
            .await?
            .ok_or_else(|| RiskError::PortfolioNotFound {
                portfolio_id: order.portfolio_id().to_string(),
            })?;

        let quote = self
            .market_data
            .get_quote(order.symbol())
            .await
            .map_err(|e| match e {
                MarketDataError::SymbolNotFound { symbol } => RiskError::StockNotFound { symbol },
                other => RiskError::MarketData(other),
            })?;

        let price = order.limit_price().unwrap_or(quote.price);
        let proposed = ProposedOrder::from_order(order, order.remaining_quantity(), price);
        let result = self
            .gate
            .validate(&proposed, &portfolio, &stock_snapshot(&quote), &self.limits);

        tracing::debug!(
            order_id = %order.id(),
            is_valid = result.is_valid,
            risk_score = result.risk_score,
            "Risk validation complete"
        );
        Ok(result)
    }
}
