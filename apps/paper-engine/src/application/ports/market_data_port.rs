//! Market Data Port (Driven Port)
//!
//! Interface for fetching the latest quote for a symbol.

use async_trait::async_trait;

use crate::domain::market_data::Quote;
use crate::domain::shared::Symbol;

/// Market data error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketDataError {
    /// No quote exists for the symbol.
    #[error("Symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// The provider could not answer.
    #[error("Market data unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for reading market quotes.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Latest quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketDataError::SymbolNotFound`] for unknown symbols and
    /// [`MarketDataError::Unavailable`] when the provider fails.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError>;
}
