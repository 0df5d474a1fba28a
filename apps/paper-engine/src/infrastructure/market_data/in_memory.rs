//! In-memory quote source.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::domain::market_data::Quote;
use crate::domain::shared::{Money, Symbol};

/// Quote store fed by whoever owns the prices (tests, a replay, an operator).
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    quotes: RwLock<HashMap<Symbol, Quote>>,
}

impl InMemoryMarketData {
    /// Create an empty quote store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the quote for its symbol.
    pub fn set_quote(&self, quote: Quote) {
        self.quotes.write().insert(quote.symbol.clone(), quote);
    }

    /// Set a last-price-only quote.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.set_quote(Quote::new(Symbol::new(symbol), Money::new(price)));
    }

    /// Remove a symbol so lookups report it as unknown.
    pub fn remove(&self, symbol: &Symbol) {
        self.quotes.write().remove(symbol);
    }
}

#[async_trait]
impl MarketDataPort for InMemoryMarketData {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        self.quotes
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn returns_latest_quote() {
        let feed = InMemoryMarketData::new();
        feed.set_price("AAPL", dec!(150));
        feed.set_price("AAPL", dec!(151));

        let quote = feed.get_quote(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(quote.price, Money::new(dec!(151)));
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let feed = InMemoryMarketData::new();
        let err = feed.get_quote(&Symbol::new("MSFT")).await.unwrap_err();
        assert_eq!(
            err,
            MarketDataError::SymbolNotFound {
                symbol: "MSFT".to_string()
            }
        );
    }
}
