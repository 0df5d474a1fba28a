//! Quote snapshot for a single symbol.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Symbol, Timestamp};

/// Latest market data for a symbol.
///
/// `price` is the last trade. The session fields and indicators are optional
/// because not every provider supplies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol quoted.
    pub symbol: Symbol,
    /// Last trade price.
    pub price: Money,
    /// Best bid.
    #[serde(default)]
    pub bid: Option<Money>,
    /// Best ask.
    #[serde(default)]
    pub ask: Option<Money>,
    /// Session volume.
    #[serde(default)]
    pub volume: u64,
    /// Session high.
    #[serde(default)]
    pub high: Option<Money>,
    /// Session low.
    #[serde(default)]
    pub low: Option<Money>,
    /// Session open.
    #[serde(default)]
    pub open: Option<Money>,
    /// When the quote was observed.
    pub timestamp: Timestamp,
    /// Named technical indicators (e.g. `rsi_14`, `sma_50`).
    #[serde(default)]
    pub indicators: HashMap<String, Decimal>,
}

impl Quote {
    /// Create a quote with only a last price.
    #[must_use]
    pub fn new(symbol: Symbol, price: Money) -> Self {
        Self {
            symbol,
            price,
            bid: None,
            ask: None,
            volume: 0,
            high: None,
            low: None,
            open: None,
            timestamp: Timestamp::now(),
            indicators: HashMap::new(),
        }
    }

    /// Set bid and ask.
    #[must_use]
    pub const fn with_bid_ask(mut self, bid: Money, ask: Money) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    /// Set session volume.
    #[must_use]
    pub const fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    /// Set session open, high and low.
    #[must_use]
    pub const fn with_session_range(mut self, open: Money, high: Money, low: Money) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    /// Add a named indicator value.
    #[must_use]
    pub fn with_indicator(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.indicators.insert(name.into(), value);
        self
    }

    /// Returns true if the last price can be traded against.
    #[must_use]
    pub fn has_valid_price(&self) -> bool {
        self.price.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn builder_sets_fields() {
        let quote = Quote::new(Symbol::new("AAPL"), Money::new(dec!(150)))
            .with_volume(2_000_000)
            .with_session_range(Money::new(dec!(148)), Money::new(dec!(151)), Money::new(dec!(147)))
            .with_indicator("rsi_14", dec!(62.5))
            .with_bid_ask(Money::new(dec!(149.99)), Money::new(dec!(150.01)));
        assert_eq!(quote.volume, 2_000_000);
        assert_eq!(quote.bid, Some(Money::new(dec!(149.99))));
        assert_eq!(quote.ask, Some(Money::new(dec!(150.01))));
        assert_eq!(quote.high, Some(Money::new(dec!(151))));
        assert_eq!(quote.indicators.get("rsi_14"), Some(&dec!(62.5)));
        assert!(quote.has_valid_price());
    }

    #[test]
    fn zero_price_is_invalid() {
        let quote = Quote::new(Symbol::new("AAPL"), Money::ZERO);
        assert!(!quote.has_valid_price());
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let json = r#"{"symbol":"msft","price":"410.25","timestamp":"2026-01-19T15:00:00Z"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.symbol.as_str(), "MSFT");
        assert_eq!(quote.volume, 0);
        assert!(quote.indicators.is_empty());
    }
}
