//! Scheduled session phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of scheduled work in the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Expiry sweep before the open.
    MarketOpen,
    /// Cancellation of DAY orders at the close.
    MarketClose,
    /// Hourly expiry sweep and integrity validation.
    HourlyMaintenance,
    /// End-of-day batch.
    EndOfDay,
    /// Processing of working orders against current quotes.
    OrderSweep,
}

impl SessionPhase {
    /// Stable lowercase name for logs and notifications.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MarketOpen => "market_open",
            Self::MarketClose => "market_close",
            Self::HourlyMaintenance => "hourly_maintenance",
            Self::EndOfDay => "end_of_day",
            Self::OrderSweep => "order_sweep",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
