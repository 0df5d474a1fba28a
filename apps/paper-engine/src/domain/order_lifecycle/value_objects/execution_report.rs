//! Execution report for a single simulated fill.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{ExecutionId, Money, Quantity, Timestamp};

/// Venue name recorded on every simulated fill.
pub const PAPER_VENUE: &str = "PAPER";

/// One fill against an order.
///
/// Reports are append-only on the order; the average execution price is
/// always recomputed from the full list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Unique id of this fill.
    pub execution_id: ExecutionId,
    /// When the fill happened.
    pub timestamp: Timestamp,
    /// Shares filled.
    pub quantity: Quantity,
    /// Fill price after slippage.
    pub price: Money,
    /// Commission charged for this fill.
    pub commission: Money,
    /// Venue label.
    pub venue: String,
}

impl ExecutionReport {
    /// Create a report for a paper fill.
    #[must_use]
    pub fn paper(quantity: Quantity, price: Money, commission: Money) -> Self {
        Self {
            execution_id: ExecutionId::generate(),
            timestamp: Timestamp::now(),
            quantity,
            price,
            commission,
            venue: PAPER_VENUE.to_string(),
        }
    }

    /// Record the fill under a pre-assigned identifier.
    #[must_use]
    pub fn with_execution_id(mut self, execution_id: ExecutionId) -> Self {
        self.execution_id = execution_id;
        self
    }

    /// Notional value of this fill.
    #[must_use]
    pub fn notional(&self) -> Money {
        self.quantity.notional(self.price)
    }
}
