//! Outcome of one execution attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{ExecutionId, Money, Quantity};

/// Disposition of an execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// The order is now fully executed.
    Filled,
    /// Some shares filled; the order keeps working.
    PartiallyFilled,
    /// Not executable at the current quote; the order keeps working.
    Queued,
    /// The order was cancelled by its time in force (IOC or FOK).
    Cancelled,
    /// Nothing happened; the order is unchanged.
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Filled => "FILLED",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Queued => "QUEUED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Result of [`ExecutionSimulator::execute`](super::ExecutionSimulator::execute).
///
/// Failures are values, not errors, so a sweep can keep going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Disposition.
    pub status: ExecutionStatus,
    /// Fill identifier when shares were executed.
    pub execution_id: Option<ExecutionId>,
    /// Fill price when shares were executed.
    pub price: Option<Money>,
    /// Shares executed by this attempt.
    pub quantity: Quantity,
    /// Commission charged for this attempt.
    pub commission: Money,
    /// True when the fill left shares outstanding.
    pub is_partial: bool,
    /// Shares still outstanding on the order after this attempt.
    pub remaining_quantity: Quantity,
    /// Human-readable explanation.
    pub message: String,
}

impl ExecutionResult {
    /// Shares were executed.
    #[must_use]
    pub fn filled(
        execution_id: ExecutionId,
        price: Money,
        quantity: Quantity,
        commission: Money,
        remaining_quantity: Quantity,
    ) -> Self {
        let is_partial = remaining_quantity.is_positive();
        let (status, message) = if is_partial {
            (
                ExecutionStatus::PartiallyFilled,
                format!("Partially filled {quantity} at {price}, {remaining_quantity} remaining"),
            )
        } else {
            (
                ExecutionStatus::Filled,
                format!("Filled {quantity} at {price}"),
            )
        };
        Self {
            status,
            execution_id: Some(execution_id),
            price: Some(price),
            quantity,
            commission,
            is_partial,
            remaining_quantity,
            message,
        }
    }

    /// Order stays working without a fill.
    #[must_use]
    pub fn queued(remaining_quantity: Quantity, message: impl Into<String>) -> Self {
        Self::without_fill(ExecutionStatus::Queued, remaining_quantity, message)
    }

    /// Order was cancelled by its time in force.
    #[must_use]
    pub fn cancelled(remaining_quantity: Quantity, message: impl Into<String>) -> Self {
        Self::without_fill(ExecutionStatus::Cancelled, remaining_quantity, message)
    }

    /// Attempt failed; the order is unchanged.
    #[must_use]
    pub fn failed(remaining_quantity: Quantity, message: impl Into<String>) -> Self {
        Self::without_fill(ExecutionStatus::Failed, remaining_quantity, message)
    }

    fn without_fill(
        status: ExecutionStatus,
        remaining_quantity: Quantity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            execution_id: None,
            price: None,
            quantity: Quantity::ZERO,
            commission: Money::ZERO,
            is_partial: false,
            remaining_quantity,
            message: message.into(),
        }
    }

    /// True when shares were executed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Filled | ExecutionStatus::PartiallyFilled
        )
    }
}
