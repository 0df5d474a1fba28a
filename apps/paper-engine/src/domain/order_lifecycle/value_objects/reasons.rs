//! Reasons attached to terminal transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason for an order leaving the working states without a full fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelReason {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message, stored as the order's cancellation reason.
    pub message: String,
}

impl CancelReason {
    /// Create a new cancel reason.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Explicit cancellation by the order owner.
    #[must_use]
    pub fn user_requested() -> Self {
        Self::new("USER_REQUESTED", "Cancelled by user request")
    }

    /// DAY order still working at market close.
    #[must_use]
    pub fn market_close() -> Self {
        Self::new("MARKET_CLOSE", "Day order cancelled at market close")
    }

    /// Expiry date passed.
    #[must_use]
    pub fn expired() -> Self {
        Self::new("EXPIRED", "Order expired")
    }

    /// Risk gate rejected the fill.
    #[must_use]
    pub fn risk_rejected(violations: &[String]) -> Self {
        Self::new(
            "RISK_REJECTED",
            format!("Rejected by risk gate: {}", violations.join("; ")),
        )
    }

    /// IOC order filled partially; remainder dropped.
    #[must_use]
    pub fn ioc_remainder() -> Self {
        Self::new("IOC_REMAINDER", "Immediate-or-cancel remainder cancelled")
    }

    /// FOK order could not be filled completely.
    #[must_use]
    pub fn fok_unfilled() -> Self {
        Self::new("FOK_UNFILLED", "Fill-or-kill order could not be filled in full")
    }

    /// IOC/FOK order whose price condition was not met on its only attempt.
    #[must_use]
    pub fn not_marketable() -> Self {
        Self::new(
            "NOT_MARKETABLE",
            "Immediate order not marketable at current quote",
        )
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
