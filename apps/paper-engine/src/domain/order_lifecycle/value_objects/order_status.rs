//! Order status in the paper order lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status.
///
/// `Pending` is initial. `Executed`, `Cancelled` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Working, waiting for a trigger, a marketable quote, or liquidity.
    Pending,
    /// Activated (conditional trigger or stop reached) or partially filled.
    Triggered,
    /// Completely filled.
    Executed,
    /// Cancelled explicitly, at market close, or by a risk rejection.
    Cancelled,
    /// Expiry date passed before the order completed.
    Expired,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Triggered,
        Self::Executed,
        Self::Cancelled,
        Self::Expired,
    ];

    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Cancelled | Self::Expired)
    }

    /// Returns true if the order is still working.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        matches!(self, Self::Pending | Self::Triggered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Triggered => write!(f, "TRIGGERED"),
            Self::Executed => write!(f, "EXECUTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_working_partition_all_states() {
        for status in OrderStatus::ALL {
            assert_ne!(status.is_terminal(), status.is_working(), "{status}");
        }
    }

    #[test]
    fn serde_roundtrip_uses_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::Triggered).unwrap();
        assert_eq!(json, "\"TRIGGERED\"");
        let parsed: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, OrderStatus::Triggered);
    }
}
