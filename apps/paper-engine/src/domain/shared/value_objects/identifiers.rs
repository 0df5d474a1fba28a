//! Strongly-typed identifiers for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(OrderId, "Unique identifier for a paper order.");
define_id!(PortfolioId, "Identifier of the portfolio that owns an order.");
define_id!(
    ExecutionId,
    "Identifier of a single simulated fill; settlement is idempotent on it."
);

impl ExecutionId {
    /// Identifier of the `fill_number`th fill (1-based) of `order_id`.
    ///
    /// Replanning the same fill after a lost save yields the same id, so the
    /// ledger recognizes it as already booked.
    #[must_use]
    pub fn for_fill(order_id: &OrderId, fill_number: usize) -> Self {
        Self(format!("{order_id}-fill-{fill_number}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
        assert_ne!(ExecutionId::generate(), ExecutionId::generate());
    }

    #[test]
    fn fill_ids_are_stable_per_order_and_fill() {
        let order = OrderId::new("ord-1");
        assert_eq!(
            ExecutionId::for_fill(&order, 1),
            ExecutionId::for_fill(&order, 1)
        );
        assert_eq!(ExecutionId::for_fill(&order, 2).as_str(), "ord-1-fill-2");
        assert_ne!(
            ExecutionId::for_fill(&order, 1),
            ExecutionId::for_fill(&OrderId::new("ord-2"), 1)
        );
    }

    #[test]
    fn from_str_and_display() {
        let id: PortfolioId = "pf-1".into();
        assert_eq!(id.as_str(), "pf-1");
        assert_eq!(format!("{id}"), "pf-1");
    }

    #[test]
    fn serde_is_transparent() {
        let id = OrderId::new("ord-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ord-123\"");
        let parsed: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
