//! Order State Machine Service
//!
//! Legal status transitions of a paper order.
//!
//! ```text
//! PENDING ──► TRIGGERED ──► TRIGGERED (partial fill)
//!    │            │
//!    ├────────────┴──► EXECUTED | CANCELLED | EXPIRED
//! ```

use crate::domain::order_lifecycle::errors::OrderError;
use crate::domain::order_lifecycle::value_objects::OrderStatus;

/// Order State Machine for validating transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (
                OrderStatus::Pending,
                OrderStatus::Triggered
                    | OrderStatus::Executed
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
            ) | (
                OrderStatus::Triggered,
                OrderStatus::Triggered
                    | OrderStatus::Executed
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
            )
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition {
                from,
                to,
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: OrderStatus, to: OrderStatus) -> String {
        match from {
            OrderStatus::Executed => format!("Order is already executed, cannot transition to {to}"),
            OrderStatus::Cancelled => format!("Order is cancelled, cannot transition to {to}"),
            OrderStatus::Expired => format!("Order has expired, cannot transition to {to}"),
            OrderStatus::Pending | OrderStatus::Triggered => {
                format!("Invalid transition from {from} to {to}")
            }
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|to| Self::is_valid_transition(from, *to))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transitions() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Triggered
        ));
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Executed
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Pending
        ));
    }

    #[test]
    fn triggered_can_stay_triggered() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Triggered,
            OrderStatus::Triggered
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::Triggered,
            OrderStatus::Pending
        ));
    }

    #[test]
    fn terminal_states_have_no_next_states() {
        for status in OrderStatus::ALL.into_iter().filter(OrderStatus::is_terminal) {
            assert!(OrderStateMachine::valid_next_states(status).is_empty());
        }
    }

    #[test]
    fn executed_never_returns_to_pending() {
        let err =
            OrderStateMachine::validate_transition(OrderStatus::Executed, OrderStatus::Pending)
                .unwrap_err();
        assert!(err.to_string().contains("already executed"));
    }

    #[test]
    fn valid_next_states_from_pending() {
        let next = OrderStateMachine::valid_next_states(OrderStatus::Pending);
        assert_eq!(
            next,
            vec![
                OrderStatus::Triggered,
                OrderStatus::Executed,
                OrderStatus::Cancelled,
                OrderStatus::Expired,
            ]
        );
    }
}
