//! Proof that an order is allowed to enter TRIGGERED.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Timestamp};

/// What caused the activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationCause {
    /// The order's conditional trigger tree evaluated true.
    ConditionalTrigger,
    /// The last price crossed the stop price.
    StopPrice {
        /// Configured stop price.
        stop_price: Money,
        /// Price that crossed it.
        observed: Money,
    },
}

/// Token required by [`Order::activate`](crate::domain::order_lifecycle::Order::activate).
///
/// Only the trigger evaluator and the simulator's stop check can mint one, so
/// no other code path can move an order into TRIGGERED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    cause: ActivationCause,
    at: Timestamp,
}

impl Activation {
    pub(crate) fn conditional() -> Self {
        Self {
            cause: ActivationCause::ConditionalTrigger,
            at: Timestamp::now(),
        }
    }

    pub(crate) fn stop_reached(stop_price: Money, observed: Money) -> Self {
        Self {
            cause: ActivationCause::StopPrice {
                stop_price,
                observed,
            },
            at: Timestamp::now(),
        }
    }

    /// Cause of the activation.
    #[must_use]
    pub const fn cause(&self) -> ActivationCause {
        self.cause
    }

    /// When the activation was observed.
    #[must_use]
    pub const fn at(&self) -> Timestamp {
        self.at
    }

    /// Human-readable reason for the status history.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.cause {
            ActivationCause::ConditionalTrigger => "Conditional triggers satisfied".to_string(),
            ActivationCause::StopPrice {
                stop_price,
                observed,
            } => format!("Stop price {stop_price} reached at {observed}"),
        }
    }
}
