//! Conditional trigger definition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of quantity a trigger compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// A price field of the snapshot.
    Price,
    /// Session volume.
    Volume,
    /// A named technical indicator.
    Indicator,
    /// Wall-clock time; `field` is ignored.
    Time,
}

impl TriggerType {
    /// Returns true if the trigger compares against wall-clock time.
    #[must_use]
    pub const fn is_time(&self) -> bool {
        matches!(self, Self::Time)
    }
}

/// Comparison applied between the observed value and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Observed strictly above target.
    GreaterThan,
    /// Observed strictly below target.
    LessThan,
    /// Observed within tolerance of target (0.1% numeric, 60s for time).
    Equals,
    /// Observed inside `[min(value, value2), max(value, value2)]`.
    Between,
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterThan => write!(f, "greater_than"),
            Self::LessThan => write!(f, "less_than"),
            Self::Equals => write!(f, "equals"),
            Self::Between => write!(f, "between"),
        }
    }
}

/// How a trigger combines with its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    /// Member of the AND-group (also the default when absent).
    #[default]
    And,
    /// Member of the OR-group.
    Or,
}

/// Target value of a trigger.
///
/// The trigger's [`TriggerType`] decides which variant is meaningful. In JSON
/// an RFC 3339 string reads as a timestamp and anything else as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerValue {
    /// Point in time, for [`TriggerType::Time`].
    Timestamp(DateTime<Utc>),
    /// Numeric threshold for price, volume and indicator triggers.
    Numeric(Decimal),
}

impl TriggerValue {
    /// Numeric payload, if this is a numeric value.
    #[must_use]
    pub const fn as_numeric(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Timestamp(_) => None,
        }
    }

    /// Timestamp payload, if this is a time value.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            Self::Numeric(_) => None,
        }
    }
}

impl From<Decimal> for TriggerValue {
    fn from(value: Decimal) -> Self {
        Self::Numeric(value)
    }
}

impl From<DateTime<Utc>> for TriggerValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// A declarative condition that activates a dormant order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalTrigger {
    /// Kind of comparison.
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Comparison operator.
    pub condition: TriggerCondition,
    /// Snapshot field (`price`, `volume`, `high`, `low`, `open`, `bid`, `ask`) or
    /// indicator name.
    #[serde(default)]
    pub field: String,
    /// Primary target.
    pub value: TriggerValue,
    /// Second bound for `between`.
    #[serde(default)]
    pub value2: Option<TriggerValue>,
    /// Group membership; absent means AND.
    #[serde(default)]
    pub logical_operator: Option<LogicalOperator>,
}

impl ConditionalTrigger {
    /// Create a numeric trigger on a snapshot field.
    #[must_use]
    pub fn numeric(
        trigger_type: TriggerType,
        field: impl Into<String>,
        condition: TriggerCondition,
        value: Decimal,
    ) -> Self {
        Self {
            trigger_type,
            condition,
            field: field.into(),
            value: TriggerValue::Numeric(value),
            value2: None,
            logical_operator: None,
        }
    }

    /// Create a price trigger on the last price.
    #[must_use]
    pub fn price(condition: TriggerCondition, value: Decimal) -> Self {
        Self::numeric(TriggerType::Price, "price", condition, value)
    }

    /// Create a volume trigger.
    #[must_use]
    pub fn volume(condition: TriggerCondition, value: Decimal) -> Self {
        Self::numeric(TriggerType::Volume, "volume", condition, value)
    }

    /// Create a wall-clock trigger.
    #[must_use]
    pub fn time(condition: TriggerCondition, at: DateTime<Utc>) -> Self {
        Self {
            trigger_type: TriggerType::Time,
            condition,
            field: String::new(),
            value: TriggerValue::Timestamp(at),
            value2: None,
            logical_operator: None,
        }
    }

    /// Set the second bound for a `between` condition.
    #[must_use]
    pub fn with_value2(mut self, value2: impl Into<TriggerValue>) -> Self {
        self.value2 = Some(value2.into());
        self
    }

    /// Place the trigger in the OR-group.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.logical_operator = Some(LogicalOperator::Or);
        self
    }

    /// Place the trigger in the AND-group explicitly.
    #[must_use]
    pub const fn and(mut self) -> Self {
        self.logical_operator = Some(LogicalOperator::And);
        self
    }

    /// Effective group membership.
    #[must_use]
    pub fn operator(&self) -> LogicalOperator {
        self.logical_operator.unwrap_or_default()
    }
}
