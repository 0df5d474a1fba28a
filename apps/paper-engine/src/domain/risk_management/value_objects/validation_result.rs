//! Risk gate verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Quantity;

/// Upper bound of the cumulative risk score.
pub const MAX_RISK_SCORE: u32 = 100;

/// Individual rule that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCheck {
    /// Order value above the per-order maximum.
    OrderSize,
    /// BUY value above leveraged cash.
    BuyingPower,
    /// Proposed position share of the portfolio too high.
    Concentration,
    /// Proposed position value above the single-stock cap.
    Exposure,
    /// Small account sending an order larger than twice its equity.
    PdtOrderSize,
    /// Small account at the day-trade limit.
    PdtDayTrades,
    /// Daily loss above the limit.
    DailyLoss,
}

impl RiskCheck {
    /// Contribution of this rule to the risk score.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::OrderSize | Self::PdtOrderSize => 25,
            Self::BuyingPower | Self::PdtDayTrades => 30,
            Self::Concentration => 20,
            Self::Exposure => 15,
            Self::DailyLoss => 35,
        }
    }
}

impl fmt::Display for RiskCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OrderSize => "ORDER_SIZE",
            Self::BuyingPower => "BUYING_POWER",
            Self::Concentration => "CONCENTRATION",
            Self::Exposure => "EXPOSURE",
            Self::PdtOrderSize => "PDT_ORDER_SIZE",
            Self::PdtDayTrades => "PDT_DAY_TRADES",
            Self::DailyLoss => "DAILY_LOSS",
        };
        write!(f, "{s}")
    }
}

/// A blocking rule failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskViolation {
    /// Rule that failed.
    pub check: RiskCheck,
    /// Human-readable explanation.
    pub message: String,
}

impl RiskViolation {
    /// Create a violation.
    #[must_use]
    pub fn new(check: RiskCheck, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

impl fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.check, self.message)
    }
}

/// Non-blocking outcome of a passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskApproval {
    /// Warnings raised.
    pub warnings: Vec<String>,
    /// Sizing and impact recommendations.
    pub recommendations: Vec<String>,
    /// Suggested quantity cap.
    pub adjusted_quantity: Option<Quantity>,
    /// Cumulative score.
    pub risk_score: u32,
}

/// Full verdict of the risk gate.
///
/// `is_valid` holds exactly when `violations` is empty. Warnings and
/// recommendations never block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskValidationResult {
    /// True when no rule failed.
    pub is_valid: bool,
    /// Blocking failures.
    pub violations: Vec<RiskViolation>,
    /// Non-blocking concerns.
    pub warnings: Vec<String>,
    /// Sizing and impact recommendations.
    pub recommendations: Vec<String>,
    /// Suggested quantity cap when the order breaches the concentration limit.
    pub adjusted_quantity: Option<Quantity>,
    /// Cumulative weight of failed rules, capped at [`MAX_RISK_SCORE`].
    pub risk_score: u32,
}

impl RiskValidationResult {
    /// Empty passing result.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            is_valid: true,
            violations: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            adjusted_quantity: None,
            risk_score: 0,
        }
    }

    /// Record a violation and add its weight to the score.
    pub fn add_violation(&mut self, violation: RiskViolation) {
        self.risk_score = (self.risk_score + violation.check.weight()).min(MAX_RISK_SCORE);
        self.violations.push(violation);
        self.is_valid = false;
    }

    /// Record a warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record a recommendation.
    pub fn add_recommendation(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }

    /// Violation messages in rule order.
    #[must_use]
    pub fn violation_messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    /// Returns true if the given rule failed.
    #[must_use]
    pub fn violated(&self, check: RiskCheck) -> bool {
        self.violations.iter().any(|v| v.check == check)
    }

    /// Split into approval or the list of violations.
    ///
    /// # Errors
    ///
    /// Returns the violations when any rule failed.
    pub fn into_result(self) -> Result<RiskApproval, Vec<RiskViolation>> {
        if self.violations.is_empty() {
            Ok(RiskApproval {
                warnings: self.warnings,
                recommendations: self.recommendations,
                adjusted_quantity: self.adjusted_quantity,
                risk_score: self.risk_score,
            })
        } else {
            Err(self.violations)
        }
    }
}

impl Default for RiskValidationResult {
    fn default() -> Self {
        Self::passed()
    }
}
