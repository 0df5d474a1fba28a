//! Structured results returned by each session phase.
//!
//! Phases never fail as a whole: problems are recorded in `errors` and the
//! counts reflect whatever was completed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::summary::DailyOrderSummary;

/// Market open expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOpenReport {
    /// Trading date.
    pub date: Option<NaiveDate>,
    /// PENDING DAY and GTC orders inspected.
    pub orders_checked: usize,
    /// Orders moved to EXPIRED.
    pub orders_expired: usize,
    /// Orders left active.
    pub orders_active: usize,
    /// Wall time.
    pub duration_ms: u64,
    /// Errors encountered.
    pub errors: Vec<String>,
}

/// Market close DAY order cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCloseReport {
    /// Trading date.
    pub date: Option<NaiveDate>,
    /// Working DAY orders found.
    pub orders_checked: usize,
    /// Orders cancelled.
    pub orders_cancelled: usize,
    /// Wall time.
    pub duration_ms: u64,
    /// Errors encountered.
    pub errors: Vec<String>,
}

/// Hourly maintenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Trading date.
    pub date: Option<NaiveDate>,
    /// Orders moved to EXPIRED.
    pub orders_expired: usize,
    /// Working orders validated.
    pub orders_validated: usize,
    /// Execution-state invariant failures, one per order and issue.
    pub integrity_issues: Vec<String>,
    /// Wall time.
    pub duration_ms: u64,
    /// Errors encountered.
    pub errors: Vec<String>,
}

/// Intraday processing of working orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Trading date.
    pub date: Option<NaiveDate>,
    /// Portfolios with working orders.
    pub portfolios: usize,
    /// Orders processed.
    pub orders_processed: usize,
    /// Orders that became fully executed.
    pub orders_filled: usize,
    /// Orders that received a partial fill.
    pub orders_partially_filled: usize,
    /// Orders left waiting.
    pub orders_queued: usize,
    /// Orders cancelled by time in force.
    pub orders_cancelled: usize,
    /// Orders cancelled by the risk gate.
    pub orders_rejected: usize,
    /// Orders that failed and stayed unchanged.
    pub orders_failed: usize,
    /// Wall time.
    pub duration_ms: u64,
    /// Errors encountered.
    pub errors: Vec<String>,
}

impl SweepReport {
    /// Fold another portfolio's counts into this report.
    pub fn merge(&mut self, other: Self) {
        self.portfolios += other.portfolios;
        self.orders_processed += other.orders_processed;
        self.orders_filled += other.orders_filled;
        self.orders_partially_filled += other.orders_partially_filled;
        self.orders_queued += other.orders_queued;
        self.orders_cancelled += other.orders_cancelled;
        self.orders_rejected += other.orders_rejected;
        self.orders_failed += other.orders_failed;
        self.errors.extend(other.errors);
    }
}

/// End-of-day batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EodProcessingResult {
    /// Trading date processed.
    pub processed_date: Option<NaiveDate>,
    /// Orders touched by any step.
    pub total_orders_processed: usize,
    /// Working DAY orders cancelled by the safety net.
    pub day_orders_cancelled: usize,
    /// Working GTC orders carried to the next session.
    pub gtc_orders_rolled_over: usize,
    /// Orders moved to EXPIRED.
    pub expired_orders_handled: usize,
    /// Portfolios reconciled without error.
    pub portfolios_reconciled: usize,
    /// Terminal orders older than the archive horizon.
    pub archival_candidates: usize,
    /// Candidates flagged archived.
    pub orders_archived: usize,
    /// One summary per portfolio.
    pub performance_summaries: Vec<DailyOrderSummary>,
    /// Wall time.
    pub processing_time_ms: u64,
    /// Errors encountered.
    pub errors: Vec<String>,
}

impl EodProcessingResult {
    /// Returns true if no step reported an error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
