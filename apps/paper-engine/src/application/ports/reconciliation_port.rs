//! Performance Reconciliation Port (Driven Port)

use async_trait::async_trait;

use crate::domain::shared::PortfolioId;

/// Reconciliation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconciliationError {
    /// Unknown portfolio.
    #[error("Portfolio not found: {portfolio_id}")]
    PortfolioNotFound {
        /// The unknown portfolio.
        portfolio_id: String,
    },

    /// Reconciliation failed.
    #[error("Reconciliation failed: {message}")]
    Failed {
        /// Error details.
        message: String,
    },
}

/// Port invoked once per portfolio at end of day.
#[async_trait]
pub trait PerformanceReconciliationPort: Send + Sync {
    /// Reconcile the day's performance of one portfolio.
    ///
    /// # Errors
    ///
    /// Returns error if reconciliation fails.
    async fn reconcile(&self, portfolio_id: &PortfolioId) -> Result<(), ReconciliationError>;
}

/// Reconciler that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReconciliation;

#[async_trait]
impl PerformanceReconciliationPort for NoOpReconciliation {
    async fn reconcile(&self, _portfolio_id: &PortfolioId) -> Result<(), ReconciliationError> {
        Ok(())
    }
}
