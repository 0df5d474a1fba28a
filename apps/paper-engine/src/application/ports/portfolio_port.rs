//! Portfolio Port (Driven Port)
//!
//! Read access to portfolio state for risk checks and summaries.

use async_trait::async_trait;

use crate::domain::risk_management::PortfolioSnapshot;
use crate::domain::shared::PortfolioId;

/// Portfolio store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortfolioError {
    /// The store could not answer.
    #[error("Portfolio store failure: {message}")]
    Storage {
        /// Error details.
        message: String,
    },
}

/// Port for reading portfolios.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// Every known portfolio.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    async fn portfolio_ids(&self) -> Result<Vec<PortfolioId>, PortfolioError>;

    /// Current snapshot of one portfolio, `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    async fn find_snapshot(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Option<PortfolioSnapshot>, PortfolioError>;
}
