//! Order Repository Trait
//!
//! Persistence abstraction for orders, implemented by infrastructure adapters.

use std::fmt;

use async_trait::async_trait;

use super::aggregate::Order;
use super::value_objects::{OrderStatus, TimeInForce};
use crate::domain::shared::{OrderId, PortfolioId, Timestamp};

/// Failure reported by an order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store is unavailable or rejected the operation.
    Storage {
        /// Description from the store.
        message: String,
    },
}

impl RepositoryError {
    /// Shorthand for a storage failure.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { message } => write!(f, "Order store failure: {message}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Predicate over the order population.
///
/// Empty lists and `None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Accepted statuses.
    pub statuses: Vec<OrderStatus>,
    /// Accepted times in force.
    pub time_in_force: Vec<TimeInForce>,
    /// Owning portfolio.
    pub portfolio_id: Option<PortfolioId>,
    /// Only orders created or updated at or after this instant.
    pub active_since: Option<Timestamp>,
    /// Only orders created or updated strictly before this instant.
    pub active_before: Option<Timestamp>,
    /// Include orders flagged as archived.
    pub include_archived: bool,
}

impl OrderQuery {
    /// Query matching every non-archived order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: &[OrderStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    /// Restrict to the given times in force.
    #[must_use]
    pub fn with_time_in_force(mut self, tifs: &[TimeInForce]) -> Self {
        self.time_in_force = tifs.to_vec();
        self
    }

    /// Restrict to one portfolio.
    #[must_use]
    pub fn for_portfolio(mut self, portfolio_id: PortfolioId) -> Self {
        self.portfolio_id = Some(portfolio_id);
        self
    }

    /// Restrict to orders with activity in `[from, to)`.
    #[must_use]
    pub const fn active_between(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.active_since = Some(from);
        self.active_before = Some(to);
        self
    }

    /// Returns true if `order` satisfies this query.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if !self.include_archived && order.archived_at().is_some() {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&order.status()) {
            return false;
        }
        if !self.time_in_force.is_empty() && !self.time_in_force.contains(&order.time_in_force())
        {
            return false;
        }
        if let Some(portfolio_id) = &self.portfolio_id
            && order.portfolio_id() != portfolio_id
        {
            return false;
        }
        let touched = |ts: Timestamp| {
            self.active_since.is_none_or(|from| ts >= from)
                && self.active_before.is_none_or(|to| ts < to)
        };
        if (self.active_since.is_some() || self.active_before.is_some())
            && !touched(order.created_at())
            && !touched(order.updated_at())
        {
            return false;
        }
        true
    }
}

/// Repository trait for Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save an order (insert or update). A single save is atomic.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Find an order by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Find every order matching `query`, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find(&self, query: &OrderQuery) -> Result<Vec<Order>, RepositoryError>;
}
