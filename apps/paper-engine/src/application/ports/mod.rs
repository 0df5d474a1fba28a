//! Application Ports (Driven)
//!
//! Interfaces the application layer uses to reach external systems. The
//! order store port lives with the order aggregate in the domain layer.

mod market_data_port;
mod notification_port;
mod portfolio_port;
mod reconciliation_port;
mod trade_settlement_port;

pub use market_data_port::{MarketDataError, MarketDataPort};
pub use notification_port::{NoOpNotificationSink, NotificationSink};
pub use portfolio_port::{PortfolioError, PortfolioRepository};
pub use reconciliation_port::{
    NoOpReconciliation, PerformanceReconciliationPort, ReconciliationError,
};
pub use trade_settlement_port::{
    SettlementError, TradeConfirmation, TradeRequest, TradeSettlementPort,
};
