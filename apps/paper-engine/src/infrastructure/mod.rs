//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer and the
//! order repository trait from the domain:
//!
//! - `persistence/`: order store
//! - `market_data/`: quote source
//! - `ledger/`: paper cash and position bookkeeping (settlement, portfolio
//!   snapshots, end-of-day reconciliation)
//! - `notifications/`: broadcast notification sink

pub mod ledger;
pub mod market_data;
pub mod notifications;
pub mod persistence;

pub use ledger::PaperLedger;
pub use market_data::InMemoryMarketData;
pub use notifications::{BroadcastNotificationSink, Notification};
pub use persistence::InMemoryOrderRepository;
