//! Ledger Adapters
//!
//! Cash and position bookkeeping behind the settlement, portfolio and
//! reconciliation ports.

mod paper_ledger;

pub use paper_ledger::PaperLedger;
