//! Risk Management Value Objects

mod risk_limits;
mod snapshots;
mod validation_result;

pub use risk_limits::RiskLimits;
pub use snapshots::{
    ExecutionRecord, PortfolioSnapshot, PositionSnapshot, ProposedOrder, StockSnapshot,
};
pub use validation_result::{
    MAX_RISK_SCORE, RiskApproval, RiskCheck, RiskValidationResult, RiskViolation,
};
