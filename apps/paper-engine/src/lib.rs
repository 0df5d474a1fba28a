// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Paper Engine - Order Lifecycle Core
//!
//! Paper-trading engine for the Cream trading system: simulated fills,
//! portfolio risk gating, conditional order activation and the trading day's
//! session phases.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, domain events)
//!   - `order_lifecycle`: Order aggregate, status state machine, execution reports
//!   - `execution_simulation`: Slippage, commission, liquidity and fill planning
//!   - `risk_management`: Risk gate, limits, day-trade counting, Kelly sizing
//!   - `conditional_triggers`: AND/OR trigger trees over quotes
//!   - `session`: Trading calendar, session times, phase reports
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`MarketDataPort`, `TradeSettlementPort`,
//!     `PortfolioRepository`, `PerformanceReconciliationPort`, `NotificationSink`)
//!   - `use_cases`: `ProcessOrder`, `ValidateOrderRisk`
//!   - `services`: `DaySessionScheduler`, `SessionDriver`, run locks
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory order store
//!   - `market_data`: In-memory quote book
//!   - `ledger`: Paper cash and position bookkeeping
//!   - `notifications`: Broadcast notification sink

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Configuration & Telemetry
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::conditional_triggers::TriggerEvaluator;
pub use domain::execution_simulation::{
    ExecutionResult, ExecutionSimulator, ExecutionStatus, FixedLiquidity, LiquidityModel,
    RandomLiquidity,
};
pub use domain::order_lifecycle::{
    CreateOrderCommand, Order, OrderError, OrderRepository, OrderStatus,
};
pub use domain::risk_management::{RiskGate, RiskLimits};
pub use domain::session::{SessionPhase, SessionSchedule, TradingCalendar};
pub use domain::shared::{ExecutionId, Money, OrderId, PortfolioId, Quantity, Symbol, Timestamp};

// Application re-exports
pub use application::ports::{
    MarketDataPort, NotificationSink, PerformanceReconciliationPort, PortfolioRepository,
    TradeSettlementPort,
};
pub use application::services::{DaySessionScheduler, SessionDriver};
pub use application::use_cases::{ProcessOrderUseCase, ValidateOrderRiskUseCase};

// Infrastructure re-exports
pub use infrastructure::{
    BroadcastNotificationSink, InMemoryMarketData, InMemoryOrderRepository, PaperLedger,
};
