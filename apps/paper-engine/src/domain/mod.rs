//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: The order and its execution state
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Records of state transitions
//! - **Domain Services**: Stateless pricing, risk and trigger logic
//! - **Repository Traits**: Persistence abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`order_lifecycle`]: Order aggregate and its state machine
//! - [`conditional_triggers`]: AND/OR trigger trees over market snapshots
//! - [`execution_simulation`]: Paper fills with slippage, commission and liquidity
//! - [`risk_management`]: Portfolio risk gate
//! - [`session`]: Trading calendar, session times and phase results

pub mod conditional_triggers;
pub mod execution_simulation;
pub mod market_data;
pub mod order_lifecycle;
pub mod risk_management;
pub mod session;
pub mod shared;
