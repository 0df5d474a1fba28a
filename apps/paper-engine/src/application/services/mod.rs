//! Application Services
//!
//! Application services coordinate domain logic and infrastructure adapters.
//! They differ from use cases in that they run as scheduled or background
//! work over many orders.

mod day_session_scheduler;
mod phase_lock;
mod session_driver;

pub use day_session_scheduler::{DaySessionScheduler, PhaseError, SchedulerSettings};
pub use phase_lock::{PhaseGuard, PhaseLocks};
pub use session_driver::{PhaseClock, SessionDriver};
