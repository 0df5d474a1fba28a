//! Trading Session Bounded Context
//!
//! Calendar, local session times, phases, and the structured results the
//! day-session scheduler reports.

mod calendar;
mod phase;
mod reports;
mod schedule;
mod summary;

pub use calendar::{HolidayCalendar, TradingCalendar, WeekdayCalendar};
pub use phase::SessionPhase;
pub use reports::{
    EodProcessingResult, MaintenanceReport, MarketCloseReport, MarketOpenReport, SweepReport,
};
pub use schedule::SessionSchedule;
pub use summary::DailyOrderSummary;
