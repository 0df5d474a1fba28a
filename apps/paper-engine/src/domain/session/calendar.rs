//! Trading calendars.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Decides whether the market trades on a date.
pub trait TradingCalendar: Send + Sync {
    /// Returns true if `date` is a trading day.
    fn is_trading_day(&self, date: NaiveDate) -> bool;
}

/// Every Monday to Friday is a trading day.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// Weekdays minus a configured set of market holidays.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Create a calendar closed on `holidays`.
    #[must_use]
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Configured holidays in date order.
    pub fn holidays(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }
}

impl TradingCalendar for HolidayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        WeekdayCalendar.is_trading_day(date) && !self.holidays.contains(&date)
    }
}
