//! Session times in exchange-local time.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::domain::shared::Timestamp;

/// Exchange-local session times at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSchedule {
    offset: FixedOffset,
    market_open: NaiveTime,
    market_close: NaiveTime,
    end_of_day: NaiveTime,
}

impl SessionSchedule {
    /// Create a schedule.
    #[must_use]
    pub const fn new(
        offset: FixedOffset,
        market_open: NaiveTime,
        market_close: NaiveTime,
        end_of_day: NaiveTime,
    ) -> Self {
        Self {
            offset,
            market_open,
            market_close,
            end_of_day,
        }
    }

    /// UTC offset of the exchange.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local open time.
    #[must_use]
    pub const fn market_open(&self) -> NaiveTime {
        self.market_open
    }

    /// Local close time.
    #[must_use]
    pub const fn market_close(&self) -> NaiveTime {
        self.market_close
    }

    /// Local time of the end-of-day batch.
    #[must_use]
    pub const fn end_of_day(&self) -> NaiveTime {
        self.end_of_day
    }

    /// Exchange-local date of an instant.
    #[must_use]
    pub fn trading_date(&self, at: Timestamp) -> NaiveDate {
        self.local(at).date_naive()
    }

    /// Exchange-local wall clock of an instant.
    #[must_use]
    pub fn local(&self, at: Timestamp) -> DateTime<FixedOffset> {
        at.as_datetime().with_timezone(&self.offset)
    }

    /// Returns true if `at` falls between open (inclusive) and close (exclusive).
    #[must_use]
    pub fn is_session_open(&self, at: Timestamp) -> bool {
        let time = self.local(at).time();
        time >= self.market_open && time < self.market_close
    }

    /// UTC instant of a local time on a local date.
    #[must_use]
    pub fn instant(&self, date: NaiveDate, time: NaiveTime) -> Timestamp {
        let local = NaiveDateTime::new(date, time);
        let utc = self
            .offset
            .from_local_datetime(&local)
            .single()
            .map_or_else(|| Utc.from_utc_datetime(&local), |dt| dt.with_timezone(&Utc));
        Timestamp::new(utc)
    }

    /// UTC bounds `[start, end)` of a local calendar day.
    #[must_use]
    pub fn day_bounds(&self, date: NaiveDate) -> (Timestamp, Timestamp) {
        let start = self.instant(date, NaiveTime::MIN);
        let end = Timestamp::new(start.as_datetime() + Duration::days(1));
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> SessionSchedule {
        SessionSchedule::new(
            FixedOffset::west_opt(5 * 3600).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
        )
    }

    #[test]
    fn trading_date_uses_local_offset() {
        let at = Timestamp::parse("2024-03-05T02:00:00Z").unwrap();
        assert_eq!(
            new_york().trading_date(at),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }

    #[test]
    fn session_window() {
        let schedule = new_york();
        assert!(schedule.is_session_open(Timestamp::parse("2024-03-04T15:00:00Z").unwrap()));
        assert!(!schedule.is_session_open(Timestamp::parse("2024-03-04T21:00:00Z").unwrap()));
    }

    #[test]
    fn day_bounds_span_local_midnights() {
        let (start, end) = new_york().day_bounds(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(start, Timestamp::parse("2024-03-04T05:00:00Z").unwrap());
        assert_eq!(end, Timestamp::parse("2024-03-05T05:00:00Z").unwrap());
    }
}
