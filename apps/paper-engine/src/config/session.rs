//! Trading session configuration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::services::SchedulerSettings;
use crate::domain::session::{HolidayCalendar, SessionSchedule, TradingCalendar};

/// Session times and scheduler tunables.
///
/// Times are exchange-local wall clock (`HH:MM` or `HH:MM:SS`) at a fixed UTC
/// offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Exchange offset from UTC in minutes (New York standard time is -300).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Session open.
    #[serde(default = "default_market_open")]
    pub market_open: String,
    /// Session close.
    #[serde(default = "default_market_close")]
    pub market_close: String,
    /// End-of-day batch time.
    #[serde(default = "default_end_of_day")]
    pub end_of_day: String,
    /// How often the driver checks for due phases.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Minimum gap between order sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Upper bound on one phase run.
    #[serde(default = "default_phase_timeout_secs")]
    pub phase_timeout_secs: u64,
    /// Terminal orders older than this are archival candidates.
    #[serde(default = "default_archive_after_days")]
    pub archive_after_days: u32,
    /// Flag archival candidates as archived.
    #[serde(default)]
    pub archive_enabled: bool,
    /// Market holidays (`YYYY-MM-DD`), in addition to weekends.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            market_open: default_market_open(),
            market_close: default_market_close(),
            end_of_day: default_end_of_day(),
            tick_interval_secs: default_tick_interval_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            phase_timeout_secs: default_phase_timeout_secs(),
            archive_after_days: default_archive_after_days(),
            archive_enabled: false,
            holidays: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Build the session schedule.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is out of range or a time does not parse.
    pub fn to_schedule(&self) -> Result<SessionSchedule, ConfigError> {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "session.utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })?;
        Ok(SessionSchedule::new(
            offset,
            parse_clock("session.market_open", &self.market_open)?,
            parse_clock("session.market_close", &self.market_close)?,
            parse_clock("session.end_of_day", &self.end_of_day)?,
        ))
    }

    /// Weekday calendar minus the configured holidays.
    #[must_use]
    pub fn calendar(&self) -> Arc<dyn TradingCalendar> {
        Arc::new(HolidayCalendar::new(self.holidays.iter().copied()))
    }

    /// Scheduler tunables.
    #[must_use]
    pub const fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            phase_timeout: Duration::from_secs(self.phase_timeout_secs),
            archive_after_days: self.archive_after_days,
            archive_enabled: self.archive_enabled,
        }
    }

    /// Driver tick interval.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Minimum gap between order sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn parse_clock(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| ConfigError::ValidationError(format!("{field} '{value}' is not a time: {e}")))
}

const fn default_utc_offset_minutes() -> i32 {
    -300
}

fn default_market_open() -> String {
    "09:30".to_string()
}

fn default_market_close() -> String {
    "16:00".to_string()
}

fn default_end_of_day() -> String {
    "16:30".to_string()
}

const fn default_tick_interval_secs() -> u64 {
    30
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

const fn default_phase_timeout_secs() -> u64 {
    300
}

const fn default_archive_after_days() -> u32 {
    30
}
