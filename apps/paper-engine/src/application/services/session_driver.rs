//! Session Driver
//!
//! Background ticker that works out which phases are due from the local
//! session times and calls the scheduler. Runs until its cancellation token
//! fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike};
use tokio_util::sync::CancellationToken;

use super::day_session_scheduler::DaySessionScheduler;
use crate::application::ports::{
    MarketDataPort, PerformanceReconciliationPort, PortfolioRepository, TradeSettlementPort,
};
use crate::domain::order_lifecycle::OrderRepository;
use crate::domain::session::{SessionPhase, SessionSchedule};
use crate::domain::shared::Timestamp;

/// Tracks which phases already ran so each fires once per slot.
///
/// Market open, close and end of day fire once per local date, maintenance
/// once per local hour of the session, and the sweep every `sweep_interval`
/// while the session is open.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    schedule: SessionSchedule,
    sweep_interval: chrono::Duration,
    last_open: Option<NaiveDate>,
    last_close: Option<NaiveDate>,
    last_eod: Option<NaiveDate>,
    last_hourly: Option<(NaiveDate, u32)>,
    last_sweep: Option<Timestamp>,
}

impl PhaseClock {
    /// Create a clock with nothing run yet.
    #[must_use]
    pub fn new(schedule: SessionSchedule, sweep_interval: Duration) -> Self {
        Self {
            schedule,
            sweep_interval: chrono::Duration::from_std(sweep_interval)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
            last_open: None,
            last_close: None,
            last_eod: None,
            last_hourly: None,
            last_sweep: None,
        }
    }

    /// Phases due at `now`, in execution order. Marks them as run.
    pub fn due(&mut self, now: Timestamp) -> Vec<SessionPhase> {
        let local = self.schedule.local(now);
        let date = local.date_naive();
        let time = local.time();
        let mut due = Vec::new();

        if self.schedule.is_session_open(now) {
            if self.last_open != Some(date) {
                self.last_open = Some(date);
                due.push(SessionPhase::MarketOpen);
            }

            let hour = (date, time.hour());
            if self.last_hourly != Some(hour) {
                self.last_hourly = Some(hour);
                due.push(SessionPhase::HourlyMaintenance);
            }

            let sweep_due = self
                .last_sweep
                .is_none_or(|last| now.as_datetime() - last.as_datetime() >= self.sweep_interval);
            if sweep_due {
                self.last_sweep = Some(now);
                due.push(SessionPhase::OrderSweep);
            }
        }

        if time >= self.schedule.market_close() && self.last_close != Some(date) {
            self.last_close = Some(date);
            due.push(SessionPhase::MarketClose);
        }

        if time >= self.schedule.end_of_day() && self.last_eod != Some(date) {
            self.last_eod = Some(date);
            due.push(SessionPhase::EndOfDay);
        }

        due
    }
}

/// Drives a [`DaySessionScheduler`] from wall-clock time.
pub struct SessionDriver<O, M, P, S, R>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
    R: PerformanceReconciliationPort,
{
    scheduler: Arc<DaySessionScheduler<O, M, P, S, R>>,
    clock: PhaseClock,
    tick: Duration,
}

impl<O, M, P, S, R> SessionDriver<O, M, P, S, R>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
    R: PerformanceReconciliationPort,
{
    /// Create a driver that checks the clock every `tick`.
    pub fn new(
        scheduler: Arc<DaySessionScheduler<O, M, P, S, R>>,
        tick: Duration,
        sweep_interval: Duration,
    ) -> Self {
        let clock = PhaseClock::new(*scheduler.schedule(), sweep_interval);
        Self {
            scheduler,
            clock,
            tick,
        }
    }

    /// Tick until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(tick_secs = self.tick.as_secs(), "Session driver started");
        let mut interval = tokio::time::interval(self.tick);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Timestamp::now();
                    for phase in self.clock.due(now) {
                        self.dispatch(phase, now).await;
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::info!("Session driver shutting down");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, phase: SessionPhase, now: Timestamp) {
        match phase {
            SessionPhase::MarketOpen => {
                let report = self.scheduler.run_market_open(now).await;
                tracing::info!(
                    phase = %phase,
                    expired = report.orders_expired,
                    active = report.orders_active,
                    errors = report.errors.len(),
                    "Market open processed"
                );
            }
            SessionPhase::MarketClose => {
                let report = self.scheduler.run_market_close(now).await;
                tracing::info!(
                    phase = %phase,
                    cancelled = report.orders_cancelled,
                    errors = report.errors.len(),
                    "Market close processed"
                );
            }
            SessionPhase::HourlyMaintenance => {
                let report = self.scheduler.run_hourly_maintenance(now).await;
                tracing::info!(
                    phase = %phase,
                    expired = report.orders_expired,
                    validated = report.orders_validated,
                    issues = report.integrity_issues.len(),
                    errors = report.errors.len(),
                    "Hourly maintenance processed"
                );
            }
            SessionPhase::EndOfDay => {
                let report = self.scheduler.run_end_of_day(now).await;
                tracing::info!(
                    phase = %phase,
                    processed = report.total_orders_processed,
                    reconciled = report.portfolios_reconciled,
                    elapsed_ms = report.processing_time_ms,
                    errors = report.errors.len(),
                    "End of day processed"
                );
            }
            SessionPhase::OrderSweep => {
                let report = self.scheduler.run_order_sweep(now).await;
                tracing::debug!(
                    phase = %phase,
                    processed = report.orders_processed,
                    filled = report.orders_filled,
                    errors = report.errors.len(),
                    "Order sweep processed"
                );
            }
        }
    }
}
