//! Day Session Scheduler
//!
//! Plain async methods for each phase of the trading day. Something external
//! (the [`SessionDriver`](super::SessionDriver) in production, the test itself
//! otherwise) decides when to call them.
//!
//! Every phase:
//!
//! - short-circuits with an empty report on a non-trading day, before touching
//!   the store
//! - holds a run lock keyed by `(phase, trading date)`; a concurrent second run
//!   is skipped and reported as an error
//! - runs under a timeout; the report keeps whatever was completed
//! - never returns `Err`: per-order and per-step failures land in `errors`

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::json;

use super::phase_lock::{PhaseGuard, PhaseLocks};
use crate::application::ports::{
    MarketDataPort, NotificationSink, PerformanceReconciliationPort, PortfolioError,
    PortfolioRepository, ReconciliationError, TradeSettlementPort,
};
use crate::application::use_cases::{ProcessOrderUseCase, publish_order_events};
use crate::domain::execution_simulation::ExecutionStatus;
use crate::domain::order_lifecycle::{
    CancelReason, Order, OrderError, OrderQuery, OrderRepository, OrderStatus, RepositoryError,
    TimeInForce,
};
use crate::domain::session::{
    DailyOrderSummary, EodProcessingResult, MaintenanceReport, MarketCloseReport,
    MarketOpenReport, SessionPhase, SessionSchedule, SweepReport, TradingCalendar,
};
use crate::domain::shared::{Money, OrderId, PortfolioId, Timestamp};

const WORKING: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Triggered];
const TERMINAL: [OrderStatus; 3] = [
    OrderStatus::Executed,
    OrderStatus::Cancelled,
    OrderStatus::Expired,
];

// ============================================================================
// Settings and Errors
// ============================================================================

/// Tunables for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Upper bound on a single phase run.
    pub phase_timeout: Duration,
    /// Terminal orders older than this many days are archival candidates.
    pub archive_after_days: u32,
    /// Flag candidates as archived instead of only counting them.
    pub archive_enabled: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            phase_timeout: Duration::from_secs(300),
            archive_after_days: 30,
            archive_enabled: false,
        }
    }
}

/// Failure inside a phase. Always rendered into the report's `errors`.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    /// Order store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Portfolio store failure.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Reconciliation collaborator failure.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// Illegal order transition.
    #[error("order transition: {0}")]
    Order(#[from] OrderError),

    /// Another run of the same phase holds the lock.
    #[error("{phase} for {date} is already running")]
    AlreadyRunning {
        /// Phase.
        phase: SessionPhase,
        /// Trading date.
        date: NaiveDate,
    },

    /// The phase exceeded its time budget.
    #[error("{phase} timed out after {seconds}s; partial results kept")]
    Timeout {
        /// Phase.
        phase: SessionPhase,
        /// Budget in seconds.
        seconds: u64,
    },
}

/// Common surface of the phase reports.
trait PhaseReport: Default {
    fn set_date(&mut self, date: NaiveDate);
    fn errors_mut(&mut self) -> &mut Vec<String>;
    fn set_elapsed(&mut self, elapsed_ms: u64);
}

macro_rules! phase_report {
    ($report:ty, $date:ident, $elapsed:ident) => {
        impl PhaseReport for $report {
            fn set_date(&mut self, date: NaiveDate) {
                self.$date = Some(date);
            }

            fn errors_mut(&mut self) -> &mut Vec<String> {
                &mut self.errors
            }

            fn set_elapsed(&mut self, elapsed_ms: u64) {
                self.$elapsed = elapsed_ms;
            }
        }
    };
}

phase_report!(MarketOpenReport, date, duration_ms);
phase_report!(MarketCloseReport, date, duration_ms);
phase_report!(MaintenanceReport, date, duration_ms);
phase_report!(SweepReport, date, duration_ms);
phase_report!(EodProcessingResult, processed_date, processing_time_ms);

/// A phase run that passed the calendar check and holds its lock.
struct PhaseRun<R> {
    phase: SessionPhase,
    report: R,
    started: Instant,
    _guard: PhaseGuard,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Runs the session phases against the order store and collaborators.
pub struct DaySessionScheduler<O, M, P, S, R>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
    R: PerformanceReconciliationPort,
{
    orders: Arc<O>,
    portfolios: Arc<P>,
    reconciler: Arc<R>,
    processor: Arc<ProcessOrderUseCase<O, M, P, S>>,
    notifications: Arc<dyn NotificationSink>,
    calendar: Arc<dyn TradingCalendar>,
    schedule: SessionSchedule,
    settings: SchedulerSettings,
    locks: PhaseLocks,
}

impl<O, M, P, S, R> DaySessionScheduler<O, M, P, S, R>
where
    O: OrderRepository,
    M: MarketDataPort,
    P: PortfolioRepository,
    S: TradeSettlementPort,
    R: PerformanceReconciliationPort,
{
    /// Create a scheduler. The order store and notification sink are shared
    /// with `processor`.
    pub fn new(
        processor: Arc<ProcessOrderUseCase<O, M, P, S>>,
        portfolios: Arc<P>,
        reconciler: Arc<R>,
        calendar: Arc<dyn TradingCalendar>,
        schedule: SessionSchedule,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            orders: Arc::clone(processor.orders()),
            notifications: Arc::clone(processor.notifications()),
            portfolios,
            reconciler,
            processor,
            calendar,
            schedule,
            settings,
            locks: PhaseLocks::new(),
        }
    }

    /// Local session times.
    #[must_use]
    pub const fn schedule(&self) -> &SessionSchedule {
        &self.schedule
    }

    /// Run locks, exposed so callers can check what is in flight.
    #[must_use]
    pub const fn locks(&self) -> &PhaseLocks {
        &self.locks
    }

    /// Returns true if the exchange trades on the local date of `as_of`.
    #[must_use]
    pub fn is_trading_day(&self, as_of: Timestamp) -> bool {
        self.calendar
            .is_trading_day(self.schedule.trading_date(as_of))
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Expire PENDING DAY and GTC orders whose expiry has passed.
    pub async fn run_market_open(&self, as_of: Timestamp) -> MarketOpenReport {
        let mut run = match self.begin(SessionPhase::MarketOpen, as_of) {
            Ok(run) => run,
            Err(report) => return report,
        };
        let outcome = tokio::time::timeout(
            self.settings.phase_timeout,
            self.market_open(as_of, &mut run.report),
        )
        .await;
        self.finish(run, outcome)
    }

    /// Cancel every working DAY order.
    pub async fn run_market_close(&self, as_of: Timestamp) -> MarketCloseReport {
        let mut run = match self.begin(SessionPhase::MarketClose, as_of) {
            Ok(run) => run,
            Err(report) => return report,
        };
        let outcome = tokio::time::timeout(
            self.settings.phase_timeout,
            self.market_close(&mut run.report),
        )
        .await;
        self.finish(run, outcome)
    }

    /// Expire stale working orders and validate execution state.
    pub async fn run_hourly_maintenance(&self, as_of: Timestamp) -> MaintenanceReport {
        let mut run = match self.begin(SessionPhase::HourlyMaintenance, as_of) {
            Ok(run) => run,
            Err(report) => return report,
        };
        let outcome = tokio::time::timeout(
            self.settings.phase_timeout,
            self.hourly_maintenance(as_of, &mut run.report),
        )
        .await;
        self.finish(run, outcome)
    }

    /// End-of-day batch: expiry, DAY safety net, GTC rollover count,
    /// reconciliation, summaries and archival.
    pub async fn run_end_of_day(&self, as_of: Timestamp) -> EodProcessingResult {
        let mut run = match self.begin(SessionPhase::EndOfDay, as_of) {
            Ok(run) => run,
            Err(report) => return report,
        };
        let outcome = tokio::time::timeout(
            self.settings.phase_timeout,
            self.end_of_day(as_of, &mut run.report),
        )
        .await;
        self.finish(run, outcome)
    }

    /// Give every working order one execution attempt.
    ///
    /// Portfolios run concurrently; orders of one portfolio run one after
    /// another so cash and positions are never updated by two fills at once.
    pub async fn run_order_sweep(&self, as_of: Timestamp) -> SweepReport {
        let mut run = match self.begin(SessionPhase::OrderSweep, as_of) {
            Ok(run) => run,
            Err(report) => return report,
        };
        let outcome = tokio::time::timeout(
            self.settings.phase_timeout,
            self.order_sweep(&mut run.report),
        )
        .await;
        self.finish(run, outcome)
    }

    // ========================================================================
    // Phase Bodies
    // ========================================================================

    async fn market_open(
        &self,
        as_of: Timestamp,
        report: &mut MarketOpenReport,
    ) -> Result<(), PhaseError> {
        let query = OrderQuery::all()
            .with_statuses(&[OrderStatus::Pending])
            .with_time_in_force(&[TimeInForce::Day, TimeInForce::Gtc]);
        let orders = self.orders.find(&query).await?;
        report.orders_checked = orders.len();

        for mut order in orders {
            if !order.is_expired_at(as_of) {
                report.orders_active += 1;
                continue;
            }
            match self.expire(&mut order).await {
                Ok(()) => report.orders_expired += 1,
                Err(e) => record_order_error(&mut report.errors, &order, "expire", &e),
            }
        }

        self.notifications.broadcast(
            SessionPhase::MarketOpen.as_str(),
            json!({
                "date": report.date.map(|d| d.to_string()),
                "orders_checked": report.orders_checked,
                "orders_expired": report.orders_expired,
                "orders_active": report.orders_active,
            }),
        );
        Ok(())
    }

    async fn market_close(&self, report: &mut MarketCloseReport) -> Result<(), PhaseError> {
        let query = OrderQuery::all()
            .with_statuses(&WORKING)
            .with_time_in_force(&[TimeInForce::Day]);
        let orders = self.orders.find(&query).await?;
        report.orders_checked = orders.len();

        for mut order in orders {
            match self.cancel(&mut order, CancelReason::market_close()).await {
                Ok(()) => report.orders_cancelled += 1,
                Err(e) => record_order_error(&mut report.errors, &order, "cancel", &e),
            }
        }

        self.notifications.broadcast(
            SessionPhase::MarketClose.as_str(),
            json!({
                "date": report.date.map(|d| d.to_string()),
                "orders_checked": report.orders_checked,
                "orders_cancelled": report.orders_cancelled,
            }),
        );
        Ok(())
    }

    async fn hourly_maintenance(
        &self,
        as_of: Timestamp,
        report: &mut MaintenanceReport,
    ) -> Result<(), PhaseError> {
        let orders = self
            .orders
            .find(&OrderQuery::all().with_statuses(&WORKING))
            .await?;

        for mut order in orders {
            report.orders_validated += 1;
            report.integrity_issues.extend(
                order
                    .integrity_issues()
                    .into_iter()
                    .map(|issue| format!("order {}: {issue}", order.id())),
            );

            if order.is_expired_at(as_of) {
                match self.expire(&mut order).await {
                    Ok(()) => report.orders_expired += 1,
                    Err(e) => record_order_error(&mut report.errors, &order, "expire", &e),
                }
            }
        }

        if !report.integrity_issues.is_empty() {
            tracing::warn!(
                issues = report.integrity_issues.len(),
                "Order integrity validation found issues"
            );
        }
        Ok(())
    }

    async fn end_of_day(
        &self,
        as_of: Timestamp,
        report: &mut EodProcessingResult,
    ) -> Result<(), PhaseError> {
        let mut touched = HashSet::new();

        if let Err(e) = self.eod_expire_and_close(as_of, report, &mut touched).await {
            record_step_error(&mut report.errors, "expiry sweep", &e);
        }
        if let Err(e) = self.eod_count_rollovers(report, &mut touched).await {
            record_step_error(&mut report.errors, "GTC rollover", &e);
        }

        let date = self.schedule.trading_date(as_of);
        match self.portfolios.portfolio_ids().await {
            Ok(portfolio_ids) => {
                let pnl = self.eod_reconcile(&portfolio_ids, report).await;
                self.eod_summaries(date, &portfolio_ids, &pnl, report, &mut touched)
                    .await;
            }
            Err(e) => {
                record_step_error(&mut report.errors, "portfolio lookup", &PhaseError::from(e));
            }
        }

        if let Err(e) = self.eod_archive(as_of, report, &mut touched).await {
            record_step_error(&mut report.errors, "archival", &e);
        }

        report.total_orders_processed = touched.len();
        self.notifications.broadcast(
            SessionPhase::EndOfDay.as_str(),
            json!({
                "date": date.to_string(),
                "total_orders_processed": report.total_orders_processed,
                "day_orders_cancelled": report.day_orders_cancelled,
                "gtc_orders_rolled_over": report.gtc_orders_rolled_over,
                "expired_orders_handled": report.expired_orders_handled,
                "portfolios_reconciled": report.portfolios_reconciled,
                "errors": report.errors.len(),
            }),
        );
        Ok(())
    }

    async fn order_sweep(&self, report: &mut SweepReport) -> Result<(), PhaseError> {
        let orders = self
            .orders
            .find(&OrderQuery::all().with_statuses(&WORKING))
            .await?;

        let mut by_portfolio: HashMap<PortfolioId, Vec<Order>> = HashMap::new();
        for order in orders {
            by_portfolio
                .entry(order.portfolio_id().clone())
                .or_default()
                .push(order);
        }
        report.portfolios = by_portfolio.len();

        let runs = by_portfolio
            .into_values()
            .map(|orders| self.sweep_portfolio(orders));
        for portfolio_report in join_all(runs).await {
            report.merge(SweepReport {
                portfolios: 0,
                ..portfolio_report
            });
        }
        Ok(())
    }

    // ========================================================================
    // End-of-Day Steps
    // ========================================================================

    async fn eod_expire_and_close(
        &self,
        as_of: Timestamp,
        report: &mut EodProcessingResult,
        touched: &mut HashSet<OrderId>,
    ) -> Result<(), PhaseError> {
        let orders = self
            .orders
            .find(&OrderQuery::all().with_statuses(&WORKING))
            .await?;

        for mut order in orders {
            if order.is_expired_at(as_of) {
                match self.expire(&mut order).await {
                    Ok(()) => {
                        report.expired_orders_handled += 1;
                        touched.insert(order.id().clone());
                    }
                    Err(e) => record_order_error(&mut report.errors, &order, "expire", &e),
                }
            } else if order.time_in_force() == TimeInForce::Day {
                match self.cancel(&mut order, CancelReason::market_close()).await {
                    Ok(()) => {
                        report.day_orders_cancelled += 1;
                        touched.insert(order.id().clone());
                    }
                    Err(e) => record_order_error(&mut report.errors, &order, "cancel", &e),
                }
            }
        }

        if report.day_orders_cancelled > 0 {
            tracing::warn!(
                count = report.day_orders_cancelled,
                "DAY orders were still working at end of day"
            );
        }
        Ok(())
    }

    async fn eod_count_rollovers(
        &self,
        report: &mut EodProcessingResult,
        touched: &mut HashSet<OrderId>,
    ) -> Result<(), PhaseError> {
        let query = OrderQuery::all()
            .with_statuses(&WORKING)
            .with_time_in_force(&[TimeInForce::Gtc]);
        let orders = self.orders.find(&query).await?;
        report.gtc_orders_rolled_over = orders.len();
        touched.extend(orders.iter().map(|o| o.id().clone()));
        Ok(())
    }

    /// Reconcile each portfolio, returning the session P&L read beforehand.
    async fn eod_reconcile(
        &self,
        portfolio_ids: &[PortfolioId],
        report: &mut EodProcessingResult,
    ) -> HashMap<PortfolioId, Money> {
        let mut pnl = HashMap::new();
        for portfolio_id in portfolio_ids {
            match self.portfolios.find_snapshot(portfolio_id).await {
                Ok(Some(snapshot)) => {
                    pnl.insert(portfolio_id.clone(), snapshot.daily_pnl);
                }
                Ok(None) => {}
                Err(e) => {
                    let e = PhaseError::from(e);
                    record_portfolio_error(&mut report.errors, portfolio_id, "snapshot", &e);
                }
            }

            match self.reconciler.reconcile(portfolio_id).await {
                Ok(()) => report.portfolios_reconciled += 1,
                Err(e) => {
                    let e = PhaseError::from(e);
                    record_portfolio_error(&mut report.errors, portfolio_id, "reconcile", &e);
                }
            }
        }
        pnl
    }

    async fn eod_summaries(
        &self,
        date: NaiveDate,
        portfolio_ids: &[PortfolioId],
        pnl: &HashMap<PortfolioId, Money>,
        report: &mut EodProcessingResult,
        touched: &mut HashSet<OrderId>,
    ) {
        let (start, end) = self.schedule.day_bounds(date);
        for portfolio_id in portfolio_ids {
            let query = OrderQuery::all()
                .for_portfolio(portfolio_id.clone())
                .active_between(start, end);
            let orders = match self.orders.find(&query).await {
                Ok(orders) => orders,
                Err(e) => {
                    let e = PhaseError::from(e);
                    record_portfolio_error(&mut report.errors, portfolio_id, "summary", &e);
                    continue;
                }
            };
            touched.extend(orders.iter().map(|o| o.id().clone()));
            let session_pnl = pnl.get(portfolio_id).copied().unwrap_or(Money::ZERO);
            report
                .performance_summaries
                .push(DailyOrderSummary::from_orders(
                    date,
                    portfolio_id.clone(),
                    &orders,
                    (start, end),
                    session_pnl,
                ));
        }
    }

    async fn eod_archive(
        &self,
        as_of: Timestamp,
        report: &mut EodProcessingResult,
        touched: &mut HashSet<OrderId>,
    ) -> Result<(), PhaseError> {
        let horizon = chrono::Duration::days(i64::from(self.settings.archive_after_days));
        let cutoff = Timestamp::new(as_of.as_datetime() - horizon);

        let orders = self
            .orders
            .find(&OrderQuery::all().with_statuses(&TERMINAL))
            .await?;
        let candidates: Vec<Order> = orders
            .into_iter()
            .filter(|o| o.terminal_at().is_some_and(|at| at < cutoff))
            .collect();
        report.archival_candidates = candidates.len();

        if !self.settings.archive_enabled {
            return Ok(());
        }
        for mut order in candidates {
            let archived = match order.mark_archived() {
                Ok(()) => self.orders.save(&order).await.map_err(PhaseError::from),
                Err(e) => Err(e.into()),
            };
            match archived {
                Ok(()) => {
                    report.orders_archived += 1;
                    touched.insert(order.id().clone());
                }
                Err(e) => record_order_error(&mut report.errors, &order, "archive", &e),
            }
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn sweep_portfolio(&self, orders: Vec<Order>) -> SweepReport {
        let mut report = SweepReport::default();
        for order in orders {
            let order_id = order.id().clone();
            match self.processor.execute(order).await {
                Ok(outcome) => {
                    report.orders_processed += 1;
                    if outcome.rejected() {
                        report.orders_rejected += 1;
                        continue;
                    }
                    match outcome.result.status {
                        ExecutionStatus::Filled => report.orders_filled += 1,
                        ExecutionStatus::PartiallyFilled => report.orders_partially_filled += 1,
                        ExecutionStatus::Queued => report.orders_queued += 1,
                        ExecutionStatus::Cancelled => report.orders_cancelled += 1,
                        ExecutionStatus::Failed => report.orders_failed += 1,
                    }
                }
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Order processing failed");
                    report.errors.push(format!("order {order_id}: process: {e}"));
                }
            }
        }
        report
    }

    async fn expire(&self, order: &mut Order) -> Result<(), PhaseError> {
        order.expire()?;
        self.orders.save(order).await?;
        publish_order_events(self.notifications.as_ref(), order);
        Ok(())
    }

    async fn cancel(&self, order: &mut Order, reason: CancelReason) -> Result<(), PhaseError> {
        order.cancel(reason)?;
        self.orders.save(order).await?;
        publish_order_events(self.notifications.as_ref(), order);
        Ok(())
    }

    fn begin<T: PhaseReport>(
        &self,
        phase: SessionPhase,
        as_of: Timestamp,
    ) -> Result<PhaseRun<T>, T> {
        let date = self.schedule.trading_date(as_of);
        let mut report = T::default();
        report.set_date(date);

        if !self.calendar.is_trading_day(date) {
            tracing::info!(phase = %phase, date = %date, "Not a trading day, skipping phase");
            return Err(report);
        }

        let Some(guard) = self.locks.try_acquire(phase, date) else {
            let e = PhaseError::AlreadyRunning { phase, date };
            tracing::info!(phase = %phase, date = %date, "Phase already running, skipping");
            report.errors_mut().push(e.to_string());
            return Err(report);
        };

        tracing::info!(phase = %phase, date = %date, "Session phase starting");
        Ok(PhaseRun {
            phase,
            report,
            started: Instant::now(),
            _guard: guard,
        })
    }

    fn finish<T: PhaseReport>(
        &self,
        run: PhaseRun<T>,
        outcome: Result<Result<(), PhaseError>, tokio::time::error::Elapsed>,
    ) -> T {
        let PhaseRun {
            phase,
            mut report,
            started,
            _guard,
        } = run;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(PhaseError::Timeout {
                phase,
                seconds: self.settings.phase_timeout.as_secs(),
            }),
        };
        if let Some(e) = failure {
            tracing::warn!(phase = %phase, error = %e, "Session phase failed");
            report.errors_mut().push(e.to_string());
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        report.set_elapsed(elapsed_ms);
        tracing::info!(
            phase = %phase,
            elapsed_ms,
            errors = report.errors_mut().len(),
            "Session phase complete"
        );
        report
    }
}

fn record_order_error(errors: &mut Vec<String>, order: &Order, action: &str, e: &PhaseError) {
    tracing::warn!(order_id = %order.id(), action, error = %e, "Order update failed");
    errors.push(format!("order {}: {action}: {e}", order.id()));
}

fn record_portfolio_error(
    errors: &mut Vec<String>,
    portfolio_id: &PortfolioId,
    action: &str,
    e: &PhaseError,
) {
    tracing::warn!(portfolio_id = %portfolio_id, action, error = %e, "Portfolio step failed");
    errors.push(format!("portfolio {portfolio_id}: {action}: {e}"));
}

fn record_step_error(errors: &mut Vec<String>, step: &str, e: &PhaseError) {
    tracing::warn!(step, error = %e, "End-of-day step failed");
    errors.push(format!("{step}: {e}"));
}
