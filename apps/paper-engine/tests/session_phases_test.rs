//! Session Phase Integration Tests
//!
//! Drives `DaySessionScheduler` phases directly against the in-memory
//! adapters:
//! - Market close cancels DAY orders, GTC orders survive
//! - Market open and hourly maintenance expire orders past their expiry
//! - End of day reconciles portfolios and builds daily summaries
//! - Non-trading days leave the store untouched
//! - Run-lock contention skips the second run
//! - The order sweep processes every portfolio
//! - Store and reconciliation failures are reported, partial work is kept

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use common::{
    AlwaysClosed, AlwaysOpen, FailingReconciler, Harness, command, limit_buy, market_buy,
    new_york,
};
use paper_engine::application::ports::PortfolioRepository;
use paper_engine::application::services::SchedulerSettings;
use paper_engine::domain::order_lifecycle::{
    Order, OrderQuery, OrderRepository, OrderSide, OrderStatus, OrderType, TimeInForce,
};
use paper_engine::domain::session::SessionPhase;
use paper_engine::domain::shared::{Money, Timestamp};
use rust_decimal_macros::dec;

fn yesterday() -> Timestamp {
    Timestamp::new(Utc::now() - Duration::days(1))
}

fn shortly() -> Timestamp {
    Timestamp::new(Utc::now() + Duration::seconds(1))
}

// ============================================
// Market Open / Close
// ============================================

#[tokio::test]
async fn test_market_close_cancels_day_orders_only() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let day = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let gtc = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Gtc));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_market_close(Timestamp::now()).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.orders_checked, 1);
    assert_eq!(report.orders_cancelled, 1);

    let day = harness.orders.get(day.id()).unwrap();
    assert_eq!(day.status(), OrderStatus::Cancelled);
    assert_eq!(
        day.cancellation_reason(),
        Some("Day order cancelled at market close")
    );
    assert_eq!(
        harness.orders.get(gtc.id()).unwrap().status(),
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_market_open_expires_orders_past_expiry() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let stale = harness.add(
        Order::new(
            command(&portfolio, "AAPL", OrderSide::Buy, OrderType::Limit, 10)
                .with_limit_price(Money::new(dec!(140)))
                .with_time_in_force(TimeInForce::Gtc)
                .with_expiry(yesterday()),
        )
        .unwrap(),
    );
    let fresh = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Gtc));
    let mut events = harness.sink.subscribe();
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_market_open(Timestamp::now()).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.orders_checked, 2);
    assert_eq!(report.orders_expired, 1);
    assert_eq!(report.orders_active, 1);

    let stale = harness.orders.get(stale.id()).unwrap();
    assert_eq!(stale.status(), OrderStatus::Expired);
    assert_eq!(stale.cancellation_reason(), Some("Order expired"));
    assert_eq!(
        harness.orders.get(fresh.id()).unwrap().status(),
        OrderStatus::Pending
    );

    let published: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|n| n.event_type)
        .collect();
    assert_eq!(published, vec!["order_expired", "market_open"]);
}

#[tokio::test]
async fn test_hourly_maintenance_validates_and_expires_stale_orders() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let stale = harness.add(
        Order::new(
            command(&portfolio, "AAPL", OrderSide::Buy, OrderType::Limit, 10)
                .with_limit_price(Money::new(dec!(140)))
                .with_time_in_force(TimeInForce::Gtc)
                .with_expiry(yesterday()),
        )
        .unwrap(),
    );
    harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_hourly_maintenance(Timestamp::now()).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.orders_validated, 2);
    assert_eq!(report.orders_expired, 1);
    assert!(report.integrity_issues.is_empty());
    assert_eq!(
        harness.orders.get(stale.id()).unwrap().status(),
        OrderStatus::Expired
    );
}

// ============================================
// End of Day
// ============================================

#[tokio::test]
async fn test_end_of_day_reconciles_and_summarizes() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    harness.market.set_price("AAPL", dec!(150.00));

    let filled = harness.add(market_buy(&portfolio, "AAPL", 100));
    harness.processor.execute(filled).await.unwrap();
    let day = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let gtc = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Gtc));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let as_of = Timestamp::now();
    let report = scheduler.run_end_of_day(as_of).await;

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.processed_date, Some(new_york().trading_date(as_of)));
    assert_eq!(report.day_orders_cancelled, 1);
    assert_eq!(report.gtc_orders_rolled_over, 1);
    assert_eq!(report.expired_orders_handled, 0);
    assert_eq!(report.portfolios_reconciled, 1);
    assert_eq!(report.total_orders_processed, 3);
    assert_eq!(report.archival_candidates, 0);

    assert_eq!(report.performance_summaries.len(), 1);
    let summary = &report.performance_summaries[0];
    assert_eq!(summary.portfolio_id, portfolio);
    assert_eq!(summary.total_orders, 3);
    assert_eq!(summary.executed_orders, 1);
    assert_eq!(summary.cancelled_orders, 1);
    assert_eq!(summary.commissions, Money::new(dec!(15.51)));
    assert_eq!(summary.total_value, Money::new(dec!(15007.50)));
    // Marked at the fill price, the day's loss is the commission.
    assert_eq!(summary.pnl, Money::new(dec!(-15.51)));

    assert_eq!(
        harness.orders.get(day.id()).unwrap().status(),
        OrderStatus::Cancelled
    );
    assert_eq!(
        harness.orders.get(gtc.id()).unwrap().status(),
        OrderStatus::Pending
    );

    // Reconciliation rolled the baseline.
    let snapshot = harness.ledger.find_snapshot(&portfolio).await.unwrap().unwrap();
    assert_eq!(snapshot.daily_pnl, Money::ZERO);
}

#[tokio::test]
async fn test_end_of_day_archives_old_terminal_orders_when_enabled() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let mut cancelled = limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Gtc);
    cancelled
        .cancel(paper_engine::domain::order_lifecycle::CancelReason::user_requested())
        .unwrap();
    let cancelled = harness.add(cancelled);
    let scheduler = harness.scheduler_with(
        Arc::new(AlwaysOpen),
        SchedulerSettings {
            archive_after_days: 0,
            archive_enabled: true,
            ..SchedulerSettings::default()
        },
    );

    let report = scheduler.run_end_of_day(shortly()).await;

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.archival_candidates, 1);
    assert_eq!(report.orders_archived, 1);

    let stored = harness.orders.get(cancelled.id()).unwrap();
    assert!(stored.archived_at().is_some());
    let visible = harness.orders.find(&OrderQuery::all()).await.unwrap();
    assert!(visible.is_empty());
}

#[tokio::test]
async fn test_end_of_day_only_counts_archival_candidates_by_default() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let mut expired = limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Gtc);
    expired.expire().unwrap();
    let expired = harness.add(expired);
    let scheduler = harness.scheduler_with(
        Arc::new(AlwaysOpen),
        SchedulerSettings {
            archive_after_days: 0,
            ..SchedulerSettings::default()
        },
    );

    let report = scheduler.run_end_of_day(shortly()).await;

    assert_eq!(report.archival_candidates, 1);
    assert_eq!(report.orders_archived, 0);
    assert!(harness.orders.get(expired.id()).unwrap().archived_at().is_none());
}

#[tokio::test]
async fn test_non_trading_day_leaves_store_untouched() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let day = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let scheduler = harness.scheduler(Arc::new(AlwaysClosed));
    let as_of = Timestamp::now();

    let report = scheduler.run_end_of_day(as_of).await;

    assert_eq!(report.total_orders_processed, 0);
    assert!(report.errors.is_empty());
    assert!(report.performance_summaries.is_empty());
    assert_eq!(report.portfolios_reconciled, 0);
    assert_eq!(report.processed_date, Some(new_york().trading_date(as_of)));

    let close = scheduler.run_market_close(as_of).await;
    assert_eq!(close.orders_cancelled, 0);

    let stored = harness.orders.get(day.id()).unwrap();
    assert_eq!(stored.status(), OrderStatus::Pending);
    assert_eq!(stored.updated_at(), day.updated_at());
}

// ============================================
// Run Locks
// ============================================

#[tokio::test]
async fn test_concurrent_run_of_same_phase_is_skipped() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let day = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));
    let as_of = Timestamp::now();
    let date = scheduler.schedule().trading_date(as_of);

    let guard = scheduler
        .locks()
        .try_acquire(SessionPhase::MarketClose, date)
        .unwrap();

    let skipped = scheduler.run_market_close(as_of).await;
    assert_eq!(skipped.orders_cancelled, 0);
    assert_eq!(skipped.errors.len(), 1);
    assert!(skipped.errors[0].contains("already running"));
    assert_eq!(
        harness.orders.get(day.id()).unwrap().status(),
        OrderStatus::Pending
    );

    // Other phases are not blocked.
    let open = scheduler.run_market_open(as_of).await;
    assert!(open.errors.is_empty());

    drop(guard);
    let report = scheduler.run_market_close(as_of).await;
    assert!(report.errors.is_empty());
    assert_eq!(report.orders_cancelled, 1);
    assert!(!scheduler.locks().is_running(SessionPhase::MarketClose, date));
}

// ============================================
// Order Sweep
// ============================================

#[tokio::test]
async fn test_sweep_processes_every_portfolio() {
    let harness = Harness::new();
    let first = harness.open_portfolio("pf-1", dec!(100000));
    let second = harness.open_portfolio("pf-2", dec!(100000));
    harness.market.set_price("AAPL", dec!(150.00));
    harness.market.set_price("MSFT", dec!(400.00));

    let a = harness.add(market_buy(&first, "AAPL", 10));
    let b = harness.add(market_buy(&first, "MSFT", 5));
    let c = harness.add(market_buy(&second, "AAPL", 20));
    let queued = harness.add(limit_buy(&second, "MSFT", 5, dec!(300), TimeInForce::Gtc));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_order_sweep(Timestamp::now()).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.portfolios, 2);
    assert_eq!(report.orders_processed, 4);
    assert_eq!(report.orders_filled, 3);
    assert_eq!(report.orders_queued, 1);

    for id in [a.id(), b.id(), c.id()] {
        assert_eq!(
            harness.orders.get(id).unwrap().status(),
            OrderStatus::Executed
        );
    }
    assert_eq!(
        harness.orders.get(queued.id()).unwrap().status(),
        OrderStatus::Pending
    );
    assert_eq!(harness.ledger.trade_count(&first), 2);
    assert_eq!(harness.ledger.trade_count(&second), 1);
}

#[tokio::test]
async fn test_sweep_counts_risk_rejections() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(1000));
    harness.market.set_price("AAPL", dec!(150.00));
    let order = harness.add(market_buy(&portfolio, "AAPL", 100));
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_order_sweep(Timestamp::now()).await;

    assert_eq!(report.orders_processed, 1);
    assert_eq!(report.orders_rejected, 1);
    assert_eq!(report.orders_filled, 0);
    assert_eq!(
        harness.orders.get(order.id()).unwrap().status(),
        OrderStatus::Cancelled
    );
}

// ============================================
// Failures
// ============================================

#[tokio::test]
async fn test_end_of_day_reports_reconciliation_failure_and_keeps_summaries() {
    let harness = Harness::new();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    harness.market.set_price("AAPL", dec!(150.00));
    let filled = harness.add(market_buy(&portfolio, "AAPL", 100));
    harness.processor.execute(filled).await.unwrap();
    harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let scheduler = harness.scheduler_reconciling_with(
        Arc::new(FailingReconciler),
        Arc::new(AlwaysOpen),
        SchedulerSettings::default(),
    );

    let report = scheduler.run_end_of_day(Timestamp::now()).await;

    assert_eq!(
        report.errors,
        vec!["portfolio pf-1: reconcile: Reconciliation failed: performance service down"]
    );
    assert_eq!(report.portfolios_reconciled, 0);
    assert_eq!(report.day_orders_cancelled, 1);
    assert_eq!(report.total_orders_processed, 2);
    assert_eq!(report.performance_summaries.len(), 1);
    assert_eq!(report.performance_summaries[0].pnl, Money::new(dec!(-15.51)));

    // The baseline was not rolled.
    let snapshot = harness.ledger.find_snapshot(&portfolio).await.unwrap().unwrap();
    assert_eq!(snapshot.daily_pnl, Money::new(dec!(-15.51)));
}

#[tokio::test]
async fn test_end_of_day_runs_every_step_when_the_store_is_down() {
    let harness = Harness::faulty();
    harness.open_portfolio("pf-1", dec!(100000));
    harness.orders.fail_finds(true);
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_end_of_day(Timestamp::now()).await;

    assert_eq!(
        report.errors,
        vec![
            "expiry sweep: Order store failure: connection refused",
            "GTC rollover: Order store failure: connection refused",
            "portfolio pf-1: summary: Order store failure: connection refused",
            "archival: Order store failure: connection refused",
        ]
    );
    assert_eq!(report.portfolios_reconciled, 1);
    assert!(report.performance_summaries.is_empty());
    assert_eq!(report.total_orders_processed, 0);
}

#[tokio::test]
async fn test_market_close_records_failed_cancel_and_continues() {
    let harness = Harness::faulty();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    let first = harness.add(limit_buy(&portfolio, "AAPL", 10, dec!(140), TimeInForce::Day));
    let second = harness.add(limit_buy(&portfolio, "MSFT", 10, dec!(300), TimeInForce::Day));
    harness.orders.fail_saves(1);
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_market_close(Timestamp::now()).await;

    assert_eq!(report.orders_checked, 2);
    assert_eq!(report.orders_cancelled, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("order "));
    assert!(
        report.errors[0].ends_with(": cancel: Order store failure: db hiccup"),
        "{}",
        report.errors[0]
    );

    let mut statuses: Vec<OrderStatus> = [first.id(), second.id()]
        .into_iter()
        .map(|id| harness.orders.get(id).unwrap().status())
        .collect();
    statuses.sort_by_key(|s| s.to_string());
    assert_eq!(statuses, vec![OrderStatus::Cancelled, OrderStatus::Pending]);
}

#[tokio::test]
async fn test_sweep_reports_failed_order_and_next_sweep_records_its_fill() {
    let harness = Harness::faulty();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    harness.market.set_price("AAPL", dec!(150.00));
    harness.market.set_price("MSFT", dec!(400.00));
    let a = harness.add(market_buy(&portfolio, "AAPL", 10));
    let b = harness.add(market_buy(&portfolio, "MSFT", 5));
    harness.orders.fail_saves(1);
    let scheduler = harness.scheduler(Arc::new(AlwaysOpen));

    let report = scheduler.run_order_sweep(Timestamp::now()).await;

    assert_eq!(report.orders_processed, 1);
    assert_eq!(report.orders_filled, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0].ends_with(": process: Order store failure: db hiccup"),
        "{}",
        report.errors[0]
    );
    assert_eq!(harness.ledger.trade_count(&portfolio), 2);

    let report = scheduler.run_order_sweep(Timestamp::now()).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.orders_processed, 1);
    assert_eq!(report.orders_filled, 1);
    for id in [a.id(), b.id()] {
        assert_eq!(
            harness.orders.get(id).unwrap().status(),
            OrderStatus::Executed
        );
    }
    assert_eq!(harness.ledger.trade_count(&portfolio), 2);
}

#[tokio::test]
async fn test_phase_timeout_keeps_partial_counts_and_releases_lock() {
    let harness = Harness::faulty();
    let portfolio = harness.open_portfolio("pf-1", dec!(100000));
    for symbol in ["AAPL", "MSFT", "F"] {
        harness.add(limit_buy(&portfolio, symbol, 10, dec!(1), TimeInForce::Day));
    }
    harness.orders.hang_after(1);
    let scheduler = harness.scheduler_with(
        Arc::new(AlwaysOpen),
        SchedulerSettings {
            phase_timeout: StdDuration::from_millis(50),
            ..SchedulerSettings::default()
        },
    );
    let as_of = Timestamp::now();
    let date = scheduler.schedule().trading_date(as_of);

    let report = scheduler.run_market_close(as_of).await;

    assert_eq!(report.orders_checked, 3);
    assert_eq!(report.orders_cancelled, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("timed out"), "{}", report.errors[0]);
    assert!(!scheduler.locks().is_running(SessionPhase::MarketClose, date));
}
