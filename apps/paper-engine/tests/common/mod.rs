//! Shared wiring for the integration tests: in-memory adapters, a
//! deterministic simulator and a New York session schedule.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use paper_engine::application::ports::{PerformanceReconciliationPort, ReconciliationError};
use paper_engine::application::services::{DaySessionScheduler, SchedulerSettings};
use paper_engine::application::use_cases::ProcessOrderUseCase;
use paper_engine::domain::execution_simulation::{
    CommissionConfig, ExecutionSimulator, FixedLiquidity, LiquidityConfig, SlippageConfig,
};
use paper_engine::domain::order_lifecycle::{
    CreateOrderCommand, Order, OrderQuery, OrderRepository, OrderSide, OrderType,
    RepositoryError, TimeInForce,
};
use paper_engine::domain::risk_management::RiskLimits;
use paper_engine::domain::session::{SessionSchedule, TradingCalendar};
use paper_engine::domain::shared::{Money, OrderId, PortfolioId, Quantity, Symbol};
use paper_engine::infrastructure::{
    BroadcastNotificationSink, InMemoryMarketData, InMemoryOrderRepository, PaperLedger,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub type Processor =
    ProcessOrderUseCase<InMemoryOrderRepository, InMemoryMarketData, PaperLedger, PaperLedger>;

pub type Scheduler = DaySessionScheduler<
    InMemoryOrderRepository,
    InMemoryMarketData,
    PaperLedger,
    PaperLedger,
    PaperLedger,
>;

/// Every date trades, so tests can run phases at `Timestamp::now()`.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysOpen;

impl TradingCalendar for AlwaysOpen {
    fn is_trading_day(&self, _date: NaiveDate) -> bool {
        true
    }
}

/// No date trades.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysClosed;

impl TradingCalendar for AlwaysClosed {
    fn is_trading_day(&self, _date: NaiveDate) -> bool {
        false
    }
}

pub fn new_york() -> SessionSchedule {
    SessionSchedule::new(
        FixedOffset::west_opt(5 * 3600).unwrap(),
        NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
    )
}

/// Default commission and slippage; large orders fill 80% at a time.
pub fn simulator() -> ExecutionSimulator {
    ExecutionSimulator::new(
        CommissionConfig::default(),
        SlippageConfig::default(),
        LiquidityConfig::default(),
        Arc::new(FixedLiquidity(dec!(0.8))),
    )
}

/// Default limits with room for a $15,000 order.
pub fn limits() -> RiskLimits {
    RiskLimits {
        max_order_size: dec!(50000),
        ..RiskLimits::default()
    }
}

// ============================================
// Failing Collaborators
// ============================================

/// In-memory store with switchable faults.
///
/// - `fail_saves(n)`: the next `n` saves fail
/// - `fail_finds(true)`: every query fails
/// - `hang_after(n)`: saves after the first `n` never complete
#[derive(Debug)]
pub struct FaultyOrderStore {
    inner: InMemoryOrderRepository,
    failing_saves: AtomicUsize,
    failing_finds: AtomicBool,
    saves_before_hang: AtomicUsize,
    saves: AtomicUsize,
}

impl FaultyOrderStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryOrderRepository::new(),
            failing_saves: AtomicUsize::new(0),
            failing_finds: AtomicBool::new(false),
            saves_before_hang: AtomicUsize::new(usize::MAX),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn fail_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    pub fn fail_finds(&self, failing: bool) {
        self.failing_finds.store(failing, Ordering::SeqCst);
    }

    pub fn hang_after(&self, saves: usize) {
        self.saves_before_hang.store(saves, Ordering::SeqCst);
    }

    pub fn add(&self, order: Order) {
        self.inner.add(order);
    }

    pub fn get(&self, id: &OrderId) -> Option<Order> {
        self.inner.get(id)
    }
}

#[async_trait]
impl OrderRepository for FaultyOrderStore {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RepositoryError::storage("db hiccup"));
        }
        if self.saves.load(Ordering::SeqCst) >= self.saves_before_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(order).await
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find(&self, query: &OrderQuery) -> Result<Vec<Order>, RepositoryError> {
        if self.failing_finds.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("connection refused"));
        }
        self.inner.find(query).await
    }
}

/// Reconciliation that always fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingReconciler;

#[async_trait]
impl PerformanceReconciliationPort for FailingReconciler {
    async fn reconcile(&self, _portfolio_id: &PortfolioId) -> Result<(), ReconciliationError> {
        Err(ReconciliationError::Failed {
            message: "performance service down".to_string(),
        })
    }
}

// ============================================
// Harness
// ============================================

pub struct Harness<O: OrderRepository = InMemoryOrderRepository> {
    pub orders: Arc<O>,
    pub market: Arc<InMemoryMarketData>,
    pub ledger: Arc<PaperLedger>,
    pub sink: Arc<BroadcastNotificationSink>,
    pub processor: Arc<ProcessOrderUseCase<O, InMemoryMarketData, PaperLedger, PaperLedger>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(limits())
    }

    pub fn with_limits(limits: RiskLimits) -> Self {
        Self::with_store(Arc::new(InMemoryOrderRepository::new()), limits)
    }

    /// Store `order` and return it.
    pub fn add(&self, order: Order) -> Order {
        self.orders.add(order.clone());
        order
    }
}

impl Harness<FaultyOrderStore> {
    pub fn faulty() -> Self {
        Self::with_store(Arc::new(FaultyOrderStore::new()), limits())
    }

    /// Store `order` and return it.
    pub fn add(&self, order: Order) -> Order {
        self.orders.add(order.clone());
        order
    }
}

impl<O: OrderRepository> Harness<O> {
    pub fn with_store(orders: Arc<O>, limits: RiskLimits) -> Self {
        let market = Arc::new(InMemoryMarketData::new());
        let ledger = Arc::new(PaperLedger::new());
        let sink = Arc::new(BroadcastNotificationSink::default());
        let processor = Arc::new(ProcessOrderUseCase::new(
            Arc::clone(&orders),
            Arc::clone(&market),
            Arc::clone(&ledger),
            Arc::clone(&ledger),
            sink.clone(),
            simulator(),
            limits,
        ));
        Self {
            orders,
            market,
            ledger,
            sink,
            processor,
        }
    }

    pub fn scheduler(
        &self,
        calendar: Arc<dyn TradingCalendar>,
    ) -> DaySessionScheduler<O, InMemoryMarketData, PaperLedger, PaperLedger, PaperLedger> {
        self.scheduler_with(calendar, SchedulerSettings::default())
    }

    pub fn scheduler_with(
        &self,
        calendar: Arc<dyn TradingCalendar>,
        settings: SchedulerSettings,
    ) -> DaySessionScheduler<O, InMemoryMarketData, PaperLedger, PaperLedger, PaperLedger> {
        self.scheduler_reconciling_with(Arc::clone(&self.ledger), calendar, settings)
    }

    pub fn scheduler_reconciling_with<R: PerformanceReconciliationPort>(
        &self,
        reconciler: Arc<R>,
        calendar: Arc<dyn TradingCalendar>,
        settings: SchedulerSettings,
    ) -> DaySessionScheduler<O, InMemoryMarketData, PaperLedger, PaperLedger, R> {
        DaySessionScheduler::new(
            Arc::clone(&self.processor),
            Arc::clone(&self.ledger),
            reconciler,
            calendar,
            new_york(),
            settings,
        )
    }

    pub fn open_portfolio(&self, id: &str, cash: Decimal) -> PortfolioId {
        let portfolio_id = PortfolioId::new(id);
        self.ledger
            .open_portfolio(portfolio_id.clone(), Money::new(cash));
        portfolio_id
    }
}

pub fn command(
    portfolio_id: &PortfolioId,
    symbol: &str,
    side: OrderSide,
    order_type: OrderType,
    quantity: i64,
) -> CreateOrderCommand {
    CreateOrderCommand::new(
        portfolio_id.clone(),
        Symbol::new(symbol),
        side,
        order_type,
        Quantity::from_i64(quantity),
    )
}

pub fn market_buy(portfolio_id: &PortfolioId, symbol: &str, quantity: i64) -> Order {
    Order::new(command(
        portfolio_id,
        symbol,
        OrderSide::Buy,
        OrderType::Market,
        quantity,
    ))
    .unwrap()
}

pub fn limit_buy(
    portfolio_id: &PortfolioId,
    symbol: &str,
    quantity: i64,
    limit: Decimal,
    tif: TimeInForce,
) -> Order {
    Order::new(
        command(portfolio_id, symbol, OrderSide::Buy, OrderType::Limit, quantity)
            .with_limit_price(Money::new(limit))
            .with_time_in_force(tif),
    )
    .unwrap()
}
