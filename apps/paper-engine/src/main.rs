//! Paper Engine Binary
//!
//! Runs the day-session driver against in-memory adapters.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin paper-engine
//! ```
//!
//! # Environment Variables
//!
//! - `PAPER_ENGINE_CONFIG`: Path to the YAML config (default: `config.yaml`)
//! - `RUST_LOG`: Log filter (default: `observability.logging.level`)
//!
//! A missing config file falls back to built-in defaults.

use std::sync::Arc;

use anyhow::Context;
use paper_engine::application::services::{DaySessionScheduler, SessionDriver};
use paper_engine::application::use_cases::ProcessOrderUseCase;
use paper_engine::config::{Config, ConfigError, load_config};
use paper_engine::domain::execution_simulation::ExecutionSimulator;
use paper_engine::infrastructure::{
    BroadcastNotificationSink, InMemoryMarketData, InMemoryOrderRepository, PaperLedger,
};
use paper_engine::telemetry::init_telemetry;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

type Processor =
    ProcessOrderUseCase<InMemoryOrderRepository, InMemoryMarketData, PaperLedger, PaperLedger>;

type Scheduler = DaySessionScheduler<
    InMemoryOrderRepository,
    InMemoryMarketData,
    PaperLedger,
    PaperLedger,
    PaperLedger,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match load_config(None) {
        Ok(config) => config,
        Err(ConfigError::ReadError { path, .. }) => {
            eprintln!("Config file '{path}' not found, using defaults");
            Config::default()
        }
        Err(e) => return Err(e).context("invalid configuration"),
    };

    init_telemetry(&config.observability.logging);
    tracing::info!("Starting paper engine");

    let schedule = config
        .session
        .to_schedule()
        .context("invalid session times")?;

    let orders = Arc::new(InMemoryOrderRepository::new());
    let market_data = Arc::new(InMemoryMarketData::new());
    let ledger = Arc::new(PaperLedger::new());
    let notifications = Arc::new(BroadcastNotificationSink::default());

    let simulator = ExecutionSimulator::with_random_liquidity(
        config.execution.commission.clone(),
        config.execution.slippage.clone(),
        config.execution.liquidity.clone(),
    );

    let processor: Arc<Processor> = Arc::new(ProcessOrderUseCase::new(
        orders,
        market_data,
        Arc::clone(&ledger),
        Arc::clone(&ledger),
        notifications.clone(),
        simulator,
        config.risk.clone(),
    ));

    let scheduler: Arc<Scheduler> = Arc::new(DaySessionScheduler::new(
        processor,
        Arc::clone(&ledger),
        ledger,
        config.session.calendar(),
        schedule,
        config.session.scheduler_settings(),
    ));

    tracing::info!(
        market_open = %schedule.market_open(),
        market_close = %schedule.market_close(),
        end_of_day = %schedule.end_of_day(),
        utc_offset_minutes = config.session.utc_offset_minutes,
        "Session schedule loaded"
    );

    let shutdown = CancellationToken::new();

    let logger = tokio::spawn(log_notifications(&notifications, shutdown.clone()));

    let driver = SessionDriver::new(
        scheduler,
        config.session.tick_interval(),
        config.session.sweep_interval(),
    );
    let driver_handle = tokio::spawn(driver.run(shutdown.clone()));

    tracing::info!("Paper engine ready");

    shutdown_signal().await;
    shutdown.cancel();

    if let Err(e) = driver_handle.await {
        tracing::error!(error = %e, "Session driver task failed");
    }
    if let Err(e) = logger.await {
        tracing::error!(error = %e, "Notification logger task failed");
    }

    tracing::info!("Paper engine stopped");
    Ok(())
}

/// Log every published notification until shutdown.
fn log_notifications(
    sink: &BroadcastNotificationSink,
    shutdown: CancellationToken,
) -> impl std::future::Future<Output = ()> + Send + 'static {
    let mut receiver = sink.subscribe();
    async move {
        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Ok(notification) => tracing::info!(
                        event_type = %notification.event_type,
                        payload = %notification.payload,
                        "Notification"
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification logger lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                () = shutdown.cancelled() => break,
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
