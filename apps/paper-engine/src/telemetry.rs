//! Tracing Setup
//!
//! Installs the global `tracing` subscriber for the engine binary.
//!
//! # Configuration
//!
//! - `RUST_LOG`: Filter directives; overrides `observability.logging.level`
//! - `observability.logging.format`: `text` (human readable) or `json`
//!
//! # Usage
//!
//! ```rust,ignore
//! use paper_engine::telemetry::init_telemetry;
//!
//! #[tokio::main]
//! async fn main() {
//!     init_telemetry(&config.observability.logging);
//!     // ... application code
//! }
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` if set and valid, else the configured level.
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console tracing.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_telemetry(logging: &LoggingConfig) {
    let filter = env_filter(logging);

    let result = if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!(
            level = %logging.level,
            format = %logging.format,
            "Tracing initialized"
        ),
        Err(e) => eprintln!("Tracing subscriber already installed: {e}"),
    }
}
