//! Configuration module for the paper engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the simulator, the risk gate and the session scheduler.
//!
//! # Usage
//!
//! ```rust,ignore
//! use paper_engine::config::{Config, load_config};
//!
//! // Load from PAPER_ENGINE_CONFIG, or config.yaml
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("slippage: {} bps", config.execution.slippage.basis_points);
//! ```

mod execution;
mod observability;
mod session;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use execution::ExecutionConfig;
pub use observability::{LoggingConfig, ObservabilityConfig};
pub use session::SessionConfig;

use crate::domain::risk_management::RiskLimits;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PAPER_ENGINE_CONFIG";

/// Config file used when neither an explicit path nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure. Every section is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Fill simulation.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Risk gate limits.
    #[serde(default)]
    pub risk: RiskLimits,
    /// Session times and scheduler tunables.
    #[serde(default)]
    pub session: SessionConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to
///   `$PAPER_ENGINE_CONFIG`, then `config.yaml`.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(
        || std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        str::to_string,
    );

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. An unset or empty
/// variable takes the default, or the empty string without one.
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let Some(re) = ENV_VAR_REGEX
        .get_or_init(|| regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").ok())
    else {
        return input.to_string();
    };

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_execution(&config.execution)?;
    validate_risk(&config.risk)?;
    validate_session(&config.session)?;

    let format = config.observability.logging.format.as_str();
    if !LOG_FORMATS.contains(&format) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {LOG_FORMATS:?}"
        )));
    }

    Ok(())
}

fn validate_execution(execution: &ExecutionConfig) -> Result<(), ConfigError> {
    let commission = &execution.commission;
    let fees = [
        ("base_fee", commission.base_fee),
        ("per_share_fee", commission.per_share_fee),
        ("percentage_fee", commission.percentage_fee),
        ("minimum_fee", commission.minimum_fee),
        ("maximum_fee", commission.maximum_fee),
    ];
    for (name, value) in fees {
        if value.is_sign_negative() {
            return Err(ConfigError::ValidationError(format!(
                "execution.commission.{name} cannot be negative"
            )));
        }
    }
    if commission.minimum_fee > commission.maximum_fee {
        return Err(ConfigError::ValidationError(
            "execution.commission.minimum_fee cannot exceed maximum_fee".to_string(),
        ));
    }

    let slippage = &execution.slippage;
    if slippage.basis_points.is_sign_negative() || slippage.max_slippage.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "execution.slippage values cannot be negative".to_string(),
        ));
    }

    let liquidity = &execution.liquidity;
    let in_unit_interval = |r: Decimal| r > Decimal::ZERO && r <= Decimal::ONE;
    if !in_unit_interval(liquidity.min_fill_ratio) || !in_unit_interval(liquidity.max_fill_ratio) {
        return Err(ConfigError::ValidationError(
            "execution.liquidity fill ratios must be in (0, 1]".to_string(),
        ));
    }
    if liquidity.min_fill_ratio > liquidity.max_fill_ratio {
        return Err(ConfigError::ValidationError(
            "execution.liquidity.min_fill_ratio cannot exceed max_fill_ratio".to_string(),
        ));
    }
    if !liquidity.partial_fill_threshold.is_positive() {
        return Err(ConfigError::ValidationError(
            "execution.liquidity.partial_fill_threshold must be positive".to_string(),
        ));
    }

    Ok(())
}

fn validate_risk(risk: &RiskLimits) -> Result<(), ConfigError> {
    let positive = [
        ("max_order_size", risk.max_order_size),
        ("max_leverage", risk.max_leverage),
        ("max_single_stock_exposure", risk.max_single_stock_exposure),
        ("max_daily_loss", risk.max_daily_loss),
    ];
    for (name, value) in positive {
        if value <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "risk.{name} must be positive"
            )));
        }
    }

    let ratios = [
        ("max_portfolio_concentration", risk.max_portfolio_concentration),
        ("kelly_fraction_cap", risk.kelly_fraction_cap),
        ("large_order_ratio", risk.large_order_ratio),
        ("concentration_warning_ratio", risk.concentration_warning_ratio),
    ];
    for (name, value) in ratios {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "risk.{name} must be in (0, 1]"
            )));
        }
    }

    if risk.day_trade_window_days == 0 {
        return Err(ConfigError::ValidationError(
            "risk.day_trade_window_days must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    let schedule = session.to_schedule()?;
    if schedule.market_close() <= schedule.market_open() {
        return Err(ConfigError::ValidationError(
            "session.market_close must be after market_open".to_string(),
        ));
    }
    if schedule.end_of_day() < schedule.market_close() {
        return Err(ConfigError::ValidationError(
            "session.end_of_day cannot be before market_close".to_string(),
        ));
    }

    let intervals = [
        ("tick_interval_secs", session.tick_interval_secs),
        ("sweep_interval_secs", session.sweep_interval_secs),
        ("phase_timeout_secs", session.phase_timeout_secs),
    ];
    for (name, value) in intervals {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "session.{name} must be positive"
            )));
        }
    }

    Ok(())
}
