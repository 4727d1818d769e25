//! Aggregation run configuration
//!
//! Handles loading configuration from TOML files and `RISK_*` environment
//! variables, layered on top of defaults.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{CalculationType, Currency};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unrecognised log level name
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// PFE quantile outside (0, 1)
    #[error("Invalid PFE quantile: {0}. Must be in (0, 1)")]
    InvalidQuantile(f64),

    /// VaR confidence outside (0, 1)
    #[error("Invalid VaR confidence: {0}. Must be in (0, 1)")]
    InvalidConfidence(f64),

    /// Negative allocation limit
    #[error("Invalid marginal allocation limit: {0}. Must be non-negative")]
    InvalidAllocationLimit(f64),

    /// Zero MPOR on an MPOR grid
    #[error("Invalid MPOR days: {0}. Must be positive")]
    InvalidMporDays(u32),

    /// Default and close-out read the same depth slot
    #[error("Default and close-out depth slots must differ (both {0})")]
    DepthSlotClash(usize),

    /// Unreadable or malformed file
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// Unparseable environment override
    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the aggregation tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Per netting set progress
    Debug,
    /// Run summaries
    #[default]
    Info,
    /// Recoverable problems
    Warn,
    /// Failures only
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Settings for one aggregation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Currency of the NPV cube
    pub base_currency: Currency,
    /// Quantile for potential future exposure
    pub pfe_quantile: f64,
    /// Collateral calculation methodology
    #[serde(deserialize_with = "deserialize_calculation_type")]
    pub calculation_type: CalculationType,
    /// Keep per-sample exposures instead of collapsing to the mean
    pub multi_path: bool,
    /// View the portfolio from the counterparty's side
    pub flip_view_xva: bool,
    /// Zero trade values beyond their next break date
    pub exercise_next_break: bool,
    /// Treat netting sets as fully collateralised at t0
    pub full_initial_collateralisation: bool,
    /// Allocate netted exposure back to trades marginally
    pub marginal_allocation: bool,
    /// Below this absolute netting set value allocation is split evenly
    pub marginal_allocation_limit: f64,
    /// The cube was generated on a valuation/close-out date grid
    pub mpor_grid: bool,
    /// MPOR used to derive close-out dates when `mpor_grid` is set
    pub mpor_days: u32,
    /// Depth slot holding default-date values
    pub default_index: usize,
    /// Depth slot holding close-out values (MPOR grid only)
    pub close_out_index: usize,
    /// Depth slot holding MPOR cash flows
    pub flows_index: usize,
    /// Confidence levels reported by the VaR summary
    pub var_confidences: Vec<f64>,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_calculation_type<'de, D>(deserializer: D) -> Result<CalculationType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    CalculationType::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            base_currency: Currency::EUR,
            pfe_quantile: 0.95,
            calculation_type: CalculationType::Symmetric,
            multi_path: false,
            flip_view_xva: false,
            exercise_next_break: false,
            full_initial_collateralisation: false,
            marginal_allocation: false,
            marginal_allocation_limit: 1.0,
            mpor_grid: false,
            mpor_days: 14,
            default_index: 0,
            close_out_index: 1,
            flows_index: 2,
            var_confidences: vec![0.95, 0.99],
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvError(format!("{name}={raw}"))),
        Err(_) => Ok(None),
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl AggregationConfig {
    /// Create a new AggregationConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AggregationConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields for which a `RISK_*` variable is set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = std::env::var("RISK_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Ok(ccy) = std::env::var("RISK_BASE_CURRENCY") {
            self.base_currency = ccy
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("RISK_BASE_CURRENCY={ccy}")))?;
        }
        if let Some(q) = env_parse("RISK_PFE_QUANTILE")? {
            self.pfe_quantile = q;
        }
        if let Ok(ct) = std::env::var("RISK_CALCULATION_TYPE") {
            self.calculation_type = ct
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("RISK_CALCULATION_TYPE={ct}")))?;
        }
        if let Some(flag) = env_flag("RISK_MULTI_PATH") {
            self.multi_path = flag;
        }
        if let Some(flag) = env_flag("RISK_FLIP_VIEW_XVA") {
            self.flip_view_xva = flag;
        }
        if let Some(flag) = env_flag("RISK_EXERCISE_NEXT_BREAK") {
            self.exercise_next_break = flag;
        }
        if let Some(flag) = env_flag("RISK_MARGINAL_ALLOCATION") {
            self.marginal_allocation = flag;
        }
        if let Some(flag) = env_flag("RISK_MPOR_GRID") {
            self.mpor_grid = flag;
        }
        if let Some(days) = env_parse("RISK_MPOR_DAYS")? {
            self.mpor_days = days;
        }
        if let Ok(list) = std::env::var("RISK_VAR_CONFIDENCES") {
            self.var_confidences = list
                .split(',')
                .map(|s| s.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| ConfigError::EnvError(format!("RISK_VAR_CONFIDENCES={list}")))?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pfe_quantile > 0.0 && self.pfe_quantile < 1.0) {
            return Err(ConfigError::InvalidQuantile(self.pfe_quantile));
        }
        if let Some(c) = self
            .var_confidences
            .iter()
            .find(|c| !(**c > 0.0 && **c < 1.0))
        {
            return Err(ConfigError::InvalidConfidence(*c));
        }
        if !(self.marginal_allocation_limit >= 0.0) {
            return Err(ConfigError::InvalidAllocationLimit(
                self.marginal_allocation_limit,
            ));
        }
        if self.mpor_grid {
            if self.mpor_days == 0 {
                return Err(ConfigError::InvalidMporDays(self.mpor_days));
            }
            if self.default_index == self.close_out_index {
                return Err(ConfigError::DepthSlotClash(self.default_index));
            }
        }
        Ok(())
    }
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Environment variables
/// 2. Config file
/// 3. Default values
pub fn build_config(path: Option<&Path>) -> Result<AggregationConfig, ConfigError> {
    let mut config = match path {
        Some(p) => AggregationConfig::from_file(p)?,
        None => AggregationConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
