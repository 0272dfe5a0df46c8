//! Configuration for the dimensioner.
//!
//! Values come from defaults, an optional TOML file and `DIMENSIONER_*`
//! environment variables, in that order of precedence (later wins).
//!
//! ```toml
//! [targets]
//! sla_target = 0.85
//! answer_time_seconds = 30
//!
//! [solver]
//! search_window = 80
//! search_handle_time = "actual"
//!
//! [database]
//! database_url = "sqlite://campaign.db"
//! table_name = "calls"
//! ```

use std::path::Path;

use dimensioner_infra_common::{LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::AggregatorConfig;
use crate::database::DatabaseConfig;
use crate::erlang::{SearchHandleTime, SolverConfig};
use crate::error::{CallCenterError, Result};
use crate::recommendations::DEFAULT_AHT_ALERT_THRESHOLD_SECONDS;
use crate::scenarios::ServiceTargets;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "DIMENSIONER_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionerConfig {
    pub targets: ServiceTargets,
    pub solver: SolverConfig,
    pub analysis: AnalysisConfig,
    pub database: DatabaseConfig,
    pub logging: LogSettings,
}

/// Historical analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub interval_minutes: u32,
    pub aht_alert_threshold_seconds: f64,
    pub busiest_hours: usize,
    /// Upper bound on one data-source fetch
    pub fetch_timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            aht_alert_threshold_seconds: DEFAULT_AHT_ALERT_THRESHOLD_SECONDS,
            busiest_hours: 3,
            fetch_timeout_seconds: 60,
        }
    }
}

impl AnalysisConfig {
    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            interval_minutes: self.interval_minutes,
            busiest_hours: self.busiest_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    /// Source file and line on every event
    pub source_location: bool,
    /// Enter/exit events for pipeline spans
    pub span_events: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            source_location: false,
            span_events: false,
        }
    }
}

impl LogSettings {
    pub fn to_logging_config(&self, app_name: &str) -> Result<LoggingConfig> {
        let mut config = LoggingConfig::from_level_str(&self.level, app_name)
            .map_err(|e| CallCenterError::config(format!("logging.level: {}", e)))?;
        if self.json {
            config.format = LogFormat::Json;
        }
        config.source_location = self.source_location;
        config.span_events = self.span_events;
        Ok(config)
    }
}

impl DimensionerConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CallCenterError::config(format!("invalid TOML: {}", e)))
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CallCenterError::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overlay the process environment
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay `DIMENSIONER_*` values returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("SLA_TARGET") {
            self.targets.sla_target = parse_env("SLA_TARGET", &v)?;
        }
        if let Some(v) = var("ANSWER_TIME_SECONDS") {
            self.targets.answer_time_seconds = parse_env("ANSWER_TIME_SECONDS", &v)?;
        }
        if let Some(v) = var("SHRINKAGE_PERCENTAGE") {
            self.targets.shrinkage_percentage = parse_env("SHRINKAGE_PERCENTAGE", &v)?;
        }
        if let Some(v) = var("SEARCH_WINDOW") {
            self.solver.search_window = parse_env("SEARCH_WINDOW", &v)?;
        }
        if let Some(v) = var("SEARCH_HANDLE_TIME") {
            self.solver.search_handle_time = parse_search_handle_time(&v)?;
        }
        if let Some(v) = var("INTERVAL_MINUTES") {
            self.analysis.interval_minutes = parse_env("INTERVAL_MINUTES", &v)?;
        }
        if let Some(v) = var("FETCH_TIMEOUT_SECONDS") {
            self.analysis.fetch_timeout_seconds = parse_env("FETCH_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.database_url = v;
        }
        if let Some(v) = var("TABLE_NAME") {
            self.database.table_name = v;
        }
        if let Some(v) = var("MAX_RECORDS") {
            self.database.max_records = parse_env("MAX_RECORDS", &v)?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = var("LOG_JSON") {
            self.logging.json = parse_env("LOG_JSON", &v)?;
        }
        if let Some(v) = var("LOG_SOURCE_LOCATION") {
            self.logging.source_location = parse_env("LOG_SOURCE_LOCATION", &v)?;
        }
        if let Some(v) = var("LOG_SPAN_EVENTS") {
            self.logging.span_events = parse_env("LOG_SPAN_EVENTS", &v)?;
        }
        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        let targets = &self.targets;
        if !(targets.sla_target > 0.0 && targets.sla_target <= 1.0) {
            return Err(CallCenterError::config(format!(
                "targets.sla_target must be in (0, 1], got {}",
                targets.sla_target
            )));
        }
        if !targets.shrinkage_percentage.is_finite() || targets.shrinkage_percentage < 0.0 {
            return Err(CallCenterError::config(format!(
                "targets.shrinkage_percentage must be >= 0, got {}",
                targets.shrinkage_percentage
            )));
        }
        if self.solver.search_window == 0 {
            return Err(CallCenterError::config("solver.search_window must be at least 1"));
        }
        if let SearchHandleTime::AnswerTimeMultiple(multiplier) = self.solver.search_handle_time {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(CallCenterError::config(format!(
                    "solver.search_handle_time multiplier must be positive, got {}",
                    multiplier
                )));
            }
        }
        if self.analysis.interval_minutes == 0 || 60 % self.analysis.interval_minutes != 0 {
            return Err(CallCenterError::config(format!(
                "analysis.interval_minutes must divide 60, got {}",
                self.analysis.interval_minutes
            )));
        }
        if self.analysis.fetch_timeout_seconds == 0 {
            return Err(CallCenterError::config("analysis.fetch_timeout_seconds must be at least 1"));
        }
        self.database
            .validate()
            .map_err(|e| CallCenterError::config(format!("database: {}", e)))?;
        dimensioner_infra_common::parse_log_level(&self.logging.level)
            .map_err(|e| CallCenterError::config(format!("logging.level: {}", e)))?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CallCenterError::config(format!("{}{} has an invalid value: {:?}", ENV_PREFIX, name, raw)))
}

/// `actual` or a positive multiplier of the answer-time target
fn parse_search_handle_time(raw: &str) -> Result<SearchHandleTime> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("actual") {
        return Ok(SearchHandleTime::Actual);
    }
    parse_env("SEARCH_HANDLE_TIME", trimmed).map(SearchHandleTime::AnswerTimeMultiple)
}
