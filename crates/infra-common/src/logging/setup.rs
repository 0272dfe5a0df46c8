//! Global `tracing` subscriber for the dimensioner binaries.
//!
//! Logs go to stderr so that table and JSON output on stdout stays clean.
//! `RUST_LOG` directives are honoured on top of the configured level.

use crate::errors::types::{Error, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Line format of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line events
    #[default]
    Text,
    /// One JSON object per event, for log shippers
    Json,
}

/// Subscriber settings, usually derived from the `[logging]` config section
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Attach source file and line to every event
    pub source_location: bool,
    /// Emit enter/exit events for active spans (pipeline stages, fetches)
    pub span_events: bool,
    /// Recorded in the first event after installation
    pub app_name: String,
}

impl LoggingConfig {
    /// Text output at `level` with no source locations or span events
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        Self {
            level,
            format: LogFormat::Text,
            source_location: false,
            span_events: false,
            app_name: app_name.into(),
        }
    }

    /// Same as [`new`](Self::new) with a textual level such as `"debug"`
    pub fn from_level_str(level: &str, app_name: impl Into<String>) -> Result<Self> {
        Ok(Self::new(parse_log_level(level)?, app_name))
    }
}

/// Install the global subscriber.
///
/// Fails with [`Error::Initialization`] if one is already installed.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());
    let span_events = if config.span_events {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(span_events)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| Error::Initialization(format!("tracing subscriber for {}: {}", config.app_name, e)))?;

    tracing::debug!(app = %config.app_name, level = %config.level, "logging ready");
    Ok(())
}

/// Case-insensitive level name (`trace` .. `error`)
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}

pub fn log_welcome(app_name: &str, version: &str) {
    tracing::info!("🚀 Starting {} v{}", app_name, version);
}
