//! Command-line structure

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Call-center staffing with Erlang C
#[derive(Debug, Parser)]
#[command(name = "dimensioner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "DIMENSIONER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dimension a new campaign from manual forecasts
    Erlang(ErlangArgs),
    /// Analyze an existing campaign from historical interactions
    Analyze(AnalyzeArgs),
    /// Show the dates and volume available in the data source
    Range(SourceArgs),
}

/// Service targets; unset values fall back to the configuration
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Service-level target as a fraction (0.90 = 90%)
    #[arg(long)]
    pub sla: Option<f64>,

    /// Answer-time target in seconds
    #[arg(long)]
    pub answer_time: Option<u32>,

    /// Shrinkage percentage
    #[arg(long)]
    pub shrinkage: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ErlangArgs {
    /// Forecast calls per hour
    #[arg(long)]
    pub calls: f64,

    /// Average handle time in seconds
    #[arg(long)]
    pub aht: f64,

    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// SQLite database URL
    #[arg(long, env = "DIMENSIONER_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Interaction table name
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// First day of the analysis (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day of the analysis, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print the full analysis as JSON
    #[arg(long)]
    pub json: bool,
}
