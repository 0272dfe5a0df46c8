//! Dimensioner CLI - Erlang-C staffing for call centers

mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use dimensioner_call_engine::DimensionerConfig;
use dimensioner_infra_common::{log_welcome, setup_logging};

use crate::cli::{Cli, Commands};

fn load_config(cli: &Cli) -> Result<DimensionerConfig> {
    let mut config = match &cli.config {
        Some(path) => DimensionerConfig::load(path)?,
        None => DimensionerConfig::default(),
    };
    config.apply_process_env()?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("invalid configuration")?;

    setup_logging(config.logging.to_logging_config("dimensioner")?)?;
    log_welcome("dimensioner", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Erlang(args) => commands::erlang(&config, args),
        Commands::Analyze(args) => commands::analyze(config, args).await,
        Commands::Range(args) => commands::range(config, args).await,
    }
}
