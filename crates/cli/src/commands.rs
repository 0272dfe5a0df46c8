//! Command execution

use anyhow::{Context, Result};
use dimensioner_call_engine::prelude::*;
use tracing::info;

use crate::cli::{AnalyzeArgs, ErlangArgs, SourceArgs, TargetArgs};
use crate::output;

/// Targets from the configuration, overridden by any flag that was given
pub fn resolve_targets(config: &DimensionerConfig, args: &TargetArgs) -> ServiceTargets {
    let mut targets = config.targets;
    if let Some(sla) = args.sla {
        targets.sla_target = sla;
    }
    if let Some(answer_time) = args.answer_time {
        targets.answer_time_seconds = answer_time;
    }
    if let Some(shrinkage) = args.shrinkage {
        targets.shrinkage_percentage = shrinkage;
    }
    targets
}

fn apply_source(config: &mut DimensionerConfig, args: &SourceArgs) {
    if let Some(url) = &args.database_url {
        config.database.database_url = url.clone();
    }
    if let Some(table) = &args.table {
        config.database.table_name = table.clone();
    }
}

async fn connect(config: &DimensionerConfig) -> Result<SqliteInteractionSource> {
    SqliteInteractionSource::connect(config.database.clone())
        .await
        .with_context(|| format!("cannot open data source {}", config.database.database_url))
}

pub fn erlang(config: &DimensionerConfig, args: &ErlangArgs) -> Result<()> {
    let targets = resolve_targets(config, &args.targets);
    let inputs = ErlangInputs::new(args.calls, args.aht, targets.sla_target, targets.answer_time_seconds)
        .with_shrinkage(targets.shrinkage_percentage);

    let results = ErlangSolver::new(config.solver)
        .calculate(&inputs)
        .context("Erlang C calculation failed")?;

    if args.json {
        let report = serde_json::json!({
            "inputs": inputs,
            "results": results.to_report(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::render_erlang(&inputs, &results);
    }
    Ok(())
}

pub async fn analyze(mut config: DimensionerConfig, args: &AnalyzeArgs) -> Result<()> {
    apply_source(&mut config, &args.source);
    config.validate()?;

    let request = CampaignRequest::new(args.start, args.end).with_targets(resolve_targets(&config, &args.targets));
    let source = connect(&config).await?;
    let analyzer = CampaignAnalyzer::from_config(source, &config);

    let analysis = analyzer
        .analyze_campaign_complete(&request)
        .await
        .with_context(|| format!("analysis of {} - {} failed", args.start, args.end))?;
    info!("🏁 Analysis complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        output::render_analysis(&analysis);
    }
    Ok(())
}

pub async fn range(mut config: DimensionerConfig, args: &SourceArgs) -> Result<()> {
    apply_source(&mut config, args);
    config.validate()?;

    let source = connect(&config).await?;
    let range = source
        .available_range()
        .await
        .context("cannot read the available date range")?;
    output::render_range(range.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_configured_targets() {
        let config = DimensionerConfig::default();
        let args = TargetArgs {
            sla: Some(0.8),
            answer_time: None,
            shrinkage: Some(0.0),
        };
        let targets = resolve_targets(&config, &args);
        assert_eq!(targets.sla_target, 0.8);
        assert_eq!(targets.answer_time_seconds, config.targets.answer_time_seconds);
        assert_eq!(targets.shrinkage_percentage, 0.0);
    }

    #[test]
    fn test_source_flags_override_database() {
        let mut config = DimensionerConfig::default();
        apply_source(
            &mut config,
            &SourceArgs {
                database_url: Some("sqlite://calls.db".to_string()),
                table: Some("calls".to_string()),
            },
        );
        assert_eq!(config.database.database_url, "sqlite://calls.db");
        assert_eq!(config.database.table_name, "calls");
    }
}
