//! # Campaign Analysis Pipeline
//!
//! `CampaignAnalyzer` composes the data source, aggregator, scenario
//! generator, validator and recommender:
//!
//! ```text
//! InteractionSource::fetch ──► HistoricalAggregator ──► ScenarioGenerator
//!        (timeout)                                            │
//!                                                             ▼
//!           Recommender ◄── ScenarioValidator ◄───── four solved scenarios
//! ```
//!
//! Only the fetch is asynchronous; everything after it is synchronous and
//! returns immutable values.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::{DateRange, HistoricalAggregator, HistoricalAnalysis, InteractionRecord};
use crate::config::DimensionerConfig;
use crate::database::{DatabaseError, InteractionSource};
use crate::erlang::{ErlangInputs, ErlangResults, ErlangSolver};
use crate::error::{CallCenterError, Result};
use crate::recommendations::{ExecutiveSummary, Recommendations, Recommender};
use crate::scenarios::{ScenarioGenerator, ScenarioSet, ServiceTargets};
use crate::validation::{ScenarioValidator, ValidationReport};

/// Default upper bound on one data-source fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// One historical campaign analysis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub targets: ServiceTargets,
}

impl CampaignRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            targets: ServiceTargets::default(),
        }
    }

    pub fn with_targets(mut self, targets: ServiceTargets) -> Self {
        self.targets = targets;
        self
    }
}

/// Full structured result of a campaign analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignAnalysis {
    pub period: DateRange,
    pub targets: ServiceTargets,
    pub historical: HistoricalAnalysis,
    pub scenarios: ScenarioSet,
    pub validation: ValidationReport,
    pub recommendations: Recommendations,
    pub summary: ExecutiveSummary,
}

/// Composition root of the analysis pipeline
pub struct CampaignAnalyzer<S> {
    source: S,
    aggregator: HistoricalAggregator,
    generator: ScenarioGenerator,
    validator: ScenarioValidator,
    recommender: Recommender,
    fetch_timeout: Duration,
}

impl<S: InteractionSource> CampaignAnalyzer<S> {
    /// Analyzer with default components
    pub fn new(source: S) -> Self {
        Self {
            source,
            aggregator: HistoricalAggregator::default(),
            generator: ScenarioGenerator::default(),
            validator: ScenarioValidator::new(),
            recommender: Recommender::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Analyzer wired from a configuration
    pub fn from_config(source: S, config: &DimensionerConfig) -> Self {
        Self::new(source)
            .with_aggregator(HistoricalAggregator::new(config.analysis.aggregator()))
            .with_generator(ScenarioGenerator::new(ErlangSolver::new(config.solver)))
            .with_recommender(Recommender::new(config.analysis.aht_alert_threshold_seconds))
            .with_fetch_timeout(Duration::from_secs(config.analysis.fetch_timeout_seconds))
    }

    pub fn with_aggregator(mut self, aggregator: HistoricalAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_generator(mut self, generator: ScenarioGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_validator(mut self, validator: ScenarioValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_recommender(mut self, recommender: Recommender) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Standalone Erlang-C dimensioning with manual inputs
    pub fn calculate_erlang_c(&self, inputs: &ErlangInputs) -> Result<ErlangResults> {
        self.generator.solver().calculate(inputs)
    }

    /// Aggregate records without a date filter
    pub fn analyze_historical(&self, records: &[InteractionRecord]) -> Result<HistoricalAnalysis> {
        self.aggregator.aggregate_all(records)
    }

    /// Fetch the requested range and run the whole pipeline over it.
    ///
    /// A source failure or a fetch exceeding the timeout fails the analysis
    /// with [`CallCenterError::DataSource`].
    pub async fn analyze_campaign_complete(&self, request: &CampaignRequest) -> Result<CampaignAnalysis> {
        let period = DateRange::new(request.start, request.end)?;
        info!("🚀 Starting campaign analysis {} - {}", period.start, period.end);

        let records = match tokio::time::timeout(self.fetch_timeout, self.source.fetch(period.start, period.end)).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                error!("❌ Data source failed: {}", e);
                return Err(CallCenterError::data_source(period.start, period.end, e));
            }
            Err(_) => {
                error!("❌ Data source timed out after {:?}", self.fetch_timeout);
                let timeout = DatabaseError::Timeout {
                    seconds: self.fetch_timeout.as_secs(),
                };
                return Err(CallCenterError::data_source(period.start, period.end, timeout));
            }
        };

        self.analyze_records(&records, request)
    }

    /// Run the pipeline over records that were already fetched
    pub fn analyze_records(&self, records: &[InteractionRecord], request: &CampaignRequest) -> Result<CampaignAnalysis> {
        let period = DateRange::new(request.start, request.end)?;
        let targets = request.targets;

        info!("📊 1. Aggregating historical data");
        let historical = self.aggregator.aggregate(records, &period)?;

        info!("🧮 2. Solving dimensioning scenarios");
        let scenarios = self.generator.generate(&historical, &targets)?;

        info!("✅ 3. Validating scenarios against observed data");
        let in_range: Vec<InteractionRecord> = records.iter().filter(|r| period.contains(r.date)).cloned().collect();
        let validation = self.validator.validate(&in_range, &scenarios)?;

        info!("💡 4. Building recommendations");
        let recommendations = self.recommender.recommend(&historical, &scenarios, &validation);
        let summary = self.recommender.summarize(&historical, &scenarios, &validation);

        log_summary(&summary);

        Ok(CampaignAnalysis {
            period,
            targets,
            historical,
            scenarios,
            validation,
            recommendations,
            summary,
        })
    }
}

impl<S> std::fmt::Debug for CampaignAnalyzer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignAnalyzer")
            .field("aggregator", &self.aggregator)
            .field("generator", &self.generator)
            .field("recommender", &self.recommender)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

fn log_summary(summary: &ExecutiveSummary) {
    info!("📋 Executive summary:");
    info!("   👥 Recommended agents: {}", summary.recommended_agents);
    info!("   🎯 Base scenario: {}", summary.base_scenario);
    match summary.model_precision {
        Some(precision) => info!("   ✅ Model precision: {:.1}%", precision),
        None => info!("   ✅ Model precision: n/a"),
    }
    info!("   📈 Observed SLA: {:.1}%", summary.observed_sla * 100.0);
    info!("   ⏳ Observed wait: {:.1}s", summary.observed_wait_mean);
}
