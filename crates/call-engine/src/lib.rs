//! # Dimensioner Call Engine
//!
//! Call-center staffing built on the Erlang-C queueing model. The crate covers
//! both ways of sizing a team:
//!
//! - **New campaign**: manual volume and handle-time forecasts go straight to
//!   the [`ErlangSolver`].
//! - **Existing campaign**: historical interaction records are aggregated,
//!   turned into four staffing scenarios, back-tested against what actually
//!   happened and summarized into recommendations.
//!
//! ## Modules
//!
//! - [`erlang`]: traffic intensity, Erlang-C wait probability, staffing search
//! - [`analysis`]: interaction records and historical aggregation
//! - [`scenarios`]: average / peak / conservative / optimistic scenarios
//! - [`validation`]: predicted vs. observed comparison and best scenario
//! - [`recommendations`]: recommendations and executive summary
//! - [`database`]: the [`InteractionSource`] trait with SQLite and in-memory
//!   implementations
//! - [`pipeline`]: [`CampaignAnalyzer`], the composition of all of the above
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use dimensioner_call_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = DimensionerConfig::default();
//! let source = SqliteInteractionSource::connect(config.database.clone())
//!     .await
//!     .map_err(|e| CallCenterError::config(e.to_string()))?;
//! let analyzer = CampaignAnalyzer::from_config(source, &config);
//!
//! let request = CampaignRequest::new(
//!     NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
//! );
//! let analysis = analyzer.analyze_campaign_complete(&request).await?;
//! println!("👥 Recommended agents: {}", analysis.summary.recommended_agents);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod database;
pub mod erlang;
pub mod error;
pub mod pipeline;
pub mod recommendations;
pub mod scenarios;
pub mod validation;

pub use analysis::{DateRange, HistoricalAggregator, HistoricalAnalysis, InteractionRecord};
pub use config::DimensionerConfig;
pub use database::{DatabaseError, InteractionSource, MemoryInteractionSource, SqliteInteractionSource};
pub use erlang::{ErlangInputs, ErlangResults, ErlangSolver, WaitTime};
pub use error::{CallCenterError, Result};
pub use pipeline::{CampaignAnalysis, CampaignAnalyzer, CampaignRequest};
pub use recommendations::{ExecutiveSummary, Recommendations, Recommender};
pub use scenarios::{ScenarioGenerator, ScenarioKind, ScenarioSet, ServiceTargets};
pub use validation::{ScenarioValidator, ValidationReport};

/// Commonly used types
pub mod prelude {
    pub use crate::analysis::{DateRange, HistoricalAggregator, HistoricalAnalysis, InteractionRecord};
    pub use crate::config::DimensionerConfig;
    pub use crate::database::{
        AvailableRange, DatabaseError, InteractionSource, MemoryInteractionSource, SqliteInteractionSource,
    };
    pub use crate::erlang::{ErlangInputs, ErlangResults, ErlangSolver, SearchHandleTime, SolverConfig, WaitTime};
    pub use crate::error::{CallCenterError, Result};
    pub use crate::pipeline::{CampaignAnalysis, CampaignAnalyzer, CampaignRequest};
    pub use crate::recommendations::{ExecutiveSummary, Recommendations, Recommender};
    pub use crate::scenarios::{ScenarioGenerator, ScenarioKind, ScenarioSet, ServiceTargets};
    pub use crate::validation::{ScenarioValidator, ValidationReport};
}
