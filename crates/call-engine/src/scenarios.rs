//! # Dimensioning Scenarios
//!
//! Builds four staffing scenarios from one historical analysis and solves each
//! of them with the Erlang-C solver:
//!
//! | scenario       | volume                         | handle time            |
//! |----------------|--------------------------------|------------------------|
//! | `average`      | mean calls over observed hours | overall mean AHT       |
//! | `peak`         | peak-hour call count           | peak-hour mean AHT     |
//! | `conservative` | p90 of hourly call counts      | overall mean AHT       |
//! | `optimistic`   | p75 of hourly call counts      | overall mean AHT       |
//!
//! The solves share nothing, so they run on scoped worker threads and are
//! merged by kind afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{stats, HistoricalAnalysis};
use crate::erlang::{ErlangInputs, ErlangResults, ErlangSolver, DEFAULT_SHRINKAGE_PERCENTAGE};
use crate::error::{CallCenterError, Result};

/// Scenario names, in enumeration order.
///
/// The derived ordering is the enumeration order; it decides iteration order
/// of a [`ScenarioSet`] and breaks ties when picking the best scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Average,
    Peak,
    Conservative,
    Optimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Average,
        ScenarioKind::Peak,
        ScenarioKind::Conservative,
        ScenarioKind::Optimistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Average => "average",
            ScenarioKind::Peak => "peak",
            ScenarioKind::Conservative => "conservative",
            ScenarioKind::Optimistic => "optimistic",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Service targets shared by every scenario of one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTargets {
    pub sla_target: f64,
    pub answer_time_seconds: u32,
    pub shrinkage_percentage: f64,
}

impl Default for ServiceTargets {
    fn default() -> Self {
        Self {
            sla_target: 0.90,
            answer_time_seconds: 20,
            shrinkage_percentage: DEFAULT_SHRINKAGE_PERCENTAGE,
        }
    }
}

/// One solved scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub inputs: ErlangInputs,
    pub results: ErlangResults,
}

/// Volumes the scenarios were built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub average: f64,
    pub peak: f64,
    pub p90: f64,
    pub p75: f64,
}

/// Handle times the scenarios were built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleTimeUsed {
    pub average_used: f64,
    pub peak_used: f64,
}

/// The four solved scenarios of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: BTreeMap<ScenarioKind, Scenario>,
    pub volume_stats: VolumeStats,
    pub handle_time: HandleTimeUsed,
    pub targets: ServiceTargets,
}

impl ScenarioSet {
    pub fn get(&self, kind: ScenarioKind) -> Option<&Scenario> {
        self.scenarios.get(&kind)
    }

    /// Scenarios in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// Scenarios whose reported service level does not reach the target
    pub fn unmet_targets(&self) -> impl Iterator<Item = &Scenario> {
        self.iter().filter(|scenario| !scenario.results.meets_target())
    }
}

/// Derives and solves the scenarios of a [`ScenarioSet`]
#[derive(Debug, Clone, Default)]
pub struct ScenarioGenerator {
    solver: ErlangSolver,
}

impl ScenarioGenerator {
    pub fn new(solver: ErlangSolver) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &ErlangSolver {
        &self.solver
    }

    /// Build and solve all four scenarios.
    ///
    /// Fails with `EmptyDataset` when the history carries no handle-time
    /// samples, and with `InvalidInput` when a derived input is rejected by the
    /// solver.
    pub fn generate(&self, historical: &HistoricalAnalysis, targets: &ServiceTargets) -> Result<ScenarioSet> {
        let average_aht = historical
            .handle_time
            .as_ref()
            .map(|aht| aht.mean)
            .ok_or_else(|| CallCenterError::empty_dataset("no handle-time samples to build scenarios from"))?;
        let peak_aht = historical.peak_hour_aht().unwrap_or(average_aht);

        let hourly = stats::sorted(&historical.hourly_volumes());
        let volume_stats = VolumeStats {
            average: historical.volume.avg_calls_per_hour,
            peak: historical.volume.peak_volume as f64,
            p90: stats::percentile(&hourly, 0.90).unwrap_or(0.0),
            p75: stats::percentile(&hourly, 0.75).unwrap_or(0.0),
        };
        let handle_time = HandleTimeUsed {
            average_used: average_aht,
            peak_used: peak_aht,
        };

        info!(
            "🧭 Generating scenarios: avg {:.1}, peak {:.0}, p90 {:.1}, p75 {:.1} calls/h",
            volume_stats.average, volume_stats.peak, volume_stats.p90, volume_stats.p75
        );
        debug!("⏱️ Scenario AHT: average {:.1}s, peak hour {:.1}s", average_aht, peak_aht);

        let inputs: Vec<(ScenarioKind, ErlangInputs)> = ScenarioKind::ALL
            .iter()
            .map(|kind| {
                let (volume, aht) = match kind {
                    ScenarioKind::Average => (volume_stats.average, average_aht),
                    ScenarioKind::Peak => (volume_stats.peak, peak_aht),
                    ScenarioKind::Conservative => (volume_stats.p90, average_aht),
                    ScenarioKind::Optimistic => (volume_stats.p75, average_aht),
                };
                let inputs = ErlangInputs::new(volume, aht, targets.sla_target, targets.answer_time_seconds)
                    .with_shrinkage(targets.shrinkage_percentage);
                (*kind, inputs)
            })
            .collect();

        let solved: Vec<(ScenarioKind, ErlangInputs, Result<ErlangResults>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|(kind, inputs)| {
                    let solver = &self.solver;
                    (*kind, *inputs, scope.spawn(move || solver.calculate(inputs)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(kind, inputs, handle)| {
                    let results = handle.join().unwrap_or_else(|_| {
                        Err(CallCenterError::internal(format!("{} scenario worker panicked", kind)))
                    });
                    (kind, inputs, results)
                })
                .collect()
        });

        let mut scenarios = BTreeMap::new();
        for (kind, inputs, results) in solved {
            let results = results?;
            info!(
                "   📋 {}: {} agents ({} with shrinkage), SL {:.1}%",
                kind,
                results.agents_required,
                results.agents_with_shrinkage,
                results.service_level * 100.0
            );
            scenarios.insert(kind, Scenario { kind, inputs, results });
        }

        Ok(ScenarioSet {
            scenarios,
            volume_stats,
            handle_time,
            targets: *targets,
        })
    }
}
