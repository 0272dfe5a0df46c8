//! Back-testing of scenarios against what actually happened.
//!
//! Every scenario's predicted wait, service level and staffing is compared
//! with the observed values of the same records. Wait-time precision is the
//! score used to pick the scenario that best explains the history.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{stats, InteractionRecord};
use crate::erlang::WaitTime;
use crate::error::{CallCenterError, Result};
use crate::scenarios::{ScenarioKind, ScenarioSet};

/// Observed outcome of the analysed period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedStats {
    pub wait_mean: f64,
    pub wait_median: f64,
    pub wait_p90: f64,
    pub wait_std: f64,
    /// Fraction of calls with a wait sample answered within the target
    pub sla: f64,
    pub avg_agents_per_day: f64,
    pub total_calls: u64,
    /// Records carrying a usable wait sample
    pub wait_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitComparison {
    pub predicted: WaitTime,
    pub observed: f64,
    /// `None` when the prediction is infinite
    pub absolute_difference: Option<f64>,
    /// `100 - |predicted - observed| / observed * 100`, unclamped.
    ///
    /// `None` when the prediction is infinite.
    pub precision_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaComparison {
    pub predicted: f64,
    pub observed: f64,
    pub absolute_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentComparison {
    /// Shrinkage-adjusted staffing of the scenario
    pub predicted: u32,
    pub observed_avg: f64,
    /// Predicted minus observed; positive means the scenario staffs more
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub kind: ScenarioKind,
    pub wait: WaitComparison,
    pub sla: SlaComparison,
    pub agents: AgentComparison,
}

impl ScenarioComparison {
    /// Wait precision clamped to [0, 100] for display; `0.0` when overloaded
    pub fn confidence(&self) -> f64 {
        self.wait
            .precision_percentage
            .map_or(0.0, |precision| precision.clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestScenario {
    pub kind: ScenarioKind,
    pub precision: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub observed: ObservedStats,
    pub comparisons: BTreeMap<ScenarioKind, ScenarioComparison>,
    /// `None` only when every scenario predicts an infinite wait
    pub best_scenario: Option<BestScenario>,
}

impl ValidationReport {
    pub fn comparison(&self, kind: ScenarioKind) -> Option<&ScenarioComparison> {
        self.comparisons.get(&kind)
    }
}

/// Compares scenario predictions with observed records
#[derive(Debug, Clone, Default)]
pub struct ScenarioValidator;

impl ScenarioValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate every scenario of `scenarios` against `records`.
    ///
    /// Fails with `EmptyDataset` when `records` is empty and with
    /// `DivisionUndefined` when no record carries a wait sample or the observed
    /// mean wait is exactly zero.
    pub fn validate(&self, records: &[InteractionRecord], scenarios: &ScenarioSet) -> Result<ValidationReport> {
        let observed = observed_stats(records, scenarios.targets.answer_time_seconds)?;

        info!(
            "✅ Validating {} scenarios against {} calls (observed wait {:.1}s, SLA {:.1}%)",
            scenarios.scenarios.len(),
            observed.total_calls,
            observed.wait_mean,
            observed.sla * 100.0
        );

        let comparisons: BTreeMap<ScenarioKind, ScenarioComparison> = scenarios
            .iter()
            .map(|scenario| {
                let results = &scenario.results;
                let (absolute_difference, precision_percentage) = match results.average_wait {
                    WaitTime::Finite(predicted) => {
                        let difference = (predicted - observed.wait_mean).abs();
                        (Some(difference), Some(100.0 - difference / observed.wait_mean * 100.0))
                    }
                    WaitTime::Infinite => {
                        warn!("⚠️ {} scenario is overloaded, skipping its wait precision", scenario.kind);
                        (None, None)
                    }
                };

                let comparison = ScenarioComparison {
                    kind: scenario.kind,
                    wait: WaitComparison {
                        predicted: results.average_wait,
                        observed: observed.wait_mean,
                        absolute_difference,
                        precision_percentage,
                    },
                    sla: SlaComparison {
                        predicted: results.service_level,
                        observed: observed.sla,
                        absolute_difference: (results.service_level - observed.sla).abs(),
                    },
                    agents: AgentComparison {
                        predicted: results.agents_with_shrinkage,
                        observed_avg: observed.avg_agents_per_day,
                        difference: results.agents_with_shrinkage as f64 - observed.avg_agents_per_day,
                    },
                };
                (scenario.kind, comparison)
            })
            .collect();

        let best_scenario = best_scenario(&comparisons);
        match &best_scenario {
            Some(best) => info!("🏆 Best scenario: {} ({:.1}% wait precision)", best.kind, best.precision),
            None => warn!("⚠️ Every scenario is overloaded, no best scenario"),
        }

        Ok(ValidationReport {
            observed,
            comparisons,
            best_scenario,
        })
    }
}

/// Highest finite precision; ties keep the earliest scenario in enumeration order.
pub fn best_scenario(comparisons: &BTreeMap<ScenarioKind, ScenarioComparison>) -> Option<BestScenario> {
    let mut best: Option<BestScenario> = None;
    for (kind, comparison) in comparisons {
        let Some(precision) = comparison.wait.precision_percentage else {
            continue;
        };
        if best.map_or(true, |current| precision > current.precision) {
            best = Some(BestScenario { kind: *kind, precision });
        }
    }
    best
}

fn observed_stats(records: &[InteractionRecord], answer_time_seconds: u32) -> Result<ObservedStats> {
    if records.is_empty() {
        return Err(CallCenterError::empty_dataset("no records to validate against"));
    }

    let waits: Vec<f64> = records.iter().filter_map(InteractionRecord::wait_time).collect();
    let Some(wait) = stats::SampleStats::from_values(&waits) else {
        return Err(CallCenterError::division_undefined(
            "no valid wait samples, wait precision is undefined",
        ));
    };
    if wait.mean == 0.0 {
        return Err(CallCenterError::division_undefined(
            "observed mean wait is zero, wait precision is undefined",
        ));
    }

    let within_target = waits.iter().filter(|w| **w <= answer_time_seconds as f64).count();
    let sla = within_target as f64 / waits.len() as f64;

    let mut agents_by_day: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for record in records {
        agents_by_day.entry(record.date).or_default().insert(record.agent_id.as_str());
    }
    let per_day: Vec<f64> = agents_by_day.values().map(|agents| agents.len() as f64).collect();

    Ok(ObservedStats {
        wait_mean: wait.mean,
        wait_median: wait.p50,
        wait_p90: wait.p90,
        wait_std: wait.std_dev,
        sla,
        avg_agents_per_day: stats::mean(&per_day).unwrap_or(0.0),
        total_calls: records.len() as u64,
        wait_samples: wait.samples,
    })
}
