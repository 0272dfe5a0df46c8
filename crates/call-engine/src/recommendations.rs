//! Recommendations and executive summary derived from a validated analysis.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::HistoricalAnalysis;
use crate::scenarios::{ScenarioKind, ScenarioSet};
use crate::validation::ValidationReport;

/// Handle time above which a training recommendation is emitted
pub const DEFAULT_AHT_ALERT_THRESHOLD_SECONDS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    RecommendedScenario,
    StaffingWarning,
    CriticalHour,
    HandleTimeOptimization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub description: String,
    pub detail: String,
    /// Agent count backing the recommendation, when it is about staffing
    pub recommended_agents: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub dimensioning: Vec<Recommendation>,
    pub operational: Vec<Recommendation>,
    pub improvements: Vec<Recommendation>,
}

impl Recommendations {
    pub fn len(&self) -> usize {
        self.dimensioning.len() + self.operational.len() + self.improvements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.dimensioning
            .iter()
            .chain(self.operational.iter())
            .chain(self.improvements.iter())
    }
}

/// Headline figures of a campaign analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub recommended_agents: u32,
    pub base_scenario: ScenarioKind,
    /// Wait precision of the base scenario; `None` when no scenario had one
    pub model_precision: Option<f64>,
    pub calls_analyzed: u64,
    pub period_days: i64,
    pub observed_sla: f64,
    pub observed_wait_mean: f64,
    pub observed_agents_per_day: f64,
}

#[derive(Debug, Clone)]
pub struct Recommender {
    aht_alert_threshold_seconds: f64,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(DEFAULT_AHT_ALERT_THRESHOLD_SECONDS)
    }
}

impl Recommender {
    pub fn new(aht_alert_threshold_seconds: f64) -> Self {
        Self {
            aht_alert_threshold_seconds,
        }
    }

    pub fn recommend(
        &self,
        historical: &HistoricalAnalysis,
        scenarios: &ScenarioSet,
        validation: &ValidationReport,
    ) -> Recommendations {
        let mut recommendations = Recommendations::default();

        if let Some(best) = &validation.best_scenario {
            if let Some(scenario) = scenarios.get(best.kind) {
                recommendations.dimensioning.push(Recommendation {
                    kind: RecommendationKind::RecommendedScenario,
                    description: format!("Use the '{}' scenario as the staffing baseline", best.kind),
                    detail: format!("Best wait-time precision: {:.1}%", best.precision),
                    recommended_agents: Some(scenario.results.agents_with_shrinkage),
                });
            }
        }

        for scenario in scenarios.unmet_targets() {
            recommendations.dimensioning.push(Recommendation {
                kind: RecommendationKind::StaffingWarning,
                description: format!(
                    "The '{}' scenario does not reach the {:.1}% service-level target",
                    scenario.kind,
                    scenarios.targets.sla_target * 100.0
                ),
                detail: if scenario.results.target_met {
                    format!(
                        "{} agents reach only {:.1}% service level with the observed handle time",
                        scenario.results.agents_required,
                        scenario.results.service_level * 100.0
                    )
                } else {
                    format!(
                        "Staffing search stopped at {} agents with {:.1}% service level",
                        scenario.results.agents_required,
                        scenario.results.service_level * 100.0
                    )
                },
                recommended_agents: Some(scenario.results.agents_with_shrinkage),
            });
        }

        recommendations.operational.push(Recommendation {
            kind: RecommendationKind::CriticalHour,
            description: format!("Reinforce staffing at {}h", historical.volume.peak_hour),
            detail: format!("Peak volume: {} calls/hour", historical.volume.peak_volume),
            recommended_agents: None,
        });

        if let Some(aht) = &historical.handle_time {
            if aht.mean > self.aht_alert_threshold_seconds {
                recommendations.improvements.push(Recommendation {
                    kind: RecommendationKind::HandleTimeOptimization,
                    description: format!("High average handle time: {:.0}s", aht.mean),
                    detail: "Consider agent training to reduce handle time".to_string(),
                    recommended_agents: None,
                });
            }
        }

        info!("💡 {} recommendations generated", recommendations.len());
        recommendations
    }

    /// Summary built on the best scenario, or `average` when there is none
    pub fn summarize(
        &self,
        historical: &HistoricalAnalysis,
        scenarios: &ScenarioSet,
        validation: &ValidationReport,
    ) -> ExecutiveSummary {
        let (base_scenario, model_precision) = match &validation.best_scenario {
            Some(best) => (best.kind, Some(best.precision)),
            None => (ScenarioKind::Average, None),
        };
        let recommended_agents = scenarios
            .get(base_scenario)
            .map_or(0, |scenario| scenario.results.agents_with_shrinkage);

        ExecutiveSummary {
            recommended_agents,
            base_scenario,
            model_precision,
            calls_analyzed: historical.total_calls,
            period_days: historical.period.days,
            observed_sla: validation.observed.sla,
            observed_wait_mean: validation.observed.wait_mean,
            observed_agents_per_day: validation.observed.avg_agents_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{HistoricalAggregator, InteractionRecord};
    use crate::scenarios::{ScenarioGenerator, ServiceTargets};
    use crate::validation::ScenarioValidator;
    use chrono::NaiveDate;

    fn records(talk: f64) -> Vec<InteractionRecord> {
        let date = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        let mut records = Vec::new();
        for (hour, count) in [(9, 40), (10, 60), (11, 30)] {
            for i in 0..count {
                records.push(InteractionRecord::new(
                    date,
                    format!("agent-{}", i % 8),
                    date.and_hms_opt(hour, i % 60, 0).unwrap(),
                    Some(talk),
                    Some(5.0 + (i % 10) as f64),
                ));
            }
        }
        records
    }

    fn run(talk: f64) -> (HistoricalAnalysis, ScenarioSet, ValidationReport) {
        let records = records(talk);
        let historical = HistoricalAggregator::default().aggregate_all(&records).unwrap();
        let scenarios = ScenarioGenerator::default()
            .generate(&historical, &ServiceTargets::default())
            .unwrap();
        let validation = ScenarioValidator::new().validate(&records, &scenarios).unwrap();
        (historical, scenarios, validation)
    }

    #[test]
    fn recommends_best_scenario_and_peak_hour() {
        let (historical, scenarios, validation) = run(200.0);
        let recommendations = Recommender::default().recommend(&historical, &scenarios, &validation);

        let best = validation.best_scenario.unwrap();
        let baseline = &recommendations.dimensioning[0];
        assert_eq!(baseline.kind, RecommendationKind::RecommendedScenario);
        assert_eq!(
            baseline.recommended_agents,
            Some(scenarios.get(best.kind).unwrap().results.agents_with_shrinkage)
        );

        assert_eq!(recommendations.operational.len(), 1);
        assert!(recommendations.operational[0].description.contains("10h"));
        assert!(recommendations.improvements.is_empty());
    }

    #[test]
    fn warns_for_every_scenario_below_target() {
        let (historical, scenarios, validation) = run(200.0);
        let recommendations = Recommender::default().recommend(&historical, &scenarios, &validation);

        let below_target: Vec<_> = scenarios
            .iter()
            .filter(|scenario| scenario.results.service_level < scenarios.targets.sla_target)
            .map(|scenario| scenario.kind)
            .collect();
        let warnings: Vec<_> = recommendations
            .dimensioning
            .iter()
            .filter(|r| r.kind == RecommendationKind::StaffingWarning)
            .collect();

        assert_eq!(warnings.len(), below_target.len());
        for kind in below_target {
            assert!(warnings.iter().any(|w| w.description.contains(&format!("'{}'", kind))));
        }
    }

    #[test]
    fn long_handle_time_triggers_training_suggestion() {
        let (historical, scenarios, validation) = run(420.0);
        let recommendations = Recommender::default().recommend(&historical, &scenarios, &validation);
        assert_eq!(recommendations.improvements.len(), 1);
        assert_eq!(
            recommendations.improvements[0].kind,
            RecommendationKind::HandleTimeOptimization
        );
    }

    #[test]
    fn summary_reflects_best_scenario() {
        let (historical, scenarios, validation) = run(200.0);
        let summary = Recommender::default().summarize(&historical, &scenarios, &validation);
        let best = validation.best_scenario.unwrap();

        assert_eq!(summary.base_scenario, best.kind);
        assert_eq!(summary.model_precision, Some(best.precision));
        assert_eq!(summary.calls_analyzed, 130);
        assert_eq!(summary.period_days, 1);
        assert_eq!(summary.observed_agents_per_day, 8.0);
    }
}
