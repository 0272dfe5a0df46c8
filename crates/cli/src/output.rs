//! Terminal rendering of results

use colored::Colorize;
use dimensioner_call_engine::database::AvailableRange;
use dimensioner_call_engine::validation::ScenarioComparison;
use dimensioner_call_engine::{CampaignAnalysis, ErlangInputs, ErlangResults, WaitTime};
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub fn header(title: &str) {
    println!("\n{}\n", title.bold().underline());
}

pub fn success(message: &str) {
    println!("{} {}", "✅".green(), message.green());
}

pub fn warn(message: &str) {
    eprintln!("{} {}", "⚠️ ".yellow(), message.yellow());
}

pub fn bullet(message: &str) {
    println!("  • {}", message);
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Calls/h")]
    calls: String,
    #[tabled(rename = "AHT (s)")]
    aht: String,
    #[tabled(rename = "Agents")]
    agents: u32,
    #[tabled(rename = "With shrinkage")]
    with_shrinkage: u32,
    #[tabled(rename = "SL")]
    service_level: String,
    #[tabled(rename = "Wait")]
    wait: String,
    #[tabled(rename = "Precision")]
    precision: String,
}

fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn wait(wait: &WaitTime) -> String {
    wait.to_string()
}

pub fn render_erlang(inputs: &ErlangInputs, results: &ErlangResults) {
    header("Erlang C dimensioning");
    let rows = vec![
        MetricRow {
            metric: "Calls per hour",
            value: format!("{:.1}", inputs.calls_per_hour),
        },
        MetricRow {
            metric: "Average handle time",
            value: format!("{:.1}s", inputs.average_handle_time_seconds),
        },
        MetricRow {
            metric: "Traffic intensity",
            value: format!("{:.3} Erlangs", results.traffic_intensity_erlangs),
        },
        MetricRow {
            metric: "Agents required",
            value: results.agents_required.to_string(),
        },
        MetricRow {
            metric: "Agents with shrinkage",
            value: format!("{} ({:.1}%)", results.agents_with_shrinkage, inputs.shrinkage_percentage),
        },
        MetricRow {
            metric: "Service level",
            value: format!(
                "{} within {}s (target {})",
                pct(results.service_level),
                inputs.answer_time_target_seconds,
                pct(inputs.service_level_target)
            ),
        },
        MetricRow {
            metric: "Utilization",
            value: pct(results.utilization),
        },
        MetricRow {
            metric: "Probability of waiting",
            value: pct(results.probability_of_wait),
        },
        MetricRow {
            metric: "Average wait",
            value: wait(&results.average_wait),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    if results.meets_target() {
        success("Service-level target reached");
    } else if results.target_met {
        warn("Staffing search met the target against its search handle time, but the real AHT falls short");
    } else {
        warn("Service-level target not reachable within the staffing search window");
    }
}

pub fn render_analysis(analysis: &CampaignAnalysis) {
    let historical = &analysis.historical;
    header(&format!(
        "Campaign analysis {} - {} ({} days)",
        historical.period.start, historical.period.end, historical.period.days
    ));

    let mut rows = vec![
        MetricRow {
            metric: "Calls analyzed",
            value: historical.total_calls.to_string(),
        },
        MetricRow {
            metric: "Average calls/hour",
            value: format!("{:.1}", historical.volume.avg_calls_per_hour),
        },
        MetricRow {
            metric: "Peak hour",
            value: format!("{}h ({} calls)", historical.volume.peak_hour, historical.volume.peak_volume),
        },
        MetricRow {
            metric: "Average agents/day",
            value: format!("{:.1}", historical.resources.avg_agents_per_day),
        },
    ];
    if let Some(aht) = &historical.handle_time {
        rows.push(MetricRow {
            metric: "Handle time (mean / p90)",
            value: format!("{:.1}s / {:.1}s", aht.mean, aht.p90),
        });
    }
    let observed = &analysis.validation.observed;
    rows.push(MetricRow {
        metric: "Observed wait (mean / p90)",
        value: format!("{:.1}s / {:.1}s", observed.wait_mean, observed.wait_p90),
    });
    rows.push(MetricRow {
        metric: "Observed service level",
        value: pct(observed.sla),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));

    header("Scenarios");
    let scenario_rows: Vec<ScenarioRow> = analysis
        .scenarios
        .iter()
        .map(|scenario| {
            let precision = analysis
                .validation
                .comparison(scenario.kind)
                .and_then(|c: &ScenarioComparison| c.wait.precision_percentage)
                .map_or_else(|| "n/a".to_string(), |p| format!("{:.1}%", p));
            ScenarioRow {
                scenario: scenario.kind.to_string(),
                calls: format!("{:.1}", scenario.inputs.calls_per_hour),
                aht: format!("{:.1}", scenario.inputs.average_handle_time_seconds),
                agents: scenario.results.agents_required,
                with_shrinkage: scenario.results.agents_with_shrinkage,
                service_level: pct(scenario.results.service_level),
                wait: wait(&scenario.results.average_wait),
                precision,
            }
        })
        .collect();
    println!("{}", Table::new(scenario_rows).with(Style::rounded()));

    header("Recommendations");
    for recommendation in analysis.recommendations.iter() {
        bullet(&format!("{} ({})", recommendation.description, recommendation.detail));
    }

    let summary = &analysis.summary;
    header("Executive summary");
    success(&format!(
        "{} agents recommended, based on the '{}' scenario",
        summary.recommended_agents, summary.base_scenario
    ));
    match summary.model_precision {
        Some(precision) => bullet(&format!("Model precision: {:.1}%", precision)),
        None => warn("Every scenario is overloaded; no model precision available"),
    }
}

pub fn render_range(range: Option<&AvailableRange>) {
    header("Available data");
    match range {
        Some(range) => {
            let rows = vec![
                MetricRow {
                    metric: "First day",
                    value: range.start.to_string(),
                },
                MetricRow {
                    metric: "Last day",
                    value: range.end.to_string(),
                },
                MetricRow {
                    metric: "Records",
                    value: range.total_records.to_string(),
                },
                MetricRow {
                    metric: "Agents",
                    value: range.total_agents.to_string(),
                },
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        None => warn("The data source holds no interactions"),
    }
}
