//! Erlang-C solver: wait probability, staffing search and derived metrics.
//!
//! The wait probability is evaluated in the log domain
//! (`k ln A - ln k!` terms combined with log-sum-exp), which stays finite for
//! offered loads in the hundreds of Erlangs where `A^N / N!` overflows.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::traffic::traffic_intensity;
use super::{ErlangInputs, ErlangResults, WaitTime};
use crate::error::Result;

/// Number of candidate agent counts tried by the staffing search
pub const DEFAULT_SEARCH_WINDOW: u32 = 50;

/// Multiplier applied to the answer-time target to obtain the handle time used
/// while searching for the minimum agent count
pub const DEFAULT_SEARCH_AHT_MULTIPLIER: f64 = 3.0;

/// Handle time fed to the service-level formula during the staffing search.
///
/// `AnswerTimeMultiple(3.0)` reproduces the historical behaviour of searching
/// against `answer_time * 3` instead of the real AHT. `Actual` searches against
/// the caller's handle time. Switching changes every staffing figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchHandleTime {
    AnswerTimeMultiple(f64),
    Actual,
}

impl Default for SearchHandleTime {
    fn default() -> Self {
        SearchHandleTime::AnswerTimeMultiple(DEFAULT_SEARCH_AHT_MULTIPLIER)
    }
}

impl SearchHandleTime {
    /// Handle time in seconds used for one search
    pub fn resolve(&self, answer_time_seconds: u32, aht_seconds: f64) -> f64 {
        match self {
            SearchHandleTime::AnswerTimeMultiple(multiplier) => answer_time_seconds as f64 * multiplier,
            SearchHandleTime::Actual => aht_seconds,
        }
    }
}

/// Solver tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Candidates examined from the theoretical floor `max(1, ceil(A))`
    pub search_window: u32,
    pub search_handle_time: SearchHandleTime,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            search_window: DEFAULT_SEARCH_WINDOW,
            search_handle_time: SearchHandleTime::default(),
        }
    }
}

/// Outcome of the minimum-agents search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSearch {
    pub agents: u32,
    /// Service level of `agents` under the search handle time
    pub service_level: f64,
    /// False when the window was exhausted; `agents` is then the last candidate
    pub target_met: bool,
}

/// Erlang-C staffing calculator
#[derive(Debug, Clone, Default)]
pub struct ErlangSolver {
    config: SolverConfig,
}

impl ErlangSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Smallest agent count whose service level reaches `sla_target`.
    ///
    /// Candidates run from `N0 = max(1, ceil(A))` for `search_window` steps.
    /// When none qualifies the last candidate `N0 + window - 1` is returned with
    /// `target_met = false`.
    pub fn minimum_agents(
        &self,
        traffic: f64,
        sla_target: f64,
        answer_time_seconds: u32,
        aht_seconds: f64,
    ) -> AgentSearch {
        let floor = (traffic.ceil().max(1.0)) as u32;
        let window = self.config.search_window.max(1);
        let search_aht = self
            .config
            .search_handle_time
            .resolve(answer_time_seconds, aht_seconds);

        let mut last_level = 0.0;
        for agents in floor..floor.saturating_add(window) {
            let probability = wait_probability(traffic, agents);
            let level = service_level(probability, traffic, agents, search_aht, answer_time_seconds);
            debug!("🔍 {} agents -> SL {:.4} (search AHT {:.1}s)", agents, level, search_aht);

            if level >= sla_target {
                debug!("🎯 Minimum agents found: {} (SL {:.1}%)", agents, level * 100.0);
                return AgentSearch {
                    agents,
                    service_level: level,
                    target_met: true,
                };
            }
            last_level = level;
        }

        let agents = floor.saturating_add(window - 1);
        warn!(
            "⚠️ No staffing within {} candidates meets SL {:.1}% for {:.2} Erlangs, falling back to {} agents",
            window,
            sla_target * 100.0,
            traffic,
            agents
        );
        AgentSearch {
            agents,
            service_level: last_level,
            target_met: false,
        }
    }

    /// Full dimensioning for one set of inputs.
    ///
    /// Fails only on malformed inputs; overload is reported through sentinels.
    pub fn calculate(&self, inputs: &ErlangInputs) -> Result<ErlangResults> {
        inputs.validate()?;

        info!(
            "🧮 Calculating Erlang C: {:.1} calls/h, AHT {:.1}s, SLA {:.1}% in {}s",
            inputs.calls_per_hour,
            inputs.average_handle_time_seconds,
            inputs.service_level_target * 100.0,
            inputs.answer_time_target_seconds
        );

        let traffic = traffic_intensity(inputs.calls_per_hour, inputs.average_handle_time_seconds);
        debug!("📊 Traffic intensity: {:.3} Erlangs", traffic);

        let search = self.minimum_agents(
            traffic,
            inputs.service_level_target,
            inputs.answer_time_target_seconds,
            inputs.average_handle_time_seconds,
        );
        let agents = search.agents;

        let probability = wait_probability(traffic, agents);
        let level = service_level(
            probability,
            traffic,
            agents,
            inputs.average_handle_time_seconds,
            inputs.answer_time_target_seconds,
        );
        let service_level_met = level >= inputs.service_level_target;
        if search.target_met && !service_level_met {
            warn!(
                "⚠️ {} agents meet the target under the search handle time but reach only {:.1}% SL with the real AHT",
                agents,
                level * 100.0
            );
        }

        let results = ErlangResults {
            agents_required: agents,
            utilization: traffic / agents as f64,
            service_level: level,
            average_wait: average_wait_time(probability, traffic, agents, inputs.average_handle_time_seconds),
            probability_of_wait: probability,
            agents_with_shrinkage: apply_shrinkage(agents, inputs.shrinkage_percentage),
            traffic_intensity_erlangs: traffic,
            target_met: search.target_met,
            service_level_met,
        };

        info!(
            "👥 {} agents ({} with {:.1}% shrinkage), utilization {:.1}%, SL {:.1}%, wait {}",
            results.agents_required,
            results.agents_with_shrinkage,
            inputs.shrinkage_percentage,
            results.utilization * 100.0,
            results.service_level * 100.0,
            results.average_wait
        );
        Ok(results)
    }
}

/// Erlang-C probability that a call waits.
///
/// Returns `1.0` when `agents <= traffic` (unstable queue) and `0.0` for no
/// offered load.
pub fn wait_probability(traffic: f64, agents: u32) -> f64 {
    if agents == 0 || agents as f64 <= traffic {
        return 1.0;
    }
    if traffic <= 0.0 {
        return 0.0;
    }

    match log_domain_probability(traffic, agents) {
        Some(probability) => probability.clamp(0.0, 1.0),
        None => {
            warn!(
                "⚠️ Log-domain Erlang C not finite for A={:.3}, N={}, using (A/N)^N approximation",
                traffic, agents
            );
            approximate_probability(traffic, agents)
        }
    }
}

fn log_domain_probability(traffic: f64, agents: u32) -> Option<f64> {
    let ln_a = traffic.ln();
    let n = agents as f64;

    // streaming log-sum-exp over ln(A^k / k!) for k in 0..N
    let mut ln_factorial = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut scaled_sum = 0.0;
    let mut accumulate = |term: f64| {
        if term > max {
            scaled_sum = scaled_sum * (max - term).exp() + 1.0;
            max = term;
        } else {
            scaled_sum += (term - max).exp();
        }
    };
    for k in 0..agents {
        if k > 0 {
            ln_factorial += (k as f64).ln();
        }
        accumulate(k as f64 * ln_a - ln_factorial);
    }

    // ln(A^N / N! * N / (N - A))
    let ln_factorial_n = ln_factorial + n.ln();
    let ln_queue_term = n * ln_a - ln_factorial_n + n.ln() - (n - traffic).ln();
    accumulate(ln_queue_term);

    if !max.is_finite() {
        return None;
    }
    let ln_total = max + scaled_sum.ln();

    let probability = (ln_queue_term - ln_total).exp();
    probability.is_finite().then_some(probability)
}

/// Last-resort approximation `(A/N)^N`; not exact, only used when the
/// log-domain evaluation is not finite.
fn approximate_probability(traffic: f64, agents: u32) -> f64 {
    let rho = traffic / agents as f64;
    if rho >= 1.0 {
        return 1.0;
    }
    let approximation = rho.powf(agents as f64);
    if approximation.is_finite() {
        approximation.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Erlang-C probability from the direct sum of `A^k / k!` terms.
///
/// Terms are built incrementally rather than from factorials. Returns `None`
/// once the terms overflow; [`wait_probability`] should be preferred.
pub fn erlang_c_direct(traffic: f64, agents: u32) -> Option<f64> {
    let n = agents as f64;
    if agents == 0 || n <= traffic {
        return Some(1.0);
    }

    let mut term = 1.0;
    let mut sum = 0.0;
    for k in 0..agents {
        if k > 0 {
            term *= traffic / k as f64;
        }
        sum += term;
    }
    let queue_term = term * traffic / n * (n / (n - traffic));
    let probability = queue_term / (sum + queue_term);

    (sum.is_finite() && probability.is_finite()).then(|| probability.clamp(0.0, 1.0))
}

/// Mean wait `p * AHT / (N - A)`, or [`WaitTime::Infinite`] when `N <= A`.
pub fn average_wait_time(probability: f64, traffic: f64, agents: u32, aht_seconds: f64) -> WaitTime {
    let n = agents as f64;
    if n <= traffic {
        return WaitTime::Infinite;
    }
    WaitTime::Finite((probability * aht_seconds / (n - traffic)).max(0.0))
}

/// Fraction answered within the target: `1 - p * exp(-(N - A) * t / AHT)`.
///
/// Exactly `0.0` when `N <= A`; clamped to [0, 1] otherwise.
pub fn service_level(
    probability: f64,
    traffic: f64,
    agents: u32,
    aht_seconds: f64,
    target_seconds: u32,
) -> f64 {
    let n = agents as f64;
    if n <= traffic {
        return 0.0;
    }

    let decay = if target_seconds == 0 {
        1.0
    } else {
        (-(n - traffic) * target_seconds as f64 / aht_seconds).exp()
    };
    let level = 1.0 - probability * decay;
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// `ceil(base * (1 + pct / 100))`, never below `base`.
pub fn apply_shrinkage(base_agents: u32, shrinkage_pct: f64) -> u32 {
    let raw = base_agents as f64 * (1.0 + shrinkage_pct / 100.0);
    // products such as 10 * 1.1 land a few ulps above an integer
    let nearest = raw.round();
    let adjusted = if (raw - nearest).abs() < 1e-9 { nearest } else { raw.ceil() };
    (adjusted as u32).max(base_agents)
}
