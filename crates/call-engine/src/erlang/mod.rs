//! # Erlang-C Dimensioning Module
//!
//! Translates call volume and handle time into the number of agents needed to
//! answer a target fraction of calls within a target wait, using the Erlang-C
//! (M/M/N, no abandonment) queueing model.
//!
//! ## Pipeline
//!
//! ```text
//! calls/hour, AHT ──► traffic intensity (Erlangs)
//!                          │
//!                          ▼
//!          minimum agents meeting the SLA target
//!                          │
//!                          ▼
//!   utilization, P(wait), average wait, service level
//!                          │
//!                          ▼
//!               shrinkage-adjusted agents
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dimensioner_call_engine::erlang::{ErlangInputs, ErlangSolver};
//!
//! # fn example() -> dimensioner_call_engine::Result<()> {
//! let solver = ErlangSolver::default();
//! let results = solver.calculate(&ErlangInputs::new(450.0, 240.0, 0.90, 20))?;
//!
//! println!("📊 {:.1} Erlangs", results.traffic_intensity_erlangs);
//! println!("👥 {} agents ({} with shrinkage)", results.agents_required, results.agents_with_shrinkage);
//! if !results.meets_target() {
//!     println!("⚠️ {:.1}% service level is below the target", results.service_level * 100.0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod solver;
pub mod traffic;

use serde::{Deserialize, Serialize};

use crate::error::{CallCenterError, Result};

pub use solver::{AgentSearch, ErlangSolver, SearchHandleTime, SolverConfig};
pub use traffic::traffic_intensity;

/// Default shrinkage applied when a caller does not provide one
pub const DEFAULT_SHRINKAGE_PERCENTAGE: f64 = 15.0;

/// Largest offered load accepted by [`ErlangInputs::validate`]. The staffing
/// search costs O(A) per candidate, so loads beyond this are rejected rather
/// than searched.
pub const MAX_TRAFFIC_ERLANGS: f64 = 1_000_000.0;

/// Parameters for one Erlang-C calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErlangInputs {
    /// Offered calls per hour
    pub calls_per_hour: f64,
    /// Average handle time in seconds
    pub average_handle_time_seconds: f64,
    /// Fraction of calls to answer within the answer-time target (0.90 = 90%)
    pub service_level_target: f64,
    /// Answer-time target in seconds
    pub answer_time_target_seconds: u32,
    /// Shrinkage percentage applied on top of the base staffing
    #[serde(default = "default_shrinkage")]
    pub shrinkage_percentage: f64,
}

fn default_shrinkage() -> f64 {
    DEFAULT_SHRINKAGE_PERCENTAGE
}

impl ErlangInputs {
    /// Inputs with the default shrinkage of 15%
    pub fn new(
        calls_per_hour: f64,
        average_handle_time_seconds: f64,
        service_level_target: f64,
        answer_time_target_seconds: u32,
    ) -> Self {
        Self {
            calls_per_hour,
            average_handle_time_seconds,
            service_level_target,
            answer_time_target_seconds,
            shrinkage_percentage: DEFAULT_SHRINKAGE_PERCENTAGE,
        }
    }

    /// Override the shrinkage percentage
    pub fn with_shrinkage(mut self, shrinkage_percentage: f64) -> Self {
        self.shrinkage_percentage = shrinkage_percentage;
        self
    }

    /// Reject inputs for which traffic intensity or the SLA target is undefined
    pub fn validate(&self) -> Result<()> {
        if !self.calls_per_hour.is_finite() || self.calls_per_hour <= 0.0 {
            return Err(CallCenterError::invalid_input(format!(
                "calls_per_hour must be positive, got {}",
                self.calls_per_hour
            )));
        }
        if !self.average_handle_time_seconds.is_finite() || self.average_handle_time_seconds <= 0.0 {
            return Err(CallCenterError::invalid_input(format!(
                "average_handle_time_seconds must be positive, got {}",
                self.average_handle_time_seconds
            )));
        }
        let traffic = traffic_intensity(self.calls_per_hour, self.average_handle_time_seconds);
        if !traffic.is_finite() || traffic > MAX_TRAFFIC_ERLANGS {
            return Err(CallCenterError::invalid_input(format!(
                "traffic intensity {:.0} Erlangs exceeds the supported maximum of {:.0}",
                traffic, MAX_TRAFFIC_ERLANGS
            )));
        }
        if !(self.service_level_target > 0.0 && self.service_level_target <= 1.0) {
            return Err(CallCenterError::invalid_input(format!(
                "service_level_target must be in (0, 1], got {}",
                self.service_level_target
            )));
        }
        if !self.shrinkage_percentage.is_finite() || self.shrinkage_percentage < 0.0 {
            return Err(CallCenterError::invalid_input(format!(
                "shrinkage_percentage must be >= 0, got {}",
                self.shrinkage_percentage
            )));
        }
        Ok(())
    }
}

/// Average wait in seconds, or the overload sentinel.
///
/// Serializes as `{"state":"finite","seconds":12.5}` or `{"state":"infinite"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "seconds", rename_all = "snake_case")]
pub enum WaitTime {
    Finite(f64),
    /// The queue is unstable (agents <= offered load)
    Infinite,
}

impl WaitTime {
    /// Seconds for a stable queue, `None` when overloaded
    pub fn seconds(&self) -> Option<f64> {
        match self {
            WaitTime::Finite(seconds) => Some(*seconds),
            WaitTime::Infinite => None,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, WaitTime::Infinite)
    }
}

impl std::fmt::Display for WaitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitTime::Finite(seconds) => write!(f, "{:.1}s", seconds),
            WaitTime::Infinite => write!(f, "∞"),
        }
    }
}

/// Output of one Erlang-C calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErlangResults {
    /// Minimum agents found by the staffing search
    pub agents_required: u32,
    /// Offered load divided by agents
    pub utilization: f64,
    /// Service level achieved with `agents_required` and the real handle time
    pub service_level: f64,
    pub average_wait: WaitTime,
    pub probability_of_wait: f64,
    /// `agents_required` inflated by shrinkage
    pub agents_with_shrinkage: u32,
    pub traffic_intensity_erlangs: f64,
    /// False when the search window was exhausted without meeting the target
    pub target_met: bool,
    /// Whether `service_level`, computed with the real handle time, reaches
    /// the target. The search may succeed against its own handle time while
    /// this stays false.
    pub service_level_met: bool,
}

impl ErlangResults {
    /// Rounded presentation view (percentages, three-decimal Erlangs)
    pub fn to_report(&self) -> ErlangReport {
        ErlangReport {
            agents_required: self.agents_required,
            utilization_pct: round_to(self.utilization * 100.0, 2),
            service_level_pct: round_to(self.service_level * 100.0, 2),
            average_wait: match self.average_wait {
                WaitTime::Finite(seconds) => WaitTime::Finite(round_to(seconds, 2)),
                WaitTime::Infinite => WaitTime::Infinite,
            },
            probability_of_wait_pct: round_to(self.probability_of_wait * 100.0, 2),
            agents_with_shrinkage: self.agents_with_shrinkage,
            traffic_intensity_erlangs: round_to(self.traffic_intensity_erlangs, 3),
            target_met: self.meets_target(),
        }
    }

    /// Search succeeded and the reported service level reaches the target
    pub fn meets_target(&self) -> bool {
        self.target_met && self.service_level_met
    }

    /// Turn the soft "target not met" condition into a hard error
    pub fn require_target_met(&self, target: f64) -> Result<&Self> {
        if self.meets_target() {
            Ok(self)
        } else {
            Err(CallCenterError::StaffingTargetUnreachable {
                agents: self.agents_required,
                achieved: self.service_level,
                target,
            })
        }
    }
}

/// Rounded, percentage-based view of [`ErlangResults`] for display and export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErlangReport {
    pub agents_required: u32,
    pub utilization_pct: f64,
    pub service_level_pct: f64,
    pub average_wait: WaitTime,
    pub probability_of_wait_pct: f64,
    pub agents_with_shrinkage: u32,
    pub traffic_intensity_erlangs: f64,
    pub target_met: bool,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_inputs() {
        assert!(ErlangInputs::new(0.0, 240.0, 0.9, 20).validate().is_err());
        assert!(ErlangInputs::new(100.0, -1.0, 0.9, 20).validate().is_err());
        assert!(ErlangInputs::new(100.0, 240.0, 0.0, 20).validate().is_err());
        assert!(ErlangInputs::new(100.0, 240.0, 1.01, 20).validate().is_err());
        assert!(ErlangInputs::new(100.0, 240.0, f64::NAN, 20).validate().is_err());
        assert!(ErlangInputs::new(100.0, 240.0, 0.9, 20).with_shrinkage(-5.0).validate().is_err());
        assert!(ErlangInputs::new(100.0, 240.0, 1.0, 0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_unbounded_traffic() {
        // 4e9 Erlangs
        let huge = ErlangInputs::new(4.8e10, 300.0, 0.9, 20);
        assert!(matches!(huge.validate(), Err(CallCenterError::InvalidInput(_))));
        assert!(ErlangInputs::new(f64::MAX, 1e10, 0.9, 20).validate().is_err());

        // exactly at the ceiling is accepted
        let at_limit = ErlangInputs::new(MAX_TRAFFIC_ERLANGS * 3600.0 / 360.0, 360.0, 0.9, 20);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn wait_time_serializes_tagged() {
        let finite = serde_json::to_value(WaitTime::Finite(12.5)).unwrap();
        assert_eq!(finite, serde_json::json!({"state": "finite", "seconds": 12.5}));

        let infinite = serde_json::to_value(WaitTime::Infinite).unwrap();
        assert_eq!(infinite, serde_json::json!({"state": "infinite"}));

        let back: WaitTime = serde_json::from_value(infinite).unwrap();
        assert!(back.is_infinite());
    }

    #[test]
    fn default_shrinkage_when_missing_from_json() {
        let inputs: ErlangInputs = serde_json::from_str(
            r#"{"calls_per_hour":100,"average_handle_time_seconds":180,
                "service_level_target":0.8,"answer_time_target_seconds":20}"#,
        )
        .unwrap();
        assert_eq!(inputs.shrinkage_percentage, DEFAULT_SHRINKAGE_PERCENTAGE);
    }
}
