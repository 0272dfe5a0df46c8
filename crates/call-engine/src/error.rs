use chrono::NaiveDate;
use thiserror::Error;

use crate::database::DatabaseError;

/// Error types for staffing calculations and campaign analysis
///
/// Numeric edge cases inside the Erlang-C solver (overload, zero volume) never
/// produce an error; they resolve to sentinel values. Only malformed inputs,
/// missing data and upstream failures surface here.
///
/// # Examples
///
/// ```
/// use dimensioner_call_engine::{CallCenterError, Result};
///
/// fn check_volume(calls_per_hour: f64) -> Result<()> {
///     if calls_per_hour <= 0.0 {
///         return Err(CallCenterError::invalid_input("calls_per_hour must be positive"));
///     }
///     Ok(())
/// }
///
/// match check_volume(0.0) {
///     Err(CallCenterError::InvalidInput(msg)) => println!("rejected: {}", msg),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum CallCenterError {
    /// Malformed Erlang-C inputs (non-positive volume or handle time,
    /// service-level target outside (0, 1], negative shrinkage)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No usable historical records for the requested range
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Upstream data source failure, with the range that was requested
    #[error("Data source error for {start} - {end}: {source}")]
    DataSource {
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        source: DatabaseError,
    },

    /// Observed wait time is zero or undefined, so precision cannot be computed
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// The staffing search exhausted its window without meeting the target.
    ///
    /// Only produced when a caller asks for a hard failure through
    /// [`ErlangResults::require_target_met`](crate::erlang::ErlangResults::require_target_met).
    #[error("Staffing target unreachable: {agents} agents reach {achieved:.4} (target {target:.4})")]
    StaffingTargetUnreachable { agents: u32, achieved: f64, target: f64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CallCenterError {
    /// Create a new InvalidInput error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new EmptyDataset error
    pub fn empty_dataset<S: Into<String>>(msg: S) -> Self {
        Self::EmptyDataset(msg.into())
    }

    /// Wrap a data source failure together with the requested range
    pub fn data_source(start: NaiveDate, end: NaiveDate, source: DatabaseError) -> Self {
        Self::DataSource { start, end, source }
    }

    /// Create a new DivisionUndefined error
    pub fn division_undefined<S: Into<String>>(msg: S) -> Self {
        Self::DivisionUndefined(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for staffing and analysis operations
pub type Result<T> = std::result::Result<T, CallCenterError>;
