//! # Historical Interaction Sources
//!
//! The analysis pipeline reads interaction records through the
//! [`InteractionSource`] trait. Two implementations ship with the crate:
//!
//! - [`SqliteInteractionSource`]: sqlx-backed reader over a configurable
//!   table and column mapping
//! - [`MemoryInteractionSource`]: records held in memory, for embedding and
//!   tests
//!
//! Sources report their own [`DatabaseError`]; the pipeline wraps it into
//! [`CallCenterError::DataSource`](crate::CallCenterError::DataSource) together
//! with the requested range.

pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::InteractionRecord;

pub use sqlite::SqliteInteractionSource;

/// Data source failures
#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// Table or columns do not match the configured mapping
    #[error("Schema mismatch: {0}")]
    Schema(String),

    /// Rejected configuration, such as an unsafe identifier
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DatabaseError::Connection("connection pool timed out".to_string()),
            sqlx::Error::Io(e) => DatabaseError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DatabaseError::Connection(e.to_string()),
            sqlx::Error::Configuration(e) => DatabaseError::Connection(e.to_string()),
            sqlx::Error::ColumnNotFound(column) => DatabaseError::Schema(format!("column not found: {}", column)),
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseError::Schema(format!("cannot decode column {}: {}", index, source))
            }
            other => DatabaseError::Query(other.to_string()),
        }
    }
}

/// Column names of the interaction table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub date: String,
    pub agent_id: String,
    pub interval_start: String,
    pub talk_time: String,
    pub wait_time: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "fecha".to_string(),
            agent_id: "usuarios".to_string(),
            interval_start: "fecha_hora".to_string(),
            talk_time: "tmo".to_string(),
            wait_time: "tme".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Every configured identifier, for validation
    pub fn identifiers(&self) -> [&str; 5] {
        [
            self.date.as_str(),
            self.agent_id.as_str(),
            self.interval_start.as_str(),
            self.talk_time.as_str(),
            self.wait_time.as_str(),
        ]
    }
}

/// Connection settings of the SQL source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub table_name: String,
    pub columns: ColumnMapping,
    /// Upper bound on records returned by one fetch
    pub max_records: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://interactions.db".to_string(),
            table_name: "interactions".to_string(),
            columns: ColumnMapping::default(),
            max_records: 50_000,
            connect_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Reject identifiers that cannot be safely interpolated into SQL
    pub fn validate(&self) -> Result<(), DatabaseError> {
        validate_identifier(&self.table_name)?;
        for column in self.columns.identifiers() {
            validate_identifier(column)?;
        }
        if self.max_records == 0 {
            return Err(DatabaseError::Validation("max_records must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Identifiers are limited to ASCII letters, digits and underscores and may
/// not start with a digit
pub fn validate_identifier(identifier: &str) -> Result<(), DatabaseError> {
    let mut chars = identifier.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DatabaseError::Validation(format!(
            "invalid SQL identifier: {:?}",
            identifier
        )))
    }
}

/// Dates and volume available in a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_records: u64,
    pub total_agents: u64,
}

/// Supplier of historical interaction records
#[async_trait]
pub trait InteractionSource: Send + Sync {
    /// Records whose date lies in `[start, end]`, ordered by date then start
    /// time
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<InteractionRecord>, DatabaseError>;

    /// `None` when the source holds no records
    async fn available_range(&self) -> Result<Option<AvailableRange>, DatabaseError>;
}

/// In-memory source
#[derive(Debug, Clone, Default)]
pub struct MemoryInteractionSource {
    records: Vec<InteractionRecord>,
}

impl MemoryInteractionSource {
    pub fn new(mut records: Vec<InteractionRecord>) -> Self {
        records.sort_by(|a, b| (a.date, a.interval_start).cmp(&(b.date, b.interval_start)));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl InteractionSource for MemoryInteractionSource {
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<InteractionRecord>, DatabaseError> {
        Ok(self
            .records
            .iter()
            .filter(|r| start <= r.date && r.date <= end)
            .cloned()
            .collect())
    }

    async fn available_range(&self) -> Result<Option<AvailableRange>, DatabaseError> {
        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            return Ok(None);
        };
        let agents: std::collections::HashSet<&str> =
            self.records.iter().map(|r| r.agent_id.as_str()).collect();
        Ok(Some(AvailableRange {
            start: first.date,
            end: last.date,
            total_records: self.records.len() as u64,
            total_agents: agents.len() as u64,
        }))
    }
}
