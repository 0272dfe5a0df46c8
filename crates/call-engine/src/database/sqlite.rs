//! SQLite-backed interaction source.
//!
//! SQLite has no native date type, so dates and timestamps are read as ISO-8601
//! text (`2025-05-14`, `2025-05-14 09:31:00` or `2025-05-14T09:31:00`).
//! Durations may be stored as REAL, INTEGER or numeric TEXT; anything that does
//! not parse becomes a missing value.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, warn};

use super::{AvailableRange, DatabaseConfig, DatabaseError, InteractionSource};
use crate::analysis::record::{coerce_seconds, parse_seconds};
use crate::analysis::InteractionRecord;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Reads interaction records from one SQLite table
#[derive(Debug, Clone)]
pub struct SqliteInteractionSource {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl SqliteInteractionSource {
    /// Open a pool for `config.database_url` after validating the mapping
    pub async fn connect(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        info!("🔗 Connecting to interaction store: {}", config.database_url);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.database_url)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!("✅ Interaction store connected (table {})", config.table_name);
        Ok(Self { pool, config })
    }

    /// Use an existing pool
    pub fn with_pool(pool: SqlitePool, config: DatabaseConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn select_sql(&self) -> String {
        let c = &self.config.columns;
        format!(
            "SELECT {date} AS date, {agent} AS agent_id, {start} AS interval_start, \
             {talk} AS talk_time, {wait} AS wait_time \
             FROM {table} \
             WHERE date({date}) >= ? AND date({date}) <= ? \
             ORDER BY {date}, {start} \
             LIMIT ?",
            date = c.date,
            agent = c.agent_id,
            start = c.interval_start,
            talk = c.talk_time,
            wait = c.wait_time,
            table = self.config.table_name,
        )
    }

    fn range_sql(&self) -> String {
        let c = &self.config.columns;
        format!(
            "SELECT MIN({date}) AS first_date, MAX({date}) AS last_date, \
             COUNT(*) AS total_records, COUNT(DISTINCT {agent}) AS total_agents \
             FROM {table}",
            date = c.date,
            agent = c.agent_id,
            table = self.config.table_name,
        )
    }
}

#[async_trait]
impl InteractionSource for SqliteInteractionSource {
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<InteractionRecord>, DatabaseError> {
        info!("🔍 Fetching interactions {} - {}", start, end);
        let sql = self.select_sql();
        debug!("Query: {}", sql);

        let rows = sqlx::query(&sql)
            .bind(start.format("%Y-%m-%d").to_string())
            .bind(end.format("%Y-%m-%d").to_string())
            .bind(i64::from(self.config.max_records))
            .fetch_all(&self.pool)
            .await?;

        let records = rows.iter().map(decode_record).collect::<Result<Vec<_>, _>>()?;

        if records.len() as u64 == u64::from(self.config.max_records) {
            warn!(
                "⚠️ Fetch hit the {} record cap, later interactions are not included",
                self.config.max_records
            );
        }
        if records.is_empty() {
            warn!("⚠️ No interactions found for {} - {}", start, end);
        } else {
            info!("📊 Fetched {} interactions", records.len());
        }
        Ok(records)
    }

    async fn available_range(&self) -> Result<Option<AvailableRange>, DatabaseError> {
        let row = sqlx::query(&self.range_sql()).fetch_one(&self.pool).await?;

        let first: Option<String> = row.try_get("first_date")?;
        let last: Option<String> = row.try_get("last_date")?;
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(None);
        };

        let total_records: i64 = row.try_get("total_records")?;
        let total_agents: i64 = row.try_get("total_agents")?;
        Ok(Some(AvailableRange {
            start: parse_date(&first)?,
            end: parse_date(&last)?,
            total_records: total_records.max(0) as u64,
            total_agents: total_agents.max(0) as u64,
        }))
    }
}

fn decode_record(row: &SqliteRow) -> Result<InteractionRecord, DatabaseError> {
    let date: String = row.try_get("date")?;
    let start: String = row.try_get("interval_start")?;
    let agent_id = match row.try_get::<Option<String>, _>("agent_id") {
        Ok(agent) => agent.unwrap_or_default(),
        Err(_) => row
            .try_get::<Option<i64>, _>("agent_id")?
            .map(|id| id.to_string())
            .unwrap_or_default(),
    };

    Ok(InteractionRecord::new(
        parse_date(&date)?,
        agent_id,
        parse_timestamp(&start)?,
        decode_seconds(row, "talk_time"),
        decode_seconds(row, "wait_time"),
    ))
}

/// REAL, INTEGER or numeric TEXT; anything else is missing
fn decode_seconds(row: &SqliteRow, column: &str) -> Option<f64> {
    if let Ok(value) = row.try_get::<Option<f64>, _>(column) {
        return coerce_seconds(value);
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return coerce_seconds(value.map(|v| v as f64));
    }
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .and_then(|raw| parse_seconds(&raw))
}

fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Schema(format!("invalid date {:?}: {}", raw, e)))
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DatabaseError::Schema(format!("invalid timestamp {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_text_dates() {
        assert_eq!(
            parse_date("2025-05-14").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 14).unwrap()
        );
        assert_eq!(
            parse_date("2025-05-14 00:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 14).unwrap()
        );
        assert!(parse_date("14/05/2025").is_err());

        let expected = NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(9, 31, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-05-14 09:31:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-05-14T09:31:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-05-14 09:31:00.000").unwrap(), expected);
        assert!(matches!(parse_timestamp("09:31"), Err(DatabaseError::Schema(_))));
    }
}
