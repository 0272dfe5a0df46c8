use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One serviced interaction as delivered by the historical data source.
///
/// Deserialization goes through [`InteractionRecord::new`]. Records built by
/// hand may still carry unusable durations in the public fields; statistics
/// read them through [`talk_time`](Self::talk_time) and
/// [`wait_time`](Self::wait_time), which drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawInteractionRecord")]
pub struct InteractionRecord {
    pub date: NaiveDate,
    pub agent_id: String,
    /// Start of the interaction; its hour and minute drive interval grouping
    pub interval_start: NaiveDateTime,
    /// Handle-time sample, `None` when missing or unusable
    pub talk_time_seconds: Option<f64>,
    /// Observed wait sample, `None` when missing or unusable
    pub wait_time_seconds: Option<f64>,
}

impl InteractionRecord {
    /// Build a record, coercing non-finite or negative durations to missing
    pub fn new(
        date: NaiveDate,
        agent_id: impl Into<String>,
        interval_start: NaiveDateTime,
        talk_time_seconds: Option<f64>,
        wait_time_seconds: Option<f64>,
    ) -> Self {
        Self {
            date,
            agent_id: agent_id.into(),
            interval_start,
            talk_time_seconds: coerce_seconds(talk_time_seconds),
            wait_time_seconds: coerce_seconds(wait_time_seconds),
        }
    }

    /// Usable handle-time sample
    pub fn talk_time(&self) -> Option<f64> {
        coerce_seconds(self.talk_time_seconds)
    }

    /// Usable wait sample
    pub fn wait_time(&self) -> Option<f64> {
        coerce_seconds(self.wait_time_seconds)
    }

    /// Hour of day (0-23) the interaction started in
    pub fn hour(&self) -> u32 {
        self.interval_start.hour()
    }

    /// Start minute of the `interval_minutes`-wide bucket within the hour
    pub fn interval_minute(&self, interval_minutes: u32) -> u32 {
        let width = interval_minutes.clamp(1, 60);
        (self.interval_start.minute() / width) * width
    }
}

#[derive(Deserialize)]
struct RawInteractionRecord {
    date: NaiveDate,
    agent_id: String,
    interval_start: NaiveDateTime,
    #[serde(default)]
    talk_time_seconds: Option<f64>,
    #[serde(default)]
    wait_time_seconds: Option<f64>,
}

impl From<RawInteractionRecord> for InteractionRecord {
    fn from(raw: RawInteractionRecord) -> Self {
        InteractionRecord::new(
            raw.date,
            raw.agent_id,
            raw.interval_start,
            raw.talk_time_seconds,
            raw.wait_time_seconds,
        )
    }
}

/// Keep only finite, non-negative durations
pub fn coerce_seconds(value: Option<f64>) -> Option<f64> {
    value.filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

/// Parse a textual duration, treating anything non-numeric as missing
pub fn parse_seconds(raw: &str) -> Option<f64> {
    coerce_seconds(raw.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn coerces_unusable_values() {
        let record = InteractionRecord::new(at(9, 0).date(), "a1", at(9, 0), Some(-3.0), Some(f64::NAN));
        assert_eq!(record.talk_time_seconds, None);
        assert_eq!(record.wait_time_seconds, None);

        assert_eq!(parse_seconds(" 42.5 "), Some(42.5));
        assert_eq!(parse_seconds("n/a"), None);
        assert_eq!(parse_seconds(""), None);
    }

    #[test]
    fn deserialization_coerces_durations() {
        let record: InteractionRecord = serde_json::from_str(
            r#"{"date":"2025-05-15","agent_id":"a1","interval_start":"2025-05-15T09:00:00",
                "talk_time_seconds":-12.0,"wait_time_seconds":8.0}"#,
        )
        .unwrap();
        assert_eq!(record.talk_time_seconds, None);
        assert_eq!(record.wait_time_seconds, Some(8.0));

        let record: InteractionRecord =
            serde_json::from_str(r#"{"date":"2025-05-15","agent_id":"a1","interval_start":"2025-05-15T09:00:00"}"#)
                .unwrap();
        assert_eq!(record.talk_time(), None);
    }

    #[test]
    fn accessors_drop_hand_built_garbage() {
        let mut record = InteractionRecord::new(at(9, 0).date(), "a1", at(9, 0), Some(100.0), Some(5.0));
        record.talk_time_seconds = Some(f64::INFINITY);
        record.wait_time_seconds = Some(-1.0);
        assert_eq!(record.talk_time(), None);
        assert_eq!(record.wait_time(), None);
    }

    #[test]
    fn buckets_by_interval() {
        let record = InteractionRecord::new(at(11, 47).date(), "a1", at(11, 47), Some(100.0), Some(5.0));
        assert_eq!(record.hour(), 11);
        assert_eq!(record.interval_minute(15), 45);
        assert_eq!(record.interval_minute(30), 30);
        assert_eq!(record.interval_minute(60), 0);
    }
}
