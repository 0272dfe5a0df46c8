//! Historical aggregation of interaction records.
//!
//! Records are grouped by hour of day (volume, handle time, wait, active
//! agents) and by date (unique agents). The busiest hour is further split into
//! fixed-width sub-intervals. Missing durations are left out of duration
//! statistics but every record counts as one call.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::record::InteractionRecord;
use super::stats::{self, SampleStats};
use crate::error::{CallCenterError, Result};

/// Inclusive date range of an analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CallCenterError::invalid_input(format!(
                "date range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Aggregation tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Width of the sub-intervals inside the peak hour
    pub interval_minutes: u32,
    /// How many of the busiest hours to report
    pub busiest_hours: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            busiest_hours: 3,
        }
    }
}

/// Dates actually covered by the records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    /// Mean call count over the hours of day that saw traffic
    pub avg_calls_per_hour: f64,
    pub peak_hour: u32,
    pub peak_volume: u64,
    /// Call count per hour of day
    pub hourly_profile: BTreeMap<u32, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAnalysis {
    pub avg_agents_per_day: f64,
    pub unique_agents: usize,
    pub calls_per_agent_per_day: f64,
    pub agents_per_day: BTreeMap<NaiveDate, usize>,
}

/// Statistics for one hour of day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyStats {
    pub hour: u32,
    pub calls: u64,
    pub active_agents: usize,
    pub aht_mean: Option<f64>,
    pub aht_std: f64,
    pub wait_mean: Option<f64>,
    pub wait_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHour {
    pub hour: u32,
    pub volume: u64,
    /// Mean handle time of the peak hour's own records
    pub aht_mean: Option<f64>,
    pub wait_mean: Option<f64>,
    pub active_agents: usize,
}

/// A sub-interval of the peak hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubInterval {
    /// Minute the interval starts at
    pub minute: u32,
    pub calls: u64,
    pub aht_mean: Option<f64>,
    pub wait_mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalAnalysis {
    /// Ascending by hour
    pub hourly: Vec<HourlyStats>,
    pub peak_hour: PeakHour,
    pub interval_minutes: u32,
    pub peak_intervals: Vec<SubInterval>,
    /// Busiest hours, most calls first
    pub busiest_hours: Vec<HourlyStats>,
}

/// Aggregated view of one set of interaction records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAnalysis {
    pub total_calls: u64,
    pub period: ObservedPeriod,
    pub volume: VolumeAnalysis,
    /// `None` when no record carries a usable handle time
    pub handle_time: Option<SampleStats>,
    /// `None` when no record carries a usable wait time
    pub wait_time: Option<SampleStats>,
    pub resources: ResourceAnalysis,
    pub intervals: IntervalAnalysis,
}

impl HistoricalAnalysis {
    /// Call counts of every observed hour, ascending by hour
    pub fn hourly_volumes(&self) -> Vec<f64> {
        self.volume.hourly_profile.values().map(|calls| *calls as f64).collect()
    }

    /// Mean handle time of the peak hour only
    pub fn peak_hour_aht(&self) -> Option<f64> {
        self.intervals.peak_hour.aht_mean
    }
}

#[derive(Default)]
struct Bucket<'a> {
    calls: u64,
    agents: HashSet<&'a str>,
    talk: Vec<f64>,
    wait: Vec<f64>,
}

impl<'a> Bucket<'a> {
    fn add(&mut self, record: &'a InteractionRecord) {
        self.calls += 1;
        self.agents.insert(record.agent_id.as_str());
        self.talk.extend(record.talk_time());
        self.wait.extend(record.wait_time());
    }

    fn hourly_stats(&self, hour: u32) -> HourlyStats {
        HourlyStats {
            hour,
            calls: self.calls,
            active_agents: self.agents.len(),
            aht_mean: stats::mean(&self.talk),
            aht_std: stats::sample_std_dev(&self.talk),
            wait_mean: stats::mean(&self.wait),
            wait_std: stats::sample_std_dev(&self.wait),
        }
    }
}

/// Stateless aggregator; one call per analysis request
#[derive(Debug, Clone, Default)]
pub struct HistoricalAggregator {
    config: AggregatorConfig,
}

impl HistoricalAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Aggregate the records falling inside `range`.
    ///
    /// Fails with [`CallCenterError::EmptyDataset`] when none do.
    pub fn aggregate(&self, records: &[InteractionRecord], range: &DateRange) -> Result<HistoricalAnalysis> {
        let selected: Vec<&InteractionRecord> = records.iter().filter(|r| range.contains(r.date)).collect();
        if selected.is_empty() {
            return Err(CallCenterError::empty_dataset(format!(
                "no interaction records between {} and {}",
                range.start, range.end
            )));
        }
        self.summarize(&selected)
    }

    /// Aggregate every record, deriving the period from the data itself
    pub fn aggregate_all(&self, records: &[InteractionRecord]) -> Result<HistoricalAnalysis> {
        if records.is_empty() {
            return Err(CallCenterError::empty_dataset("no interaction records supplied"));
        }
        let selected: Vec<&InteractionRecord> = records.iter().collect();
        self.summarize(&selected)
    }

    fn summarize(&self, records: &[&InteractionRecord]) -> Result<HistoricalAnalysis> {
        info!("📊 Aggregating {} interaction records", records.len());

        let mut by_hour: BTreeMap<u32, Bucket<'_>> = BTreeMap::new();
        let mut agents_by_day: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
        let mut all_agents: HashSet<&str> = HashSet::new();
        let mut talk = Vec::with_capacity(records.len());
        let mut wait = Vec::with_capacity(records.len());

        for record in records {
            by_hour.entry(record.hour()).or_default().add(record);
            agents_by_day
                .entry(record.date)
                .or_default()
                .insert(record.agent_id.as_str());
            all_agents.insert(record.agent_id.as_str());
            talk.extend(record.talk_time());
            wait.extend(record.wait_time());
        }

        let total_calls = records.len() as u64;
        let (Some(first_day), Some(last_day)) = (
            agents_by_day.keys().next().copied(),
            agents_by_day.keys().next_back().copied(),
        ) else {
            return Err(CallCenterError::empty_dataset("no interaction records to summarize"));
        };
        let period = ObservedPeriod {
            start: first_day,
            end: last_day,
            days: (last_day - first_day).num_days() + 1,
        };

        // Ties resolve to the lowest hour: BTreeMap iterates ascending and only
        // a strictly larger count replaces the current peak.
        let mut peak_hour = 0;
        let mut peak_volume = 0;
        for (hour, bucket) in &by_hour {
            if bucket.calls > peak_volume {
                peak_hour = *hour;
                peak_volume = bucket.calls;
            }
        }

        let hourly_profile: BTreeMap<u32, u64> = by_hour.iter().map(|(hour, b)| (*hour, b.calls)).collect();
        let volume = VolumeAnalysis {
            avg_calls_per_hour: total_calls as f64 / by_hour.len() as f64,
            peak_hour,
            peak_volume,
            hourly_profile,
        };

        let agents_per_day: BTreeMap<NaiveDate, usize> =
            agents_by_day.iter().map(|(day, agents)| (*day, agents.len())).collect();
        let day_counts: Vec<f64> = agents_per_day.values().map(|n| *n as f64).collect();
        let avg_agents_per_day = stats::mean(&day_counts).unwrap_or(0.0);
        let staffed_days = avg_agents_per_day * period.days as f64;
        let resources = ResourceAnalysis {
            avg_agents_per_day,
            unique_agents: all_agents.len(),
            calls_per_agent_per_day: if staffed_days > 0.0 {
                total_calls as f64 / staffed_days
            } else {
                0.0
            },
            agents_per_day,
        };

        let intervals = self.interval_analysis(records, &by_hour, peak_hour);

        let analysis = HistoricalAnalysis {
            total_calls,
            period,
            volume,
            handle_time: SampleStats::from_values(&talk),
            wait_time: SampleStats::from_values(&wait),
            resources,
            intervals,
        };
        log_analysis(&analysis);
        Ok(analysis)
    }

    fn interval_analysis(
        &self,
        records: &[&InteractionRecord],
        by_hour: &BTreeMap<u32, Bucket<'_>>,
        peak_hour: u32,
    ) -> IntervalAnalysis {
        let hourly: Vec<HourlyStats> = by_hour.iter().map(|(hour, b)| b.hourly_stats(*hour)).collect();

        let peak_stats = hourly
            .iter()
            .find(|h| h.hour == peak_hour)
            .cloned()
            .unwrap_or_else(|| Bucket::default().hourly_stats(peak_hour));
        let peak = PeakHour {
            hour: peak_hour,
            volume: peak_stats.calls,
            aht_mean: peak_stats.aht_mean,
            wait_mean: peak_stats.wait_mean,
            active_agents: peak_stats.active_agents,
        };

        let width = self.config.interval_minutes.clamp(1, 60);
        let mut sub_buckets: BTreeMap<u32, Bucket<'_>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.hour() == peak_hour) {
            sub_buckets.entry(record.interval_minute(width)).or_default().add(record);
        }
        let peak_intervals = sub_buckets
            .iter()
            .map(|(minute, b)| SubInterval {
                minute: *minute,
                calls: b.calls,
                aht_mean: stats::mean(&b.talk),
                wait_mean: stats::mean(&b.wait),
            })
            .collect();

        // stable sort keeps ascending hour order among equal counts
        let mut busiest_hours = hourly.clone();
        busiest_hours.sort_by(|a, b| b.calls.cmp(&a.calls));
        busiest_hours.truncate(self.config.busiest_hours);

        debug!("⏰ Peak hour {}h split into {}-minute intervals", peak_hour, width);

        IntervalAnalysis {
            hourly,
            peak_hour: peak,
            interval_minutes: width,
            peak_intervals,
            busiest_hours,
        }
    }
}

fn log_analysis(analysis: &HistoricalAnalysis) {
    info!("📈 Historical analysis:");
    info!(
        "   📅 Period: {} - {} ({} days)",
        analysis.period.start, analysis.period.end, analysis.period.days
    );
    info!("   📞 Total calls: {}", analysis.total_calls);
    info!("   📊 Average calls/hour: {:.1}", analysis.volume.avg_calls_per_hour);
    info!(
        "   🕐 Peak hour: {}h ({} calls)",
        analysis.volume.peak_hour, analysis.volume.peak_volume
    );
    if let Some(aht) = &analysis.handle_time {
        info!("   ⏱️ Average handle time: {:.1}s", aht.mean);
    }
    if let Some(wait) = &analysis.wait_time {
        info!("   ⏳ Average wait: {:.1}s", wait.mean);
    }
    info!("   👥 Average agents/day: {:.1}", analysis.resources.avg_agents_per_day);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, hour: u32, minute: u32, agent: &str, talk: Option<f64>, wait: Option<f64>) -> InteractionRecord {
        let date = NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        InteractionRecord::new(date, agent, date.and_hms_opt(hour, minute, 0).unwrap(), talk, wait)
    }

    fn range(start: u32, end: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 5, start).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn empty_range_is_an_error() {
        let aggregator = HistoricalAggregator::default();
        let err = aggregator.aggregate(&[], &range(1, 2)).unwrap_err();
        assert!(matches!(err, CallCenterError::EmptyDataset(_)));

        let outside = vec![record(20, 9, 0, "a", Some(100.0), Some(5.0))];
        let err = aggregator.aggregate(&outside, &range(1, 2)).unwrap_err();
        assert!(matches!(err, CallCenterError::EmptyDataset(_)));

        assert!(aggregator.aggregate_all(&[]).is_err());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, CallCenterError::InvalidInput(_)));
        assert_eq!(range(1, 3).days(), 3);
    }

    #[test]
    fn peak_hour_ties_go_to_lowest_hour() {
        let records = vec![
            record(1, 14, 0, "a", Some(100.0), Some(5.0)),
            record(1, 14, 10, "b", Some(100.0), Some(5.0)),
            record(1, 9, 0, "a", Some(100.0), Some(5.0)),
            record(1, 9, 30, "b", Some(100.0), Some(5.0)),
            record(1, 11, 0, "a", Some(100.0), Some(5.0)),
        ];
        let analysis = HistoricalAggregator::default().aggregate_all(&records).unwrap();
        assert_eq!(analysis.volume.peak_hour, 9);
        assert_eq!(analysis.volume.peak_volume, 2);
        assert_eq!(analysis.intervals.busiest_hours[0].hour, 9);
        assert_eq!(analysis.intervals.busiest_hours[1].hour, 14);
        assert_eq!(analysis.intervals.busiest_hours[2].hour, 11);
    }

    #[test]
    fn volume_and_resource_statistics() {
        let records = vec![
            record(1, 9, 0, "a", Some(100.0), Some(10.0)),
            record(1, 9, 20, "b", Some(200.0), Some(20.0)),
            record(1, 10, 5, "a", Some(300.0), Some(30.0)),
            record(2, 9, 40, "c", Some(400.0), Some(40.0)),
        ];
        let analysis = HistoricalAggregator::default()
            .aggregate(&records, &range(1, 2))
            .unwrap();

        assert_eq!(analysis.total_calls, 4);
        assert_eq!(analysis.period.days, 2);
        assert_eq!(analysis.volume.hourly_profile.get(&9), Some(&3));
        assert_eq!(analysis.volume.hourly_profile.get(&10), Some(&1));
        assert!((analysis.volume.avg_calls_per_hour - 2.0).abs() < 1e-12);

        let aht = analysis.handle_time.unwrap();
        assert!((aht.mean - 250.0).abs() < 1e-12);
        assert_eq!(aht.samples, 4);

        assert_eq!(analysis.resources.unique_agents, 3);
        assert!((analysis.resources.avg_agents_per_day - 1.5).abs() < 1e-12);
        assert!((analysis.resources.calls_per_agent_per_day - 4.0 / 3.0).abs() < 1e-12);

        let peak = &analysis.intervals.peak_hour;
        assert_eq!(peak.hour, 9);
        assert_eq!(peak.active_agents, 3);
        assert!((peak.aht_mean.unwrap() - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn missing_values_are_counted_but_not_averaged() {
        let records = vec![
            record(1, 9, 0, "a", Some(120.0), None),
            record(1, 9, 5, "a", None, Some(15.0)),
            record(1, 9, 10, "b", Some(180.0), Some(-2.0)),
        ];
        let analysis = HistoricalAggregator::default().aggregate_all(&records).unwrap();
        assert_eq!(analysis.total_calls, 3);
        assert_eq!(analysis.volume.peak_volume, 3);

        let aht = analysis.handle_time.unwrap();
        assert_eq!(aht.samples, 2);
        assert!((aht.mean - 150.0).abs() < 1e-12);

        let wait = analysis.wait_time.unwrap();
        assert_eq!(wait.samples, 1);
        assert_eq!(wait.mean, 15.0);
    }

    #[test]
    fn hand_built_durations_are_still_filtered() {
        let mut bad = record(1, 9, 15, "c", Some(100.0), Some(5.0));
        bad.talk_time_seconds = Some(f64::NAN);
        bad.wait_time_seconds = Some(-30.0);
        let records = vec![record(1, 9, 0, "a", Some(120.0), Some(15.0)), bad];

        let analysis = HistoricalAggregator::default().aggregate_all(&records).unwrap();
        assert_eq!(analysis.total_calls, 2);
        let aht = analysis.handle_time.unwrap();
        assert_eq!(aht.samples, 1);
        assert_eq!(aht.mean, 120.0);
        assert_eq!(analysis.wait_time.unwrap().mean, 15.0);
    }

    #[test]
    fn peak_hour_is_split_into_sub_intervals() {
        let records = vec![
            record(1, 10, 2, "a", Some(100.0), Some(1.0)),
            record(1, 10, 14, "b", Some(200.0), Some(3.0)),
            record(1, 10, 31, "a", Some(300.0), Some(5.0)),
            record(1, 10, 59, "b", None, None),
            record(1, 8, 20, "a", Some(50.0), Some(1.0)),
        ];
        let analysis = HistoricalAggregator::default().aggregate_all(&records).unwrap();
        let intervals = &analysis.intervals.peak_intervals;

        assert_eq!(intervals.len(), 3);
        assert_eq!((intervals[0].minute, intervals[0].calls), (0, 2));
        assert_eq!(intervals[0].aht_mean, Some(150.0));
        assert_eq!((intervals[1].minute, intervals[1].calls), (30, 1));
        assert_eq!((intervals[2].minute, intervals[2].calls), (45, 1));
        assert_eq!(intervals[2].aht_mean, None);
    }
}
