//! # Historical Analysis Module
//!
//! Turns raw interaction records into the volume, handle-time, wait-time and
//! staffing statistics that drive scenario generation and validation.
//!
//! - [`record`]: the raw [`InteractionRecord`] and its value coercion rules
//! - [`stats`]: sample statistics (mean, deviation, interpolated percentiles)
//! - [`aggregator`]: per-hour, per-day and peak-hour aggregation

pub mod aggregator;
pub mod record;
pub mod stats;

pub use aggregator::{
    AggregatorConfig, DateRange, HistoricalAggregator, HistoricalAnalysis, HourlyStats,
    IntervalAnalysis, ObservedPeriod, PeakHour, ResourceAnalysis, SubInterval, VolumeAnalysis,
};
pub use record::InteractionRecord;
pub use stats::SampleStats;
