//! Offered traffic load.

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Offered load in Erlangs: calls per hour times handle time in hours.
///
/// Zero calls yield zero load.
pub fn traffic_intensity(calls_per_hour: f64, aht_seconds: f64) -> f64 {
    calls_per_hour * (aht_seconds / SECONDS_PER_HOUR)
}
