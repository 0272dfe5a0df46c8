//! Descriptive statistics over duration samples.

use serde::{Deserialize, Serialize};

/// Summary of a set of duration samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub samples: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); `0.0` below two samples
    pub std_dev: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

impl SampleStats {
    /// `None` when there are no samples
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let sorted = sorted(values);
        Some(Self {
            samples: values.len(),
            mean,
            std_dev: sample_std_dev(values),
            p50: percentile(&sorted, 0.50)?,
            p90: percentile(&sorted, 0.90)?,
            p95: percentile(&sorted, 0.95)?,
        })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    if values.len() < 2 {
        return 0.0;
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile `q` in [0, 1] of ascending `sorted` values, interpolating
/// linearly between the closest ranks.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_interpolate() {
        let values = sorted(&[10.0, 40.0, 20.0, 30.0]);
        assert_eq!(percentile(&values, 0.0), Some(10.0));
        assert_eq!(percentile(&values, 1.0), Some(40.0));
        assert!((percentile(&values, 0.5).unwrap() - 25.0).abs() < 1e-12);
        assert!((percentile(&values, 0.9).unwrap() - 37.0).abs() < 1e-12);
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        let std = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((std - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn empty_samples_have_no_stats() {
        assert!(SampleStats::from_values(&[]).is_none());
        let single = SampleStats::from_values(&[120.0]).unwrap();
        assert_eq!(single.mean, 120.0);
        assert_eq!(single.p95, 120.0);
        assert_eq!(single.std_dev, 0.0);
    }
}
