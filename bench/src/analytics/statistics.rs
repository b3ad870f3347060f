//! Descriptive statistics over latency samples.
//!
//! Empty inputs yield `NaN` rather than zero so that "no data" stays
//! distinguishable from "zero latency" in reports.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl LatencyStatistics {
    pub fn from_samples(samples: &[f64]) -> Self {
        Self {
            min: min(samples),
            max: max(samples),
            mean: mean(samples),
            std_dev: sample_std_dev(samples),
        }
    }
}

/// Smallest value, ignoring `NaN` entries.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::min)
}

/// Largest value, ignoring `NaN` entries.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::max)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bessel's correction, undefined below two samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
