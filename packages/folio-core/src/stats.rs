//! Population statistics used by the metrics and optimization engines.
//!
//! Every function is total: too little data yields `0.0` instead of an error.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N). Returns 0.0 for fewer than 2 points.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Returns 0.0 for fewer than 2 points.
pub fn standard_deviation(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population covariance of two paired series.
///
/// Returns 0.0 unless both series have the same length and at least 2 points.
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    x.iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / x.len() as f64
}

/// Variances at or below this are treated as no dispersion.
pub const VARIANCE_FLOOR: f64 = 1e-24;

/// Whether a variance is rounding noise rather than real dispersion.
///
/// A constant series like `[0.1; 3]` has a computed variance around 1e-35
/// instead of exactly 0. Anything under [`VARIANCE_FLOOR`] or under
/// `f64::EPSILON * mean²` counts as zero.
pub fn is_zero_variance(variance: f64, mean: f64) -> bool {
    variance <= VARIANCE_FLOOR.max(f64::EPSILON * mean * mean)
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
