//! Drawdown analysis over portfolio value series.

use crate::stats::round_to;
use crate::types::DrawdownAnalysis;

/// Analyze the largest peak-to-trough decline of a value series.
///
/// A single forward pass tracks the running peak and keeps the deepest
/// drawdown together with its peak and trough. A second scan starting after
/// the trough looks for the first value that regains that peak.
///
/// Returns a zeroed analysis for fewer than 2 values.
///
/// # Example
///
/// ```rust
/// use folio_core::calculate_max_drawdown;
///
/// let analysis = calculate_max_drawdown(&[1000.0, 1200.0, 800.0, 900.0, 1000.0, 1300.0]);
/// assert_eq!(analysis.max_drawdown_pct, 33.33);
/// assert_eq!(analysis.recovery_index, Some(5));
/// ```
pub fn calculate_max_drawdown(values: &[f64]) -> DrawdownAnalysis {
    if values.len() < 2 {
        return DrawdownAnalysis::default();
    }

    let mut running_peak = values[0];
    let mut running_peak_index = 0;

    let mut max_drawdown = 0.0;
    let mut peak_value = values[0];
    let mut trough_value = values[0];
    let mut peak_index = 0;
    let mut trough_index = 0;

    for (i, &value) in values.iter().enumerate() {
        if value > running_peak {
            running_peak = value;
            running_peak_index = i;
        }

        let drawdown = if running_peak > 0.0 {
            (running_peak - value) / running_peak
        } else {
            0.0
        };

        if drawdown > max_drawdown {
            max_drawdown = drawdown;
            peak_value = running_peak;
            trough_value = value;
            peak_index = running_peak_index;
            trough_index = i;
        }
    }

    let recovery_index = if max_drawdown > 0.0 {
        values[trough_index + 1..]
            .iter()
            .position(|&v| v >= peak_value)
            .map(|offset| trough_index + 1 + offset)
    } else {
        None
    };

    DrawdownAnalysis {
        max_drawdown_pct: round_to(max_drawdown * 100.0, 2),
        peak_value,
        trough_value,
        peak_index,
        trough_index,
        recovery_index,
        days_to_recover: recovery_index.map(|idx| idx - trough_index),
    }
}

/// Decline of the latest value from the series maximum, as a percentage.
///
/// Returns 0.0 for an empty series or a non-positive maximum.
pub fn calculate_current_drawdown(values: &[f64]) -> f64 {
    let Some(&current) = values.last() else {
        return 0.0;
    };

    let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak <= 0.0 {
        return 0.0;
    }

    round_to((peak - current) / peak * 100.0, 2)
}
