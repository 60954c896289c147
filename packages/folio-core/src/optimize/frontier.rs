//! Efficient frontier sweep and capital allocation line.

use super::strategy::{target_return, Model};
use crate::config::OptimizerConfig;
use crate::types::{CalPoint, FrontierPoint, PortfolioPoint};

/// Default number of steps on the capital allocation line.
pub const CAL_STEPS: usize = 20;

/// Targets `i / points * max_return` for `i in 0..points`.
pub(crate) fn targets(points: usize, max_return: f64) -> impl Iterator<Item = f64> {
    (0..points).map(move |i| i as f64 / points as f64 * max_return)
}

/// One target-return search per point, in ascending target order.
///
/// Heuristic: realized points are neither guaranteed Pareto-efficient nor
/// monotonic in return or volatility.
pub(crate) fn sweep(model: &Model, config: &OptimizerConfig, points: usize) -> Vec<FrontierPoint> {
    targets(points, config.frontier_max_return)
        .map(|target| {
            let weights = target_return(model, config, target);
            FrontierPoint {
                target_return: target,
                expected_return: model.portfolio_return(&weights),
                volatility: model.portfolio_volatility(&weights),
                sharpe_ratio: model.sharpe_ratio(&weights),
                weights,
            }
        })
        .collect()
}

/// Evaluate a weight vector against the model.
pub(crate) fn evaluate(model: &Model, weights: Vec<f64>) -> PortfolioPoint {
    PortfolioPoint {
        expected_return: model.portfolio_return(&weights),
        volatility: model.portfolio_volatility(&weights),
        sharpe_ratio: model.sharpe_ratio(&weights),
        weights,
    }
}

/// Mix the risk-free asset with `point`, from all cash to 2x leverage.
///
/// Returns `steps + 1` points with risk spanning `[0, 2 * point.volatility]`.
/// Empty when the point has no volatility or `steps` is 0.
pub fn capital_allocation_line(
    point: &PortfolioPoint,
    risk_free_rate: f64,
    steps: usize,
) -> Vec<CalPoint> {
    if steps == 0 || point.volatility <= 0.0 || !point.volatility.is_finite() {
        return Vec::new();
    }

    let slope = (point.expected_return - risk_free_rate) / point.volatility;
    (0..=steps)
        .map(|k| {
            let risk = 2.0 * point.volatility * k as f64 / steps as f64;
            CalPoint {
                risk,
                expected_return: risk_free_rate + slope * risk,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_targets() {
        let targets: Vec<f64> = targets(3, 0.3).collect();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], 0.0);
        assert_abs_diff_eq!(targets[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(targets[2], 0.2, epsilon = 1e-12);

        assert_eq!(super::targets(0, 0.3).count(), 0);
    }

    #[test]
    fn test_capital_allocation_line() {
        let point = PortfolioPoint {
            weights: vec![0.5, 0.5],
            expected_return: 0.12,
            volatility: 0.1,
            sharpe_ratio: 1.0,
        };
        let line = capital_allocation_line(&point, 0.02, CAL_STEPS);

        assert_eq!(line.len(), 21);
        assert_eq!(line[0].risk, 0.0);
        assert_abs_diff_eq!(line[0].expected_return, 0.02, epsilon = 1e-12);
        // Passes through the point itself at the midpoint
        assert_abs_diff_eq!(line[10].risk, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(line[10].expected_return, 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(line[20].risk, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(line[20].expected_return, 0.22, epsilon = 1e-12);
    }

    #[test]
    fn test_capital_allocation_line_degenerate() {
        let flat = PortfolioPoint {
            weights: vec![1.0],
            expected_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
        };
        assert!(capital_allocation_line(&flat, 0.02, CAL_STEPS).is_empty());

        let point = PortfolioPoint {
            volatility: 0.1,
            ..flat
        };
        assert!(capital_allocation_line(&point, 0.02, 0).is_empty());
    }
}
