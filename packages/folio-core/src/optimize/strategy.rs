//! Weight search strategies, one per objective.

use super::covariance::CovarianceMatrix;
use crate::config::OptimizerConfig;
use crate::stats::VARIANCE_FLOOR;

/// Expected returns and covariance for one optimization call.
#[derive(Debug, Clone)]
pub(crate) struct Model {
    pub returns: Vec<f64>,
    pub covariance: CovarianceMatrix,
    pub risk_free_rate: f64,
}

impl Model {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// `Σ w_i r_i`
    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights.iter().zip(&self.returns).map(|(w, r)| w * r).sum()
    }

    /// Square root of the absolute quadratic form, so a numerically negative
    /// variance cannot produce NaN.
    pub fn portfolio_volatility(&self, weights: &[f64]) -> f64 {
        self.covariance.quadratic_form(weights).abs().sqrt()
    }

    /// Excess return per unit of volatility; 0 when the variance is
    /// rounding noise.
    pub fn sharpe_ratio(&self, weights: &[f64]) -> f64 {
        let volatility = self.portfolio_volatility(weights);
        if volatility * volatility <= VARIANCE_FLOOR {
            return 0.0;
        }
        (self.portfolio_return(weights) - self.risk_free_rate) / volatility
    }

    pub fn equal_weights(&self) -> Vec<f64> {
        let n = self.len();
        vec![1.0 / n as f64; n]
    }
}

/// Rescale to `|w_i| / Σ|w_j|`.
///
/// A negative weight is flipped positive, not floored. A zero or non-finite
/// sum resets to uniform weights.
pub(crate) fn normalize(weights: &mut [f64]) {
    if weights.is_empty() {
        return;
    }

    let sum: f64 = weights.iter().map(|w| w.abs()).sum();
    if sum == 0.0 || !sum.is_finite() {
        let uniform = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = uniform);
        return;
    }

    for w in weights.iter_mut() {
        *w = w.abs() / sum;
    }
}

/// Symmetric finite-difference gradient of `f`, renormalizing each
/// perturbed vector before evaluation.
pub(crate) fn gradient<F>(weights: &[f64], epsilon: f64, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    (0..weights.len())
        .map(|i| {
            let mut plus = weights.to_vec();
            plus[i] += epsilon;
            normalize(&mut plus);

            let mut minus = weights.to_vec();
            minus[i] -= epsilon;
            normalize(&mut minus);

            (f(&plus) - f(&minus)) / (2.0 * epsilon)
        })
        .collect()
}

/// Final weights and the number of iterations actually run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Search {
    pub weights: Vec<f64>,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascend,
    Descend,
}

/// Gradient walk from uniform weights, renormalizing after every step.
fn gradient_search<F>(model: &Model, config: &OptimizerConfig, direction: Direction, f: F) -> Search
where
    F: Fn(&[f64]) -> f64,
{
    let mut weights = model.equal_weights();

    for iteration in 1..=config.iterations {
        let grad = gradient(&weights, config.epsilon, &f);
        let previous = weights.clone();

        for (w, g) in weights.iter_mut().zip(&grad) {
            match direction {
                Direction::Ascend => *w += config.learning_rate * g,
                Direction::Descend => *w -= config.learning_rate * g,
            }
        }
        normalize(&mut weights);

        if converged(&previous, &weights, config.tolerance) {
            tracing::debug!(iteration, tolerance = config.tolerance, "Optimizer converged");
            return Search {
                weights,
                iterations: iteration,
            };
        }
    }

    Search {
        weights,
        iterations: config.iterations,
    }
}

/// True when no weight moved more than `tolerance`. A zero tolerance never
/// stops the loop early.
fn converged(previous: &[f64], current: &[f64], tolerance: f64) -> bool {
    if tolerance <= 0.0 {
        return false;
    }
    previous
        .iter()
        .zip(current)
        .all(|(a, b)| (a - b).abs() < tolerance)
}

/// Gradient ascent on the Sharpe ratio.
pub(crate) fn max_sharpe(model: &Model, config: &OptimizerConfig) -> Search {
    gradient_search(model, config, Direction::Ascend, |w| model.sharpe_ratio(w))
}

/// Gradient descent on portfolio volatility.
pub(crate) fn min_volatility(model: &Model, config: &OptimizerConfig) -> Search {
    gradient_search(model, config, Direction::Descend, |w| {
        model.portfolio_volatility(w)
    })
}

/// All weight on the highest expected return; the first of equal maxima wins.
pub(crate) fn max_return(model: &Model) -> Search {
    let mut best = 0;
    for (i, r) in model.returns.iter().enumerate() {
        if *r > model.returns[best] {
            best = i;
        }
    }

    let mut weights = vec![0.0; model.len()];
    if let Some(w) = weights.get_mut(best) {
        *w = 1.0;
    }
    Search {
        weights,
        iterations: 0,
    }
}

/// Lower volatility while being pulled toward `target` return.
///
/// Each step subtracts the volatility gradient and adds
/// `rate * (target - current_return) * r_i`, then renormalizes. Stops early
/// under the same tolerance rule as the gradient searches.
pub(crate) fn target_return(model: &Model, config: &OptimizerConfig, target: f64) -> Vec<f64> {
    let mut weights = model.equal_weights();
    let rate = config.frontier_learning_rate;

    for iteration in 1..=config.frontier_iterations {
        let return_error = target - model.portfolio_return(&weights);
        let grad = gradient(&weights, config.epsilon, |w| model.portfolio_volatility(w));
        let previous = weights.clone();

        for ((w, g), r) in weights.iter_mut().zip(&grad).zip(&model.returns) {
            *w -= rate * g;
            *w += rate * return_error * r;
        }
        normalize(&mut weights);

        if converged(&previous, &weights, config.tolerance) {
            tracing::debug!(iteration, target, "Frontier search converged");
            break;
        }
    }

    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::covariance::{CovarianceProvider, HeuristicCovariance};
    use approx::assert_abs_diff_eq;

    fn model(returns: &[f64]) -> Model {
        Model {
            returns: returns.to_vec(),
            covariance: HeuristicCovariance.covariance(returns),
            risk_free_rate: 0.02,
        }
    }

    fn assert_valid_weights(weights: &[f64]) {
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
        assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn test_normalize() {
        let mut weights = vec![2.0, -1.0, 1.0];
        normalize(&mut weights);
        assert_eq!(weights, vec![0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut zeros = vec![0.0, 0.0];
        normalize(&mut zeros);
        assert_eq!(zeros, vec![0.5, 0.5]);

        let mut nan = vec![f64::NAN, 1.0, 1.0, 1.0];
        normalize(&mut nan);
        assert_eq!(nan, vec![0.25; 4]);

        let mut empty: Vec<f64> = Vec::new();
        normalize(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_gradient_of_linear_function() {
        // f(w) = w_0 on normalized weights; raising w_0 raises f
        let grad = gradient(&[0.5, 0.5], 0.001, |w| w[0]);
        assert!(grad[0] > 0.0);
        assert!(grad[1] < 0.0);
        assert_abs_diff_eq!(grad[0], -grad[1], epsilon = 1e-6);
    }

    #[test]
    fn test_model_metrics() {
        let m = model(&[0.5, 0.25]);
        let w = [0.5, 0.5];

        assert_abs_diff_eq!(m.portfolio_return(&w), 0.375, epsilon = 1e-12);
        // 0.25*0.01 + 0.25*0.0025 + 2*0.25*0.0015 = 0.003875
        assert_abs_diff_eq!(m.portfolio_volatility(&w), 0.003875f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            m.sharpe_ratio(&w),
            (0.375 - 0.02) / 0.003875f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_sharpe_zero_volatility() {
        let m = model(&[0.0, 0.0]);
        assert_eq!(m.sharpe_ratio(&[0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_min_volatility_prefers_low_variance_asset() {
        let m = model(&[0.05, 0.5]);
        let search = min_volatility(&m, &OptimizerConfig::default());

        assert_valid_weights(&search.weights);
        assert!(search.weights[0] > 0.5);
        assert_eq!(search.iterations, 100);
        assert!(m.portfolio_volatility(&search.weights) <= m.portfolio_volatility(&[0.5, 0.5]));
    }

    #[test]
    fn test_max_sharpe_weights_valid() {
        let m = model(&[0.1, 0.3, -0.05]);
        let search = max_sharpe(&m, &OptimizerConfig::default());
        assert_valid_weights(&search.weights);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let m = model(&[0.05, 0.5]);
        let config = OptimizerConfig {
            tolerance: 1.0,
            ..Default::default()
        };
        let search = min_volatility(&m, &config);

        assert_eq!(search.iterations, 1);
        assert_valid_weights(&search.weights);
    }

    #[test]
    fn test_max_return_first_maximum_wins() {
        let search = max_return(&model(&[0.1, 0.4, 0.4, -0.2]));
        assert_eq!(search.weights, vec![0.0, 1.0, 0.0, 0.0]);

        let single = max_return(&model(&[-0.3]));
        assert_eq!(single.weights, vec![1.0]);
    }

    #[test]
    fn test_target_return_weights_valid() {
        let m = model(&[0.05, 0.2, 0.4]);
        let config = OptimizerConfig::default();

        for target in [0.0, 0.15, 0.3] {
            assert_valid_weights(&target_return(&m, &config, target));
        }
    }

    #[test]
    fn test_target_return_honors_tolerance() {
        let m = model(&[0.05, 0.2, 0.4]);
        let loose = OptimizerConfig {
            tolerance: 1.0,
            ..Default::default()
        };
        let one_step = OptimizerConfig {
            frontier_iterations: 1,
            ..Default::default()
        };

        let stopped = target_return(&m, &loose, 0.15);
        assert_eq!(stopped, target_return(&m, &one_step, 0.15));
        assert_ne!(stopped, target_return(&m, &OptimizerConfig::default(), 0.15));
        assert_valid_weights(&stopped);
    }

    #[test]
    fn test_single_asset() {
        let m = model(&[0.2]);
        let config = OptimizerConfig::default();

        assert_eq!(max_sharpe(&m, &config).weights, vec![1.0]);
        assert_eq!(min_volatility(&m, &config).weights, vec![1.0]);
        assert_eq!(target_return(&m, &config, 0.1), vec![1.0]);
    }
}
