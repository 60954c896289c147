//! Covariance models feeding the optimizer.

use crate::stats::{is_zero_variance, mean};

/// Volatility assumed per unit of expected return by the heuristic model.
pub const HEURISTIC_VOLATILITY_SCALE: f64 = 0.2;

/// Pairwise correlation assumed by the heuristic model.
pub const HEURISTIC_CORRELATION: f64 = 0.3;

/// Square covariance matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    dim: usize,
    values: Vec<f64>,
}

impl CovarianceMatrix {
    /// Build a `dim x dim` matrix from an entry function.
    pub fn from_fn(dim: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                values.push(f(i, j));
            }
        }
        Self { dim, values }
    }

    /// Number of assets covered.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry at row `i`, column `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.dim && j < self.dim, "index out of range");
        self.values[i * self.dim + j]
    }

    /// `Σ_i Σ_j w_i w_j cov_ij`.
    pub fn quadratic_form(&self, weights: &[f64]) -> f64 {
        let mut total = 0.0;
        for (i, wi) in weights.iter().enumerate().take(self.dim) {
            for (j, wj) in weights.iter().enumerate().take(self.dim) {
                total += wi * wj * self.values[i * self.dim + j];
            }
        }
        total
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.dim.max(1)).map(<[f64]>::to_vec).collect()
    }
}

/// Supplies the covariance matrix the optimizer works against.
///
/// Implementations must return a symmetric `n x n` matrix with a
/// non-negative diagonal, where `n` is the number of expected returns.
pub trait CovarianceProvider {
    fn covariance(&self, expected_returns: &[f64]) -> CovarianceMatrix;
}

impl<P: CovarianceProvider + ?Sized> CovarianceProvider for &P {
    fn covariance(&self, expected_returns: &[f64]) -> CovarianceMatrix {
        (**self).covariance(expected_returns)
    }
}

/// Placeholder model derived from expected returns alone.
///
/// Each asset's volatility is 20% of its expected return and every pair is
/// assumed 0.3 correlated. Nothing is estimated from co-movement.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCovariance;

impl CovarianceProvider for HeuristicCovariance {
    fn covariance(&self, expected_returns: &[f64]) -> CovarianceMatrix {
        let variances: Vec<f64> = expected_returns
            .iter()
            .map(|r| (r * HEURISTIC_VOLATILITY_SCALE).powi(2))
            .collect();

        CovarianceMatrix::from_fn(variances.len(), |i, j| {
            if i == j {
                variances[i]
            } else {
                HEURISTIC_CORRELATION * (variances[i] * variances[j]).sqrt()
            }
        })
    }
}

/// Sample covariance estimated from per-asset return histories.
///
/// Uses the unbiased `T - 1` divisor. A pair whose histories differ in
/// length or hold fewer than 2 observations gets 0.
#[derive(Debug, Clone, Default)]
pub struct SampleCovariance {
    histories: Vec<Vec<f64>>,
}

impl SampleCovariance {
    /// One return history per asset, in holding order.
    pub fn new(histories: Vec<Vec<f64>>) -> Self {
        Self { histories }
    }

    /// Number of assets with a history.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl CovarianceProvider for SampleCovariance {
    /// Ignores `expected_returns`; the optimizer checks the dimension.
    fn covariance(&self, _expected_returns: &[f64]) -> CovarianceMatrix {
        let means: Vec<f64> = self.histories.iter().map(|h| mean(h)).collect();

        CovarianceMatrix::from_fn(self.histories.len(), |i, j| {
            let (x, y) = (&self.histories[i], &self.histories[j]);
            if x.len() != y.len() || x.len() < 2 {
                return 0.0;
            }
            let sum: f64 = x
                .iter()
                .zip(y)
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            sum / (x.len() - 1) as f64
        })
    }
}

/// Convert a covariance matrix into correlations.
///
/// Entries touching a variance that is zero up to rounding noise are 0.
pub fn correlation_matrix(covariance: &CovarianceMatrix) -> CovarianceMatrix {
    CovarianceMatrix::from_fn(covariance.dim(), |i, j| {
        let (var_i, var_j) = (covariance.get(i, i), covariance.get(j, j));
        if is_zero_variance(var_i, 0.0) || is_zero_variance(var_j, 0.0) {
            return 0.0;
        }
        let denom = (var_i * var_j).sqrt();
        if denom.is_finite() {
            covariance.get(i, j) / denom
        } else {
            0.0
        }
    })
}
