//! Allocation optimizer over a pluggable covariance model.
//!
//! The optimizer works on fractional expected returns derived from each
//! holding's cost and value. Three objectives are supported:
//!
//! - **Max Sharpe**: gradient ascent on the Sharpe ratio
//! - **Min Volatility**: gradient descent on portfolio volatility
//! - **Max Return**: all weight on the best holding
//!
//! Weights are always long-only and sum to 1.

mod covariance;
mod frontier;
mod strategy;

pub use covariance::{
    correlation_matrix, CovarianceMatrix, CovarianceProvider, HeuristicCovariance,
    SampleCovariance, HEURISTIC_CORRELATION, HEURISTIC_VOLATILITY_SCALE,
};
pub use frontier::{capital_allocation_line, CAL_STEPS};

use crate::config::{AnalyticsConfig, OptimizerConfig, DEFAULT_RISK_FREE_RATE};
use crate::returns::{current_weights, expected_returns};
use crate::types::{
    Allocation, CalPoint, FrontierPoint, Holding, Objective, OptimizationResult, PortfolioPoint,
};
use crate::{Error, Result};
use strategy::{max_return, max_sharpe, min_volatility, Model};

/// Portfolio weight optimizer.
///
/// Generic over the covariance model; the heuristic model is the default.
/// Apart from configuration the engine is stateless between calls.
#[derive(Debug, Clone)]
pub struct OptimizationEngine<C = HeuristicCovariance> {
    risk_free_rate: f64,
    config: OptimizerConfig,
    covariance: C,
}

impl Default for OptimizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationEngine {
    /// Create an engine with default settings and the heuristic covariance.
    pub fn new() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            config: OptimizerConfig::default(),
            covariance: HeuristicCovariance,
        }
    }

    /// Create an engine from loaded configuration.
    pub fn with_config(config: &AnalyticsConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            config: config.optimizer.clone(),
            covariance: HeuristicCovariance,
        }
    }
}

impl<C: CovarianceProvider> OptimizationEngine<C> {
    /// Swap in a different covariance model, keeping the configuration.
    pub fn with_covariance<D: CovarianceProvider>(self, covariance: D) -> OptimizationEngine<D> {
        OptimizationEngine {
            risk_free_rate: self.risk_free_rate,
            config: self.config,
            covariance,
        }
    }

    /// Annual risk-free rate.
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Set the annual risk-free rate (decimal, e.g. 0.02 for 2%).
    pub fn set_risk_free_rate(&mut self, rate: f64) {
        self.risk_free_rate = rate;
    }

    /// Loop parameters in use.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Covariance matrix the engine would optimize against.
    pub fn covariance_matrix(&self, holdings: &[Holding]) -> Result<CovarianceMatrix> {
        Ok(self.model(holdings)?.covariance)
    }

    fn model(&self, holdings: &[Holding]) -> Result<Model> {
        if holdings.is_empty() {
            return Err(Error::EmptyPortfolio);
        }

        let returns = expected_returns(holdings);
        let covariance = self.covariance.covariance(&returns);
        if covariance.dim() != returns.len() {
            return Err(Error::DimensionMismatch {
                expected: returns.len(),
                actual: covariance.dim(),
            });
        }

        Ok(Model {
            returns,
            covariance,
            risk_free_rate: self.risk_free_rate,
        })
    }

    /// Find weights for `objective`.
    ///
    /// # Arguments
    /// * `holdings` - Portfolio snapshot, at least one holding
    /// * `objective` - What to optimize for
    ///
    /// # Returns
    /// Weights in holding order plus per-holding allocations sorted by
    /// optimal weight, largest first. Fails only on an empty portfolio or a
    /// covariance model of the wrong size.
    pub fn optimize(&self, holdings: &[Holding], objective: Objective) -> Result<OptimizationResult> {
        let model = self.model(holdings)?;
        tracing::debug!(%objective, assets = model.len(), "Starting optimization");

        let search = match objective {
            Objective::MaxSharpe => max_sharpe(&model, &self.config),
            Objective::MinVolatility => min_volatility(&model, &self.config),
            Objective::MaxReturn => max_return(&model),
        };
        tracing::debug!(%objective, iterations = search.iterations, "Optimization finished");

        Ok(format_result(holdings, &model, objective, search.weights))
    }

    /// Sweep `points` target returns over `[0, frontier_max_return)`.
    ///
    /// Zero points yields an empty frontier.
    pub fn generate_efficient_frontier(
        &self,
        holdings: &[Holding],
        points: usize,
    ) -> Result<Vec<FrontierPoint>> {
        let model = self.model(holdings)?;
        tracing::debug!(assets = model.len(), points, "Generating efficient frontier");
        Ok(frontier::sweep(&model, &self.config, points))
    }

    /// Frontier with the configured `frontier_points` (50 by default).
    pub fn efficient_frontier(&self, holdings: &[Holding]) -> Result<Vec<FrontierPoint>> {
        self.generate_efficient_frontier(holdings, self.config.frontier_points)
    }

    /// The 1/N portfolio evaluated against the covariance model.
    pub fn equal_weight_portfolio(&self, holdings: &[Holding]) -> Result<PortfolioPoint> {
        let model = self.model(holdings)?;
        let weights = model.equal_weights();
        Ok(frontier::evaluate(&model, weights))
    }

    /// Capital allocation line through `point` at the configured rate.
    pub fn capital_allocation_line(&self, point: &PortfolioPoint, steps: usize) -> Vec<CalPoint> {
        capital_allocation_line(point, self.risk_free_rate, steps)
    }
}

fn format_result(
    holdings: &[Holding],
    model: &Model,
    objective: Objective,
    weights: Vec<f64>,
) -> OptimizationResult {
    let current = current_weights(holdings);

    let mut allocations: Vec<Allocation> = holdings
        .iter()
        .enumerate()
        .map(|(i, holding)| Allocation {
            name: holding.name.clone(),
            category: holding.category.clone(),
            current_weight: current[i],
            optimal_weight: weights[i],
            difference: weights[i] - current[i],
            expected_return: model.returns[i],
        })
        .collect();
    allocations.sort_by(|a, b| b.optimal_weight.total_cmp(&a.optimal_weight));

    OptimizationResult {
        objective,
        expected_return: model.portfolio_return(&weights),
        volatility: model.portfolio_volatility(&weights),
        sharpe_ratio: model.sharpe_ratio(&weights),
        weights,
        allocations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    /// Holding bought for 100 and now worth `value`.
    fn holding(name: &str, value: f64) -> Holding {
        let date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        Holding::new(name, "equity", 1.0, 100.0, value, date).unwrap()
    }

    fn portfolio() -> Vec<Holding> {
        vec![
            holding("Bonds", 105.0),
            holding("Growth", 150.0),
            holding("Value", 120.0),
        ]
    }

    fn assert_valid_weights(weights: &[f64]) {
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
        assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn test_empty_portfolio_is_an_error() {
        let engine = OptimizationEngine::new();

        assert!(matches!(
            engine.optimize(&[], Objective::MaxSharpe),
            Err(Error::EmptyPortfolio)
        ));
        assert!(matches!(
            engine.generate_efficient_frontier(&[], 10),
            Err(Error::EmptyPortfolio)
        ));
        assert!(matches!(
            engine.equal_weight_portfolio(&[]),
            Err(Error::EmptyPortfolio)
        ));
    }

    #[test]
    fn test_all_objectives_produce_valid_weights() {
        let engine = OptimizationEngine::new();
        let holdings = portfolio();

        for objective in [Objective::MaxSharpe, Objective::MinVolatility, Objective::MaxReturn] {
            let result = engine.optimize(&holdings, objective).unwrap();
            assert_eq!(result.objective, objective);
            assert_eq!(result.weights.len(), 3);
            assert_valid_weights(&result.weights);
        }
    }

    #[test]
    fn test_max_return_is_winner_take_all() {
        let engine = OptimizationEngine::new();
        let result = engine.optimize(&portfolio(), Objective::MaxReturn).unwrap();

        assert_eq!(result.weights, vec![0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(result.expected_return, 0.5, epsilon = 1e-12);

        let top = &result.allocations[0];
        assert_eq!(top.name, "Growth");
        assert_eq!(top.optimal_weight, 1.0);
        // Growth holds 150 of 375 total value
        assert_abs_diff_eq!(top.current_weight, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(top.difference, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(top.expected_return, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_allocations_sorted_by_optimal_weight() {
        let engine = OptimizationEngine::new();
        let result = engine.optimize(&portfolio(), Objective::MinVolatility).unwrap();

        for pair in result.allocations.windows(2) {
            assert!(pair[0].optimal_weight >= pair[1].optimal_weight);
        }
        // Lowest expected return has the lowest heuristic variance
        assert_eq!(result.allocations[0].name, "Bonds");
    }

    #[test]
    fn test_min_volatility_beats_equal_weight() {
        let engine = OptimizationEngine::new();
        let holdings = portfolio();

        let equal = engine.equal_weight_portfolio(&holdings).unwrap();
        let result = engine.optimize(&holdings, Objective::MinVolatility).unwrap();

        assert!(result.volatility <= equal.volatility);
        assert_eq!(equal.weights, vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn test_single_holding() {
        let engine = OptimizationEngine::new();
        let holdings = vec![holding("Only", 130.0)];

        for objective in [Objective::MaxSharpe, Objective::MinVolatility, Objective::MaxReturn] {
            let result = engine.optimize(&holdings, objective).unwrap();
            assert_eq!(result.weights, vec![1.0]);
        }
    }

    #[test]
    fn test_optimize_is_deterministic() {
        let engine = OptimizationEngine::new();
        let holdings = portfolio();

        let first = engine.optimize(&holdings, Objective::MaxSharpe).unwrap();
        let second = engine.optimize(&holdings, Objective::MaxSharpe).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_risk_free_rate_changes_sharpe() {
        let mut engine = OptimizationEngine::new();
        let holdings = portfolio();
        let base = engine.optimize(&holdings, Objective::MaxReturn).unwrap();

        engine.set_risk_free_rate(0.05);
        assert_eq!(engine.risk_free_rate(), 0.05);
        let shifted = engine.optimize(&holdings, Objective::MaxReturn).unwrap();
        assert!(shifted.sharpe_ratio < base.sharpe_ratio);
    }

    #[test]
    fn test_with_config() {
        let config = AnalyticsConfig {
            risk_free_rate: 0.04,
            optimizer: OptimizerConfig {
                iterations: 10,
                ..Default::default()
            },
        };
        let engine = OptimizationEngine::with_config(&config);

        assert_eq!(engine.risk_free_rate(), 0.04);
        assert_eq!(engine.config().iterations, 10);
    }

    #[test]
    fn test_efficient_frontier() {
        let engine = OptimizationEngine::new();
        let frontier = engine.generate_efficient_frontier(&portfolio(), 10).unwrap();

        assert_eq!(frontier.len(), 10);
        assert_eq!(frontier[0].target_return, 0.0);
        assert_abs_diff_eq!(frontier[9].target_return, 0.27, epsilon = 1e-12);
        for point in &frontier {
            assert_valid_weights(&point.weights);
            assert!(point.volatility >= 0.0);
        }
        for pair in frontier.windows(2) {
            assert!(pair[0].target_return < pair[1].target_return);
        }

        assert!(engine
            .generate_efficient_frontier(&portfolio(), 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_efficient_frontier_uses_configured_points() {
        let engine = OptimizationEngine::new();
        assert_eq!(engine.efficient_frontier(&portfolio()).unwrap().len(), 50);

        let config = AnalyticsConfig {
            optimizer: OptimizerConfig {
                frontier_points: 7,
                ..Default::default()
            },
            ..Default::default()
        };
        let engine = OptimizationEngine::with_config(&config);
        let frontier = engine.efficient_frontier(&portfolio()).unwrap();
        assert_eq!(frontier.len(), 7);
        assert_eq!(frontier, engine.generate_efficient_frontier(&portfolio(), 7).unwrap());
    }

    #[test]
    fn test_sample_covariance_injection() {
        let histories = vec![
            vec![0.01, 0.012, 0.011, 0.009],
            vec![0.05, -0.04, 0.06, -0.03],
        ];
        let engine = OptimizationEngine::new().with_covariance(SampleCovariance::new(histories));
        let holdings = vec![holding("Stable", 104.0), holding("Swingy", 110.0)];

        let result = engine.optimize(&holdings, Objective::MinVolatility).unwrap();
        assert_valid_weights(&result.weights);
        assert!(result.weights[0] > 0.5);

        let covariance = engine.covariance_matrix(&holdings).unwrap();
        assert_eq!(covariance.dim(), 2);
    }

    /// Every objective and the frontier stay finite, long-only and fully
    /// invested for `holdings` under `engine`.
    fn assert_degrades_gracefully<C: CovarianceProvider>(
        engine: &OptimizationEngine<C>,
        holdings: &[Holding],
    ) {
        for objective in [Objective::MaxSharpe, Objective::MinVolatility, Objective::MaxReturn] {
            let result = engine.optimize(holdings, objective).unwrap();
            assert!(result.weights.iter().all(|w| w.is_finite()));
            assert_valid_weights(&result.weights);
            assert!(result.sharpe_ratio.is_finite());
            assert!(result.volatility.is_finite());
        }

        let frontier = engine.generate_efficient_frontier(holdings, 5).unwrap();
        assert_eq!(frontier.len(), 5);
        for point in &frontier {
            assert!(point.weights.iter().all(|w| w.is_finite()));
            assert_valid_weights(&point.weights);
            assert!(point.sharpe_ratio.is_finite());
        }
    }

    #[test]
    fn test_perfectly_correlated_assets() {
        let history = vec![0.01, -0.02, 0.03, 0.005];
        let engine = OptimizationEngine::new()
            .with_covariance(SampleCovariance::new(vec![history.clone(), history]));
        let holdings = vec![holding("Twin A", 110.0), holding("Twin B", 105.0)];

        assert_degrades_gracefully(&engine, &holdings);
    }

    #[test]
    fn test_perfectly_anticorrelated_assets() {
        let history = vec![0.01, -0.02, 0.03, 0.005];
        let mirrored: Vec<f64> = history.iter().map(|r| -r).collect();
        let engine =
            OptimizationEngine::new().with_covariance(SampleCovariance::new(vec![history, mirrored]));
        let holdings = vec![holding("Long", 110.0), holding("Hedge", 105.0)];

        assert_degrades_gracefully(&engine, &holdings);

        let corr = correlation_matrix(&engine.covariance_matrix(&holdings).unwrap());
        assert_abs_diff_eq!(corr.get(0, 1), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_zero_expected_returns() {
        let engine = OptimizationEngine::new();
        let holdings = vec![holding("Flat A", 100.0), holding("Flat B", 100.0)];

        assert_degrades_gracefully(&engine, &holdings);

        let result = engine.optimize(&holdings, Objective::MaxSharpe).unwrap();
        assert_eq!(result.weights, vec![0.5, 0.5]);
        assert_eq!(result.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_covariance_dimension_mismatch() {
        let provider = SampleCovariance::new(vec![vec![0.01, 0.02]; 3]);
        let engine = OptimizationEngine::new().with_covariance(&provider);

        let result = engine.optimize(&portfolio()[..2], Objective::MaxSharpe);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_capital_allocation_line_through_equal_weight() {
        let engine = OptimizationEngine::new();
        let point = engine.equal_weight_portfolio(&portfolio()).unwrap();
        let line = engine.capital_allocation_line(&point, CAL_STEPS);

        assert_eq!(line.len(), CAL_STEPS + 1);
        assert_abs_diff_eq!(line[0].expected_return, 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(line[10].expected_return, point.expected_return, epsilon = 1e-9);
    }

    #[test]
    fn test_tangency_point() {
        let engine = OptimizationEngine::new();
        let result = engine.optimize(&portfolio(), Objective::MaxSharpe).unwrap();
        let point = result.portfolio_point();

        assert_eq!(point.weights, result.weights);
        assert_eq!(point.sharpe_ratio, result.sharpe_ratio);
        assert_eq!(
            engine.capital_allocation_line(&point, CAL_STEPS).len(),
            CAL_STEPS + 1
        );
    }
}
