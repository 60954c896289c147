//! Portfolio risk and return metrics.
//!
//! Every metric is total: degenerate input (zero cost, short series, missing
//! history) yields a neutral default instead of an error. Callers that need
//! to tell "computed zero" from "not enough data" must check input lengths.

mod assessment;
mod drawdown;

pub use assessment::{
    BetaCategory, CompositionAnalysis, HoldingWeight, OverallRiskLevel, Priority, RatedMetric,
    Recommendation, RiskAssessment, Severity,
};
pub use drawdown::{calculate_current_drawdown, calculate_max_drawdown};

use crate::config::{AnalyticsConfig, DEFAULT_RISK_FREE_RATE};
use crate::returns::periodic_returns;
use crate::stats::{covariance, is_zero_variance, mean, round_to, standard_deviation, variance};
use crate::types::{Holding, MetricsResult, Performer};
use chrono::{NaiveDate, Utc};

/// Periods per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Minimum holding period (in years, roughly 36 days) for a meaningful CAGR.
const MIN_CAGR_YEARS: f64 = 0.1;

/// Number of holdings listed as top and worst performers.
const PERFORMER_COUNT: usize = 5;

/// ROI of a single holding as a percentage, rounded to 2 decimals.
///
/// Returns 0.0 when the holding has no originating cost.
pub fn calculate_roi(holding: &Holding) -> f64 {
    let cost = holding.original_cost();
    if cost == 0.0 {
        return 0.0;
    }
    round_to((holding.current_value - cost) / cost * 100.0, 2)
}

/// ROI of the whole portfolio as a percentage.
///
/// Returns 0.0 when the total cost is zero.
pub fn calculate_total_roi(holdings: &[Holding]) -> f64 {
    let total_current: f64 = holdings.iter().map(|h| h.current_value).sum();
    let total_cost: f64 = holdings.iter().map(|h| h.original_cost()).sum();

    if total_cost == 0.0 {
        return 0.0;
    }
    (total_current - total_cost) / total_cost * 100.0
}

/// Compound annual growth rate as a percentage, rounded to 2 decimals.
///
/// Accepts fractional years and negative growth. Returns 0.0 when
/// `start_value` or `years` is zero.
pub fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> f64 {
    if start_value == 0.0 || years == 0.0 {
        return 0.0;
    }
    round_to(((end_value / start_value).powf(1.0 / years) - 1.0) * 100.0, 2)
}

/// Portfolio CAGR from the oldest purchase date until today.
pub fn calculate_portfolio_cagr(holdings: &[Holding]) -> f64 {
    calculate_portfolio_cagr_at(holdings, Utc::now().date_naive())
}

/// Portfolio CAGR from the oldest purchase date until `as_of`.
///
/// Returns 0.0 for an empty portfolio or a holding period under ~36 days.
pub fn calculate_portfolio_cagr_at(holdings: &[Holding], as_of: NaiveDate) -> f64 {
    let Some(oldest) = holdings.iter().map(|h| h.purchase_date).min() else {
        return 0.0;
    };

    let years = (as_of - oldest).num_days() as f64 / 365.25;
    if years < MIN_CAGR_YEARS {
        return 0.0;
    }

    let total_cost: f64 = holdings.iter().map(|h| h.original_cost()).sum();
    let total_current: f64 = holdings.iter().map(|h| h.current_value).sum();

    calculate_cagr(total_cost, total_current, years)
}

/// Annualized Sharpe ratio of a daily return series, rounded to 2 decimals.
///
/// # Arguments
///
/// * `returns` - Daily returns (e.g., 0.01 for 1%)
/// * `risk_free_rate` - Annual risk-free rate
///
/// Returns 0.0 for fewer than 2 returns or zero dispersion.
pub fn calculate_sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let avg = mean(returns);
    if is_zero_variance(variance(returns), avg) {
        return 0.0;
    }

    let std = standard_deviation(returns);
    let annualized_return = avg * TRADING_DAYS_PER_YEAR;
    let annualized_std = std * TRADING_DAYS_PER_YEAR.sqrt();

    round_to((annualized_return - risk_free_rate) / annualized_std, 2)
}

/// Annualized volatility percentage of a daily return series.
pub fn calculate_volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    round_to(
        standard_deviation(returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0,
        2,
    )
}

/// Beta of a portfolio against a benchmark, rounded to 2 decimals.
///
/// Returns the neutral 1.0 when lengths differ, either series is shorter
/// than 2, or the benchmark has no variance.
pub fn calculate_beta(portfolio_returns: &[f64], market_returns: &[f64]) -> f64 {
    if portfolio_returns.len() != market_returns.len() || portfolio_returns.len() < 2 {
        return 1.0;
    }

    let market_variance = variance(market_returns);
    if is_zero_variance(market_variance, mean(market_returns)) {
        return 1.0;
    }

    round_to(covariance(portfolio_returns, market_returns) / market_variance, 2)
}

/// Computes portfolio-level metrics with a configurable risk-free rate.
///
/// The engine holds no state besides its configuration, so callers running
/// computations in parallel can give each worker its own copy.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    risk_free_rate: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine {
    /// Create an engine with the default 2% risk-free rate.
    pub fn new() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }

    /// Create an engine from loaded configuration.
    pub fn with_config(config: &AnalyticsConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
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

    /// Sharpe ratio of a value series, using the configured risk-free rate.
    pub fn portfolio_sharpe(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        calculate_sharpe_ratio(&periodic_returns(values), self.risk_free_rate)
    }

    /// Annualized volatility percentage of a value series.
    pub fn portfolio_volatility(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        calculate_volatility(&periodic_returns(values))
    }

    /// Compute all metrics for a holdings snapshot, as of today.
    ///
    /// # Arguments
    ///
    /// * `holdings` - Portfolio snapshot
    /// * `historical_values` - Optional portfolio value series (oldest first)
    /// * `market_returns` - Optional benchmark returns, either aligned with
    ///   `historical_values` or with the returns derived from it
    pub fn calculate_portfolio_metrics(
        &self,
        holdings: &[Holding],
        historical_values: Option<&[f64]>,
        market_returns: Option<&[f64]>,
    ) -> MetricsResult {
        self.calculate_portfolio_metrics_at(
            holdings,
            historical_values,
            market_returns,
            Utc::now().date_naive(),
        )
    }

    /// Compute all metrics for a holdings snapshot, as of a given date.
    pub fn calculate_portfolio_metrics_at(
        &self,
        holdings: &[Holding],
        historical_values: Option<&[f64]>,
        market_returns: Option<&[f64]>,
        as_of: NaiveDate,
    ) -> MetricsResult {
        let mut metrics = MetricsResult::default();

        for holding in holdings {
            metrics.total_value += holding.current_value;
            metrics.total_cost += holding.original_cost();
        }
        metrics.total_gain_loss = metrics.total_value - metrics.total_cost;

        metrics.roi = calculate_total_roi(holdings);
        metrics.cagr = calculate_portfolio_cagr_at(holdings, as_of);

        match historical_values {
            Some(values) if values.len() > 1 => {
                metrics.sharpe_ratio = self.portfolio_sharpe(values);
                metrics.volatility = self.portfolio_volatility(values);
                metrics.max_drawdown = calculate_max_drawdown(values).max_drawdown_pct;
                metrics.current_drawdown = calculate_current_drawdown(values);

                if let Some(market) = market_returns {
                    let portfolio_returns = periodic_returns(values);
                    // A benchmark aligned with the value series loses its first point
                    let market = if market.len() == values.len() {
                        &market[1..]
                    } else {
                        market
                    };
                    metrics.beta = calculate_beta(&portfolio_returns, market);
                }
            }
            _ => {
                tracing::debug!(
                    "No usable value history; Sharpe, volatility, beta and drawdown use neutral defaults"
                );
            }
        }

        let (top, worst) = rank_performers(holdings);
        metrics.top_performers = top;
        metrics.worst_performers = worst;

        metrics
    }
}

/// Split holdings into the best and worst performers by ROI.
///
/// Sorting is stable, so equal ROIs keep their input order.
fn rank_performers(holdings: &[Holding]) -> (Vec<Performer>, Vec<Performer>) {
    let mut ranked: Vec<Performer> = holdings
        .iter()
        .map(|h| Performer {
            name: h.name.clone(),
            category: h.category.clone(),
            roi: calculate_roi(h),
            value: h.current_value,
        })
        .collect();
    ranked.sort_by(|a, b| b.roi.total_cmp(&a.roi));

    let top = ranked.iter().take(PERFORMER_COUNT).cloned().collect();
    let worst = ranked.iter().rev().take(PERFORMER_COUNT).cloned().collect();

    (top, worst)
}
