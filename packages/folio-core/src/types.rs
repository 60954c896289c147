//! Core data types for the Folio analytics engine.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single holding in a portfolio snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Display name of the fund or asset
    pub name: String,
    /// Asset class or producer category
    pub category: String,
    /// Number of units held
    pub quantity: f64,
    /// Price paid per unit
    pub purchase_price: f64,
    /// Current market value of the whole holding
    pub current_value: f64,
    /// Date the holding was bought
    pub purchase_date: NaiveDate,
}

impl Holding {
    /// Create a validated holding.
    pub fn new(
        name: &str,
        category: &str,
        quantity: f64,
        purchase_price: f64,
        current_value: f64,
        purchase_date: NaiveDate,
    ) -> Result<Self> {
        let holding = Self {
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            quantity,
            purchase_price,
            current_value,
            purchase_date,
        };
        holding.validate()?;
        Ok(holding)
    }

    /// Check the invariants every computation relies on.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidHolding("name must not be empty".to_string()));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(Error::InvalidHolding(format!(
                "{}: quantity must be positive, got {}",
                self.name, self.quantity
            )));
        }
        if !self.purchase_price.is_finite() || self.purchase_price < 0.0 {
            return Err(Error::InvalidHolding(format!(
                "{}: purchase price must be non-negative, got {}",
                self.name, self.purchase_price
            )));
        }
        if !self.current_value.is_finite() || self.current_value < 0.0 {
            return Err(Error::InvalidHolding(format!(
                "{}: current value must be non-negative, got {}",
                self.name, self.current_value
            )));
        }
        Ok(())
    }

    /// Originating cost of the holding (quantity * purchase price).
    pub fn original_cost(&self) -> f64 {
        self.quantity * self.purchase_price
    }

    /// Unrealized gain or loss in currency units.
    pub fn gain_loss(&self) -> f64 {
        self.current_value - self.original_cost()
    }
}

/// A holding ranked by its return on investment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Performer {
    pub name: String,
    pub category: String,
    /// ROI percentage, rounded to 2 decimals
    pub roi: f64,
    /// Current value of the holding
    pub value: f64,
}

/// Peak-to-trough analysis of a value series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DrawdownAnalysis {
    /// Largest decline from a running peak, as a percentage
    pub max_drawdown_pct: f64,
    /// Peak value preceding the largest decline
    pub peak_value: f64,
    /// Lowest value of the largest decline
    pub trough_value: f64,
    pub peak_index: usize,
    pub trough_index: usize,
    /// First index after the trough at which the peak value is regained
    pub recovery_index: Option<usize>,
    /// Periods between trough and recovery
    pub days_to_recover: Option<usize>,
}

impl DrawdownAnalysis {
    /// Whether the series regained its prior peak after the worst decline.
    pub fn is_recovered(&self) -> bool {
        self.recovery_index.is_some()
    }
}

/// Risk and return metrics for a single portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsResult {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    /// Portfolio ROI percentage
    pub roi: f64,
    /// Compound annual growth rate percentage
    pub cagr: f64,
    pub sharpe_ratio: f64,
    /// Annualized volatility percentage
    pub volatility: f64,
    pub beta: f64,
    /// Maximum drawdown percentage
    pub max_drawdown: f64,
    /// Decline of the latest value from the series maximum, percentage
    pub current_drawdown: f64,
    /// Up to five best holdings by ROI, best first
    pub top_performers: Vec<Performer>,
    /// Up to five worst holdings by ROI, worst first
    pub worst_performers: Vec<Performer>,
}

impl Default for MetricsResult {
    fn default() -> Self {
        Self {
            total_value: 0.0,
            total_cost: 0.0,
            total_gain_loss: 0.0,
            roi: 0.0,
            cagr: 0.0,
            sharpe_ratio: 0.0,
            volatility: 0.0,
            beta: 1.0,
            max_drawdown: 0.0,
            current_drawdown: 0.0,
            top_performers: Vec::new(),
            worst_performers: Vec::new(),
        }
    }
}

impl fmt::Display for MetricsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PORTFOLIO METRICS SUMMARY")?;
        writeln!(f)?;
        writeln!(f, "Value & Returns:")?;
        writeln!(f, "  Total Value: {:.2}", self.total_value)?;
        writeln!(f, "  Total Cost: {:.2}", self.total_cost)?;
        writeln!(f, "  Gain/Loss: {:.2}", self.total_gain_loss)?;
        writeln!(f, "  ROI: {:.2}%", self.roi)?;
        writeln!(f, "  CAGR: {:.2}%", self.cagr)?;
        writeln!(f)?;
        writeln!(f, "Risk Metrics:")?;
        writeln!(f, "  Sharpe Ratio: {:.2}", self.sharpe_ratio)?;
        writeln!(f, "  Volatility: {:.2}%", self.volatility)?;
        writeln!(f, "  Beta: {:.2}", self.beta)?;
        writeln!(f, "  Max Drawdown: {:.2}%", self.max_drawdown)?;
        writeln!(f, "  Current Drawdown: {:.2}%", self.current_drawdown)?;
        writeln!(f)?;
        writeln!(f, "Top Performers:")?;
        for (i, p) in self.top_performers.iter().enumerate() {
            writeln!(f, "  {}. {}: {:.2}%", i + 1, p.name, p.roi)?;
        }
        writeln!(f)?;
        write!(f, "Worst Performers:")?;
        for (i, p) in self.worst_performers.iter().enumerate() {
            write!(f, "\n  {}. {}: {:.2}%", i + 1, p.name, p.roi)?;
        }
        Ok(())
    }
}

/// Optimization objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Highest risk-adjusted return
    MaxSharpe,
    /// Lowest portfolio volatility
    MinVolatility,
    /// Highest expected return (winner-take-all)
    MaxReturn,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Objective::MaxSharpe => "Maximum Sharpe Ratio",
            Objective::MinVolatility => "Minimum Volatility",
            Objective::MaxReturn => "Maximum Return",
        };
        f.write_str(name)
    }
}

/// Recommended allocation change for one holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub name: String,
    pub category: String,
    /// Share of current total value
    pub current_weight: f64,
    /// Weight chosen by the optimizer
    pub optimal_weight: f64,
    /// optimal_weight - current_weight
    pub difference: f64,
    /// Fractional return used as the expected return
    pub expected_return: f64,
}

/// Outcome of a single optimization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    pub objective: Objective,
    /// Optimal weights in input holding order
    pub weights: Vec<f64>,
    /// Fractional expected portfolio return
    pub expected_return: f64,
    /// Fractional portfolio volatility
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Per-holding allocations, sorted by optimal weight descending
    pub allocations: Vec<Allocation>,
}

impl OptimizationResult {
    /// Weights and statistics without the allocation breakdown.
    pub fn portfolio_point(&self) -> PortfolioPoint {
        PortfolioPoint {
            weights: self.weights.clone(),
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe_ratio: self.sharpe_ratio,
        }
    }
}

/// One point of the efficient frontier sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontierPoint {
    /// Return the search was steered toward
    pub target_return: f64,
    /// Return actually realized by `weights`
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub weights: Vec<f64>,
}

/// A reference portfolio (equal weight, tangency, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioPoint {
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Point on the capital allocation line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CalPoint {
    pub risk: f64,
    pub expected_return: f64,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
