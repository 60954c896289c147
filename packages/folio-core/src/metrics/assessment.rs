//! Threshold-based risk assessment and composition analysis.

use crate::stats::round_to;
use crate::types::{Holding, MetricsResult};
use serde::{Deserialize, Serialize};

/// How alarming a rated metric is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Safe,
    Caution,
    Warning,
    Danger,
}

/// Overall portfolio risk level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Market sensitivity bucket derived from beta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BetaCategory {
    Defensive,
    Neutral,
    Aggressive,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Medium,
    High,
    Critical,
}

/// A metric value with its rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedMetric {
    pub value: f64,
    /// EXCELLENT, GOOD, ACCEPTABLE, HIGH or POOR
    pub rating: String,
    /// Descriptive level (LOW, MEDIUM, WARNING, CRITICAL, ...)
    pub level: String,
    pub severity: Severity,
}

impl RatedMetric {
    fn new(value: f64, rating: &str, level: &str, severity: Severity) -> Self {
        Self {
            value,
            rating: rating.to_string(),
            level: level.to_string(),
            severity,
        }
    }
}

/// Weight of one holding in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldingWeight {
    pub name: String,
    pub value: f64,
    /// Share of total value, as a percentage
    pub weight: f64,
}

/// Concentration of value across holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompositionAnalysis {
    pub total_value: f64,
    /// Herfindahl-Hirschman index of value weights (1.0 = single holding)
    pub concentration_index: f64,
    /// (1 - HHI) * 100, clamped to [0, 100]
    pub diversification_score: f64,
    /// Up to five largest holdings by weight
    pub top_holdings: Vec<HoldingWeight>,
}

impl CompositionAnalysis {
    /// Analyze how concentrated the current value is.
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let total_value: f64 = holdings.iter().map(|h| h.current_value).sum();
        if holdings.is_empty() || total_value <= 0.0 {
            return Self::default();
        }

        let hhi: f64 = holdings
            .iter()
            .map(|h| (h.current_value / total_value).powi(2))
            .sum();
        let diversification_score = ((1.0 - hhi) * 100.0).clamp(0.0, 100.0);

        let mut top_holdings: Vec<HoldingWeight> = holdings
            .iter()
            .map(|h| HoldingWeight {
                name: h.name.clone(),
                value: h.current_value,
                weight: h.current_value / total_value * 100.0,
            })
            .collect();
        top_holdings.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        top_holdings.truncate(5);

        Self {
            total_value: round_to(total_value, 2),
            concentration_index: round_to(hhi, 4),
            diversification_score: round_to(diversification_score, 2),
            top_holdings,
        }
    }
}

/// Actionable advice attached to an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Ratings for the headline risk metrics of a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub roi: f64,
    pub volatility: RatedMetric,
    pub drawdown: RatedMetric,
    pub sharpe_ratio: RatedMetric,
    pub beta: f64,
    pub beta_category: BetaCategory,
    pub diversification: CompositionAnalysis,
    pub overall_risk_level: OverallRiskLevel,
    pub recommendations: Vec<Recommendation>,
}

impl RiskAssessment {
    /// Rate computed metrics and derive recommendations.
    pub fn from_metrics(metrics: &MetricsResult, holdings: &[Holding]) -> Self {
        let volatility = rate_volatility(metrics.volatility);
        let drawdown = rate_drawdown(metrics.max_drawdown.abs());
        let sharpe_ratio = rate_sharpe(metrics.sharpe_ratio);
        let overall_risk_level = overall_level(volatility.severity, drawdown.severity);

        let mut assessment = Self {
            roi: metrics.roi,
            volatility,
            drawdown,
            sharpe_ratio,
            beta: metrics.beta,
            beta_category: categorize_beta(metrics.beta),
            diversification: CompositionAnalysis::from_holdings(holdings),
            overall_risk_level,
            recommendations: Vec::new(),
        };
        assessment.recommendations = recommendations(&assessment);
        assessment
    }
}

fn rate_volatility(value: f64) -> RatedMetric {
    if value < 10.0 {
        RatedMetric::new(value, "EXCELLENT", "LOW", Severity::Safe)
    } else if value < 20.0 {
        RatedMetric::new(value, "GOOD", "MEDIUM", Severity::Caution)
    } else if value < 30.0 {
        RatedMetric::new(value, "ACCEPTABLE", "HIGH", Severity::Warning)
    } else {
        RatedMetric::new(value, "HIGH", "VERY_HIGH", Severity::Danger)
    }
}

fn rate_drawdown(value: f64) -> RatedMetric {
    if value < 10.0 {
        RatedMetric::new(value, "EXCELLENT", "ACCEPTABLE", Severity::Safe)
    } else if value < 20.0 {
        RatedMetric::new(value, "GOOD", "WARNING", Severity::Caution)
    } else if value < 30.0 {
        RatedMetric::new(value, "ACCEPTABLE", "CRITICAL", Severity::Warning)
    } else {
        RatedMetric::new(value, "POOR", "SEVERE", Severity::Danger)
    }
}

fn rate_sharpe(value: f64) -> RatedMetric {
    if value >= 1.5 {
        RatedMetric::new(value, "EXCELLENT", "HIGH", Severity::Safe)
    } else if value >= 1.0 {
        RatedMetric::new(value, "GOOD", "MEDIUM", Severity::Safe)
    } else if value >= 0.5 {
        RatedMetric::new(value, "ACCEPTABLE", "LOW", Severity::Caution)
    } else {
        RatedMetric::new(value, "POOR", "VERY_LOW", Severity::Warning)
    }
}

fn categorize_beta(beta: f64) -> BetaCategory {
    if beta < 0.7 {
        BetaCategory::Defensive
    } else if beta > 1.3 {
        BetaCategory::Aggressive
    } else {
        BetaCategory::Neutral
    }
}

fn overall_level(volatility: Severity, drawdown: Severity) -> OverallRiskLevel {
    match (volatility, drawdown) {
        (Severity::Safe, Severity::Safe) => OverallRiskLevel::Low,
        (Severity::Danger, _) | (_, Severity::Danger) => OverallRiskLevel::Critical,
        (Severity::Warning, _) | (_, Severity::Warning) => OverallRiskLevel::High,
        _ => OverallRiskLevel::Medium,
    }
}

fn recommendations(assessment: &RiskAssessment) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if assessment.volatility.severity == Severity::Danger {
        recommendations.push(Recommendation {
            title: "High volatility".to_string(),
            message: format!(
                "Volatility of {:.1}% is critically high. Consider rebalancing the portfolio.",
                assessment.volatility.value
            ),
            priority: Priority::High,
        });
    }

    if assessment.drawdown.severity == Severity::Danger {
        recommendations.push(Recommendation {
            title: "Critical drawdown".to_string(),
            message: format!(
                "Maximum decline of {:.1}% is significant. Consider hedging positions.",
                assessment.drawdown.value
            ),
            priority: Priority::Critical,
        });
    }

    if assessment.sharpe_ratio.value < 0.5 {
        recommendations.push(Recommendation {
            title: "Low risk-adjusted return".to_string(),
            message: format!(
                "Sharpe ratio {:.2} is below the acceptable level. Consider optimizing the allocation.",
                assessment.sharpe_ratio.value
            ),
            priority: Priority::Medium,
        });
    }

    if assessment.roi < 0.0 {
        recommendations.push(Recommendation {
            title: "Negative return".to_string(),
            message: format!(
                "Portfolio is at a loss ({:.2}%). Keep monitoring the market.",
                assessment.roi
            ),
            priority: Priority::High,
        });
    }

    recommendations
}
