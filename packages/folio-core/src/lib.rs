//! Folio Core - Portfolio analytics and allocation optimization.
//!
//! This crate provides the numeric core of the Folio portfolio tracker:
//!
//! - **Statistics**: population mean, variance, standard deviation, covariance
//! - **Metrics**: ROI, CAGR, Sharpe ratio, volatility, beta, drawdown analysis
//! - **Risk assessment**: threshold ratings, concentration, recommendations
//! - **Optimization**: max-Sharpe, min-volatility and max-return allocations,
//!   efficient frontier, capital allocation line
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use folio_core::{Holding, MetricsEngine, Objective, OptimizationEngine};
//!
//! let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
//! let holdings = vec![
//!     Holding::new("World ETF", "equity", 10.0, 100.0, 1250.0, date).unwrap(),
//!     Holding::new("Bond Fund", "bonds", 20.0, 50.0, 1040.0, date).unwrap(),
//! ];
//!
//! let metrics = MetricsEngine::new().calculate_portfolio_metrics(&holdings, None, None);
//! println!("ROI: {:.2}%", metrics.roi);
//!
//! let result = OptimizationEngine::new()
//!     .optimize(&holdings, Objective::MaxSharpe)
//!     .unwrap();
//! for allocation in &result.allocations {
//!     println!("{}: {:.1}%", allocation.name, allocation.optimal_weight * 100.0);
//! }
//! ```

pub mod config;
pub mod metrics;
pub mod optimize;
pub mod returns;
pub mod snapshot;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::{AnalyticsConfig, OptimizerConfig};
pub use types::{
    Allocation, ApiResponse, CalPoint, DrawdownAnalysis, FrontierPoint, Holding, MetricsResult,
    Objective, OptimizationResult, Performer, PortfolioPoint,
};

// Re-export main functionality
pub use metrics::{
    calculate_beta, calculate_cagr, calculate_current_drawdown, calculate_max_drawdown,
    calculate_portfolio_cagr, calculate_roi, calculate_sharpe_ratio, calculate_total_roi,
    calculate_volatility, CompositionAnalysis, MetricsEngine, RiskAssessment,
};
pub use optimize::{
    CovarianceMatrix, CovarianceProvider, HeuristicCovariance, OptimizationEngine,
    SampleCovariance,
};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Nothing to optimize: portfolio has no holdings")]
    EmptyPortfolio,

    #[error("Invalid holding: {0}")]
    InvalidHolding(String),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Covariance matrix is {actual}x{actual}, expected {expected}x{expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
