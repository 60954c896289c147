//! Engine configuration loaded from TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default annual risk-free rate (2%).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Top-level analytics configuration.
///
/// ```toml
/// risk_free_rate = 0.03
///
/// [optimizer]
/// iterations = 200
/// tolerance = 1e-7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Annual risk-free rate used by Sharpe calculations
    pub risk_free_rate: f64,
    /// Optimizer loop parameters
    pub optimizer: OptimizerConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// Parameters of the gradient loops and the frontier sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Maximum gradient iterations for max-Sharpe and min-volatility
    pub iterations: usize,
    /// Step size of the gradient loops
    pub learning_rate: f64,
    /// Finite-difference perturbation
    pub epsilon: f64,
    /// Stop once no weight moves more than this in one iteration (0 disables)
    pub tolerance: f64,
    /// Default number of frontier points
    pub frontier_points: usize,
    /// Iterations per frontier target
    pub frontier_iterations: usize,
    /// Step size of the frontier loop
    pub frontier_learning_rate: f64,
    /// Upper end of the target return sweep (fractional)
    pub frontier_max_return: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            learning_rate: 0.01,
            epsilon: 0.001,
            tolerance: 0.0,
            frontier_points: 50,
            frontier_iterations: 50,
            frontier_learning_rate: 0.005,
            frontier_max_return: 0.3,
        }
    }
}

impl OptimizerConfig {
    /// Reject parameters that would make the loops meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 || self.frontier_iterations == 0 {
            return Err(Error::InvalidConfig(
                "optimizer iterations must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("frontier_learning_rate", self.frontier_learning_rate),
            ("epsilon", self.epsilon),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "optimizer {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "optimizer tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if !self.frontier_max_return.is_finite() {
            return Err(Error::InvalidConfig(
                "frontier_max_return must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl AnalyticsConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.folio/config.toml`
    /// Can be overridden with `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for usable values.
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        self.optimizer.validate()
    }
}
