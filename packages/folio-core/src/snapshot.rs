//! Loading holdings snapshots and value series from JSON files.

use crate::types::Holding;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Load and validate a JSON array of holdings.
pub fn load_holdings(path: &Path) -> Result<Vec<Holding>> {
    let content = fs::read_to_string(path)?;
    let holdings: Vec<Holding> = serde_json::from_str(&content)?;

    for holding in &holdings {
        holding.validate()?;
    }

    tracing::debug!(count = holdings.len(), path = %path.display(), "Loaded holdings");
    Ok(holdings)
}

/// Load a JSON array of numbers (a value or return series).
pub fn load_series(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path)?;
    let series: Vec<f64> = serde_json::from_str(&content)?;

    if let Some(idx) = series.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidSeries(format!(
            "{}: non-finite value at index {}",
            path.display(),
            idx
        )));
    }

    Ok(series)
}

/// Write holdings as pretty-printed JSON.
pub fn save_holdings(path: &Path, holdings: &[Holding]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(holdings)?;
    fs::write(path, content)?;
    Ok(())
}
