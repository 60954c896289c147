//! Return series derivation from holdings and value histories.

use crate::types::Holding;

/// Fractional return of a single holding: `(current - cost) / cost`.
///
/// Returns 0.0 when the holding has no originating cost.
pub fn holding_return(holding: &Holding) -> f64 {
    let cost = holding.original_cost();
    if cost == 0.0 {
        return 0.0;
    }
    (holding.current_value - cost) / cost
}

/// Expected return vector, one fractional return per holding in input order.
pub fn expected_returns(holdings: &[Holding]) -> Vec<f64> {
    holdings.iter().map(holding_return).collect()
}

/// Simple periodic returns of a value series.
///
/// The result has one element fewer than the input. A period starting from
/// a zero value contributes a 0.0 return.
pub fn periodic_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Share of total current value held in each holding.
///
/// All weights are 0.0 when the portfolio has no current value.
pub fn current_weights(holdings: &[Holding]) -> Vec<f64> {
    let total: f64 = holdings.iter().map(|h| h.current_value).sum();
    if total <= 0.0 {
        return vec![0.0; holdings.len()];
    }
    holdings.iter().map(|h| h.current_value / total).collect()
}
