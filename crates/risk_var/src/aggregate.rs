//! Portfolio PnL from trade-level PnL vectors.

use std::collections::BTreeMap;

use rayon::prelude::*;
use risk_core::TradeId;
use tracing::debug;

use crate::error::VarError;

/// Scenario-wise sum of the PnL vectors of `trade_ids`.
///
/// Every listed trade must have a vector and all vectors must have the same
/// number of scenarios. An empty trade list gives an empty vector.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use risk_core::TradeId;
/// use risk_var::aggregate_pnls;
///
/// let mut pnls = BTreeMap::new();
/// pnls.insert(TradeId::new("T1"), vec![1.0, -2.0]);
/// pnls.insert(TradeId::new("T2"), vec![0.5, 0.5]);
/// pnls.insert(TradeId::new("T3"), vec![9.0, 9.0]);
///
/// let total = aggregate_pnls(&pnls, &[TradeId::new("T1"), TradeId::new("T2")]).unwrap();
/// assert_eq!(total, vec![1.5, -1.5]);
/// ```
pub fn aggregate_pnls(
    trade_pnls: &BTreeMap<TradeId, Vec<f64>>,
    trade_ids: &[TradeId],
) -> Result<Vec<f64>, VarError> {
    let vectors = trade_ids
        .iter()
        .map(|id| {
            trade_pnls
                .get(id)
                .map(|v| (id, v.as_slice()))
                .ok_or_else(|| VarError::UnknownTrade(id.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let Some((_, first)) = vectors.first() else {
        return Ok(Vec::new());
    };
    let scenarios = first.len();
    for (id, v) in &vectors {
        if v.len() != scenarios {
            return Err(VarError::LengthMismatch {
                id: id.to_string(),
                expected: scenarios,
                actual: v.len(),
            });
        }
    }

    debug!(trades = vectors.len(), scenarios, "aggregating trade PnL");
    Ok((0..scenarios)
        .into_par_iter()
        .map(|s| vectors.iter().map(|(_, v)| v[s]).sum::<f64>())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnls() -> BTreeMap<TradeId, Vec<f64>> {
        [("T1", vec![1.0, 2.0, 3.0]), ("T2", vec![-1.0, 0.0, 4.0])]
            .into_iter()
            .map(|(id, v)| (TradeId::new(id), v))
            .collect()
    }

    #[test]
    fn test_sums_per_scenario() {
        let ids = [TradeId::new("T1"), TradeId::new("T2")];
        assert_eq!(aggregate_pnls(&pnls(), &ids).unwrap(), vec![0.0, 2.0, 7.0]);
    }

    #[test]
    fn test_empty_selection() {
        assert!(aggregate_pnls(&pnls(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_trade() {
        let err = aggregate_pnls(&pnls(), &[TradeId::new("T9")]).unwrap_err();
        assert_eq!(err, VarError::UnknownTrade("T9".to_string()));
    }

    #[test]
    fn test_length_mismatch() {
        let mut pnls = pnls();
        pnls.insert(TradeId::new("T3"), vec![1.0]);
        let ids = [TradeId::new("T1"), TradeId::new("T3")];
        assert_eq!(
            aggregate_pnls(&pnls, &ids).unwrap_err(),
            VarError::LengthMismatch {
                id: "T3".to_string(),
                expected: 3,
                actual: 1,
            }
        );
    }
}
