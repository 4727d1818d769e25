//! Historical simulation VaR and expected shortfall.
//!
//! The VaR is read from the `c` smallest sign-adjusted observations, where
//! `c = floor(n (1 - confidence) + 0.5) + 2`, kept in a bounded max-heap so
//! that only the tail is ordered.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::VarError;

/// VaR and expected shortfall at one confidence level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarResult {
    /// Confidence level
    pub confidence: f64,
    /// Value-at-Risk, NaN when undefined
    pub var: f64,
    /// Expected shortfall, NaN when undefined
    pub expected_shortfall: f64,
}

/// Quantile risk measures over a PnL distribution.
pub trait VarCalculator: Send + Sync {
    /// Value-at-Risk at `confidence`.
    ///
    /// `is_call = false` negates observations before taking the left tail.
    fn var(&self, confidence: f64, is_call: bool) -> Result<f64, VarError>;

    /// Mean of the sign-adjusted observations at or below the VaR.
    fn expected_shortfall(&self, confidence: f64, is_call: bool) -> Result<f64, VarError>;

    /// VaR and expected shortfall for each confidence level, in order.
    fn summary(&self, confidences: &[f64], is_call: bool) -> Result<Vec<VarResult>, VarError> {
        confidences
            .iter()
            .map(|&confidence| {
                Ok(VarResult {
                    confidence,
                    var: self.var(confidence, is_call)?,
                    expected_shortfall: self.expected_shortfall(confidence, is_call)?,
                })
            })
            .collect()
    }
}

/// Empirical VaR over a fixed vector of PnL observations.
///
/// # Examples
///
/// ```
/// use risk_var::{HistoricalVarCalculator, VarCalculator};
///
/// let pnls: Vec<f64> = (1..=100).map(f64::from).collect();
/// let calc = HistoricalVarCalculator::new(pnls);
///
/// // 25 of 100 observations in the tail
/// assert_eq!(calc.var(0.75, true).unwrap(), 25.0);
/// assert_eq!(calc.expected_shortfall(0.75, true).unwrap(), 13.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalVarCalculator {
    pnls: Vec<f64>,
}

impl HistoricalVarCalculator {
    /// Calculator over the given PnL observations.
    pub fn new(pnls: Vec<f64>) -> Self {
        Self { pnls }
    }

    /// The PnL observations.
    #[inline]
    pub fn pnls(&self) -> &[f64] {
        &self.pnls
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.pnls.len()
    }

    /// True when there are no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pnls.is_empty()
    }

    fn adjusted(&self, is_call: bool) -> impl Iterator<Item = f64> + '_ {
        let sign = if is_call { 1.0 } else { -1.0 };
        self.pnls.iter().map(move |pnl| sign * pnl)
    }
}

impl VarCalculator for HistoricalVarCalculator {
    fn var(&self, confidence: f64, is_call: bool) -> Result<f64, VarError> {
        check_confidence(confidence)?;
        let n = self.pnls.len();
        let tail = smallest(self.adjusted(is_call), tail_size(n, confidence));
        let index = tail_index(n, confidence);
        if index >= tail.len() {
            debug!(n, confidence, index, "too few observations for VaR");
            return Ok(f64::NAN);
        }
        Ok(tail[index - 1])
    }

    fn expected_shortfall(&self, confidence: f64, is_call: bool) -> Result<f64, VarError> {
        let var = self.var(confidence, is_call)?;
        if var.is_nan() {
            return Ok(var);
        }
        let (sum, count) = self
            .adjusted(is_call)
            .filter(|x| *x <= var)
            .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
        // var is itself an observation, so count >= 1
        Ok(sum / count as f64)
    }
}

fn check_confidence(confidence: f64) -> Result<(), VarError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(VarError::InvalidConfidence(confidence))
    }
}

/// Number of tail observations retained.
fn tail_size(n: usize, confidence: f64) -> usize {
    (n as f64 * (1.0 - confidence) + 0.5).floor() as usize + 2
}

/// One-based rank of the quantile within the tail.
fn tail_index(n: usize, confidence: f64) -> usize {
    ((n as f64 * (1.0 - confidence)).ceil() as usize).max(1)
}

#[derive(Debug, Clone, Copy)]
struct TailValue(f64);

impl PartialEq for TailValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TailValue {}

impl PartialOrd for TailValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TailValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The `count` smallest values, ascending.
fn smallest(values: impl Iterator<Item = f64>, count: usize) -> Vec<f64> {
    let mut heap = BinaryHeap::with_capacity(count + 1);
    for value in values {
        heap.push(TailValue(value));
        if heap.len() > count {
            heap.pop();
        }
    }
    heap.into_sorted_vec().into_iter().map(|t| t.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> HistoricalVarCalculator {
        HistoricalVarCalculator::new(vec![-100.0, -50.0, -10.0, 0.0, 20.0, 40.0, 90.0])
    }

    #[test]
    fn test_loss_side_var_and_shortfall() {
        let calc = sample();
        assert_eq!(calc.var(0.95, false).unwrap(), -90.0);
        assert_eq!(calc.expected_shortfall(0.95, false).unwrap(), -90.0);
    }

    #[test]
    fn test_call_side_uses_raw_values() {
        let calc = sample();
        assert_eq!(calc.var(0.95, true).unwrap(), -100.0);
        assert_eq!(calc.expected_shortfall(0.95, true).unwrap(), -100.0);
    }

    #[test]
    fn test_shortfall_averages_tail() {
        let calc = HistoricalVarCalculator::new((1..=100).map(f64::from).collect());
        assert_eq!(calc.var(0.9, true).unwrap(), 10.0);
        assert_relative_eq!(calc.expected_shortfall(0.9, true).unwrap(), 5.5, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_data_is_nan() {
        let single = HistoricalVarCalculator::new(vec![5.0]);
        assert!(single.var(0.99, false).unwrap().is_nan());
        assert!(single.expected_shortfall(0.99, false).unwrap().is_nan());

        let empty = HistoricalVarCalculator::new(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.var(0.5, true).unwrap().is_nan());
    }

    #[test]
    fn test_invalid_confidence() {
        let calc = sample();
        assert_eq!(calc.var(1.5, false), Err(VarError::InvalidConfidence(1.5)));
        assert!(calc.expected_shortfall(f64::NAN, false).is_err());
    }

    #[test]
    fn test_summary_preserves_order() {
        let calc = HistoricalVarCalculator::new((1..=100).map(f64::from).collect());
        let summary = calc.summary(&[0.9, 0.75], true).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].confidence, 0.9);
        assert_eq!(summary[0].var, 10.0);
        assert_eq!(summary[1].var, 25.0);
        assert_relative_eq!(summary[1].expected_shortfall, 13.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tail_keeps_smallest_sorted() {
        let tail = smallest([5.0, -1.0, 3.0, -7.0, 0.0].into_iter(), 3);
        assert_eq!(tail, vec![-7.0, -1.0, 0.0]);
        assert_eq!(smallest([1.0].into_iter(), 4), vec![1.0]);
    }

    #[test]
    fn test_tail_size_and_index() {
        assert_eq!(tail_size(7, 0.95), 2);
        assert_eq!(tail_index(7, 0.95), 1);
        assert_eq!(tail_size(100, 0.75), 27);
        assert_eq!(tail_index(100, 0.75), 25);
        assert_eq!(tail_index(0, 0.5), 1);
    }
}
