//! VaR calculation errors.

use thiserror::Error;

/// Errors raised by VaR calculators and PnL aggregation.
///
/// Insufficient data is not an error: it yields NaN.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VarError {
    /// Confidence level outside [0, 1].
    #[error("invalid confidence level {0}: must be in [0, 1]")]
    InvalidConfidence(f64),

    /// PnL vectors of different lengths.
    #[error("PnL vector for {id} has {actual} scenarios, expected {expected}")]
    LengthMismatch {
        /// Trade id
        id: String,
        /// Scenario count of the first vector
        expected: usize,
        /// Scenario count of this vector
        actual: usize,
    },

    /// Trade requested without a PnL vector.
    #[error("no PnL vector for trade {0}")]
    UnknownTrade(String),
}
