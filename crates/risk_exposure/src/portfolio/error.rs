//! Portfolio construction errors.

use thiserror::Error;

/// Portfolio validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// Duplicate trade id.
    #[error("Duplicate trade ID: {0}")]
    DuplicateTrade(String),

    /// Duplicate netting set id.
    #[error("Duplicate netting set ID: {0}")]
    DuplicateNettingSet(String),

    /// Trade references a netting set that was not added.
    #[error("Trade {0} references unknown netting set {1}")]
    UnknownNettingSetReference(String, String),

    /// CSA terms rejected.
    #[error("Invalid CSA: {0}")]
    InvalidCsa(String),
}
