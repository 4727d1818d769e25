//! Exposure calculation errors.

use risk_core::{DateError, MarketDataError};
use risk_cube::CubeError;
use thiserror::Error;

use crate::portfolio::PortfolioError;

/// Errors raised while building exposure profiles.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExposureError {
    /// Cube access or interpretation failure.
    #[error(transparent)]
    Cube(#[from] CubeError),

    /// Discount curve or FX lookup failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Date arithmetic failure.
    #[error(transparent)]
    Date(#[from] DateError),

    /// Invalid portfolio.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// A portfolio trade has no row in the NPV cube.
    #[error("trade {0} not found in NPV cube")]
    TradeNotInCube(String),

    /// PFE quantile outside [0, 1].
    #[error("invalid PFE quantile {0}")]
    InvalidQuantile(f64),

    /// Negative or NaN marginal allocation limit.
    #[error("invalid marginal allocation limit {0}")]
    InvalidAllocationLimit(f64),

    /// Trades of one netting set face different counterparties.
    #[error("counterparty not unique within netting set {netting_set}: {first} vs {second}")]
    CounterpartyNotUnique {
        /// Netting set
        netting_set: String,
        /// Counterparty of the first trade
        first: String,
        /// Conflicting counterparty
        second: String,
    },

    /// CSA currency differs from base but no FX scenario data is available.
    #[error("scenario data does not provide FX rates for {currency} in netting set {netting_set}")]
    MissingFxScenarios {
        /// Netting set
        netting_set: String,
        /// CSA currency code
        currency: String,
    },

    /// Lookup of an id without results.
    #[error("no exposure results for {0}")]
    UnknownId(String),
}
