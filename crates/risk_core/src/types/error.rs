//! Parse errors for core value types.

use thiserror::Error;

/// Date-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Date arithmetic left the representable range.
    #[error("Date overflow: {0}")]
    Overflow(String),

    /// Unknown day count convention name.
    #[error("Unknown day count convention: {0}")]
    UnknownDayCount(String),
}

/// Currency and enum parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Unknown currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Unknown collateral calculation type.
    #[error("Collateral calculation type \"{0}\" not recognized")]
    UnknownCalculationType(String),
}
