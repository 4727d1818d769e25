//! Market data error types.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::Currency;

/// Market data lookup errors.
///
/// # Examples
///
/// ```
/// use risk_core::market_data::MarketDataError;
/// use risk_core::types::Currency;
///
/// let err = MarketDataError::MissingCurve(Currency::GBP);
/// assert_eq!(err.to_string(), "No discount curve for GBP");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Discount requested before the curve's reference date.
    #[error("Discount date {date} is before curve reference date {asof}")]
    DateBeforeReference {
        /// Requested date
        date: NaiveDate,
        /// Curve reference date
        asof: NaiveDate,
    },

    /// No curve registered for the currency.
    #[error("No discount curve for {0}")]
    MissingCurve(Currency),

    /// No FX spot available between the two currencies.
    #[error("No FX spot for {from}{to}")]
    MissingFxSpot {
        /// Source currency
        from: Currency,
        /// Target currency
        to: Currency,
    },

    /// FX spot must be strictly positive.
    #[error("Invalid FX spot {from}{to} = {rate}")]
    InvalidFxSpot {
        /// Source currency
        from: Currency,
        /// Target currency
        to: Currency,
        /// Offending rate
        rate: f64,
    },
}
