//! Core value types shared across the aggregation crates.
//!
//! - `ids`: trade, netting set and counterparty identifiers
//! - `time`: day count conventions and calendar adjustment
//! - `currency`: ISO 4217 currency codes
//! - `calculation_type`: collateral calculation methodology
//! - `error`: parse errors for the above

pub mod calculation_type;
pub mod currency;
pub mod error;
pub mod ids;
pub mod time;

pub use calculation_type::CalculationType;
pub use currency::Currency;
pub use error::{CurrencyError, DateError};
pub use ids::{CounterpartyId, NettingSetId, TradeId};
pub use time::{add_years, adjust_following_weekends_only, DayCountConvention};
