//! # risk_core: Foundation for the Risk Aggregation Layer
//!
//! ## Layer 1 (Foundation) Role
//!
//! risk_core is the bottom layer of the aggregation workspace, providing:
//! - Strongly-typed identifiers: `TradeId`, `NettingSetId`, `CounterpartyId` (`types::ids`)
//! - Time handling: `DayCountConvention`, weekend adjustment (`types::time`)
//! - Currency codes: `Currency` (`types::currency`)
//! - Collateral calculation types: `CalculationType` (`types::calculation_type`)
//! - Market data used for bookkeeping: discount curves and FX spots (`market_data`)
//! - Run configuration and logging setup (`config`, `logging`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   risk_exposure (L3)   risk_var (L3)    │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │            risk_cube (L2)               │
//! │  ScenarioCube, JointCube, Interpretation│
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │            risk_core (L1)               │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use risk_core::types::{Currency, DayCountConvention, TradeId};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//! let yf = DayCountConvention::ActualActualIsda.year_fraction(start, end);
//! assert!((yf - 182.0 / 366.0).abs() < 1e-12);
//!
//! assert_eq!(Currency::EUR.code(), "EUR");
//! assert_eq!(TradeId::new("T1").as_str(), "T1");
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod logging;
pub mod market_data;
pub mod types;

pub use config::{AggregationConfig, ConfigError, LogLevel};
pub use market_data::{DiscountCurve, FlatDiscountCurve, Market, MarketDataError, SimpleMarket};
pub use types::{
    CalculationType, CounterpartyId, Currency, CurrencyError, DateError, DayCountConvention,
    NettingSetId, TradeId,
};
