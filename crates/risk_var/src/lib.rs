//! # risk_var (L3: Risk)
//!
//! Historical simulation Value-at-Risk and expected shortfall.
//!
//! This crate provides:
//! - The `VarCalculator` trait
//! - `HistoricalVarCalculator`: empirical VaR / ES from a PnL vector, using a
//!   bounded tail instead of a full sort
//! - `aggregate_pnls`: scenario-wise sum of trade PnL vectors for a subset
//!   of trades
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              risk_var (L3)              │
//! ├─────────────────────────────────────────┤
//! │  historical - VaR / ES, summaries       │
//! │  aggregate  - trade PnL aggregation     │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │             risk_core (L1)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//!
//! With `is_call = false` observations are negated before the tail is
//! taken, so the result is always a left-tail quantile of the adjusted
//! sample. Results are NaN, not errors, when the sample is too small for
//! the requested confidence.
//!
//! ```
//! use risk_var::{HistoricalVarCalculator, VarCalculator};
//!
//! let calc = HistoricalVarCalculator::new(vec![-100.0, -50.0, -10.0, 0.0, 20.0, 40.0, 90.0]);
//! assert_eq!(calc.var(0.95, false).unwrap(), -90.0);
//! assert_eq!(calc.expected_shortfall(0.95, false).unwrap(), -90.0);
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod error;
pub mod historical;

pub use aggregate::aggregate_pnls;
pub use error::VarError;
pub use historical::{HistoricalVarCalculator, VarCalculator, VarResult};
