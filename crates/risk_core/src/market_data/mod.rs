//! Market data needed by exposure post-processing.
//!
//! Aggregation does not price anything. It only needs discount factors to
//! turn exposures into discounted profiles, and FX spots to convert
//! collateral balances held in a CSA currency into the cube's base currency.
//!
//! - `curve`: `DiscountCurve` trait and a flat implementation
//! - `market`: `Market` trait bundling curves and FX spots
//! - `error`: `MarketDataError`

pub mod curve;
pub mod error;
pub mod market;

pub use curve::{DiscountCurve, FlatDiscountCurve};
pub use error::MarketDataError;
pub use market::{Market, SimpleMarket};
