//! Market snapshot used by exposure calculators.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::curve::{DiscountCurve, FlatDiscountCurve};
use super::error::MarketDataError;
use crate::types::Currency;

/// Today's market as seen by aggregation.
pub trait Market: Send + Sync {
    /// Valuation date.
    fn asof(&self) -> NaiveDate;

    /// Discount curve for a currency.
    fn discount_curve(&self, ccy: Currency) -> Result<&dyn DiscountCurve, MarketDataError>;

    /// Spot rate converting one unit of `from` into `to`.
    fn fx_rate(&self, from: Currency, to: Currency) -> Result<f64, MarketDataError>;
}

/// In-memory market with flat curves and a table of FX spots.
///
/// FX lookups try the direct quote, then the inverse quote. Identity pairs
/// always return 1.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use risk_core::market_data::{Market, SimpleMarket};
/// use risk_core::types::Currency;
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let market = SimpleMarket::new(asof)
///     .with_fx_spot(Currency::EUR, Currency::USD, 1.10)
///     .unwrap();
/// assert!((market.fx_rate(Currency::USD, Currency::EUR).unwrap() - 1.0 / 1.10).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleMarket {
    asof: NaiveDate,
    curves: HashMap<Currency, FlatDiscountCurve>,
    fx_spots: HashMap<(Currency, Currency), f64>,
}

impl SimpleMarket {
    /// Empty market at the given valuation date.
    pub fn new(asof: NaiveDate) -> Self {
        Self {
            asof,
            curves: HashMap::new(),
            fx_spots: HashMap::new(),
        }
    }

    /// Register a flat discount curve for `ccy`.
    pub fn with_flat_curve(mut self, ccy: Currency, curve: FlatDiscountCurve) -> Self {
        self.curves.insert(ccy, curve);
        self
    }

    /// Register an FX spot quoted as units of `to` per unit of `from`.
    pub fn with_fx_spot(
        mut self,
        from: Currency,
        to: Currency,
        rate: f64,
    ) -> Result<Self, MarketDataError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(MarketDataError::InvalidFxSpot { from, to, rate });
        }
        self.fx_spots.insert((from, to), rate);
        Ok(self)
    }
}

impl Market for SimpleMarket {
    fn asof(&self) -> NaiveDate {
        self.asof
    }

    fn discount_curve(&self, ccy: Currency) -> Result<&dyn DiscountCurve, MarketDataError> {
        self.curves
            .get(&ccy)
            .map(|c| c as &dyn DiscountCurve)
            .ok_or(MarketDataError::MissingCurve(ccy))
    }

    fn fx_rate(&self, from: Currency, to: Currency) -> Result<f64, MarketDataError> {
        if from == to {
            return Ok(1.0);
        }
        if let Some(rate) = self.fx_spots.get(&(from, to)) {
            return Ok(*rate);
        }
        self.fx_spots
            .get(&(to, from))
            .map(|rate| 1.0 / rate)
            .ok_or(MarketDataError::MissingFxSpot { from, to })
    }
}
