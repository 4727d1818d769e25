//! Discount curves keyed by calendar date.

use chrono::NaiveDate;

use super::error::MarketDataError;
use crate::types::DayCountConvention;

/// A discount curve anchored at a reference date.
pub trait DiscountCurve: Send + Sync {
    /// Reference date; `discount(asof())` is 1.
    fn asof(&self) -> NaiveDate;

    /// Discount factor for a calendar date on or after the reference date.
    fn discount(&self, date: NaiveDate) -> Result<f64, MarketDataError>;
}

/// Flat continuously compounded curve.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use risk_core::market_data::{DiscountCurve, FlatDiscountCurve};
/// use risk_core::types::DayCountConvention;
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let curve = FlatDiscountCurve::new(asof, 0.05, DayCountConvention::Actual365Fixed);
/// let one_year = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
/// assert!((curve.discount(one_year).unwrap() - (-0.05_f64).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatDiscountCurve {
    asof: NaiveDate,
    rate: f64,
    day_count: DayCountConvention,
}

impl FlatDiscountCurve {
    /// Construct a flat curve.
    pub fn new(asof: NaiveDate, rate: f64, day_count: DayCountConvention) -> Self {
        Self {
            asof,
            rate,
            day_count,
        }
    }

    /// Zero-rate curve: every discount factor is 1.
    pub fn unit(asof: NaiveDate) -> Self {
        Self::new(asof, 0.0, DayCountConvention::Actual365Fixed)
    }

    /// The constant rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl DiscountCurve for FlatDiscountCurve {
    fn asof(&self) -> NaiveDate {
        self.asof
    }

    fn discount(&self, date: NaiveDate) -> Result<f64, MarketDataError> {
        if date < self.asof {
            return Err(MarketDataError::DateBeforeReference {
                date,
                asof: self.asof,
            });
        }
        let t = self.day_count.year_fraction(self.asof, date);
        Ok((-self.rate * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_discount_at_reference_is_one() {
        let curve = FlatDiscountCurve::new(d(2024, 1, 1), 0.03, DayCountConvention::Actual360);
        assert_relative_eq!(curve.discount(d(2024, 1, 1)).unwrap(), 1.0);
    }

    #[test]
    fn test_discount_is_decreasing_for_positive_rate() {
        let curve =
            FlatDiscountCurve::new(d(2024, 1, 1), 0.03, DayCountConvention::ActualActualIsda);
        let a = curve.discount(d(2025, 1, 1)).unwrap();
        let b = curve.discount(d(2026, 1, 1)).unwrap();
        assert!(b < a);
        assert_relative_eq!(a, (-0.03_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_discount_before_reference_fails() {
        let curve = FlatDiscountCurve::unit(d(2024, 1, 1));
        assert!(matches!(
            curve.discount(d(2023, 12, 31)),
            Err(MarketDataError::DateBeforeReference { .. })
        ));
    }
}
