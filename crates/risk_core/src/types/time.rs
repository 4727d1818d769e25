//! Day count conventions and calendar helpers.
//!
//! Exposure profiles convert the date grid into year fractions with a day
//! count, and the one-year horizon used for effective EPE is rolled with a
//! weekends-only calendar.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use risk_core::types::DayCountConvention;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//!
//! let yf = DayCountConvention::Actual365Fixed.year_fraction(start, end);
//! assert!((yf - 182.0 / 365.0).abs() < 1e-12);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::error::DateError;

/// Industry-standard day count conventions.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// Actual/Actual (ISDA): days falling in each calendar year divided by
    /// that year's length.
    #[default]
    ActualActualIsda,

    /// Actual/365 Fixed: actual_days / 365.0
    Actual365Fixed,

    /// Actual/360: actual_days / 360.0
    Actual360,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::ActualActualIsda => "ACT/ACT.ISDA",
            DayCountConvention::Actual365Fixed => "ACT/365F",
            DayCountConvention::Actual360 => "ACT/360",
        }
    }

    /// Year fraction between two dates.
    ///
    /// Negative when `start > end`.
    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        if start > end {
            return -self.year_fraction(end, start);
        }
        let days = (end - start).num_days() as f64;
        match self {
            DayCountConvention::Actual365Fixed => days / 365.0,
            DayCountConvention::Actual360 => days / 360.0,
            DayCountConvention::ActualActualIsda => {
                if start.year() == end.year() {
                    return days / days_in_year(start.year());
                }
                let mut total = 0.0;
                let mut from = start;
                for year in start.year()..=end.year() {
                    let year_end = if year == end.year() {
                        end
                    } else {
                        // first day of next year always exists
                        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap_or(end)
                    };
                    total += (year_end - from).num_days() as f64 / days_in_year(year);
                    from = year_end;
                }
                total
            }
        }
    }
}

fn days_in_year(year: i32) -> f64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    }
}

impl FromStr for DayCountConvention {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['/', ' ', '.', '_'], "").as_str() {
            "ACTACTISDA" | "ACTUALACTUALISDA" | "ACTACT" => {
                Ok(DayCountConvention::ActualActualIsda)
            }
            "ACT365F" | "ACT365FIXED" | "ACTUAL365FIXED" | "A365F" | "ACT365" => {
                Ok(DayCountConvention::Actual365Fixed)
            }
            "ACT360" | "ACTUAL360" | "A360" => Ok(DayCountConvention::Actual360),
            _ => Err(DateError::UnknownDayCount(s.to_string())),
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Adds whole years, clamping Feb 29 to Feb 28 where needed.
pub fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate, DateError> {
    date.checked_add_months(Months::new(12 * years))
        .ok_or_else(|| DateError::Overflow(format!("{date} + {years}Y")))
}

/// Rolls a date forward to the next weekday (following, weekends-only calendar).
pub fn adjust_following_weekends_only(date: NaiveDate) -> NaiveDate {
    let shift = match date.weekday() {
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    };
    date.checked_add_days(Days::new(shift)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_act_act_isda_within_leap_year() {
        let yf = DayCountConvention::ActualActualIsda.year_fraction(d(2024, 1, 1), d(2024, 7, 1));
        assert_relative_eq!(yf, 182.0 / 366.0, epsilon = 1e-12);
    }

    #[test]
    fn test_act_act_isda_across_year_boundary() {
        let yf =
            DayCountConvention::ActualActualIsda.year_fraction(d(2023, 12, 1), d(2024, 2, 1));
        assert_relative_eq!(yf, 31.0 / 365.0 + 31.0 / 366.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_dates_are_negative() {
        let fwd = DayCountConvention::Actual360.year_fraction(d(2024, 1, 1), d(2024, 3, 1));
        let bwd = DayCountConvention::Actual360.year_fraction(d(2024, 3, 1), d(2024, 1, 1));
        assert_relative_eq!(fwd, -bwd, epsilon = 1e-15);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            "ACT/365F".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Actual365Fixed
        );
        assert_eq!(
            "act/act.isda".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::ActualActualIsda
        );
        assert!("30E/360".parse::<DayCountConvention>().is_err());
    }

    #[test]
    fn test_weekend_adjustment() {
        // 2024-06-15 is a Saturday
        assert_eq!(adjust_following_weekends_only(d(2024, 6, 15)), d(2024, 6, 17));
        assert_eq!(adjust_following_weekends_only(d(2024, 6, 16)), d(2024, 6, 17));
        assert_eq!(adjust_following_weekends_only(d(2024, 6, 17)), d(2024, 6, 17));
    }

    #[test]
    fn test_add_years_clamps_leap_day() {
        assert_eq!(add_years(d(2024, 2, 29), 1).unwrap(), d(2025, 2, 28));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_act_act_isda_is_additive(a in 0i64..3000, b in 0i64..3000) {
            let base = d(2020, 1, 1);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let mid = base + chrono::Duration::days(lo);
            let end = base + chrono::Duration::days(hi);
            let dc = DayCountConvention::ActualActualIsda;
            let whole = dc.year_fraction(base, end);
            let parts = dc.year_fraction(base, mid) + dc.year_fraction(mid, end);
            prop_assert!((whole - parts).abs() < 1e-12);
        }
    }
}
