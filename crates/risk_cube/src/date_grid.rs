//! Valuation / close-out date pairs for MPOR-grid simulations.

use chrono::{Days, NaiveDate};

use crate::error::CubeError;

/// Parallel arrays of valuation dates and their close-out dates.
///
/// A cube simulated on an MPOR grid stores, at each valuation date index,
/// both the default-date value and the value at the matching close-out date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_cube::DateGrid;
///
/// let v = vec![
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
/// ];
/// let grid = DateGrid::with_mpor(v, 14).unwrap();
/// assert_eq!(grid.close_out_dates()[0], NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGrid {
    valuation_dates: Vec<NaiveDate>,
    close_out_dates: Vec<NaiveDate>,
}

impl DateGrid {
    /// Grid from explicit date pairs.
    ///
    /// Valuation dates must be strictly ascending and both arrays equally long.
    pub fn new(
        valuation_dates: Vec<NaiveDate>,
        close_out_dates: Vec<NaiveDate>,
    ) -> Result<Self, CubeError> {
        if valuation_dates.len() != close_out_dates.len() {
            return Err(CubeError::InvalidDateGrid(format!(
                "{} valuation dates but {} close-out dates",
                valuation_dates.len(),
                close_out_dates.len()
            )));
        }
        if valuation_dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CubeError::InvalidDateGrid(
                "valuation dates must be strictly ascending".into(),
            ));
        }
        Ok(Self {
            valuation_dates,
            close_out_dates,
        })
    }

    /// Grid whose close-out dates lag the valuation dates by `mpor_days`.
    pub fn with_mpor(valuation_dates: Vec<NaiveDate>, mpor_days: u32) -> Result<Self, CubeError> {
        let close_out_dates = valuation_dates
            .iter()
            .map(|d| {
                d.checked_add_days(Days::new(u64::from(mpor_days))).ok_or_else(|| {
                    CubeError::InvalidDateGrid(format!("{d} + {mpor_days}D overflows"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(valuation_dates, close_out_dates)
    }

    /// Valuation (default) dates.
    pub fn valuation_dates(&self) -> &[NaiveDate] {
        &self.valuation_dates
    }

    /// Close-out dates.
    pub fn close_out_dates(&self) -> &[NaiveDate] {
        &self.close_out_dates
    }

    /// Number of date pairs.
    pub fn len(&self) -> usize {
        self.valuation_dates.len()
    }

    /// Whether the grid has no dates.
    pub fn is_empty(&self) -> bool {
        self.valuation_dates.is_empty()
    }
}
