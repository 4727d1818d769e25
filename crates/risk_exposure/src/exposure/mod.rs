//! Exposure profiles for trades and netting sets.
//!
//! [`ExposureCalculator`] reduces the trade NPV cube to per-trade profiles and
//! per-netting-set value matrices. [`NettedExposureCalculator`] collateralises
//! the netting set values, produces netting set profiles and optionally
//! allocates netted exposure back to trades.
//!
//! Exposure cubes have [`EXPOSURE_CUBE_DEPTH`] slots addressed by
//! [`ExposureIndex`]. With `multi_path` every sample is stored; otherwise
//! sample 0 holds the mean over samples.

mod calculator;
mod netted;
mod profile;

pub use calculator::{ExposureCalculator, NettingSetValues, TradeExposureResults};
pub use netted::{NettedExposureCalculator, NettedExposureResults};
pub use profile::{
    effective_horizon, pfe_from_distribution, pfe_index, time_weighted_average, ExposureProfile,
};

use chrono::NaiveDate;
use risk_core::{AggregationConfig, CalculationType, Currency};
use risk_cube::{
    CubeInterpretation, DateGrid, MporGridCubeInterpretation, RegularCubeInterpretation,
    ScenarioCube,
};

use crate::error::ExposureError;

/// Depth slots of an exposure cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExposureIndex {
    /// Positive exposure.
    Epe = 0,
    /// Negative exposure, stored positive.
    Ene = 1,
    /// Netted positive exposure allocated to a trade.
    AllocatedEpe = 2,
    /// Netted negative exposure allocated to a trade.
    AllocatedEne = 3,
}

impl ExposureIndex {
    /// Depth slot in the exposure cube.
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }
}

/// Number of depth slots in an exposure cube.
pub const EXPOSURE_CUBE_DEPTH: usize = 4;

/// Options shared by the trade and netted calculators.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSettings {
    /// Reporting currency of the NPV cube.
    pub base_currency: Currency,
    /// Quantile for PFE, in [0, 1].
    pub pfe_quantile: f64,
    /// Collateral settlement methodology.
    pub calculation_type: CalculationType,
    /// Keep per-sample exposures instead of means.
    pub multi_path: bool,
    /// Treat trades as terminated after their next break date.
    pub exercise_next_break: bool,
    /// Assume collateral fully covers the value today.
    pub full_initial_collateralisation: bool,
    /// Allocate netted exposure to trades.
    pub marginal_allocation: bool,
    /// Netting set values at or below this size are allocated pro rata.
    pub marginal_allocation_limit: f64,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            base_currency: Currency::EUR,
            pfe_quantile: 0.95,
            calculation_type: CalculationType::default(),
            multi_path: false,
            exercise_next_break: false,
            full_initial_collateralisation: false,
            marginal_allocation: false,
            marginal_allocation_limit: 1.0,
        }
    }
}

impl From<&AggregationConfig> for ExposureSettings {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            base_currency: config.base_currency,
            pfe_quantile: config.pfe_quantile,
            calculation_type: config.calculation_type,
            multi_path: config.multi_path,
            exercise_next_break: config.exercise_next_break,
            full_initial_collateralisation: config.full_initial_collateralisation,
            marginal_allocation: config.marginal_allocation,
            marginal_allocation_limit: config.marginal_allocation_limit,
        }
    }
}

impl ExposureSettings {
    pub(crate) fn validate(&self) -> Result<(), ExposureError> {
        if !(0.0..=1.0).contains(&self.pfe_quantile) {
            return Err(ExposureError::InvalidQuantile(self.pfe_quantile));
        }
        let limit = self.marginal_allocation_limit;
        if limit.is_nan() || limit < 0.0 {
            return Err(ExposureError::InvalidAllocationLimit(limit));
        }
        Ok(())
    }
}

/// Profile of one depth slot: the T0 value followed by the mean over samples
/// at each date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_cube::{DoublePrecisionCube, ScenarioCube};
/// use risk_exposure::exposure::{mean_exposure, ExposureIndex, EXPOSURE_CUBE_DEPTH};
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()];
/// let cube = DoublePrecisionCube::new(asof, ["T1"], dates, 2, EXPOSURE_CUBE_DEPTH).unwrap();
/// cube.set_t0(1.0, 0, 0).unwrap();
/// cube.set(2.0, 0, 0, 0, 0).unwrap();
/// cube.set(4.0, 0, 0, 1, 0).unwrap();
///
/// let epe = mean_exposure(&cube, "T1", ExposureIndex::Epe).unwrap();
/// assert_eq!(epe, vec![1.0, 3.0]);
/// ```
pub fn mean_exposure(
    cube: &dyn ScenarioCube,
    id: &str,
    index: ExposureIndex,
) -> Result<Vec<f64>, ExposureError> {
    let row = cube
        .id_index(id)
        .ok_or_else(|| ExposureError::UnknownId(id.to_string()))?;
    let slot = index.slot();
    let samples = cube.samples();
    let mut profile = Vec::with_capacity(cube.num_dates() + 1);
    profile.push(cube.get_t0(row, slot)?);
    for date in 0..cube.num_dates() {
        let mut sum = 0.0;
        for sample in 0..samples {
            sum += cube.get(row, date, sample, slot)?;
        }
        profile.push(sum / samples as f64);
    }
    Ok(profile)
}

/// Interpretation matching the configured grid layout.
///
/// With `mpor_grid` the close-out dates are the cube dates shifted by
/// `mpor_days`.
pub fn cube_interpretation(
    config: &AggregationConfig,
    cube_dates: &[NaiveDate],
) -> Result<Box<dyn CubeInterpretation>, ExposureError> {
    if config.mpor_grid {
        let grid = DateGrid::with_mpor(cube_dates.to_vec(), config.mpor_days)?;
        Ok(Box::new(MporGridCubeInterpretation::with_indices(
            config.flip_view_xva,
            grid,
            config.default_index,
            config.close_out_index,
            config.flows_index,
        )))
    } else {
        Ok(Box::new(RegularCubeInterpretation::with_indices(
            config.flip_view_xva,
            config.default_index,
            config.flows_index,
        )))
    }
}
