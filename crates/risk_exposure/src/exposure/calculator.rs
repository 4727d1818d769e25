//! Trade-level exposure and netting set value aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use risk_core::{DiscountCurve, Market, NettingSetId, TradeId};
use risk_cube::{
    CubeInterpretation, DoublePrecisionCube, ScenarioCube, SinglePrecisionCube,
};
use tracing::{debug, info};

use super::profile::{pfe_from_distribution, ExposureProfile};
use super::{mean_exposure, ExposureIndex, ExposureSettings, EXPOSURE_CUBE_DEPTH};
use crate::error::ExposureError;
use crate::portfolio::{Portfolio, Trade};

/// Netting set values summed over constituent trades, indexed `[date][sample]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NettingSetValues {
    /// Values at the default dates.
    pub default_values: Vec<Vec<f64>>,
    /// Values at the close-out dates.
    pub close_out_values: Vec<Vec<f64>>,
    /// Positive cash flows during the MPOR.
    pub positive_flows: Vec<Vec<f64>>,
    /// Negative cash flows during the MPOR.
    pub negative_flows: Vec<Vec<f64>>,
    /// Sum of the trade values today.
    pub value_today: f64,
    /// Latest trade maturity, the valuation date for a set of expired trades.
    pub maturity: NaiveDate,
}

impl NettingSetValues {
    fn zeros(asof: NaiveDate, dates: usize, samples: usize) -> Self {
        let zero = vec![vec![0.0; samples]; dates];
        Self {
            value_today: 0.0,
            maturity: asof,
            default_values: zero.clone(),
            close_out_values: zero.clone(),
            positive_flows: zero.clone(),
            negative_flows: zero,
        }
    }
}

/// Output of [`ExposureCalculator::build`].
///
/// The exposure cube has one row per portfolio trade, in portfolio order.
/// Its allocated slots are filled later by the netted calculator when
/// marginal allocation is on.
pub struct TradeExposureResults {
    exposure_cube: Box<dyn ScenarioCube>,
    cube_rows: Vec<usize>,
    profiles: BTreeMap<TradeId, ExposureProfile>,
    netting_set_values: BTreeMap<NettingSetId, NettingSetValues>,
}

impl std::fmt::Debug for TradeExposureResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeExposureResults")
            .field("trades", &self.profiles.len())
            .field("netting_sets", &self.netting_set_values.len())
            .field("exposure_samples", &self.exposure_cube.samples())
            .finish()
    }
}

impl TradeExposureResults {
    /// Trade exposure cube (depth [`EXPOSURE_CUBE_DEPTH`]).
    pub fn exposure_cube(&self) -> &dyn ScenarioCube {
        self.exposure_cube.as_ref()
    }

    /// Profile of one trade.
    pub fn profile(&self, id: &TradeId) -> Option<&ExposureProfile> {
        self.profiles.get(id)
    }

    /// All trade profiles in id order.
    pub fn profiles(&self) -> impl Iterator<Item = (&TradeId, &ExposureProfile)> {
        self.profiles.iter()
    }

    /// Aggregated values of a netting set.
    pub fn netting_set_values(&self, id: &NettingSetId) -> Option<&NettingSetValues> {
        self.netting_set_values.get(id)
    }

    /// Value today of a netting set, summed over its trades.
    pub fn value_today(&self, id: &NettingSetId) -> Option<f64> {
        self.netting_set_values.get(id).map(|v| v.value_today)
    }

    /// Latest maturity among the trades of a netting set.
    pub fn maturity(&self, id: &NettingSetId) -> Option<NaiveDate> {
        self.netting_set_values.get(id).map(|v| v.maturity)
    }

    /// Netting sets holding at least one trade, in id order.
    pub fn netting_set_ids(&self) -> impl Iterator<Item = &NettingSetId> {
        self.netting_set_values.keys()
    }

    /// Mean of one exposure slot, T0 first.
    pub fn mean_exposure(&self, id: &str, index: ExposureIndex) -> Result<Vec<f64>, ExposureError> {
        mean_exposure(self.exposure_cube(), id, index)
    }

    /// EPE profile of a trade.
    pub fn epe(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        self.mean_exposure(id, ExposureIndex::Epe)
    }

    /// ENE profile of a trade.
    pub fn ene(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        self.mean_exposure(id, ExposureIndex::Ene)
    }

    /// Allocated EPE profile of a trade.
    pub fn allocated_epe(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        self.mean_exposure(id, ExposureIndex::AllocatedEpe)
    }

    /// Allocated ENE profile of a trade.
    pub fn allocated_ene(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        self.mean_exposure(id, ExposureIndex::AllocatedEne)
    }

    /// NPV cube row of the `i`-th portfolio trade.
    pub(crate) fn cube_row(&self, i: usize) -> usize {
        self.cube_rows[i]
    }
}

/// Reduces a trade NPV cube to trade exposure profiles.
///
/// Netting sets are processed in parallel; the trades of one netting set
/// are processed in order so that each set's value matrices have a single
/// writer.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_core::{Currency, FlatDiscountCurve, SimpleMarket};
/// use risk_cube::{DoublePrecisionCube, RegularCubeInterpretation, ScenarioCube};
/// use risk_exposure::exposure::{ExposureCalculator, ExposureSettings};
/// use risk_exposure::portfolio::{NettingSetDefinition, PortfolioBuilder, Trade};
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![
///     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
/// ];
/// let cube = DoublePrecisionCube::new(asof, ["T1"], dates.clone(), 2, 1).unwrap();
/// for (j, k, v) in [(0, 0, 10.0), (0, 1, -6.0), (1, 0, 4.0), (1, 1, 2.0)] {
///     cube.set(v, 0, j, k, 0).unwrap();
/// }
///
/// let portfolio = PortfolioBuilder::new()
///     .add_netting_set(NettingSetDefinition::uncollateralised("NS1"))
///     .add_trade(Trade::new("T1", "CP1", "NS1", dates[1]))
///     .build()
///     .unwrap();
/// let market = SimpleMarket::new(asof)
///     .with_flat_curve(Currency::EUR, FlatDiscountCurve::unit(asof));
/// let interpretation = RegularCubeInterpretation::new(false);
///
/// let results = ExposureCalculator::new(
///     &portfolio,
///     &cube,
///     &interpretation,
///     &market,
///     ExposureSettings::default(),
/// )
/// .build()
/// .unwrap();
/// assert_eq!(results.epe("T1").unwrap(), vec![0.0, 5.0, 3.0]);
/// assert_eq!(results.ene("T1").unwrap(), vec![0.0, 3.0, 0.0]);
/// ```
pub struct ExposureCalculator<'a> {
    portfolio: &'a Portfolio,
    cube: &'a dyn ScenarioCube,
    interpretation: &'a dyn CubeInterpretation,
    market: &'a dyn Market,
    settings: ExposureSettings,
}

impl<'a> ExposureCalculator<'a> {
    /// Calculator over a populated NPV cube.
    pub fn new(
        portfolio: &'a Portfolio,
        cube: &'a dyn ScenarioCube,
        interpretation: &'a dyn CubeInterpretation,
        market: &'a dyn Market,
        settings: ExposureSettings,
    ) -> Self {
        Self {
            portfolio,
            cube,
            interpretation,
            market,
            settings,
        }
    }

    /// Computes trade profiles and netting set value matrices.
    pub fn build(&self) -> Result<TradeExposureResults, ExposureError> {
        self.settings.validate()?;
        let cube = self.cube;
        let trades = self.portfolio.trades();
        let curve = self.market.discount_curve(self.settings.base_currency)?;

        let cube_rows = trades
            .iter()
            .map(|t| {
                cube.id_index(t.id().as_str())
                    .ok_or_else(|| ExposureError::TradeNotInCube(t.id().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exposure_cube = new_exposure_cube(
            cube.asof(),
            trades.iter().map(|t| t.id().to_string()),
            cube.dates().to_vec(),
            cube.samples(),
            self.settings.multi_path,
        )?;

        info!(
            trades = trades.len(),
            dates = cube.num_dates(),
            samples = cube.samples(),
            "computing trade exposure profiles"
        );

        let netting_set_ids: Vec<&NettingSetId> =
            self.portfolio.netting_sets().map(|ns| ns.id()).collect();
        let per_set = netting_set_ids
            .par_iter()
            .map(|ns_id| {
                let mut values =
                    NettingSetValues::zeros(cube.asof(), cube.num_dates(), cube.samples());
                let mut profiles = Vec::new();
                for (i, trade) in trades.iter().enumerate() {
                    if trade.netting_set_id() != *ns_id {
                        continue;
                    }
                    let profile = self.trade_profile(
                        trade,
                        i,
                        cube_rows[i],
                        exposure_cube.as_ref(),
                        curve,
                        &mut values,
                    )?;
                    profiles.push((trade.id().clone(), profile));
                }
                debug!(
                    netting_set = %ns_id,
                    trades = profiles.len(),
                    "netting set values aggregated"
                );
                Ok::<_, ExposureError>(((*ns_id).clone(), values, profiles))
            })
            .collect::<Result<Vec<_>, ExposureError>>()?;

        let mut profiles = BTreeMap::new();
        let mut netting_set_values = BTreeMap::new();
        for (ns_id, values, trade_profiles) in per_set {
            if trade_profiles.is_empty() {
                continue;
            }
            netting_set_values.insert(ns_id, values);
            profiles.extend(trade_profiles);
        }

        Ok(TradeExposureResults {
            exposure_cube,
            cube_rows,
            profiles,
            netting_set_values,
        })
    }

    fn trade_profile(
        &self,
        trade: &Trade,
        exposure_row: usize,
        row: usize,
        exposure_cube: &dyn ScenarioCube,
        curve: &dyn DiscountCurve,
        values: &mut NettingSetValues,
    ) -> Result<ExposureProfile, ExposureError> {
        let cube = self.cube;
        let interp = self.interpretation;
        let dates = cube.dates();
        let samples = cube.samples();
        let n = samples as f64;
        let multi_path = self.settings.multi_path;
        let has_flows = interp.has_mpor_flows(cube);
        let next_break = trade.next_break_date();
        let last = dates.len().saturating_sub(1);
        let (epe_slot, ene_slot) = (ExposureIndex::Epe.slot(), ExposureIndex::Ene.slot());

        let npv = interp.sign() * cube.get_t0(row, 0)?;
        let mut epe = vec![0.0; dates.len() + 1];
        let mut ene = vec![0.0; dates.len() + 1];
        let mut pfe = vec![0.0; dates.len() + 1];
        epe[0] = npv.max(0.0);
        ene[0] = (-npv).max(0.0);
        pfe[0] = npv.max(0.0);
        exposure_cube.set_t0(epe[0], exposure_row, epe_slot)?;
        exposure_cube.set_t0(ene[0], exposure_row, ene_slot)?;
        values.value_today += npv;
        values.maturity = values.maturity.max(trade.maturity());

        let mut distribution = vec![0.0; samples];
        for (j, date) in dates.iter().enumerate() {
            let terminated = self.settings.exercise_next_break && *date > next_break;
            for k in 0..samples {
                let default_value = if terminated {
                    0.0
                } else {
                    interp.default_npv(cube, row, j, k)?
                };
                let close_out_value = if interp.is_regular_grid() && j == last {
                    default_value
                } else if terminated {
                    0.0
                } else {
                    interp.close_out_npv(cube, row, j, k)?
                };

                values.default_values[j][k] += default_value;
                values.close_out_values[j][k] += close_out_value;
                if has_flows {
                    let flow = interp.mpor_flows(cube, row, j, k);
                    values.positive_flows[j][k] += flow.max(0.0);
                    values.negative_flows[j][k] += flow.min(0.0);
                }

                epe[j + 1] += default_value.max(0.0) / n;
                ene[j + 1] += (-default_value).max(0.0) / n;
                distribution[k] = default_value;
                if multi_path {
                    exposure_cube.set(default_value.max(0.0), exposure_row, j, k, epe_slot)?;
                    exposure_cube.set((-default_value).max(0.0), exposure_row, j, k, ene_slot)?;
                }
            }
            if !multi_path {
                exposure_cube.set(epe[j + 1], exposure_row, j, 0, epe_slot)?;
                exposure_cube.set(ene[j + 1], exposure_row, j, 0, ene_slot)?;
            }
            pfe[j + 1] = pfe_from_distribution(&mut distribution, self.settings.pfe_quantile);
        }

        ExposureProfile::finish(epe, ene, pfe, cube.asof(), dates, trade.maturity(), curve)
    }
}

/// Exposure cube keeping every sample (single precision) or only means
/// (double precision, one sample).
pub(crate) fn new_exposure_cube<I, S>(
    asof: NaiveDate,
    ids: I,
    dates: Vec<NaiveDate>,
    samples: usize,
    multi_path: bool,
) -> Result<Box<dyn ScenarioCube>, ExposureError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if multi_path {
        Ok(Box::new(SinglePrecisionCube::new(
            asof,
            ids,
            dates,
            samples,
            EXPOSURE_CUBE_DEPTH,
        )?))
    } else {
        Ok(Box::new(DoublePrecisionCube::new(
            asof,
            ids,
            dates,
            1,
            EXPOSURE_CUBE_DEPTH,
        )?))
    }
}
