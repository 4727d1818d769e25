//! Netting set exposure after collateral, with marginal allocation to trades.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use risk_core::{CalculationType, CounterpartyId, DiscountCurve, Market, NettingSetId};
use risk_cube::{
    AggregationScenarioData, AggregationScenarioDataType, CubeError, CubeInterpretation,
    ScenarioCube, SinglePrecisionCube,
};
use tracing::{debug, info};

use super::calculator::{new_exposure_cube, NettingSetValues, TradeExposureResults};
use super::profile::{pfe_from_distribution, ExposureProfile};
use super::{mean_exposure, ExposureIndex, ExposureSettings};
use crate::collateral::{CollateralAccount, CollateralInput, CollateralModel, VariationMarginModel};
use crate::error::ExposureError;
use crate::portfolio::{CsaDetails, Portfolio};

#[derive(Debug, Clone, PartialEq)]
struct NettingSetSummary {
    counterparty: CounterpartyId,
    value_today: f64,
    maturity: NaiveDate,
    size: usize,
}

/// Output of [`NettedExposureCalculator::build`].
pub struct NettedExposureResults {
    netted_cube: SinglePrecisionCube,
    exposure_cube: Box<dyn ScenarioCube>,
    profiles: BTreeMap<NettingSetId, ExposureProfile>,
    expected_collateral: BTreeMap<NettingSetId, Vec<f64>>,
    summaries: BTreeMap<NettingSetId, NettingSetSummary>,
}

impl std::fmt::Debug for NettedExposureResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NettedExposureResults")
            .field("netted_cube", &self.netted_cube)
            .field("netting_sets", &self.summaries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NettedExposureResults {
    /// Collateralised netting set values per (date, sample).
    pub fn netted_cube(&self) -> &dyn ScenarioCube {
        &self.netted_cube
    }

    /// Netting set exposure cube.
    pub fn exposure_cube(&self) -> &dyn ScenarioCube {
        self.exposure_cube.as_ref()
    }

    /// Profile of a netting set.
    pub fn profile(&self, id: &NettingSetId) -> Option<&ExposureProfile> {
        self.profiles.get(id)
    }

    /// Netting sets in id order.
    pub fn netting_set_ids(&self) -> impl Iterator<Item = &NettingSetId> {
        self.summaries.keys()
    }

    /// Mean collateral balance in base currency, today first.
    pub fn expected_collateral(&self, id: &NettingSetId) -> Option<&[f64]> {
        self.expected_collateral.get(id).map(Vec::as_slice)
    }

    /// The single counterparty facing a netting set.
    pub fn counterparty(&self, id: &NettingSetId) -> Option<&CounterpartyId> {
        self.summaries.get(id).map(|s| &s.counterparty)
    }

    /// Netting set value today.
    pub fn value_today(&self, id: &NettingSetId) -> Option<f64> {
        self.summaries.get(id).map(|s| s.value_today)
    }

    /// Latest trade maturity in a netting set.
    pub fn maturity(&self, id: &NettingSetId) -> Option<NaiveDate> {
        self.summaries.get(id).map(|s| s.maturity)
    }

    /// EPE profile of a netting set.
    pub fn epe(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        mean_exposure(self.exposure_cube(), id, ExposureIndex::Epe)
    }

    /// ENE profile of a netting set.
    pub fn ene(&self, id: &str) -> Result<Vec<f64>, ExposureError> {
        mean_exposure(self.exposure_cube(), id, ExposureIndex::Ene)
    }
}

/// Computes collateralised netting set exposure.
///
/// For netting sets with an active CSA the collateral model produces balance
/// paths from the netting set default values; exposure is the netting set
/// value less the balance converted to base currency. Under `NoLag` with an
/// active CSA the close-out values are used instead of the default values.
///
/// With marginal allocation on, netted exposure is allocated back to the
/// trades of each netting set and written into the allocated slots of the
/// trade exposure cube.
pub struct NettedExposureCalculator<'a> {
    portfolio: &'a Portfolio,
    cube: &'a dyn ScenarioCube,
    interpretation: &'a dyn CubeInterpretation,
    market: &'a dyn Market,
    trade_results: &'a TradeExposureResults,
    scenario_data: Option<&'a dyn AggregationScenarioData>,
    collateral_model: Box<dyn CollateralModel + 'a>,
    settings: ExposureSettings,
}

impl<'a> NettedExposureCalculator<'a> {
    /// Calculator using a [`VariationMarginModel`] for the configured
    /// calculation type.
    pub fn new(
        portfolio: &'a Portfolio,
        cube: &'a dyn ScenarioCube,
        interpretation: &'a dyn CubeInterpretation,
        market: &'a dyn Market,
        trade_results: &'a TradeExposureResults,
        settings: ExposureSettings,
    ) -> Self {
        Self {
            portfolio,
            cube,
            interpretation,
            market,
            trade_results,
            scenario_data: None,
            collateral_model: Box::new(VariationMarginModel::new(settings.calculation_type)),
            settings,
        }
    }

    /// Scenario data providing FX rates for CSAs not in base currency.
    pub fn with_scenario_data(mut self, data: &'a dyn AggregationScenarioData) -> Self {
        self.scenario_data = Some(data);
        self
    }

    /// Replaces the collateral model.
    pub fn with_collateral_model(mut self, model: Box<dyn CollateralModel + 'a>) -> Self {
        self.collateral_model = model;
        self
    }

    /// Computes netting set profiles and, if enabled, trade allocations.
    pub fn build(&self) -> Result<NettedExposureResults, ExposureError> {
        self.settings.validate()?;
        let cube = self.cube;
        let curve = self.market.discount_curve(self.settings.base_currency)?;
        let summaries = self.summarise()?;

        if self.settings.marginal_allocation && self.settings.multi_path {
            let trade_samples = self.trade_results.exposure_cube().samples();
            if trade_samples != cube.samples() {
                return Err(CubeError::InvalidCube(format!(
                    "trade exposure cube has {trade_samples} samples, \
                     multi-path allocation needs {}",
                    cube.samples()
                ))
                .into());
            }
        }

        let ids: Vec<NettingSetId> = self.trade_results.netting_set_ids().cloned().collect();
        let netted_cube = SinglePrecisionCube::new(
            cube.asof(),
            ids.iter().map(|id| id.to_string()),
            cube.dates().to_vec(),
            cube.samples(),
            1,
        )?;
        let exposure_cube = new_exposure_cube(
            cube.asof(),
            ids.iter().map(|id| id.to_string()),
            cube.dates().to_vec(),
            cube.samples(),
            self.settings.multi_path,
        )?;

        info!(
            netting_sets = ids.len(),
            calculation_type = %self.collateral_model.calculation_type(),
            "computing netting set exposure profiles"
        );

        let outcomes = ids
            .par_iter()
            .enumerate()
            .map(|(row, id)| {
                let values = self
                    .trade_results
                    .netting_set_values(id)
                    .ok_or_else(|| ExposureError::UnknownId(id.to_string()))?;
                let summary = summaries
                    .get(id)
                    .ok_or_else(|| ExposureError::UnknownId(id.to_string()))?;
                self.netting_set_exposure(
                    row,
                    id,
                    values,
                    summary,
                    &netted_cube,
                    exposure_cube.as_ref(),
                    curve,
                )
            })
            .collect::<Result<Vec<_>, ExposureError>>()?;

        let mut profiles = BTreeMap::new();
        let mut expected_collateral = BTreeMap::new();
        for (id, (profile, eab)) in ids.into_iter().zip(outcomes) {
            profiles.insert(id.clone(), profile);
            expected_collateral.insert(id, eab);
        }

        Ok(NettedExposureResults {
            netted_cube,
            exposure_cube,
            profiles,
            expected_collateral,
            summaries,
        })
    }

    fn summarise(&self) -> Result<BTreeMap<NettingSetId, NettingSetSummary>, ExposureError> {
        let sign = self.interpretation.sign();
        let mut summaries: BTreeMap<NettingSetId, NettingSetSummary> = BTreeMap::new();
        for (i, trade) in self.portfolio.trades().iter().enumerate() {
            let npv = sign * self.cube.get_t0(self.trade_results.cube_row(i), 0)?;
            let summary = summaries
                .entry(trade.netting_set_id().clone())
                .or_insert_with(|| NettingSetSummary {
                    counterparty: trade.counterparty_id().clone(),
                    value_today: 0.0,
                    maturity: self.cube.asof(),
                    size: 0,
                });
            if summary.counterparty != *trade.counterparty_id() {
                return Err(ExposureError::CounterpartyNotUnique {
                    netting_set: trade.netting_set_id().to_string(),
                    first: summary.counterparty.to_string(),
                    second: trade.counterparty_id().to_string(),
                });
            }
            summary.value_today += npv;
            summary.maturity = summary.maturity.max(trade.maturity());
            summary.size += 1;
        }
        Ok(summaries)
    }

    #[allow(clippy::too_many_arguments)]
    fn netting_set_exposure(
        &self,
        row: usize,
        id: &NettingSetId,
        values: &NettingSetValues,
        summary: &NettingSetSummary,
        netted_cube: &dyn ScenarioCube,
        exposure_cube: &dyn ScenarioCube,
        curve: &dyn DiscountCurve,
    ) -> Result<(ExposureProfile, Vec<f64>), ExposureError> {
        let cube = self.cube;
        let interp = self.interpretation;
        let dates = cube.dates();
        let samples = cube.samples();
        let n = samples as f64;
        let multi_path = self.settings.multi_path;
        let trade_cube = self.trade_results.exposure_cube();
        let (epe_slot, ene_slot) = (ExposureIndex::Epe.slot(), ExposureIndex::Ene.slot());
        let (allocated_epe, allocated_ene) =
            (ExposureIndex::AllocatedEpe.slot(), ExposureIndex::AllocatedEne.slot());

        let definition = self
            .portfolio
            .netting_set(id)
            .ok_or_else(|| ExposureError::UnknownId(id.to_string()))?;
        let csa = definition.active_csa().map(|csa| {
            if interp.flip_view() {
                csa.inverted()
            } else {
                csa.clone()
            }
        });
        let data = match &csa {
            Some(_) if self.collateral_model.calculation_type() == CalculationType::NoLag => {
                &values.close_out_values
            }
            _ => &values.default_values,
        };
        let collateral = match &csa {
            Some(csa) => Some(self.collateral_paths(id, csa, summary, values)?),
            None => None,
        };
        debug!(
            netting_set = %id,
            collateralised = collateral.is_some(),
            "aggregating netting set exposure"
        );

        let npv = summary.value_today;
        let mut epe = vec![0.0; dates.len() + 1];
        let mut ene = vec![0.0; dates.len() + 1];
        let mut pfe = vec![0.0; dates.len() + 1];
        let mut eab = vec![0.0; dates.len() + 1];
        if !(self.settings.full_initial_collateralisation && csa.is_some()) {
            epe[0] = npv.max(0.0);
            ene[0] = (-npv).max(0.0);
            pfe[0] = npv.max(0.0);
        }
        // expected collateral today assumes full collateralisation
        eab[0] = -npv;
        netted_cube.set_t0(npv, row, 0)?;
        exposure_cube.set_t0(epe[0], row, epe_slot)?;
        exposure_cube.set_t0(ene[0], row, ene_slot)?;

        // (trade exposure row, NPV cube row) of each trade in the set
        let members: Vec<(usize, usize)> = self
            .portfolio
            .trades()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.netting_set_id() == id)
            .map(|(i, _)| (i, self.trade_results.cube_row(i)))
            .collect();
        let allocate = self.settings.marginal_allocation;
        let mut positive_allocation = vec![vec![0.0; dates.len()]; members.len()];
        let mut negative_allocation = vec![vec![0.0; dates.len()]; members.len()];

        let mut distribution = vec![0.0; samples];
        for (j, date) in dates.iter().enumerate() {
            for k in 0..samples {
                let balance = match &collateral {
                    Some((accounts, fx)) => accounts[k].balance_at(*date) * fx[j][k],
                    None => 0.0,
                };
                eab[j + 1] += balance / n;
                let exposure = data[j][k] - balance;
                epe[j + 1] += exposure.max(0.0) / n;
                ene[j + 1] += (-exposure).max(0.0) / n;
                distribution[k] = exposure;
                netted_cube.set(exposure, row, j, k, 0)?;
                if multi_path {
                    exposure_cube.set(exposure.max(0.0), row, j, k, epe_slot)?;
                    exposure_cube.set((-exposure).max(0.0), row, j, k, ene_slot)?;
                }

                if !allocate {
                    continue;
                }
                for (m, (trade_row, cube_row)) in members.iter().enumerate() {
                    let allocation = if balance == 0.0 {
                        interp.default_npv(cube, *cube_row, j, k)?
                    } else if data[j][k].abs() <= self.settings.marginal_allocation_limit {
                        exposure / members.len() as f64
                    } else {
                        exposure * interp.default_npv(cube, *cube_row, j, k)? / data[j][k]
                    };
                    if multi_path {
                        if exposure > 0.0 {
                            trade_cube.set(allocation, *trade_row, j, k, allocated_epe)?;
                        } else {
                            trade_cube.set(-allocation, *trade_row, j, k, allocated_ene)?;
                        }
                    } else if exposure > 0.0 {
                        positive_allocation[m][j] += allocation / n;
                    } else {
                        negative_allocation[m][j] -= allocation / n;
                    }
                }
            }
            if !multi_path {
                exposure_cube.set(epe[j + 1], row, j, 0, epe_slot)?;
                exposure_cube.set(ene[j + 1], row, j, 0, ene_slot)?;
            }
            pfe[j + 1] = pfe_from_distribution(&mut distribution, self.settings.pfe_quantile);
        }

        if allocate && !multi_path {
            for (m, (trade_row, _)) in members.iter().enumerate() {
                for j in 0..dates.len() {
                    let positive = positive_allocation[m][j];
                    let negative = negative_allocation[m][j];
                    trade_cube.set(positive, *trade_row, j, 0, allocated_epe)?;
                    trade_cube.set(negative, *trade_row, j, 0, allocated_ene)?;
                }
            }
        }

        let profile =
            ExposureProfile::finish(epe, ene, pfe, cube.asof(), dates, summary.maturity, curve)?;
        Ok((profile, eab))
    }

    /// Balance paths in CSA currency plus the CSA-to-base FX paths used to
    /// convert them.
    fn collateral_paths(
        &self,
        id: &NettingSetId,
        csa: &CsaDetails,
        summary: &NettingSetSummary,
        values: &NettingSetValues,
    ) -> Result<(Vec<CollateralAccount>, Vec<Vec<f64>>), ExposureError> {
        let cube = self.cube;
        let base = self.settings.base_currency;
        let ccy = csa.currency();
        let (fx_today, fx_paths) = if ccy == base {
            (1.0, vec![vec![1.0; cube.samples()]; cube.num_dates()])
        } else {
            let data = self
                .scenario_data
                .filter(|d| d.has(AggregationScenarioDataType::FxSpot, ccy.code()))
                .ok_or_else(|| ExposureError::MissingFxScenarios {
                    netting_set: id.to_string(),
                    currency: ccy.code().to_string(),
                })?;
            let paths = (0..cube.num_dates())
                .map(|j| {
                    (0..cube.samples())
                        .map(|k| {
                            self.interpretation.default_scenario_data(
                                data,
                                AggregationScenarioDataType::FxSpot,
                                j,
                                k,
                                ccy.code(),
                            )
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, CubeError>>()?;
            (self.market.fx_rate(ccy, base)?, paths)
        };
        debug!(netting_set = %id, csa_currency = %ccy, fx_today, "building collateral paths");

        let input = CollateralInput {
            csa,
            asof: cube.asof(),
            t0_value: summary.value_today,
            values: &values.default_values,
            dates: cube.dates(),
            maturity: summary.maturity,
            fx_today,
            fx_paths: &fx_paths,
        };
        let accounts = self.collateral_model.balance_paths(&input)?;
        Ok((accounts, fx_paths))
    }
}
