//! Variation margin model producing collateral balance paths.

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use risk_core::{CalculationType, DateError};
use risk_cube::CubeError;
use tracing::debug;

use super::account::CollateralAccount;
use crate::error::ExposureError;
use crate::portfolio::CsaDetails;

/// Collateral required under the CSA for an uncollateralised value.
///
/// The independent amount held shifts the value; the receive threshold
/// applies when the shifted value is non-negative, the pay threshold
/// otherwise.
///
/// # Examples
///
/// ```
/// use risk_core::Currency;
/// use risk_exposure::collateral::credit_support_amount;
/// use risk_exposure::portfolio::CsaDetails;
///
/// let csa = CsaDetails::new(Currency::EUR, 10)
///     .unwrap()
///     .with_thresholds(50.0, 100.0)
///     .unwrap();
/// assert_eq!(credit_support_amount(&csa, 150.0), 50.0);
/// assert_eq!(credit_support_amount(&csa, 80.0), 0.0);
/// assert_eq!(credit_support_amount(&csa, -80.0), -30.0);
/// ```
pub fn credit_support_amount(csa: &CsaDetails, value: f64) -> f64 {
    let shifted = value + csa.independent_amount_held();
    if shifted >= 0.0 {
        (shifted - csa.threshold_rcv()).max(0.0)
    } else {
        (shifted + csa.threshold_pay()).min(0.0)
    }
}

/// Margin to call (positive) or return (negative) for `value`.
///
/// The shortfall against the balance and open calls is zeroed when its size
/// is below the applicable minimum transfer amount.
pub fn margin_requirement(csa: &CsaDetails, account: &CollateralAccount, value: f64) -> f64 {
    let shortfall = credit_support_amount(csa, value) - account.balance() - account.outstanding();
    let mta = if shortfall >= 0.0 {
        csa.mta_rcv()
    } else {
        csa.mta_pay()
    };
    if shortfall.abs() >= mta {
        shortfall
    } else {
        0.0
    }
}

/// Netting set data a collateral model consumes.
///
/// Values are netting set values in base currency indexed `[date][sample]`;
/// `fx_paths` holds the CSA-to-base FX rate on the same grid.
#[derive(Debug, Clone, Copy)]
pub struct CollateralInput<'a> {
    /// CSA terms, already inverted under flip view.
    pub csa: &'a CsaDetails,
    /// Valuation date.
    pub asof: NaiveDate,
    /// Netting set value today in base currency.
    pub t0_value: f64,
    /// Simulated netting set values.
    pub values: &'a [Vec<f64>],
    /// Exposure grid dates.
    pub dates: &'a [NaiveDate],
    /// Latest maturity in the netting set.
    pub maturity: NaiveDate,
    /// CSA-to-base FX rate today.
    pub fx_today: f64,
    /// Simulated CSA-to-base FX rates.
    pub fx_paths: &'a [Vec<f64>],
}

impl CollateralInput<'_> {
    fn samples(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    fn check(&self) -> Result<(), ExposureError> {
        if self.dates.is_empty() {
            return Err(
                CubeError::InvalidCube("collateral requires a non-empty date grid".into()).into(),
            );
        }
        let samples = self.samples();
        let shaped = |m: &[Vec<f64>]| {
            m.len() == self.dates.len() && m.iter().all(|r| r.len() == samples)
        };
        if !shaped(self.values) || !shaped(self.fx_paths) {
            return Err(CubeError::InvalidCube(
                "netting set values and FX paths must match the date grid".into(),
            )
            .into());
        }
        Ok(())
    }
}

/// Builds collateral balance paths for a netting set.
pub trait CollateralModel: Send + Sync {
    /// Settlement methodology.
    fn calculation_type(&self) -> CalculationType;

    /// One collateral account per sample, balances in CSA currency.
    fn balance_paths(
        &self,
        input: &CollateralInput<'_>,
    ) -> Result<Vec<CollateralAccount>, ExposureError>;
}

/// Daily-stepped variation margin with MTA, thresholds and MPOR lag.
///
/// Margin is called on our call dates and returned on the counterparty's
/// post dates, stepping from the valuation date until the earlier of
/// maturity and the last grid date plus the MPOR. Calls settle after the
/// MPOR unless the calculation type removes the lag for that direction.
/// Accounts close the day after the simulation end. No interest accrues
/// on collateral.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariationMarginModel {
    calculation_type: CalculationType,
}

impl VariationMarginModel {
    /// Model with the given settlement methodology.
    pub fn new(calculation_type: CalculationType) -> Self {
        Self { calculation_type }
    }

    fn path(
        &self,
        input: &CollateralInput<'_>,
        initial_balance: f64,
        sample: usize,
        sim_end: NaiveDate,
    ) -> Result<CollateralAccount, ExposureError> {
        let csa = input.csa;
        let lag = match self.calculation_type {
            CalculationType::NoLag => 0,
            _ => csa.mpor_days(),
        };
        let mut account = CollateralAccount::new(initial_balance, input.asof);
        let mut date = input.asof;
        let mut next_call = input.asof;
        let mut next_post = input.asof;
        while date <= sim_end {
            let (asof, dates) = (input.asof, input.dates);
            let npv = path_value(date, asof, input.t0_value, dates, input.values, sample);
            let fx = path_value(date, asof, input.fx_today, dates, input.fx_paths, sample);
            let value = npv / fx;

            account.settle(date);
            let margin = margin_requirement(csa, &account, value);
            if margin > 0.0 && date == next_call {
                let pay = match self.calculation_type {
                    CalculationType::AsymmetricDVA => date,
                    _ => add_days(date, lag)?,
                };
                account.post_call(margin, pay, date);
            } else if margin < 0.0 && date == next_post {
                let pay = match self.calculation_type {
                    CalculationType::AsymmetricCVA => date,
                    _ => add_days(date, lag)?,
                };
                account.post_call(margin, pay, date);
            }

            if next_call == date {
                next_call = add_days(date, csa.margin_call_frequency_days())?;
            }
            if next_post == date {
                next_post = add_days(date, csa.margin_post_frequency_days())?;
            }
            date = next_call.min(next_post);
        }
        account.close(add_days(sim_end, 1)?);
        Ok(account)
    }
}

impl CollateralModel for VariationMarginModel {
    fn calculation_type(&self) -> CalculationType {
        self.calculation_type
    }

    fn balance_paths(
        &self,
        input: &CollateralInput<'_>,
    ) -> Result<Vec<CollateralAccount>, ExposureError> {
        input.check()?;
        let csa = input.csa;
        let opening = CollateralAccount::new(0.0, input.asof);
        let initial_balance = margin_requirement(csa, &opening, input.t0_value / input.fx_today);

        let last = input.dates[input.dates.len() - 1];
        let sim_end = add_days(input.maturity.min(last), csa.mpor_days())?;
        debug!(
            initial_balance,
            %sim_end,
            calculation_type = %self.calculation_type,
            "building collateral balance paths"
        );

        (0..input.samples())
            .into_par_iter()
            .map(|sample| self.path(input, initial_balance, sample, sim_end))
            .collect()
    }
}

/// Path value on `date`.
///
/// Today's value at the valuation date and the last grid value from the
/// last grid date on. In between, linear in calendar days across the
/// bracketing grid dates, with today's value as the left point before the
/// first grid date.
fn path_value(
    date: NaiveDate,
    asof: NaiveDate,
    today: f64,
    dates: &[NaiveDate],
    values: &[Vec<f64>],
    sample: usize,
) -> f64 {
    let last = dates.len() - 1;
    if date >= dates[last] {
        return values[last][sample];
    }
    if date == asof {
        return today;
    }
    let right = dates.partition_point(|d| *d < date);
    if dates[right] == date {
        return values[right][sample];
    }
    let (t1, v1) = match right {
        0 => (asof, today),
        _ => (dates[right - 1], values[right - 1][sample]),
    };
    let (t2, v2) = (dates[right], values[right][sample]);
    let weight = (date - t1).num_days() as f64 / (t2 - t1).num_days() as f64;
    v1 + (v2 - v1) * weight
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, DateError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| DateError::Overflow(format!("{date} + {days}D")))
}
