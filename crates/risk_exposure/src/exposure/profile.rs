//! Profile statistics: PFE quantiles, discounted EE and time-weighted
//! effective EPE over the one-year horizon.

use chrono::{Days, NaiveDate};
use risk_core::types::{add_years, adjust_following_weekends_only};
use risk_core::{DateError, DayCountConvention, DiscountCurve};

use crate::error::ExposureError;

/// Exposure profile of a trade or netting set.
///
/// Vectors have one entry for today followed by one per grid date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureProfile {
    /// Expected positive exposure.
    pub epe: Vec<f64>,
    /// Expected negative exposure.
    pub ene: Vec<f64>,
    /// Potential future exposure at the configured quantile.
    pub pfe: Vec<f64>,
    /// EPE divided by the base discount factor (Basel EE).
    pub ee_b: Vec<f64>,
    /// Running maximum of `ee_b` (Basel effective EE).
    pub eee_b: Vec<f64>,
    /// Time-weighted average of `ee_b` over the horizon (Basel EPE).
    pub epe_b: f64,
    /// Time-weighted average of `eee_b` over the horizon (Basel EEPE).
    pub eepe_b: f64,
}

impl ExposureProfile {
    /// Completes a profile from EPE, ENE and PFE.
    pub(crate) fn finish(
        epe: Vec<f64>,
        ene: Vec<f64>,
        pfe: Vec<f64>,
        asof: NaiveDate,
        dates: &[NaiveDate],
        maturity: NaiveDate,
        curve: &dyn DiscountCurve,
    ) -> Result<Self, ExposureError> {
        let mut ee_b = Vec::with_capacity(epe.len());
        let mut eee_b = Vec::with_capacity(epe.len());
        ee_b.push(epe[0]);
        eee_b.push(epe[0]);
        for (j, date) in dates.iter().enumerate() {
            let ee = epe[j + 1] / curve.discount(*date)?;
            eee_b.push(eee_b[j].max(ee));
            ee_b.push(ee);
        }

        let times = year_fractions(asof, dates);
        let horizon = effective_horizon(asof, maturity)?;
        let horizon_time = DayCountConvention::ActualActualIsda.year_fraction(asof, horizon);
        let (epe_b, eepe_b) = time_weighted_average(&ee_b, &eee_b, &times, horizon_time);

        Ok(Self {
            epe,
            ene,
            pfe,
            ee_b,
            eee_b,
            epe_b,
            eepe_b,
        })
    }
}

/// Position of the quantile in a sorted sample of size `samples`.
///
/// # Examples
///
/// ```
/// use risk_exposure::exposure::pfe_index;
///
/// assert_eq!(pfe_index(100, 0.95), 94);
/// assert_eq!(pfe_index(1, 0.95), 0);
/// ```
pub fn pfe_index(samples: usize, quantile: f64) -> usize {
    if samples == 0 {
        return 0;
    }
    let idx = (quantile * (samples - 1) as f64 + 0.5).floor() as usize;
    idx.min(samples - 1)
}

/// Sorts `distribution` and returns its quantile floored at zero.
pub fn pfe_from_distribution(distribution: &mut [f64], quantile: f64) -> f64 {
    if distribution.is_empty() {
        return 0.0;
    }
    distribution.sort_by(f64::total_cmp);
    distribution[pfe_index(distribution.len(), quantile)].max(0.0)
}

/// Horizon for effective EPE: one year and four days after today, rolled
/// to a weekday, capped at maturity.
pub fn effective_horizon(asof: NaiveDate, maturity: NaiveDate) -> Result<NaiveDate, DateError> {
    let one_year = add_years(asof, 1)?
        .checked_add_days(Days::new(4))
        .ok_or_else(|| DateError::Overflow(format!("{asof} + 1Y4D")))?;
    Ok(adjust_following_weekends_only(one_year).min(maturity))
}

pub(crate) fn year_fractions(asof: NaiveDate, dates: &[NaiveDate]) -> Vec<f64> {
    dates
        .iter()
        .map(|d| DayCountConvention::ActualActualIsda.year_fraction(asof, *d))
        .collect()
}

/// Time-weighted averages of `ee_b` and `eee_b` over grid times up to
/// `horizon_time`.
///
/// Weights are the grid time increments (the first measured from today)
/// normalised to one. Weight `k` applies to profile entry `k`, which is
/// today's value for `k = 0`.
pub fn time_weighted_average(
    ee_b: &[f64],
    eee_b: &[f64],
    times: &[f64],
    horizon_time: f64,
) -> (f64, f64) {
    let t = times.iter().take_while(|time| **time <= horizon_time).count();
    if t == 0 {
        return (0.0, 0.0);
    }
    let mut weights = Vec::with_capacity(t);
    weights.push(times[0]);
    for k in 1..t {
        weights.push(times[k] - times[k - 1]);
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return (0.0, 0.0);
    }
    let mut epe_b = 0.0;
    let mut eepe_b = 0.0;
    for (k, w) in weights.iter().enumerate() {
        epe_b += ee_b[k] * w / total;
        eepe_b += eee_b[k] * w / total;
    }
    (epe_b, eepe_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use risk_core::FlatDiscountCurve;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_pfe_index_rounds_to_nearest() {
        assert_eq!(pfe_index(10, 0.95), 9);
        assert_eq!(pfe_index(21, 0.5), 10);
        assert_eq!(pfe_index(11, 0.5), 5);
        assert_eq!(pfe_index(0, 0.5), 0);
    }

    #[test]
    fn test_pfe_is_floored_at_zero() {
        let mut dist = vec![-3.0, -1.0, -2.0];
        assert_eq!(pfe_from_distribution(&mut dist, 0.95), 0.0);
        let mut dist = vec![5.0, -1.0, 2.0, 8.0, 0.0];
        assert_eq!(pfe_from_distribution(&mut dist, 0.75), 5.0);
    }

    #[test]
    fn test_effective_horizon() {
        // 2024-01-01 + 1Y + 4D = 2025-01-05, a Sunday
        assert_eq!(effective_horizon(d(2024, 1, 1), d(2030, 1, 1)).unwrap(), d(2025, 1, 6));
        assert_eq!(effective_horizon(d(2024, 1, 1), d(2024, 6, 1)).unwrap(), d(2024, 6, 1));
    }

    #[test]
    fn test_time_weighted_average_uses_leading_entries() {
        let ee_b = [1.0, 2.0, 3.0, 4.0];
        let eee_b = [1.0, 2.0, 3.0, 4.0];
        let times = [0.25, 0.5, 2.0];
        let (epe_b, eepe_b) = time_weighted_average(&ee_b, &eee_b, &times, 1.0);
        assert_relative_eq!(epe_b, 1.5, epsilon = 1e-12);
        assert_relative_eq!(eepe_b, 1.5, epsilon = 1e-12);
        assert_eq!(time_weighted_average(&ee_b, &eee_b, &times, 0.1), (0.0, 0.0));
    }

    #[test]
    fn test_finish_discounts_and_tracks_maximum() {
        let asof = d(2024, 1, 1);
        let dates = vec![d(2024, 7, 1), d(2025, 1, 1), d(2025, 7, 1)];
        let curve = FlatDiscountCurve::unit(asof);
        let profile = ExposureProfile::finish(
            vec![1.0, 3.0, 2.0, 4.0],
            vec![0.0; 4],
            vec![0.0; 4],
            asof,
            &dates,
            d(2030, 1, 1),
            &curve,
        )
        .unwrap();
        assert_eq!(profile.ee_b, vec![1.0, 3.0, 2.0, 4.0]);
        assert_eq!(profile.eee_b, vec![1.0, 3.0, 3.0, 4.0]);
        // two grid dates inside the horizon, equal-ish weights on entries 0 and 1
        let w0 = 182.0 / 366.0;
        let w1 = 1.0 - w0;
        assert_relative_eq!(profile.epe_b, w0 * 1.0 + w1 * 3.0, epsilon = 1e-12);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_pfe_index_in_range(n in 1usize..500, q in 0.0f64..=1.0) {
            prop_assert!(pfe_index(n, q) < n);
        }

        #[test]
        fn prop_eepe_dominates_epe(ee in proptest::collection::vec(0.0f64..100.0, 2..20)) {
            let mut eee: Vec<f64> = Vec::with_capacity(ee.len());
            for (k, v) in ee.iter().enumerate() {
                eee.push(if k == 0 { *v } else { eee[k - 1].max(*v) });
            }
            let times: Vec<f64> = (1..ee.len()).map(|k| k as f64 * 0.1).collect();
            let (epe_b, eepe_b) = time_weighted_average(&ee, &eee, &times, 1.0);
            prop_assert!(eepe_b + 1e-12 >= epe_b);
        }
    }
}
