//! Netting set definitions with collateral agreements.

use risk_core::{Currency, NettingSetId};
use serde::Deserialize;

use super::error::PortfolioError;

/// Credit Support Annex terms of a collateralised netting set.
///
/// Amounts are in the CSA currency. "Pay" terms apply to collateral we post,
/// "receive" terms to collateral we call from the counterparty. The
/// independent amount is the amount held by us (negative when posted).
///
/// # Examples
///
/// ```
/// use risk_core::Currency;
/// use risk_exposure::portfolio::CsaDetails;
///
/// let csa = CsaDetails::new(Currency::EUR, 14)
///     .unwrap()
///     .with_thresholds(1_000_000.0, 500_000.0)
///     .unwrap();
/// assert_eq!(csa.threshold_pay(), 1_000_000.0);
/// assert_eq!(csa.inverted().threshold_pay(), 500_000.0);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawCsa")]
pub struct CsaDetails {
    currency: Currency,
    threshold_pay: f64,
    threshold_rcv: f64,
    mta_pay: f64,
    mta_rcv: f64,
    independent_amount_held: f64,
    mpor_days: u32,
    margin_call_frequency_days: u32,
    margin_post_frequency_days: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCsa {
    currency: Currency,
    #[serde(default)]
    threshold_pay: f64,
    #[serde(default)]
    threshold_rcv: f64,
    #[serde(default)]
    mta_pay: f64,
    #[serde(default)]
    mta_rcv: f64,
    #[serde(default)]
    independent_amount_held: f64,
    mpor_days: u32,
    #[serde(default = "one_day")]
    margin_call_frequency_days: u32,
    #[serde(default = "one_day")]
    margin_post_frequency_days: u32,
}

fn one_day() -> u32 {
    1
}

impl TryFrom<RawCsa> for CsaDetails {
    type Error = PortfolioError;

    fn try_from(raw: RawCsa) -> Result<Self, Self::Error> {
        CsaDetails::new(raw.currency, raw.mpor_days)?
            .with_thresholds(raw.threshold_pay, raw.threshold_rcv)?
            .with_mtas(raw.mta_pay, raw.mta_rcv)?
            .with_independent_amount(raw.independent_amount_held)
            .with_frequencies(raw.margin_call_frequency_days, raw.margin_post_frequency_days)
    }
}

impl CsaDetails {
    /// Zero-threshold, zero-MTA agreement with daily margining.
    ///
    /// # Errors
    ///
    /// Returns `PortfolioError::InvalidCsa` if `mpor_days` is zero.
    pub fn new(currency: Currency, mpor_days: u32) -> Result<Self, PortfolioError> {
        if mpor_days == 0 {
            return Err(PortfolioError::InvalidCsa(
                "Margin period of risk must be positive".to_string(),
            ));
        }
        Ok(Self {
            currency,
            threshold_pay: 0.0,
            threshold_rcv: 0.0,
            mta_pay: 0.0,
            mta_rcv: 0.0,
            independent_amount_held: 0.0,
            mpor_days,
            margin_call_frequency_days: 1,
            margin_post_frequency_days: 1,
        })
    }

    /// Sets pay and receive thresholds.
    pub fn with_thresholds(mut self, pay: f64, rcv: f64) -> Result<Self, PortfolioError> {
        if !(pay >= 0.0 && rcv >= 0.0) {
            return Err(PortfolioError::InvalidCsa(
                "Threshold must be non-negative".to_string(),
            ));
        }
        self.threshold_pay = pay;
        self.threshold_rcv = rcv;
        Ok(self)
    }

    /// Sets pay and receive minimum transfer amounts.
    pub fn with_mtas(mut self, pay: f64, rcv: f64) -> Result<Self, PortfolioError> {
        if !(pay >= 0.0 && rcv >= 0.0) {
            return Err(PortfolioError::InvalidCsa(
                "Minimum transfer amount must be non-negative".to_string(),
            ));
        }
        self.mta_pay = pay;
        self.mta_rcv = rcv;
        Ok(self)
    }

    /// Sets the independent amount held.
    pub fn with_independent_amount(mut self, held: f64) -> Self {
        self.independent_amount_held = held;
        self
    }

    /// Sets the margin call and post frequencies in calendar days.
    pub fn with_frequencies(mut self, call: u32, post: u32) -> Result<Self, PortfolioError> {
        if call == 0 || post == 0 {
            return Err(PortfolioError::InvalidCsa(
                "Margin frequency must be at least one day".to_string(),
            ));
        }
        self.margin_call_frequency_days = call;
        self.margin_post_frequency_days = post;
        Ok(self)
    }

    /// The same agreement seen from the counterparty's side.
    pub fn inverted(&self) -> Self {
        Self {
            threshold_pay: self.threshold_rcv,
            threshold_rcv: self.threshold_pay,
            mta_pay: self.mta_rcv,
            mta_rcv: self.mta_pay,
            independent_amount_held: -self.independent_amount_held,
            margin_call_frequency_days: self.margin_post_frequency_days,
            margin_post_frequency_days: self.margin_call_frequency_days,
            ..self.clone()
        }
    }

    /// Collateral currency.
    #[inline]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Threshold applied to collateral we post.
    #[inline]
    pub fn threshold_pay(&self) -> f64 {
        self.threshold_pay
    }

    /// Threshold applied to collateral we call.
    #[inline]
    pub fn threshold_rcv(&self) -> f64 {
        self.threshold_rcv
    }

    /// MTA applied to collateral we post.
    #[inline]
    pub fn mta_pay(&self) -> f64 {
        self.mta_pay
    }

    /// MTA applied to collateral we call.
    #[inline]
    pub fn mta_rcv(&self) -> f64 {
        self.mta_rcv
    }

    /// Independent amount held (negative when posted).
    #[inline]
    pub fn independent_amount_held(&self) -> f64 {
        self.independent_amount_held
    }

    /// Margin period of risk in calendar days.
    #[inline]
    pub fn mpor_days(&self) -> u32 {
        self.mpor_days
    }

    /// Days between our margin calls.
    #[inline]
    pub fn margin_call_frequency_days(&self) -> u32 {
        self.margin_call_frequency_days
    }

    /// Days between the counterparty's margin calls.
    #[inline]
    pub fn margin_post_frequency_days(&self) -> u32 {
        self.margin_post_frequency_days
    }
}

/// Netting set with an optional collateral agreement.
///
/// # Examples
///
/// ```
/// use risk_exposure::portfolio::NettingSetDefinition;
///
/// let ns = NettingSetDefinition::uncollateralised("NS_A");
/// assert!(!ns.is_collateralised());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NettingSetDefinition {
    id: NettingSetId,
    csa: Option<CsaDetails>,
    active_csa: bool,
}

impl NettingSetDefinition {
    /// Netting set without a CSA.
    pub fn uncollateralised(id: impl Into<NettingSetId>) -> Self {
        Self {
            id: id.into(),
            csa: None,
            active_csa: false,
        }
    }

    /// Netting set with an active CSA.
    pub fn collateralised(id: impl Into<NettingSetId>, csa: CsaDetails) -> Self {
        Self {
            id: id.into(),
            csa: Some(csa),
            active_csa: true,
        }
    }

    /// Keeps the CSA terms but switches collateralisation on or off.
    pub fn with_active_csa(mut self, active: bool) -> Self {
        self.active_csa = active && self.csa.is_some();
        self
    }

    /// Returns the netting set ID.
    #[inline]
    pub fn id(&self) -> &NettingSetId {
        &self.id
    }

    /// Returns the CSA terms if any.
    #[inline]
    pub fn csa(&self) -> Option<&CsaDetails> {
        self.csa.as_ref()
    }

    /// Whether collateral is exchanged under the CSA.
    #[inline]
    pub fn is_collateralised(&self) -> bool {
        self.active_csa
    }

    /// The active CSA, if collateralised.
    pub fn active_csa(&self) -> Option<&CsaDetails> {
        if self.active_csa {
            self.csa.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csa() -> CsaDetails {
        CsaDetails::new(Currency::USD, 10)
            .unwrap()
            .with_thresholds(100.0, 50.0)
            .unwrap()
            .with_mtas(10.0, 5.0)
            .unwrap()
            .with_independent_amount(20.0)
            .with_frequencies(1, 7)
            .unwrap()
    }

    #[test]
    fn test_inverted_swaps_sides() {
        let inv = csa().inverted();
        assert_eq!(inv.threshold_pay(), 50.0);
        assert_eq!(inv.threshold_rcv(), 100.0);
        assert_eq!(inv.mta_pay(), 5.0);
        assert_eq!(inv.mta_rcv(), 10.0);
        assert_eq!(inv.independent_amount_held(), -20.0);
        assert_eq!(inv.margin_call_frequency_days(), 7);
        assert_eq!(inv.mpor_days(), 10);
        assert_eq!(inv.inverted(), csa());
    }

    #[test]
    fn test_invalid_terms() {
        assert!(CsaDetails::new(Currency::USD, 0).is_err());
        assert!(csa().with_thresholds(-1.0, 0.0).is_err());
        assert!(csa().with_mtas(0.0, f64::NAN).is_err());
        assert!(csa().with_frequencies(0, 1).is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let parsed: CsaDetails =
            toml::from_str("currency = \"eur\"\nmpor_days = 14\nthreshold_rcv = 1000.0\n").unwrap();
        assert_eq!(parsed.currency(), Currency::EUR);
        assert_eq!(parsed.threshold_rcv(), 1000.0);
        assert_eq!(parsed.margin_post_frequency_days(), 1);
    }

    #[test]
    fn test_deserialize_rejects_negative_threshold() {
        let parsed: Result<CsaDetails, _> =
            toml::from_str("currency = \"EUR\"\nmpor_days = 14\nthreshold_pay = -1.0\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_inactive_csa() {
        let ns = NettingSetDefinition::collateralised("NS", csa()).with_active_csa(false);
        assert!(ns.csa().is_some());
        assert!(ns.active_csa().is_none());
        assert!(!NettingSetDefinition::uncollateralised("NS")
            .with_active_csa(true)
            .is_collateralised());
    }
}
