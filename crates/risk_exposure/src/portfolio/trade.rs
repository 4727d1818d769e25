//! Trade metadata needed for aggregation.

use chrono::NaiveDate;
use risk_core::{CounterpartyId, NettingSetId, TradeId};

/// A trade as seen by exposure aggregation.
///
/// Pricing is done upstream; only the keys into the cube and the dates that
/// bound the exposure horizon are kept here.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_exposure::portfolio::Trade;
///
/// let maturity = NaiveDate::from_ymd_opt(2034, 1, 1).unwrap();
/// let trade = Trade::new("SWAP_1", "CPTY_A", "NS_A", maturity)
///     .with_next_break(NaiveDate::from_ymd_opt(2029, 1, 1).unwrap());
/// assert_eq!(trade.id().as_str(), "SWAP_1");
/// assert!(trade.next_break_date() < trade.maturity());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    id: TradeId,
    counterparty_id: CounterpartyId,
    netting_set_id: NettingSetId,
    maturity: NaiveDate,
    next_break: Option<NaiveDate>,
}

impl Trade {
    /// Creates a trade.
    pub fn new(
        id: impl Into<TradeId>,
        counterparty_id: impl Into<CounterpartyId>,
        netting_set_id: impl Into<NettingSetId>,
        maturity: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            counterparty_id: counterparty_id.into(),
            netting_set_id: netting_set_id.into(),
            maturity,
            next_break: None,
        }
    }

    /// Adds a mutual break date.
    pub fn with_next_break(mut self, date: NaiveDate) -> Self {
        self.next_break = Some(date);
        self
    }

    /// Returns the trade ID.
    #[inline]
    pub fn id(&self) -> &TradeId {
        &self.id
    }

    /// Returns the counterparty ID.
    #[inline]
    pub fn counterparty_id(&self) -> &CounterpartyId {
        &self.counterparty_id
    }

    /// Returns the netting set ID.
    #[inline]
    pub fn netting_set_id(&self) -> &NettingSetId {
        &self.netting_set_id
    }

    /// Returns the maturity date.
    #[inline]
    pub fn maturity(&self) -> NaiveDate {
        self.maturity
    }

    /// Next break date, or maturity when the trade has no break.
    #[inline]
    pub fn next_break_date(&self) -> NaiveDate {
        self.next_break.unwrap_or(self.maturity)
    }
}
