//! Portfolio builder with reference validation.

use std::collections::{BTreeMap, HashSet};

use super::error::PortfolioError;
use super::netting_set::NettingSetDefinition;
use super::trade::Trade;
use super::Portfolio;

/// Builder for constructing portfolios with validation.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_exposure::portfolio::{NettingSetDefinition, PortfolioBuilder, Trade};
///
/// let maturity = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
/// let portfolio = PortfolioBuilder::new()
///     .add_netting_set(NettingSetDefinition::uncollateralised("NS1"))
///     .add_trade(Trade::new("T1", "CP1", "NS1", maturity))
///     .build()
///     .unwrap();
/// assert_eq!(portfolio.trade_count(), 1);
/// ```
#[derive(Default)]
pub struct PortfolioBuilder {
    trades: Vec<Trade>,
    netting_sets: Vec<NettingSetDefinition>,
}

impl PortfolioBuilder {
    /// Creates a new portfolio builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trade to the portfolio.
    pub fn add_trade(mut self, trade: Trade) -> Self {
        self.trades.push(trade);
        self
    }

    /// Adds multiple trades to the portfolio.
    pub fn add_trades(mut self, trades: impl IntoIterator<Item = Trade>) -> Self {
        self.trades.extend(trades);
        self
    }

    /// Adds a netting set to the portfolio.
    pub fn add_netting_set(mut self, netting_set: NettingSetDefinition) -> Self {
        self.netting_sets.push(netting_set);
        self
    }

    /// Adds multiple netting sets to the portfolio.
    pub fn add_netting_sets(
        mut self,
        netting_sets: impl IntoIterator<Item = NettingSetDefinition>,
    ) -> Self {
        self.netting_sets.extend(netting_sets);
        self
    }

    /// Builds and validates the portfolio.
    ///
    /// # Validation
    ///
    /// - No duplicate trade IDs
    /// - No duplicate netting set IDs
    /// - All trades reference known netting sets
    ///
    /// Trades keep insertion order.
    pub fn build(self) -> Result<Portfolio, PortfolioError> {
        let mut trade_ids = HashSet::new();
        for trade in &self.trades {
            if !trade_ids.insert(trade.id().clone()) {
                return Err(PortfolioError::DuplicateTrade(trade.id().to_string()));
            }
        }

        let mut netting_sets = BTreeMap::new();
        for ns in self.netting_sets {
            let id = ns.id().clone();
            if netting_sets.insert(id.clone(), ns).is_some() {
                return Err(PortfolioError::DuplicateNettingSet(id.to_string()));
            }
        }

        for trade in &self.trades {
            if !netting_sets.contains_key(trade.netting_set_id()) {
                return Err(PortfolioError::UnknownNettingSetReference(
                    trade.id().to_string(),
                    trade.netting_set_id().to_string(),
                ));
            }
        }

        Ok(Portfolio {
            trades: self.trades,
            netting_sets,
        })
    }

    /// Returns the number of trades currently in the builder.
    #[inline]
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Returns the number of netting sets currently in the builder.
    #[inline]
    pub fn netting_set_count(&self) -> usize {
        self.netting_sets.len()
    }
}
