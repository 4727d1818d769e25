//! Portfolio definitions consumed by exposure aggregation.
//!
//! - [`Trade`]: cube row key plus counterparty, netting set, maturity and break
//! - [`NettingSetDefinition`]: netting set with optional [`CsaDetails`]
//! - [`Portfolio`]: validated container built through [`PortfolioBuilder`]

mod builder;
mod error;
mod netting_set;
mod trade;

pub use builder::PortfolioBuilder;
pub use error::PortfolioError;
pub use netting_set::{CsaDetails, NettingSetDefinition};
pub use trade::Trade;

use std::collections::BTreeMap;

use risk_core::{NettingSetId, TradeId};

/// Validated set of trades and netting sets.
///
/// Trades keep insertion order; netting sets iterate in id order.
#[derive(Clone, Debug)]
pub struct Portfolio {
    trades: Vec<Trade>,
    netting_sets: BTreeMap<NettingSetId, NettingSetDefinition>,
}

impl Portfolio {
    /// Returns the number of trades in the portfolio.
    #[inline]
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Returns the number of netting sets in the portfolio.
    #[inline]
    pub fn netting_set_count(&self) -> usize {
        self.netting_sets.len()
    }

    /// Returns whether the portfolio is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Gets a trade by ID.
    pub fn trade(&self, id: &TradeId) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id() == id)
    }

    /// Gets a netting set by ID.
    #[inline]
    pub fn netting_set(&self, id: &NettingSetId) -> Option<&NettingSetDefinition> {
        self.netting_sets.get(id)
    }

    /// All trades in insertion order.
    #[inline]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Returns an iterator over all netting sets.
    #[inline]
    pub fn netting_sets(&self) -> impl Iterator<Item = &NettingSetDefinition> {
        self.netting_sets.values()
    }

    /// Trades belonging to a netting set, in insertion order.
    pub fn trades_in<'a>(&'a self, id: &'a NettingSetId) -> impl Iterator<Item = &'a Trade> + 'a {
        self.trades.iter().filter(move |t| t.netting_set_id() == id)
    }
}
