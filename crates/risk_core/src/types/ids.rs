//! Identifier types for portfolio entities.
//!
//! Trades, netting sets and counterparties are keyed by strings in the
//! scenario cubes. The newtypes keep them apart at the type level and order
//! lexicographically so that aggregation iterates in a deterministic order.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a trade, also the row key of a trade-level cube.
    ///
    /// # Examples
    ///
    /// ```
    /// use risk_core::types::TradeId;
    ///
    /// let id = TradeId::new("SWAP_EUR_10Y");
    /// assert_eq!(id.as_str(), "SWAP_EUR_10Y");
    /// ```
    TradeId
);

string_id!(
    /// Unique identifier for a netting set.
    ///
    /// # Examples
    ///
    /// ```
    /// use risk_core::types::NettingSetId;
    ///
    /// let id = NettingSetId::new("CPTY_A_ISDA");
    /// assert_eq!(id.to_string(), "CPTY_A_ISDA");
    /// ```
    NettingSetId
);

string_id!(
    /// Unique identifier for a counterparty.
    CounterpartyId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_trade_id_conversions() {
        let a: TradeId = "T1".into();
        let b: TradeId = String::from("T1").into();
        assert_eq!(a, b);
        assert_eq!(a.as_ref(), "T1");
    }

    #[test]
    fn test_ids_hash_and_deduplicate() {
        let mut set = HashSet::new();
        set.insert(NettingSetId::new("NS1"));
        set.insert(NettingSetId::new("NS2"));
        set.insert(NettingSetId::new("NS1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ids_order_lexicographically() {
        let ordered: BTreeSet<_> = ["T3", "T1", "T2"].into_iter().map(TradeId::new).collect();
        let names: Vec<_> = ordered.iter().map(TradeId::as_str).collect();
        assert_eq!(names, vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_counterparty_display() {
        assert_eq!(format!("{}", CounterpartyId::new("CP001")), "CP001");
    }
}
