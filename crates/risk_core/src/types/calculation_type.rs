//! Collateral calculation methodology.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CurrencyError;

/// How margin calls settle relative to the margin period of risk.
///
/// - `Symmetric`: both margin calls and returns settle after the MPOR lag
/// - `AsymmetricCVA`: returns to the counterparty settle immediately
/// - `AsymmetricDVA`: calls from the counterparty settle immediately
/// - `NoLag`: everything settles immediately and close-out values are used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationType {
    /// Lagged in both directions.
    #[default]
    Symmetric,
    /// Lagged only for margin received.
    AsymmetricCVA,
    /// Lagged only for margin posted.
    AsymmetricDVA,
    /// No lag.
    NoLag,
}

impl CalculationType {
    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            CalculationType::Symmetric => "Symmetric",
            CalculationType::AsymmetricCVA => "AsymmetricCVA",
            CalculationType::AsymmetricDVA => "AsymmetricDVA",
            CalculationType::NoLag => "NoLag",
        }
    }
}

impl FromStr for CalculationType {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Symmetric" => Ok(CalculationType::Symmetric),
            "AsymmetricCVA" => Ok(CalculationType::AsymmetricCVA),
            "AsymmetricDVA" => Ok(CalculationType::AsymmetricDVA),
            "NoLag" => Ok(CalculationType::NoLag),
            _ => Err(CurrencyError::UnknownCalculationType(s.to_string())),
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
