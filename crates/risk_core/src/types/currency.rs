//! ISO 4217 currency codes.
//!
//! Netting set collateral is held in a CSA currency that can differ from the
//! base currency of the NPV cube, so FX lookups key on these codes.
//!
//! # Examples
//!
//! ```
//! use risk_core::types::Currency;
//!
//! let eur: Currency = "eur".parse().unwrap();
//! assert_eq!(eur, Currency::EUR);
//! assert_eq!(eur.to_string(), "EUR");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CurrencyError;

/// Major trading currencies.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// United States Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
}

impl Currency {
    /// Returns the ISO 4217 three-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
        }
    }

    /// Returns the standard number of decimal places.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parses a currency code, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(ccy: Currency) -> Self {
        ccy.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_parse() {
        for ccy in [
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::CHF,
            Currency::CAD,
            Currency::AUD,
        ] {
            assert_eq!(ccy.code().parse::<Currency>().unwrap(), ccy);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" gbp ".parse::<Currency>().unwrap(), Currency::GBP);
    }

    #[test]
    fn test_unknown_currency() {
        let err = "XYZ".parse::<Currency>().unwrap_err();
        assert_eq!(err, CurrencyError::UnknownCurrency("XYZ".to_string()));
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(Currency::JPY.decimal_places(), 0);
        assert_eq!(Currency::EUR.decimal_places(), 2);
    }
}
