//! Market state observed along simulation paths.
//!
//! Alongside trade values, a simulation records per (date, sample) market
//! observations that aggregation needs later: FX spots to convert collateral,
//! numeraire values, index fixings and credit states.

use std::collections::HashMap;
use std::fmt;

use crate::error::{check_index, Axis, CubeError};

/// Kind of an aggregation scenario data series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AggregationScenarioDataType {
    /// Index fixing, qualified by index name
    IndexFixing,
    /// FX spot into base currency, qualified by currency code
    FxSpot,
    /// Model numeraire
    Numeraire,
    /// Credit state, qualified by name
    CreditState,
    /// Survival weight, qualified by name
    SurvivalWeight,
    /// Recovery rate, qualified by name
    RecoveryRate,
    /// Anything else
    Generic,
}

impl fmt::Display for AggregationScenarioDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IndexFixing => "IndexFixing",
            Self::FxSpot => "FXSpot",
            Self::Numeraire => "Numeraire",
            Self::CreditState => "CreditState",
            Self::SurvivalWeight => "SurvivalWeight",
            Self::RecoveryRate => "RecoveryRate",
            Self::Generic => "Generic",
        };
        f.write_str(name)
    }
}

/// Read access to scenario data on the cube's (date, sample) grid.
pub trait AggregationScenarioData: Send + Sync {
    /// Number of dates.
    fn dim_dates(&self) -> usize;

    /// Number of samples.
    fn dim_samples(&self) -> usize;

    /// Whether a series exists.
    fn has(&self, kind: AggregationScenarioDataType, qualifier: &str) -> bool;

    /// Value of a series at (date, sample).
    fn get(
        &self,
        date: usize,
        sample: usize,
        kind: AggregationScenarioDataType,
        qualifier: &str,
    ) -> Result<f64, CubeError>;
}

/// Dense in-memory scenario data.
#[derive(Debug, Clone)]
pub struct InMemoryAggregationScenarioData {
    dates: usize,
    samples: usize,
    series: HashMap<(AggregationScenarioDataType, String), Vec<f64>>,
}

impl InMemoryAggregationScenarioData {
    /// Empty store on a `dates` x `samples` grid.
    pub fn new(dates: usize, samples: usize) -> Self {
        Self {
            dates,
            samples,
            series: HashMap::new(),
        }
    }

    /// Record one observation, creating the series on first use.
    pub fn set(
        &mut self,
        value: f64,
        date: usize,
        sample: usize,
        kind: AggregationScenarioDataType,
        qualifier: &str,
    ) -> Result<(), CubeError> {
        check_index(Axis::Date, date, self.dates)?;
        check_index(Axis::Sample, sample, self.samples)?;
        let len = self.dates * self.samples;
        let series = self
            .series
            .entry((kind, qualifier.to_string()))
            .or_insert_with(|| vec![0.0; len]);
        series[date * self.samples + sample] = value;
        Ok(())
    }
}

impl AggregationScenarioData for InMemoryAggregationScenarioData {
    fn dim_dates(&self) -> usize {
        self.dates
    }

    fn dim_samples(&self) -> usize {
        self.samples
    }

    fn has(&self, kind: AggregationScenarioDataType, qualifier: &str) -> bool {
        self.series.contains_key(&(kind, qualifier.to_string()))
    }

    fn get(
        &self,
        date: usize,
        sample: usize,
        kind: AggregationScenarioDataType,
        qualifier: &str,
    ) -> Result<f64, CubeError> {
        check_index(Axis::Date, date, self.dates)?;
        check_index(Axis::Sample, sample, self.samples)?;
        let series = self
            .series
            .get(&(kind, qualifier.to_string()))
            .ok_or_else(|| CubeError::MissingScenarioData {
                kind: kind.to_string(),
                qualifier: qualifier.to_string(),
            })?;
        Ok(series[date * self.samples + sample])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AggregationScenarioDataType::*;

    #[test]
    fn test_set_get_has() {
        let mut data = InMemoryAggregationScenarioData::new(3, 2);
        assert!(!data.has(FxSpot, "USD"));
        data.set(1.1, 2, 1, FxSpot, "USD").unwrap();
        assert!(data.has(FxSpot, "USD"));
        assert!(!data.has(FxSpot, "GBP"));
        assert_eq!(data.get(2, 1, FxSpot, "USD").unwrap(), 1.1);
        assert_eq!(data.get(0, 0, FxSpot, "USD").unwrap(), 0.0);
    }

    #[test]
    fn test_missing_series_and_bad_index() {
        let mut data = InMemoryAggregationScenarioData::new(1, 1);
        data.set(1.0, 0, 0, Numeraire, "").unwrap();
        assert!(matches!(
            data.get(0, 0, IndexFixing, "EUR-EURIBOR-6M"),
            Err(CubeError::MissingScenarioData { .. })
        ));
        assert!(data.get(1, 0, Numeraire, "").is_err());
        assert!(data.set(1.0, 0, 1, Numeraire, "").is_err());
    }
}
