//! The scenario cube contract.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::{check_index, Axis, CubeError};

/// Dense store of simulated values indexed by (id, date, sample, depth),
/// plus a time-zero store indexed by (id, depth).
///
/// `set` takes `&self`: populating workers share the cube and each cell has
/// exactly one writer. Implementations must not serialise writers.
pub trait ScenarioCube: Send + Sync {
    /// Valuation date.
    fn asof(&self) -> NaiveDate;

    /// Ordered, unique ids.
    fn ids(&self) -> &[String];

    /// Simulation dates.
    fn dates(&self) -> &[NaiveDate];

    /// Number of samples.
    fn samples(&self) -> usize;

    /// Number of depth slots.
    fn depth(&self) -> usize;

    /// Number of ids.
    fn num_ids(&self) -> usize {
        self.ids().len()
    }

    /// Number of dates.
    fn num_dates(&self) -> usize {
        self.dates().len()
    }

    /// Position of `id` in [`ids`](ScenarioCube::ids).
    fn id_index(&self, id: &str) -> Option<usize> {
        self.ids().iter().position(|x| x == id)
    }

    /// Read one cell.
    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError>;

    /// Write one cell.
    fn set(
        &self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError>;

    /// Read a time-zero value.
    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError>;

    /// Write a time-zero value.
    fn set_t0(&self, value: f64, id: usize, depth: usize) -> Result<(), CubeError>;

    /// Zero every value held for `id`, time-zero included.
    fn remove(&self, id: usize) -> Result<(), CubeError> {
        check_index(Axis::Id, id, self.num_ids())?;
        for d in 0..self.depth() {
            self.set_t0(0.0, id, d)?;
        }
        for sample in 0..self.samples() {
            self.remove_sample(id, sample)?;
        }
        Ok(())
    }

    /// Zero the values held for `id` on one sample.
    fn remove_sample(&self, id: usize, sample: usize) -> Result<(), CubeError> {
        check_index(Axis::Id, id, self.num_ids())?;
        check_index(Axis::Sample, sample, self.samples())?;
        for date in 0..self.num_dates() {
            for d in 0..self.depth() {
                self.set(0.0, id, date, sample, d)?;
            }
        }
        Ok(())
    }

    /// Sample-indexed values stored for `id`, for cubes that keep sparse
    /// per-scenario results.
    fn trade_npvs(&self, _id: usize) -> Result<BTreeMap<usize, f64>, CubeError> {
        Err(CubeError::Unsupported("trade_npvs"))
    }

    /// Samples for which any stored value differs from its base.
    fn relevant_scenarios(&self) -> BTreeSet<usize> {
        BTreeSet::new()
    }
}
