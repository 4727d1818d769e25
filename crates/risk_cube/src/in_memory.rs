//! Dense in-memory cubes in single and double precision.
//!
//! Cells are atomics holding the bit pattern of the stored float, so
//! concurrent writers to disjoint cells never contend on a lock.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::NaiveDate;

use crate::cube::ScenarioCube;
use crate::error::{check_index, Axis, CubeError};

/// Storage precision of an in-memory cube.
pub trait CubeValue: Send + Sync + 'static {
    /// Atomic cell type.
    type Cell: Send + Sync;

    /// New cell holding `value`.
    fn cell(value: f64) -> Self::Cell;

    /// Read a cell.
    fn load(cell: &Self::Cell) -> f64;

    /// Overwrite a cell.
    fn store(cell: &Self::Cell, value: f64);
}

impl CubeValue for f32 {
    type Cell = AtomicU32;

    fn cell(value: f64) -> AtomicU32 {
        AtomicU32::new((value as f32).to_bits())
    }

    fn load(cell: &AtomicU32) -> f64 {
        f32::from_bits(cell.load(Ordering::Relaxed)) as f64
    }

    fn store(cell: &AtomicU32, value: f64) {
        cell.store((value as f32).to_bits(), Ordering::Relaxed);
    }
}

impl CubeValue for f64 {
    type Cell = AtomicU64;

    fn cell(value: f64) -> AtomicU64 {
        AtomicU64::new(value.to_bits())
    }

    fn load(cell: &AtomicU64) -> f64 {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    fn store(cell: &AtomicU64, value: f64) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Dense cube backed by flat atomic arrays.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_cube::{DoublePrecisionCube, ScenarioCube};
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![
///     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
/// ];
/// let cube = DoublePrecisionCube::new(asof, ["T1", "T2"], dates, 100, 1).unwrap();
///
/// cube.set(42.0, 1, 0, 17, 0).unwrap();
/// assert_eq!(cube.get(1, 0, 17, 0).unwrap(), 42.0);
/// assert!(cube.get(2, 0, 0, 0).is_err());
/// ```
pub struct InMemoryCube<T: CubeValue> {
    asof: NaiveDate,
    ids: Vec<String>,
    id_map: HashMap<String, usize>,
    dates: Vec<NaiveDate>,
    samples: usize,
    depth: usize,
    t0: Vec<T::Cell>,
    data: Vec<T::Cell>,
    _precision: PhantomData<T>,
}

/// Cube storing `f32` values.
pub type SinglePrecisionCube = InMemoryCube<f32>;

/// Cube storing `f64` values.
pub type DoublePrecisionCube = InMemoryCube<f64>;

impl<T: CubeValue> InMemoryCube<T> {
    /// Zero-initialised cube.
    ///
    /// Ids must be unique, dates strictly ascending, and `samples` and
    /// `depth` at least one.
    pub fn new<I, S>(
        asof: NaiveDate,
        ids: I,
        dates: Vec<NaiveDate>,
        samples: usize,
        depth: usize,
    ) -> Result<Self, CubeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if samples == 0 {
            return Err(CubeError::InvalidCube("samples must be at least 1".into()));
        }
        if depth == 0 {
            return Err(CubeError::InvalidCube("depth must be at least 1".into()));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CubeError::InvalidCube(
                "dates must be strictly ascending".into(),
            ));
        }
        let mut id_map = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if id_map.insert(id.clone(), i).is_some() {
                return Err(CubeError::DuplicateId(id.clone()));
            }
        }

        let t0 = (0..ids.len() * depth).map(|_| T::cell(0.0)).collect();
        let data = (0..ids.len() * dates.len() * samples * depth)
            .map(|_| T::cell(0.0))
            .collect();

        Ok(Self {
            asof,
            ids,
            id_map,
            dates,
            samples,
            depth,
            t0,
            data,
            _precision: PhantomData,
        })
    }

    fn t0_offset(&self, id: usize, depth: usize) -> Result<usize, CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        check_index(Axis::Depth, depth, self.depth)?;
        Ok(id * self.depth + depth)
    }

    fn offset(
        &self,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<usize, CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        check_index(Axis::Date, date, self.dates.len())?;
        check_index(Axis::Sample, sample, self.samples)?;
        check_index(Axis::Depth, depth, self.depth)?;
        Ok(((id * self.dates.len() + date) * self.samples + sample) * self.depth + depth)
    }
}

impl<T: CubeValue> ScenarioCube for InMemoryCube<T> {
    fn asof(&self) -> NaiveDate {
        self.asof
    }

    fn ids(&self) -> &[String] {
        &self.ids
    }

    fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    fn samples(&self) -> usize {
        self.samples
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn id_index(&self, id: &str) -> Option<usize> {
        self.id_map.get(id).copied()
    }

    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError> {
        let k = self.offset(id, date, sample, depth)?;
        Ok(T::load(&self.data[k]))
    }

    fn set(
        &self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError> {
        let k = self.offset(id, date, sample, depth)?;
        T::store(&self.data[k], value);
        Ok(())
    }

    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError> {
        let k = self.t0_offset(id, depth)?;
        Ok(T::load(&self.t0[k]))
    }

    fn set_t0(&self, value: f64, id: usize, depth: usize) -> Result<(), CubeError> {
        let k = self.t0_offset(id, depth)?;
        T::store(&self.t0[k], value);
        Ok(())
    }
}

impl<T: CubeValue> std::fmt::Debug for InMemoryCube<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCube")
            .field("asof", &self.asof)
            .field("ids", &self.ids.len())
            .field("dates", &self.dates.len())
            .field("samples", &self.samples)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cube<T: CubeValue>() -> InMemoryCube<T> {
        InMemoryCube::new(
            d(2024, 1, 1),
            ["A", "B", "C"],
            vec![d(2024, 4, 1), d(2024, 7, 1)],
            4,
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_cells_start_at_zero_and_are_independent() {
        let c = cube::<f64>();
        c.set(1.5, 2, 1, 3, 1).unwrap();
        assert_eq!(c.get(2, 1, 3, 1).unwrap(), 1.5);
        assert_eq!(c.get(2, 1, 3, 0).unwrap(), 0.0);
        assert_eq!(c.get(2, 0, 3, 1).unwrap(), 0.0);
        assert_eq!(c.get(1, 1, 3, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_single_precision_rounds_to_f32() {
        let c = cube::<f32>();
        c.set(0.1, 0, 0, 0, 0).unwrap();
        assert_eq!(c.get(0, 0, 0, 0).unwrap(), 0.1_f32 as f64);
        assert_relative_eq!(c.get(0, 0, 0, 0).unwrap(), 0.1, epsilon = 1e-7);
    }

    #[test]
    fn test_out_of_range_on_every_axis() {
        let c = cube::<f64>();
        let expect = |r: Result<f64, CubeError>, axis, index, size| {
            assert_eq!(r, Err(CubeError::IndexOutOfRange { axis, index, size }));
        };
        expect(c.get(3, 0, 0, 0), Axis::Id, 3, 3);
        expect(c.get(0, 2, 0, 0), Axis::Date, 2, 2);
        expect(c.get(0, 0, 4, 0), Axis::Sample, 4, 4);
        expect(c.get(0, 0, 0, 2), Axis::Depth, 2, 2);
        expect(c.get_t0(0, 5), Axis::Depth, 5, 2);
        assert!(c.set(1.0, 9, 0, 0, 0).is_err());
        assert!(c.set_t0(1.0, 3, 0).is_err());
    }

    #[test]
    fn test_t0_store_is_separate() {
        let c = cube::<f64>();
        c.set_t0(7.0, 1, 1).unwrap();
        assert_eq!(c.get_t0(1, 1).unwrap(), 7.0);
        assert_eq!(c.get_t0(1, 0).unwrap(), 0.0);
        assert_eq!(c.get(1, 0, 0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_remove_zeroes_id() {
        let c = cube::<f64>();
        c.set_t0(3.0, 0, 0).unwrap();
        c.set(1.0, 0, 1, 2, 1).unwrap();
        c.set(2.0, 1, 1, 2, 1).unwrap();
        c.remove(0).unwrap();
        assert_eq!(c.get_t0(0, 0).unwrap(), 0.0);
        assert_eq!(c.get(0, 1, 2, 1).unwrap(), 0.0);
        assert_eq!(c.get(1, 1, 2, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_remove_sample_keeps_other_samples() {
        let c = cube::<f64>();
        c.set(1.0, 0, 0, 1, 0).unwrap();
        c.set(2.0, 0, 0, 2, 0).unwrap();
        c.remove_sample(0, 1).unwrap();
        assert_eq!(c.get(0, 0, 1, 0).unwrap(), 0.0);
        assert_eq!(c.get(0, 0, 2, 0).unwrap(), 2.0);
    }

    #[test]
    fn test_default_sparse_operations() {
        let c = cube::<f64>();
        assert!(matches!(c.trade_npvs(0), Err(CubeError::Unsupported(_))));
        assert!(c.relevant_scenarios().is_empty());
    }

    #[test]
    fn test_construction_validation() {
        let asof = d(2024, 1, 1);
        assert_eq!(
            DoublePrecisionCube::new(asof, ["A", "A"], vec![], 1, 1).unwrap_err(),
            CubeError::DuplicateId("A".into())
        );
        assert!(DoublePrecisionCube::new(asof, ["A"], vec![], 0, 1).is_err());
        assert!(DoublePrecisionCube::new(asof, ["A"], vec![], 1, 0).is_err());
        assert!(
            DoublePrecisionCube::new(asof, ["A"], vec![d(2024, 2, 1), d(2024, 2, 1)], 1, 1)
                .is_err()
        );
    }

    #[test]
    fn test_id_index() {
        let c = cube::<f32>();
        assert_eq!(c.id_index("C"), Some(2));
        assert_eq!(c.id_index("Z"), None);
    }
}
