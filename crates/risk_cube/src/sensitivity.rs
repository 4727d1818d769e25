//! Sparse-by-scenario cube for sensitivity runs.
//!
//! A sensitivity run revalues every trade under many single-factor shifts,
//! and most shifts leave most trades unchanged. The cube stores one date
//! (the valuation date) with depth one, and a cell only counts as stored
//! when its value differs from the trade's base (time-zero) value.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDate;

use crate::cube::ScenarioCube;
use crate::error::{check_index, Axis, CubeError};

const CLOSE_ENOUGH: f64 = 1e-14;

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= CLOSE_ENOUGH * a.abs().max(b.abs()).max(1.0)
}

#[derive(Default)]
struct Cell {
    value: AtomicU64,
    stored: AtomicBool,
}

/// Scenario cube keeping only scenario values that move off base.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_cube::{ScenarioCube, SensitivityCube};
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let cube = SensitivityCube::new(asof, ["T1"], 3).unwrap();
/// cube.set_t0(10.0, 0, 0).unwrap();
/// cube.set(10.0, 0, 0, 0, 0).unwrap(); // equal to base, not stored
/// cube.set(12.5, 0, 0, 2, 0).unwrap();
///
/// assert_eq!(cube.get(0, 0, 1, 0).unwrap(), 10.0);
/// assert_eq!(cube.relevant_scenarios().into_iter().collect::<Vec<_>>(), vec![2]);
/// ```
pub struct SensitivityCube {
    asof: NaiveDate,
    ids: Vec<String>,
    id_map: HashMap<String, usize>,
    dates: Vec<NaiveDate>,
    samples: usize,
    t0: Vec<AtomicU64>,
    cells: Vec<Cell>,
}

impl SensitivityCube {
    /// Cube with `samples` scenarios for the given ids.
    pub fn new<I, S>(asof: NaiveDate, ids: I, samples: usize) -> Result<Self, CubeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if samples == 0 {
            return Err(CubeError::InvalidCube("samples must be at least 1".into()));
        }
        let mut id_map = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if id_map.insert(id.clone(), i).is_some() {
                return Err(CubeError::DuplicateId(id.clone()));
            }
        }
        let t0 = (0..ids.len()).map(|_| AtomicU64::new(0.0_f64.to_bits())).collect();
        let cells = (0..ids.len() * samples).map(|_| Cell::default()).collect();
        Ok(Self {
            asof,
            ids,
            id_map,
            dates: vec![asof],
            samples,
            t0,
            cells,
        })
    }

    fn cell(
        &self,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<&Cell, CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        check_index(Axis::Date, date, 1)?;
        check_index(Axis::Sample, sample, self.samples)?;
        check_index(Axis::Depth, depth, 1)?;
        Ok(&self.cells[id * self.samples + sample])
    }

    fn base(&self, id: usize) -> f64 {
        f64::from_bits(self.t0[id].load(Ordering::Relaxed))
    }
}

impl ScenarioCube for SensitivityCube {
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
        1
    }

    fn id_index(&self, id: &str) -> Option<usize> {
        self.id_map.get(id).copied()
    }

    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError> {
        let cell = self.cell(id, date, sample, depth)?;
        if cell.stored.load(Ordering::Acquire) {
            Ok(f64::from_bits(cell.value.load(Ordering::Relaxed)))
        } else {
            Ok(self.base(id))
        }
    }

    fn set(
        &self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError> {
        let cell = self.cell(id, date, sample, depth)?;
        if close_enough(value, self.base(id)) {
            cell.stored.store(false, Ordering::Release);
        } else {
            cell.value.store(value.to_bits(), Ordering::Relaxed);
            cell.stored.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        check_index(Axis::Depth, depth, 1)?;
        Ok(self.base(id))
    }

    fn set_t0(&self, value: f64, id: usize, depth: usize) -> Result<(), CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        check_index(Axis::Depth, depth, 1)?;
        self.t0[id].store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, id: usize) -> Result<(), CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        self.t0[id].store(0.0_f64.to_bits(), Ordering::Relaxed);
        for sample in 0..self.samples {
            self.cells[id * self.samples + sample]
                .stored
                .store(false, Ordering::Release);
        }
        Ok(())
    }

    fn remove_sample(&self, id: usize, sample: usize) -> Result<(), CubeError> {
        self.cell(id, 0, sample, 0)?
            .stored
            .store(false, Ordering::Release);
        Ok(())
    }

    fn trade_npvs(&self, id: usize) -> Result<BTreeMap<usize, f64>, CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        let row = &self.cells[id * self.samples..(id + 1) * self.samples];
        Ok(row
            .iter()
            .enumerate()
            .filter(|(_, c)| c.stored.load(Ordering::Acquire))
            .map(|(s, c)| (s, f64::from_bits(c.value.load(Ordering::Relaxed))))
            .collect())
    }

    fn relevant_scenarios(&self) -> BTreeSet<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.stored.load(Ordering::Acquire))
            .map(|(k, _)| k % self.samples)
            .collect()
    }
}
