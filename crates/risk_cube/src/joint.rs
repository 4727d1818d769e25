//! Logical union of several scenario cubes.
//!
//! Large simulations are often split by trade subset or run in several
//! processes, each producing its own cube. A [`JointCube`] presents them as
//! one cube with a single id axis without copying any data.
//!
//! ```text
//!   source 0: [x, y]      source 1: [y, z]
//!              \             /
//!          JointCube ids: [x, y, z]
//!          y -> {(0, 1), (1, 0)}
//! ```
//!
//! In summing mode an id may be held by several sources and reads return
//! the sum over them. In exclusive mode each id belongs to exactly one
//! source and every operation forwards to it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::cube::ScenarioCube;
use crate::error::{check_index, Axis, CubeError};

/// How ids shared between sources are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointMode {
    /// Reads sum over every source holding the id.
    Summing,
    /// Each id has exactly one source.
    Exclusive,
}

/// A read-mostly view over several borrowed cubes.
///
/// The sources must agree on number of dates, samples and depth. Dates,
/// asof and the time-zero layout are taken from the first source.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use risk_cube::{DoublePrecisionCube, JointCube, JointMode, ScenarioCube};
///
/// let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()];
/// let a = DoublePrecisionCube::new(asof, ["x", "y"], dates.clone(), 1, 1).unwrap();
/// let b = DoublePrecisionCube::new(asof, ["y", "z"], dates, 1, 1).unwrap();
/// a.set(1.0, 1, 0, 0, 0).unwrap();
/// b.set(2.0, 0, 0, 0, 0).unwrap();
///
/// let joint = JointCube::new(vec![&a, &b], None, false, JointMode::Summing).unwrap();
/// assert_eq!(joint.ids(), &["x", "y", "z"]);
/// assert_eq!(joint.get(1, 0, 0, 0).unwrap(), 3.0);
/// ```
pub struct JointCube<'a> {
    cubes: Vec<&'a dyn ScenarioCube>,
    ids: Vec<String>,
    id_map: HashMap<String, usize>,
    sources: Vec<Vec<(usize, usize)>>,
    mode: JointMode,
}

impl<'a> JointCube<'a> {
    /// Build a joint cube.
    ///
    /// With `ids` given, exactly those ids are exposed in that order and
    /// must be unique. Otherwise the union of source ids is used in source
    /// order; `require_unique_ids` rejects an id seen in more than one
    /// source.
    pub fn new(
        cubes: Vec<&'a dyn ScenarioCube>,
        ids: Option<Vec<String>>,
        require_unique_ids: bool,
        mode: JointMode,
    ) -> Result<Self, CubeError> {
        let first = *cubes.first().ok_or(CubeError::EmptyCubeList)?;
        for (i, cube) in cubes.iter().enumerate().skip(1) {
            for (axis, found, expected) in [
                (Axis::Date, cube.num_dates(), first.num_dates()),
                (Axis::Sample, cube.samples(), first.samples()),
                (Axis::Depth, cube.depth(), first.depth()),
            ] {
                if found != expected {
                    return Err(CubeError::DimensionMismatch {
                        cube: i,
                        axis,
                        found,
                        expected,
                    });
                }
            }
        }

        let ids = match ids {
            Some(ids) => {
                let mut seen = HashSet::with_capacity(ids.len());
                if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
                    return Err(CubeError::DuplicateId(dup.clone()));
                }
                ids
            }
            None => {
                let mut seen = HashSet::new();
                let mut union = Vec::new();
                for cube in &cubes {
                    for id in cube.ids() {
                        if seen.insert(id.as_str()) {
                            union.push(id.clone());
                        } else if require_unique_ids {
                            return Err(CubeError::DuplicateId(id.clone()));
                        }
                    }
                }
                union
            }
        };

        let mut sources = Vec::with_capacity(ids.len());
        for id in &ids {
            let held: Vec<(usize, usize)> = cubes
                .iter()
                .enumerate()
                .filter_map(|(c, cube)| cube.id_index(id).map(|local| (c, local)))
                .collect();
            if held.is_empty() {
                return Err(CubeError::NoCubesForId(id.clone()));
            }
            if mode == JointMode::Exclusive && held.len() > 1 {
                return Err(CubeError::IdInMultipleCubes(id.clone()));
            }
            sources.push(held);
        }

        let id_map = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        debug!(
            cubes = cubes.len(),
            ids = ids.len(),
            ?mode,
            "joint cube built"
        );

        Ok(Self {
            cubes,
            ids,
            id_map,
            sources,
            mode,
        })
    }

    /// Combination mode.
    pub fn mode(&self) -> JointMode {
        self.mode
    }

    /// (source, local index) pairs holding joint id `id`.
    pub fn sources_of(&self, id: usize) -> Result<&[(usize, usize)], CubeError> {
        check_index(Axis::Id, id, self.ids.len())?;
        Ok(&self.sources[id])
    }

    fn single_source(&self, id: usize) -> Result<(&'a dyn ScenarioCube, usize), CubeError> {
        match self.sources_of(id)? {
            [(c, local)] => Ok((self.cubes[*c], *local)),
            held => Err(CubeError::AmbiguousWrite {
                id: self.ids[id].clone(),
                sources: held.len(),
            }),
        }
    }

    fn exclusive_source(
        &self,
        id: usize,
        op: &'static str,
    ) -> Result<(&'a dyn ScenarioCube, usize), CubeError> {
        if self.mode != JointMode::Exclusive {
            return Err(CubeError::Unsupported(op));
        }
        self.single_source(id)
    }
}

impl ScenarioCube for JointCube<'_> {
    fn asof(&self) -> NaiveDate {
        self.cubes[0].asof()
    }

    fn ids(&self) -> &[String] {
        &self.ids
    }

    fn dates(&self) -> &[NaiveDate] {
        self.cubes[0].dates()
    }

    fn samples(&self) -> usize {
        self.cubes[0].samples()
    }

    fn depth(&self) -> usize {
        self.cubes[0].depth()
    }

    fn id_index(&self, id: &str) -> Option<usize> {
        self.id_map.get(id).copied()
    }

    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError> {
        let mut sum = 0.0;
        for (c, local) in self.sources_of(id)? {
            sum += self.cubes[*c].get(*local, date, sample, depth)?;
        }
        Ok(sum)
    }

    fn set(
        &self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError> {
        let (cube, local) = self.single_source(id)?;
        cube.set(value, local, date, sample, depth)
    }

    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError> {
        let mut sum = 0.0;
        for (c, local) in self.sources_of(id)? {
            sum += self.cubes[*c].get_t0(*local, depth)?;
        }
        Ok(sum)
    }

    fn set_t0(&self, value: f64, id: usize, depth: usize) -> Result<(), CubeError> {
        let (cube, local) = self.single_source(id)?;
        cube.set_t0(value, local, depth)
    }

    fn remove(&self, id: usize) -> Result<(), CubeError> {
        let (cube, local) = self.exclusive_source(id, "remove on a summing joint cube")?;
        cube.remove(local)
    }

    fn remove_sample(&self, id: usize, sample: usize) -> Result<(), CubeError> {
        let (cube, local) = self.exclusive_source(id, "remove on a summing joint cube")?;
        cube.remove_sample(local, sample)
    }

    fn trade_npvs(&self, id: usize) -> Result<BTreeMap<usize, f64>, CubeError> {
        let (cube, local) = self.exclusive_source(id, "trade_npvs on a summing joint cube")?;
        cube.trade_npvs(local)
    }

    fn relevant_scenarios(&self) -> BTreeSet<usize> {
        match self.mode {
            JointMode::Summing => BTreeSet::new(),
            JointMode::Exclusive => self
                .cubes
                .iter()
                .flat_map(|c| c.relevant_scenarios())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::DoublePrecisionCube;
    use crate::sensitivity::SensitivityCube;

    fn asof() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|m| NaiveDate::from_ymd_opt(2024, m + 1, 1).unwrap())
            .collect()
    }

    fn cube(ids: &[&str], n_dates: u32, samples: usize, depth: usize) -> DoublePrecisionCube {
        DoublePrecisionCube::new(asof(), ids.iter().copied(), dates(n_dates), samples, depth)
            .unwrap()
    }

    #[test]
    fn test_empty_cube_list() {
        assert_eq!(
            JointCube::new(vec![], None, false, JointMode::Summing).err(),
            Some(CubeError::EmptyCubeList)
        );
    }

    #[test]
    fn test_dimension_mismatch_names_axis() {
        let a = cube(&["x"], 2, 3, 1);
        let b = cube(&["y"], 2, 4, 1);
        let c = cube(&["z"], 3, 3, 1);
        assert_eq!(
            JointCube::new(vec![&a, &b], None, false, JointMode::Summing).err(),
            Some(CubeError::DimensionMismatch {
                cube: 1,
                axis: Axis::Sample,
                found: 4,
                expected: 3
            })
        );
        assert!(matches!(
            JointCube::new(vec![&a, &c], None, false, JointMode::Exclusive).err(),
            Some(CubeError::DimensionMismatch { axis: Axis::Date, .. })
        ));
    }

    #[test]
    fn test_union_order_first_occurrence_wins() {
        let a = cube(&["x", "y"], 1, 1, 1);
        let b = cube(&["y", "z"], 1, 1, 1);
        let joint = JointCube::new(vec![&a, &b], None, false, JointMode::Summing).unwrap();
        assert_eq!(joint.ids(), &["x", "y", "z"]);
        assert_eq!(joint.sources_of(1).unwrap(), &[(0, 1), (1, 0)]);
    }

    #[test]
    fn test_require_unique_ids() {
        let a = cube(&["x", "y"], 1, 1, 1);
        let b = cube(&["y", "z"], 1, 1, 1);
        assert_eq!(
            JointCube::new(vec![&a, &b], None, true, JointMode::Summing).err(),
            Some(CubeError::DuplicateId("y".into()))
        );
    }

    #[test]
    fn test_exclusive_rejects_shared_id() {
        let a = cube(&["x", "y"], 1, 1, 1);
        let b = cube(&["y", "z"], 1, 1, 1);
        let err = JointCube::new(vec![&a, &b], None, false, JointMode::Exclusive)
            .err()
            .unwrap();
        assert_eq!(err, CubeError::IdInMultipleCubes("y".into()));
        assert!(err.to_string().contains("occurs in more than one input cube"));
    }

    #[test]
    fn test_explicit_ids() {
        let a = cube(&["x", "y"], 1, 1, 1);
        let b = cube(&["z"], 1, 1, 1);
        let joint = JointCube::new(
            vec![&a, &b],
            Some(vec!["z".into(), "x".into()]),
            false,
            JointMode::Exclusive,
        )
        .unwrap();
        assert_eq!(joint.ids(), &["z", "x"]);
        assert_eq!(joint.id_index("x"), Some(1));
        assert_eq!(joint.id_index("y"), None);

        let err = JointCube::new(vec![&a], Some(vec!["q".into()]), false, JointMode::Summing)
            .err()
            .unwrap();
        assert_eq!(err, CubeError::NoCubesForId("q".into()));
        assert!(err.to_string().contains("no input cubes for id"));

        assert_eq!(
            JointCube::new(
                vec![&a],
                Some(vec!["x".into(), "x".into()]),
                false,
                JointMode::Summing
            )
            .err(),
            Some(CubeError::DuplicateId("x".into()))
        );
    }

    #[test]
    fn test_exclusive_forwards_reads_and_writes() {
        let a = cube(&["x"], 2, 2, 2);
        let b = cube(&["y"], 2, 2, 2);
        let joint = JointCube::new(vec![&a, &b], None, true, JointMode::Exclusive).unwrap();
        joint.set(5.0, 1, 1, 0, 1).unwrap();
        joint.set_t0(-3.0, 0, 0).unwrap();
        assert_eq!(b.get(0, 1, 0, 1).unwrap(), 5.0);
        assert_eq!(a.get_t0(0, 0).unwrap(), -3.0);
        assert_eq!(joint.get(1, 1, 0, 1).unwrap(), 5.0);
        assert_eq!(joint.get_t0(0, 0).unwrap(), -3.0);
        assert!(joint.get(2, 0, 0, 0).is_err());
    }

    #[test]
    fn test_summing_reads_sum_but_writes_need_single_source() {
        let a = cube(&["x", "y"], 1, 1, 1);
        let b = cube(&["y"], 1, 1, 1);
        a.set(1.5, 1, 0, 0, 0).unwrap();
        b.set(2.0, 0, 0, 0, 0).unwrap();
        a.set_t0(4.0, 1, 0).unwrap();
        b.set_t0(6.0, 0, 0).unwrap();
        let joint = JointCube::new(vec![&a, &b], None, false, JointMode::Summing).unwrap();

        assert_eq!(joint.get(1, 0, 0, 0).unwrap(), 3.5);
        assert_eq!(joint.get_t0(1, 0).unwrap(), 10.0);
        assert_eq!(
            joint.set(1.0, 1, 0, 0, 0),
            Err(CubeError::AmbiguousWrite {
                id: "y".into(),
                sources: 2
            })
        );
        assert!(joint.set_t0(1.0, 1, 0).is_err());
        // single-source ids stay writable
        joint.set(9.0, 0, 0, 0, 0).unwrap();
        assert_eq!(a.get(0, 0, 0, 0).unwrap(), 9.0);
    }

    #[test]
    fn test_summing_administrative_operations_unsupported() {
        let a = cube(&["x"], 1, 1, 1);
        let joint = JointCube::new(vec![&a], None, false, JointMode::Summing).unwrap();
        assert!(matches!(joint.remove(0), Err(CubeError::Unsupported(_))));
        assert!(matches!(joint.remove_sample(0, 0), Err(CubeError::Unsupported(_))));
        assert!(matches!(joint.trade_npvs(0), Err(CubeError::Unsupported(_))));
        assert!(joint.relevant_scenarios().is_empty());
    }

    #[test]
    fn test_exclusive_administrative_operations_forward() {
        let s1 = SensitivityCube::new(asof(), ["x"], 4).unwrap();
        let s2 = SensitivityCube::new(asof(), ["y"], 4).unwrap();
        s1.set(1.0, 0, 0, 1, 0).unwrap();
        s2.set(2.0, 0, 0, 3, 0).unwrap();
        let joint = JointCube::new(vec![&s1, &s2], None, true, JointMode::Exclusive).unwrap();

        assert_eq!(
            joint.relevant_scenarios().into_iter().collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(
            joint.trade_npvs(1).unwrap().into_iter().collect::<Vec<_>>(),
            vec![(3, 2.0)]
        );
        joint.remove_sample(1, 3).unwrap();
        assert!(s2.trade_npvs(0).unwrap().is_empty());
        joint.remove(0).unwrap();
        assert!(s1.relevant_scenarios().is_empty());
    }
}
