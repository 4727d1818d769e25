//! Property tests for joint cubes.

use chrono::NaiveDate;
use proptest::prelude::*;
use risk_cube::{CubeError, DoublePrecisionCube, JointCube, JointMode, ScenarioCube};

const DATES: usize = 2;
const SAMPLES: usize = 3;
const DEPTH: usize = 2;

fn asof() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn dates() -> Vec<NaiveDate> {
    vec![
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
    ]
}

/// Source id sets drawn from a small alphabet so that overlaps are common.
fn id_sets() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        prop::collection::btree_set(0u8..6, 1..5),
        1..4,
    )
    .prop_map(|sets| {
        sets.into_iter()
            .map(|s| s.into_iter().map(|i| format!("T{i}")).collect())
            .collect()
    })
}

fn populate(ids: &[String], seed: u64) -> DoublePrecisionCube {
    let cube = DoublePrecisionCube::new(asof(), ids.iter().cloned(), dates(), SAMPLES, DEPTH)
        .unwrap();
    for i in 0..ids.len() {
        for d in 0..DEPTH {
            cube.set_t0((seed + i as u64 * 3 + d as u64) as f64, i, d).unwrap();
        }
        for date in 0..DATES {
            for s in 0..SAMPLES {
                for d in 0..DEPTH {
                    let v = ((seed * 7 + (i * 11 + date * 5 + s * 3 + d) as u64) % 23) as f64;
                    cube.set(v - 11.0, i, date, s, d).unwrap();
                }
            }
        }
    }
    cube
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn summing_reads_are_additive(sets in id_sets()) {
        let cubes: Vec<DoublePrecisionCube> = sets
            .iter()
            .enumerate()
            .map(|(k, ids)| populate(ids, k as u64 + 1))
            .collect();
        let refs: Vec<&dyn ScenarioCube> = cubes.iter().map(|c| c as &dyn ScenarioCube).collect();
        let joint = JointCube::new(refs, None, false, JointMode::Summing).unwrap();

        for (j, id) in joint.ids().iter().enumerate() {
            for d in 0..DEPTH {
                let expected: f64 = cubes
                    .iter()
                    .filter_map(|c| c.id_index(id).map(|i| c.get_t0(i, d).unwrap()))
                    .sum();
                prop_assert_eq!(joint.get_t0(j, d).unwrap(), expected);
            }
            for date in 0..DATES {
                for s in 0..SAMPLES {
                    for d in 0..DEPTH {
                        let expected: f64 = cubes
                            .iter()
                            .filter_map(|c| c.id_index(id).map(|i| c.get(i, date, s, d).unwrap()))
                            .sum();
                        prop_assert_eq!(joint.get(j, date, s, d).unwrap(), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn union_is_ordered_by_first_occurrence(sets in id_sets()) {
        let cubes: Vec<DoublePrecisionCube> = sets.iter().map(|ids| populate(ids, 0)).collect();
        let refs: Vec<&dyn ScenarioCube> = cubes.iter().map(|c| c as &dyn ScenarioCube).collect();
        let joint = JointCube::new(refs, None, false, JointMode::Summing).unwrap();

        let mut expected: Vec<String> = Vec::new();
        for ids in &sets {
            for id in ids {
                if !expected.contains(id) {
                    expected.push(id.clone());
                }
            }
        }
        prop_assert_eq!(joint.ids(), expected.as_slice());
    }

    #[test]
    fn exclusive_mode_accepts_exactly_disjoint_sources(sets in id_sets()) {
        let cubes: Vec<DoublePrecisionCube> = sets.iter().map(|ids| populate(ids, 5)).collect();
        let refs: Vec<&dyn ScenarioCube> = cubes.iter().map(|c| c as &dyn ScenarioCube).collect();
        let total: usize = sets.iter().map(Vec::len).sum();
        let mut all: Vec<&String> = sets.iter().flatten().collect();
        all.sort();
        all.dedup();
        let disjoint = all.len() == total;

        match JointCube::new(refs, None, false, JointMode::Exclusive) {
            Ok(joint) => {
                prop_assert!(disjoint);
                for (j, id) in joint.ids().iter().enumerate() {
                    let (c, i) = cubes
                        .iter()
                        .enumerate()
                        .find_map(|(c, cube)| cube.id_index(id).map(|i| (c, i)))
                        .unwrap();
                    prop_assert_eq!(
                        joint.get(j, 1, 2, 1).unwrap(),
                        cubes[c].get(i, 1, 2, 1).unwrap()
                    );
                }
            }
            Err(e) => {
                prop_assert!(!disjoint);
                prop_assert!(
                    matches!(e, CubeError::IdInMultipleCubes(_)),
                    "unexpected error: {}",
                    e
                );
            }
        }
    }

    #[test]
    fn joint_shape_follows_first_source(sets in id_sets()) {
        let cubes: Vec<DoublePrecisionCube> = sets.iter().map(|ids| populate(ids, 1)).collect();
        let refs: Vec<&dyn ScenarioCube> = cubes.iter().map(|c| c as &dyn ScenarioCube).collect();
        let joint = JointCube::new(refs, None, false, JointMode::Summing).unwrap();
        prop_assert_eq!(joint.num_dates(), DATES);
        prop_assert_eq!(joint.samples(), SAMPLES);
        prop_assert_eq!(joint.depth(), DEPTH);
        prop_assert_eq!(joint.asof(), asof());
    }
}

#[test]
fn mismatched_depth_is_rejected() {
    let a = DoublePrecisionCube::new(asof(), ["A"], dates(), SAMPLES, 2).unwrap();
    let b = DoublePrecisionCube::new(asof(), ["B"], dates(), SAMPLES, 3).unwrap();
    let err = JointCube::new(vec![&a, &b], None, false, JointMode::Exclusive)
        .err()
        .unwrap();
    assert!(err.to_string().contains("depth dimension 3"));
}
