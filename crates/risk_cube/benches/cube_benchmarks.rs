//! Criterion benchmarks for cube population and joint reads.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rayon::prelude::*;
use risk_cube::{DoublePrecisionCube, JointCube, JointMode, ScenarioCube};

fn grid(n_dates: usize) -> (NaiveDate, Vec<NaiveDate>) {
    let asof = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = (1..=n_dates as u64)
        .map(|k| asof + chrono::Days::new(7 * k))
        .collect();
    (asof, dates)
}

fn make_cube(prefix: &str, n_ids: usize, n_dates: usize, samples: usize) -> DoublePrecisionCube {
    let (asof, dates) = grid(n_dates);
    let ids: Vec<String> = (0..n_ids).map(|i| format!("{prefix}{i}")).collect();
    DoublePrecisionCube::new(asof, ids, dates, samples, 1).unwrap()
}

fn bench_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("cube_population");

    for (n_ids, samples) in [(10, 1000), (100, 1000), (100, 5000)] {
        let label = format!("{}ids_{}samples", n_ids, samples);
        let cube = make_cube("T", n_ids, 52, samples);

        group.bench_with_input(BenchmarkId::new("parallel", &label), &cube, |b, cube| {
            b.iter(|| {
                (0..cube.num_ids()).into_par_iter().for_each(|id| {
                    for date in 0..cube.num_dates() {
                        for s in 0..cube.samples() {
                            cube.set(black_box(1.0), id, date, s, 0).unwrap();
                        }
                    }
                })
            });
        });
    }

    group.finish();
}

fn bench_joint_reads(c: &mut Criterion) {
    let a = make_cube("A", 50, 52, 1000);
    let b = make_cube("B", 50, 52, 1000);

    c.bench_function("joint_exclusive_read", |bench| {
        let joint = JointCube::new(vec![&a, &b], None, true, JointMode::Exclusive).unwrap();
        bench.iter(|| {
            let mut sum = 0.0;
            for id in 0..joint.num_ids() {
                for s in 0..joint.samples() {
                    sum += joint.get(id, 26, s, 0).unwrap();
                }
            }
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_population, bench_joint_reads);
criterion_main!(benches);
