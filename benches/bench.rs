use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nonogram_solver::csp::SatBackend;
use nonogram_solver::nonogram::generate::random_puzzle;
use nonogram_solver::nonogram::{Enumerator, Puzzle, compile};
use nonogram_solver::sat::restarter::{Geometric, Luby, Never};
use nonogram_solver::sat::solver::{Config, SolverConfig};
use nonogram_solver::sat::variable_selection::{FixedOrder, Vsids};
use std::hint::black_box;
use std::time::Duration;

fn puzzles(size: usize) -> Vec<Puzzle> {
    let mut rng = fastrand::Rng::with_seed(17);
    (0..8).map(|_| random_puzzle(size, 0.5, &mut rng)).collect()
}

fn decide_all<C: SolverConfig>(puzzles: &[Puzzle]) {
    for puzzle in puzzles {
        let instance = compile(puzzle).unwrap();
        let uniqueness = Enumerator::new(&instance, SatBackend::<C>::new())
            .unwrap()
            .is_unique(None)
            .unwrap();
        black_box(uniqueness);
    }
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for size in [10, 20, 30] {
        let puzzles = puzzles(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &puzzles, |b, puzzles| {
            b.iter(|| {
                for puzzle in puzzles {
                    black_box(compile(puzzle).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_uniqueness(c: &mut Criterion) {
    let mut group = c.benchmark_group("uniqueness");
    group.measurement_time(Duration::from_secs(10));
    for size in [5, 10, 15] {
        let puzzles = puzzles(size);
        group.bench_with_input(BenchmarkId::new("vsids-luby", size), &puzzles, |b, puzzles| {
            b.iter(|| decide_all::<Config<Vsids, Luby<100>>>(puzzles));
        });
    }
    group.finish();
}

fn bench_configs(c: &mut Criterion) {
    let puzzles = puzzles(12);
    let mut group = c.benchmark_group("configs");

    group.bench_function("vsids - luby", |b| {
        b.iter(|| decide_all::<Config<Vsids, Luby<100>>>(&puzzles));
    });
    group.bench_function("vsids - geometric", |b| {
        b.iter(|| decide_all::<Config<Vsids, Geometric<2>>>(&puzzles));
    });
    group.bench_function("vsids - never", |b| {
        b.iter(|| decide_all::<Config<Vsids, Never>>(&puzzles));
    });
    group.bench_function("fixed order - luby", |b| {
        b.iter(|| decide_all::<Config<FixedOrder, Luby<100>>>(&puzzles));
    });
    group.finish();
}

criterion_group!(benches, bench_compile, bench_uniqueness, bench_configs);
criterion_main!(benches);
