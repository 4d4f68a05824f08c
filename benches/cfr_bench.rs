//! Benchmarks for CFR solver.

use std::sync::Arc;

use cfr_solver::cfr::{
    DiscountParams, OutcomeSampler, PolicyTable, SharedPool, Solver, SolverConfig, StrategyProfile, Trainer,
    Traversal,
};
use cfr_solver::games::kuhn::KuhnNode;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn kuhn_vanilla_iteration_benchmark(c: &mut Criterion) {
    let mut trainer = Trainer::new(KuhnNode::new(), SolverConfig::vanilla().with_seed(42)).unwrap();

    c.bench_function("kuhn_vanilla_iteration", |b| {
        b.iter(|| {
            trainer.run_iteration();
            black_box(trainer.iteration())
        })
    });
}

fn kuhn_external_sampling_benchmark(c: &mut Criterion) {
    c.bench_function("kuhn_external_sampling_1000_iterations", |b| {
        b.iter(|| {
            let config = SolverConfig::external_sampling().with_seed(42);
            let mut trainer = Trainer::new(KuhnNode::new(), config).unwrap();
            trainer.train(black_box(1000)).iterations
        })
    });
}

fn kuhn_outcome_sampling_run_benchmark(c: &mut Criterion) {
    let profile = Arc::new(PolicyTable::new(2, DiscountParams::default()));
    let solver = Solver::new(
        profile.clone(),
        OutcomeSampler { exploration: 0.6 },
        SharedPool::new(),
        Traversal::sampled(),
    );
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("kuhn_outcome_sampling_run", |b| {
        b.iter(|| {
            let mut root = KuhnNode::new();
            let value = solver.run(&mut root, &mut rng);
            profile.update();
            black_box(value)
        })
    });
}

criterion_group!(
    benches,
    kuhn_vanilla_iteration_benchmark,
    kuhn_external_sampling_benchmark,
    kuhn_outcome_sampling_run_benchmark
);
criterion_main!(benches);
