use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use consmdp::{examples, solve, Objective};

/// Positive reachability on the double flower needs a quadratic
/// number of fixpoint rounds in the capacity.
fn flower_pos_reach(c: &mut Criterion) {
    let mut group = c.benchmark_group("flower_pos_reach");
    for cap in [8u32, 16, 32, 64] {
        let mdp = examples::double_flower(cap, 6);
        group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, &cap| {
            b.iter(|| solve(&mdp, cap + 2, &[2], Objective::PosReach).unwrap());
        });
    }
    group.finish();
}

fn flower_buchi(c: &mut Criterion) {
    let mut group = c.benchmark_group("flower_buchi");
    for cap in [16u32, 32] {
        let mdp = examples::double_flower(cap, 6);
        group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, &cap| {
            b.iter(|| solve(&mdp, cap + 2, &[2], Objective::Buchi).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, flower_pos_reach, flower_buchi);
criterion_main!(benches);
