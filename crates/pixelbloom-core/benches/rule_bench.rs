use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use pixelbloom_core::{AgentState, Grid, Palette, PatternParams, Rule, inject_shapes, step};
use rand::{SeedableRng, rngs::SmallRng};
use std::time::Duration;

fn seeded_grid(size: usize, seed: u64) -> Grid {
    let mut rng = SmallRng::seed_from_u64(seed);
    let palette = Palette::default();
    let mut grid = Grid::new(size, size);
    for _ in 0..size {
        grid = inject_shapes(&grid, &palette, &mut rng);
    }
    grid
}

fn bench_rule_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_step");
    let samples: usize = std::env::var("PB_BENCH_SAMPLES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(30);
    let size: usize = std::env::var("PB_BENCH_GRID")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(375);
    group.sample_size(samples);
    group.measurement_time(Duration::from_secs(5));

    let grid = seeded_grid(size, 0xBEEF);
    let params = PatternParams::default();
    for rule in Rule::ALL {
        group.bench_function(format!("{rule}_{size}x{size}"), |b| {
            b.iter_batched(
                || (AgentState::new(), SmallRng::seed_from_u64(0x5EED)),
                |(mut agents, mut rng)| {
                    let next = step(rule, &grid, &params, &mut agents, &mut rng);
                    std::hint::black_box(next);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rule_steps);
criterion_main!(benches);
