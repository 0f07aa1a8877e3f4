use std::sync::Arc;

use core_plan::{breadth_first, Board, Coord, Grid, PlannerConfig, TurnPlanner};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_board(size: u32, seed: u64) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut rows: Vec<Vec<u32>> = (0..size)
        .map(|_| {
            (0..size)
                .map(|_| if rng.gen_bool(0.15) { 0 } else { rng.gen_range(1..20) })
                .collect()
        })
        .collect();
    let centre = (size / 2) as usize;
    rows[centre][centre] = 10;
    Board::from_grid(&Grid::from_weights(&rows).expect("grid")).expect("board")
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachability");
    for size in [9u32, 19, 37] {
        let board = random_board(size, 0xb0a2_d000 + u64::from(size));
        let centre = Coord::new(size / 2, size / 2);
        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, _| {
            b.iter(|| breadth_first(&board, centre).expect("search"));
        });
    }
    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn_planner");
    group.sample_size(10);
    for size in [9u32, 19, 37] {
        let board = random_board(size, 0x5eed_0000 + u64::from(size));
        let config = Arc::new(PlannerConfig {
            home: Coord::new(size / 2, size / 2),
            horizon: 3,
            ..PlannerConfig::default()
        });
        let planner = TurnPlanner::new(config, board).expect("planner");
        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, _| {
            b.iter(|| planner.plan().expect("plan"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search, bench_plan);
criterion_main!(benches);
