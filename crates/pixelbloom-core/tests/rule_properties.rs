use pixelbloom_core::{
    AgentState, Cardinal, Engine, EngineConfig, Grid, LifeRules, MAX_WALKERS, PatternParams,
    Ripple, Rule, Tick, Walker, rotate_ring, step,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

fn speckled(rng: &mut SmallRng, rows: usize, cols: usize, density: f64) -> Grid {
    let mut grid = Grid::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            if rng.random::<f64>() < density {
                grid.set(row, col, rng.random_range(1..9));
            }
        }
    }
    grid
}

fn color_multiset(grid: &Grid) -> Vec<u32> {
    let mut colors: Vec<u32> = grid.occupied().map(|(_, _, color)| color).collect();
    colors.sort_unstable();
    colors
}

#[test]
fn dimensions_are_invariant_under_every_rule() {
    let mut rng = SmallRng::seed_from_u64(0xD1);
    let params = PatternParams::default();
    for (rows, cols) in [(1, 1), (1, 9), (3, 3), (17, 5), (20, 31)] {
        for rule in Rule::ALL {
            let mut grid = speckled(&mut rng, rows, cols, 0.3);
            let mut agents = AgentState::new();
            for _ in 0..5 {
                grid = step(rule, &grid, &params, &mut agents, &mut rng);
                assert_eq!((grid.rows(), grid.cols()), (rows, cols), "{rule}");
                grid.assert_coherent();
            }
        }
    }
}

#[test]
fn blank_grids_are_fixed_points() {
    let mut rng = SmallRng::seed_from_u64(0xB1A);
    let params = PatternParams {
        spread_probability: 1.0,
        jitter_chance: 1.0,
        flow_chance: 1.0,
        ripple_chance: 1.0,
        crystallize_threshold: 0,
        strobe_expand_threshold: 0,
        ..PatternParams::default()
    };
    for rule in Rule::ALL {
        let grid = Grid::new(13, 8);
        let mut agents = AgentState::new();
        for _ in 0..4 {
            assert_eq!(step(rule, &grid, &params, &mut agents, &mut rng), grid, "{rule}");
        }
    }
}

#[test]
fn jitter_and_flow_conserve_occupancy() {
    let mut rng = SmallRng::seed_from_u64(0xC0);
    for chance in [0.1, 0.5, 1.0] {
        for direction in [Cardinal::Up, Cardinal::Down, Cardinal::Left, Cardinal::Right] {
            let params = PatternParams {
                jitter_chance: chance,
                flow_chance: chance,
                flow_direction: direction,
                ..PatternParams::default()
            };
            for rule in [Rule::Jitter, Rule::Flow] {
                let mut grid = speckled(&mut rng, 15, 12, 0.6);
                let count = grid.occupied_count();
                let mut agents = AgentState::new();
                for _ in 0..8 {
                    grid = step(rule, &grid, &params, &mut agents, &mut rng);
                    assert_eq!(grid.occupied_count(), count, "{rule} {direction:?}");
                }
            }
        }
    }
}

#[test]
fn scramble_is_a_permutation() {
    let mut rng = SmallRng::seed_from_u64(0x5C);
    let params = PatternParams {
        scramble_swaps: 40,
        ..PatternParams::default()
    };
    let mut grid = speckled(&mut rng, 18, 18, 0.4);
    let colors = color_multiset(&grid);
    let occupied: Vec<_> = grid.occupied().map(|(r, c, _)| (r, c)).collect();
    let mut agents = AgentState::new();
    for _ in 0..10 {
        grid = step(Rule::Scramble, &grid, &params, &mut agents, &mut rng);
        assert_eq!(color_multiset(&grid), colors);
        let positions: Vec<_> = grid.occupied().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(positions, occupied);
    }
}

#[test]
fn vortex_ring_returns_after_eight_turns() {
    let mut rng = SmallRng::seed_from_u64(0x7);
    let original = speckled(&mut rng, 7, 7, 1.0);
    let mut grid = original.clone();
    for _ in 0..8 {
        let mut next = grid.clone();
        assert!(rotate_ring(&grid, &mut next, 3, 3));
        grid = next;
    }
    assert_eq!(grid, original);
}

#[test]
fn lone_conway_cell_dies_only_through_soft_death() {
    let mut grid = Grid::new(10, 10);
    grid.set(5, 5, 1);
    let mut rng = SmallRng::seed_from_u64(1);
    let mut agents = AgentState::new();

    let certain = PatternParams {
        conway: LifeRules::conway(),
        soft_death_chance: 1.0,
        ..PatternParams::default()
    };
    assert!(step(Rule::Conway, &grid, &certain, &mut agents, &mut rng).is_blank());

    let never = PatternParams {
        soft_death_chance: 0.0,
        ..certain
    };
    assert_eq!(step(Rule::Conway, &grid, &never, &mut agents, &mut rng), grid);
}

#[test]
fn corner_ripples_are_gone_after_seven_steps() {
    let mut grid = Grid::new(10, 10);
    let params = PatternParams {
        ripple_chance: 0.0,
        ..PatternParams::default()
    };
    let mut agents = AgentState::new();
    agents.ripples_mut().push(Ripple::new(0, 0, 1, 3.0));
    agents.ripples_mut().push(Ripple::new(9, 9, 2, 3.0));
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..7 {
        grid = step(Rule::Ripple, &grid, &params, &mut agents, &mut rng);
    }
    assert!(agents.ripples().is_empty());
}

#[test]
fn vein_population_is_capped_from_any_start() {
    let mut rng = SmallRng::seed_from_u64(0x7E);
    let params = PatternParams {
        vein_branch_chance: 0.9,
        ..PatternParams::default()
    };
    for start in [0usize, 10, 199, 200, 201, 1000] {
        let mut grid = speckled(&mut rng, 25, 25, 0.2);
        let mut agents = AgentState::new();
        for i in 0..start {
            agents.walkers_mut().push(Walker {
                row: i % 25,
                col: (i / 25) % 25,
                color: 1,
            });
        }
        for _ in 0..10 {
            grid = step(Rule::Vein, &grid, &params, &mut agents, &mut rng);
            assert!(agents.walkers().len() <= MAX_WALKERS);
        }
    }
}

#[test]
fn engine_run_is_reproducible_per_seed() {
    let run = |seed: u64| {
        let config = EngineConfig {
            rows: 48,
            cols: 48,
            rng_seed: Some(seed),
            history_capacity: 64,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config).expect("engine");
        engine.inject_shapes();
        for (i, rule) in Rule::ALL.into_iter().enumerate() {
            engine.set_rule(rule);
            engine.step();
            if i % 3 == 0 {
                engine.inject_dots();
            }
        }
        let history: Vec<_> = engine.history().cloned().collect();
        (history, engine.grid().clone())
    };
    let (history_a, grid_a) = run(0xDEADBEEF);
    let (history_b, grid_b) = run(0xDEADBEEF);
    assert_eq!(history_a, history_b);
    assert_eq!(grid_a, grid_b);
    assert_eq!(history_a.len(), Rule::ALL.len());
    assert_eq!(history_a.last().map(|summary| summary.tick), Some(Tick(14)));
}
