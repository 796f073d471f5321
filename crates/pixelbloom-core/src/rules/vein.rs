//! Vein: persistent walkers that wander, seek occupied cells, and branch.

use pixelbloom_index::{OccupancyIndex, UniformGridIndex};
use rand::{Rng, RngCore};
use tracing::warn;

use crate::ColorIndex;
use crate::agents::{MAX_WALKERS, Walker};
use crate::config::PatternParams;
use crate::grid::Grid;

/// Chance each occupied cell seeds a walker on first activation.
const SEED_SAMPLE_CHANCE: f64 = 0.1;
/// Walkers drawn from arbitrary occupied cells when sampling seeds none.
const FALLBACK_SEEDS: usize = 5;
/// Seek targets must be strictly farther than this squared distance.
const SEEK_MIN_DISTANCE_SQ: u64 = 1;

fn seed(occupied: &[(usize, usize, ColorIndex)], walkers: &mut Vec<Walker>, rng: &mut dyn RngCore) {
    for &(row, col, color) in occupied {
        if rng.random::<f64>() < SEED_SAMPLE_CHANCE {
            walkers.push(Walker { row, col, color });
        }
    }
    if walkers.is_empty() {
        for _ in 0..FALLBACK_SEEDS.min(occupied.len()) {
            let (row, col, color) = occupied[rng.random_range(0..occupied.len())];
            walkers.push(Walker { row, col, color });
        }
    }
}

fn step_toward(from: usize, to: usize) -> isize {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Uniform step of -1, 0 or 1 along one axis.
fn random_delta(rng: &mut dyn RngCore) -> isize {
    rng.random_range(-1i32..=1) as isize
}

fn clamp_step(position: usize, delta: isize, len: usize) -> usize {
    position
        .saturating_add_signed(delta)
        .min(len.saturating_sub(1))
}

/// Move every existing walker one cell, painting as it goes. Walkers spawned this step do
/// not move until the next one; the population is capped at [`MAX_WALKERS`].
pub(super) fn advance(
    grid: &Grid,
    params: &PatternParams,
    walkers: &mut Vec<Walker>,
    rng: &mut dyn RngCore,
) -> Grid {
    let mut next = grid.clone();
    let occupied: Vec<(usize, usize, ColorIndex)> = grid.occupied().collect();
    if walkers.is_empty() {
        seed(&occupied, walkers, rng);
    }
    if walkers.is_empty() {
        return next;
    }

    let cells: Vec<(usize, usize)> = occupied.iter().map(|&(row, col, _)| (row, col)).collect();
    let mut index = UniformGridIndex::default();
    let index = match index.rebuild(grid.rows(), grid.cols(), &cells) {
        Ok(()) => Some(index),
        Err(err) => {
            warn!(%err, "vein target index unavailable; walkers will wander");
            None
        }
    };

    for i in 0..walkers.len() {
        let walker = walkers[i];
        let (dr, dc) = if !cells.is_empty() && rng.random::<f64>() < params.vein_seek_strength {
            index
                .as_ref()
                .and_then(|index| index.nearest_beyond(walker.row, walker.col, SEEK_MIN_DISTANCE_SQ))
                .map_or((0, 0), |target| {
                    (
                        step_toward(walker.row, target.row),
                        step_toward(walker.col, target.col),
                    )
                })
        } else {
            (random_delta(rng), random_delta(rng))
        };
        let moved = Walker {
            row: clamp_step(walker.row, dr, grid.rows()),
            col: clamp_step(walker.col, dc, grid.cols()),
            color: walker.color,
        };
        walkers[i] = moved;
        next.set(moved.row, moved.col, moved.color);
        if rng.random::<f64>() < params.vein_branch_chance {
            walkers.push(moved);
        }
    }
    walkers.truncate(MAX_WALKERS);
    next
}
