//! Copying rules: Pulse, Directional, and Random Walk.

use rand::{Rng, RngCore, seq::SliceRandom};

use super::neighborhood::{CARDINAL, MOORE, PendingWrites, neighbors, scan_order};
use crate::config::{Direction, PatternParams, WalkMode};
use crate::grid::{EMPTY, Grid};

/// Every occupied cell pushes its color into its neighbors, scanning so the wave leads in
/// `direction`. Later writers in scan order win.
pub(super) fn pulse(grid: &Grid, direction: Direction, overtakes: bool) -> Grid {
    let mut pending = PendingWrites::for_grid(grid);
    let order = scan_order(
        grid.rows(),
        grid.cols(),
        direction.reverses_rows(),
        direction.reverses_cols(),
    );
    for (row, col) in order {
        let Some(color) = grid.get(row, col).filter(|&color| color != EMPTY) else {
            continue;
        };
        for (nr, nc) in neighbors(grid, row, col, &MOORE) {
            if overtakes || grid.get(nr, nc) == Some(EMPTY) {
                pending.overwrite(nr, nc, color);
            }
        }
    }
    let mut next = grid.clone();
    pending.apply(&mut next);
    next
}

/// Occupied cells spread with `spread_probability`, preferring the bias direction with
/// `bias_strength` and otherwise picking a uniformly random neighbor.
pub(super) fn directional(grid: &Grid, params: &PatternParams, rng: &mut dyn RngCore) -> Grid {
    // Reads `grid`, writes `next`: cells painted this step never spread again within it.
    let mut next = grid.clone();
    for (row, col, color) in grid.occupied() {
        if rng.random::<f64>() >= params.spread_probability {
            continue;
        }
        if let Some(bias) = params.bias
            && rng.random::<f64>() < params.bias_strength
        {
            let (dr, dc) = bias.delta();
            if let Some((nr, nc)) = grid.shifted(row, col, dr, dc) {
                next.set(nr, nc, color);
                continue;
            }
        }
        let candidates = neighbors(grid, row, col, &MOORE);
        if !candidates.is_empty() {
            let (nr, nc) = candidates[rng.random_range(0..candidates.len())];
            next.set(nr, nc, color);
        }
    }
    next
}

/// Occupied cells spread with `spread_probability` into up to `spread_count` shuffled
/// neighbors.
pub(super) fn random_walk(grid: &Grid, params: &PatternParams, rng: &mut dyn RngCore) -> Grid {
    let offsets: &[(isize, isize)] = match params.walk_mode {
        WalkMode::Any => &MOORE,
        WalkMode::Cardinal => &CARDINAL,
    };
    let mut next = grid.clone();
    for (row, col, color) in grid.occupied() {
        if rng.random::<f64>() >= params.spread_probability {
            continue;
        }
        let mut candidates = neighbors(grid, row, col, offsets);
        candidates.shuffle(rng);
        for &(nr, nc) in candidates.iter().take(params.spread_count) {
            next.set(nr, nc, color);
        }
    }
    next
}
