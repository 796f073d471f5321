//! Ripple: expanding rings painted onto empty cells.

use rand::{Rng, RngCore};

use crate::agents::{RIPPLE_GROWTH, Ripple};
use crate::grid::{EMPTY, Grid};

/// Angular spacing of the painted points, in degrees.
const POINT_SPACING_DEG: usize = 15;
/// Target number of seeding samples spanning the grid.
const SEED_SAMPLES: f64 = 50.0;

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn paint_ring(next: &mut Grid, ripple: &Ripple) {
    let radius = round_half_up(ripple.radius);
    for degrees in (0..360).step_by(POINT_SPACING_DEG) {
        let (sin, cos) = (degrees as f64).to_radians().sin_cos();
        let row = round_half_up(ripple.row as f64 + radius * sin);
        let col = round_half_up(ripple.col as f64 + radius * cos);
        if row < 0.0 || col < 0.0 {
            continue;
        }
        let (row, col) = (row as usize, col as usize);
        if next.get(row, col) == Some(EMPTY) {
            next.set(row, col, ripple.color);
        }
    }
}

/// Sampling stride so roughly fifty samples span the grid.
pub(crate) fn seed_stride(rows: usize, cols: usize) -> usize {
    (((rows * cols) as f64).sqrt() / SEED_SAMPLES).floor().max(1.0) as usize
}

/// Paint and grow live ripples, drop spent ones, then seed new ripples from a strided
/// sample of the pre-step grid.
pub(super) fn advance(
    grid: &Grid,
    chance: f64,
    ripples: &mut Vec<Ripple>,
    rng: &mut dyn RngCore,
) -> Grid {
    let mut next = grid.clone();
    for ripple in ripples.iter_mut() {
        paint_ring(&mut next, ripple);
        ripple.radius += RIPPLE_GROWTH;
    }
    ripples.retain(|ripple| !ripple.is_spent());

    let stride = seed_stride(grid.rows(), grid.cols());
    let max_radius = grid.rows().max(grid.cols()) as f64 / 3.0;
    for row in (0..grid.rows()).step_by(stride) {
        for col in (0..grid.cols()).step_by(stride) {
            if let Some(color) = grid.get(row, col).filter(|&color| color != EMPTY)
                && rng.random::<f64>() < chance
            {
                ripples.push(Ripple::new(row, col, color, max_radius));
            }
        }
    }
    next
}
