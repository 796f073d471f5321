//! Threshold rules: Crystallize, Erosion, and Strobe.

use rand::{Rng, RngCore};

use super::neighborhood::{ColorList, occupied_neighbor_colors, open_neighbor_count, plurality};
use crate::agents::StrobePhase;
use crate::config::PatternParams;
use crate::grid::{EMPTY, Grid};

/// Chance an occupied cell is considered for recoloring by Crystallize.
const CRYSTAL_RECOLOR_CHANCE: f64 = 0.05;

/// Empty cells adopt a plurality color backed by at least `threshold` neighbors. Occupied
/// cells occasionally adopt a surrounding foreign majority. Both passes read `grid` only.
pub(super) fn crystallize(grid: &Grid, threshold: usize, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let colors = occupied_neighbor_colors(grid, row, col);
            match grid.get(row, col) {
                Some(EMPTY) => {
                    if let Some((color, count)) = plurality(&colors)
                        && count >= threshold
                    {
                        next.set(row, col, color);
                    }
                }
                Some(own) => {
                    if rng.random::<f64>() >= CRYSTAL_RECOLOR_CHANCE {
                        continue;
                    }
                    let foreign: ColorList =
                        colors.into_iter().filter(|&color| color != own).collect();
                    if foreign.len() < threshold + 2 {
                        continue;
                    }
                    if let Some((color, count)) = plurality(&foreign)
                        && count > threshold
                    {
                        next.set(row, col, color);
                    }
                }
                None => {}
            }
        }
    }
    next
}

/// Occupied cells with at least `solidity` open neighbors clear with `rate`.
pub(super) fn erode(grid: &Grid, rate: f64, solidity: usize, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    for (row, col, _) in grid.occupied() {
        if open_neighbor_count(grid, row, col) >= solidity && rng.random::<f64>() < rate {
            next.set(row, col, EMPTY);
        }
    }
    next
}

/// Flips the stored phase, then runs the half-step it now names. A fresh or reset
/// phase is `Expand`, so the first call of a run contracts.
pub(super) fn strobe(grid: &Grid, params: &PatternParams, phase: &mut StrobePhase) -> Grid {
    let current = phase.flipped();
    *phase = current;
    let mut next = grid.clone();
    match current {
        StrobePhase::Expand => {
            for row in 0..grid.rows() {
                for col in 0..grid.cols() {
                    if grid.is_occupied(row, col) {
                        continue;
                    }
                    let colors = occupied_neighbor_colors(grid, row, col);
                    if colors.len() >= params.strobe_expand_threshold
                        && let Some((color, _)) = plurality(&colors)
                    {
                        next.set(row, col, color);
                    }
                }
            }
        }
        StrobePhase::Contract => {
            for (row, col, _) in grid.occupied() {
                if open_neighbor_count(grid, row, col) >= params.strobe_contract_threshold {
                    next.set(row, col, EMPTY);
                }
            }
        }
    }
    next
}
