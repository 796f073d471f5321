//! Random dot and shape injection.

use rand::{Rng, RngCore};
use std::ops::RangeInclusive;

use crate::grid::{Grid, Palette};

/// Dots placed per injection.
pub const DOTS_PER_INJECTION: RangeInclusive<usize> = 5..=10;
/// Shapes placed per injection.
pub const SHAPES_PER_INJECTION: RangeInclusive<usize> = 1..=2;
const RECT_EXTENT: RangeInclusive<usize> = 3..=8;
const LINE_LENGTH: RangeInclusive<usize> = 5..=14;
/// Rectangles start this far from the bottom/right edge when the grid allows it.
const RECT_MARGIN: usize = 5;

/// Scatter 5 to 10 single cells in random palette colors. Returns the input unchanged when
/// the palette has no paintable colors or the grid has no cells.
pub fn inject_dots(grid: &Grid, palette: &Palette, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    let colors = palette.paint_indices();
    if colors.is_empty() || grid.rows() == 0 || grid.cols() == 0 {
        return next;
    }
    for _ in 0..rng.random_range(DOTS_PER_INJECTION) {
        let row = rng.random_range(0..grid.rows());
        let col = rng.random_range(0..grid.cols());
        let color = rng.random_range(colors.clone());
        next.set(row, col, color);
    }
    next
}

/// Draw one or two filled rectangles or straight line segments, clipped to the grid.
pub fn inject_shapes(grid: &Grid, palette: &Palette, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    let colors = palette.paint_indices();
    let (rows, cols) = (grid.rows(), grid.cols());
    if colors.is_empty() || rows == 0 || cols == 0 {
        return next;
    }
    for _ in 0..rng.random_range(SHAPES_PER_INJECTION) {
        let color = rng.random_range(colors.clone());
        if rng.random::<f64>() > 0.5 {
            let top = rng.random_range(0..rows.saturating_sub(RECT_MARGIN).max(1));
            let left = rng.random_range(0..cols.saturating_sub(RECT_MARGIN).max(1));
            let width = rng.random_range(RECT_EXTENT);
            let height = rng.random_range(RECT_EXTENT);
            for row in top..(top + height).min(rows) {
                for col in left..(left + width).min(cols) {
                    next.set(row, col, color);
                }
            }
        } else {
            let row = rng.random_range(0..rows);
            let col = rng.random_range(0..cols);
            let horizontal = rng.random::<f64>() > 0.5;
            let length = rng.random_range(LINE_LENGTH);
            for offset in 0..length {
                if horizontal {
                    next.set(row, col + offset, color);
                } else {
                    next.set(row + offset, col, color);
                }
            }
        }
    }
    next
}
