//! Bounded neighbor lookups, plurality voting, scan orders, and deferred writes.

use smallvec::SmallVec;

use crate::ColorIndex;
use crate::grid::{EMPTY, Grid};

/// Moore offsets in row-major order.
pub(crate) const MOORE: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Edge-adjacent offsets in row-major order.
pub(crate) const CARDINAL: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

pub(crate) type NeighborList = SmallVec<[(usize, usize); 8]>;
pub(crate) type ColorList = SmallVec<[ColorIndex; 8]>;

/// In-bounds neighbors of `(row, col)` for the given offsets.
pub(crate) fn neighbors(
    grid: &Grid,
    row: usize,
    col: usize,
    offsets: &[(isize, isize)],
) -> NeighborList {
    offsets
        .iter()
        .filter_map(|&(dr, dc)| grid.shifted(row, col, dr, dc))
        .collect()
}

/// Colors of the occupied Moore neighbors, in offset order.
pub(crate) fn occupied_neighbor_colors(grid: &Grid, row: usize, col: usize) -> ColorList {
    MOORE
        .iter()
        .filter_map(|&(dr, dc)| grid.shifted(row, col, dr, dc))
        .filter_map(|(nr, nc)| grid.get(nr, nc))
        .filter(|&color| color != EMPTY)
        .collect()
}

/// Moore neighbors that are empty or outside the grid.
pub(crate) fn open_neighbor_count(grid: &Grid, row: usize, col: usize) -> usize {
    MOORE
        .iter()
        .filter(|&&(dr, dc)| {
            grid.shifted(row, col, dr, dc)
                .and_then(|(nr, nc)| grid.get(nr, nc))
                .is_none_or(|color| color == EMPTY)
        })
        .count()
}

/// Most frequent color and its count. Ties go to the lowest color index.
pub(crate) fn plurality(colors: &[ColorIndex]) -> Option<(ColorIndex, usize)> {
    let mut best: Option<(ColorIndex, usize)> = None;
    for &candidate in colors {
        let count = colors.iter().filter(|&&color| color == candidate).count();
        let better = match best {
            None => true,
            Some((color, best_count)) => {
                count > best_count || (count == best_count && candidate < color)
            }
        };
        if better {
            best = Some((candidate, count));
        }
    }
    best
}

/// Row-major traversal with either axis optionally reversed.
pub(crate) fn scan_order(
    rows: usize,
    cols: usize,
    reverse_rows: bool,
    reverse_cols: bool,
) -> impl Iterator<Item = (usize, usize)> {
    (0..rows).flat_map(move |i| {
        let row = if reverse_rows { rows - 1 - i } else { i };
        (0..cols).map(move |j| {
            let col = if reverse_cols { cols - 1 - j } else { j };
            (row, col)
        })
    })
}

/// Writes collected during a scan and applied once it finishes.
pub(crate) struct PendingWrites {
    cols: usize,
    slots: Vec<Option<ColorIndex>>,
    touched: Vec<usize>,
}

impl PendingWrites {
    pub(crate) fn for_grid(grid: &Grid) -> Self {
        Self {
            cols: grid.cols(),
            slots: vec![None; grid.rows() * grid.cols()],
            touched: Vec::new(),
        }
    }

    /// Record a write; a later write to the same cell replaces it.
    pub(crate) fn overwrite(&mut self, row: usize, col: usize, color: ColorIndex) {
        let idx = row * self.cols + col;
        if self.slots[idx].replace(color).is_none() {
            self.touched.push(idx);
        }
    }

    /// Record a write only if nothing claimed the cell yet. Returns whether it was claimed.
    pub(crate) fn claim(&mut self, row: usize, col: usize, color: ColorIndex) -> bool {
        let idx = row * self.cols + col;
        if self.slots[idx].is_some() {
            return false;
        }
        self.slots[idx] = Some(color);
        self.touched.push(idx);
        true
    }

    pub(crate) fn is_claimed(&self, row: usize, col: usize) -> bool {
        self.slots[row * self.cols + col].is_some()
    }

    pub(crate) fn apply(self, grid: &mut Grid) {
        let cells = grid.cells_mut();
        for idx in self.touched {
            if let Some(color) = self.slots[idx] {
                cells[idx] = color;
            }
        }
    }
}
