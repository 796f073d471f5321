//! Global rearrangement: Vortex and Scramble. Neither creates nor destroys colors.

use rand::{Rng, RngCore};

use crate::grid::{EMPTY, Grid};

/// The eight neighbors of an anchor, clockwise from the top-left corner.
const RING: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Rotate the ring around `(row, col)` one position clockwise, reading from `source` and
/// writing into `target`. The anchor must be an interior cell of both grids; anything else
/// is left untouched and reported as `false`.
pub fn rotate_ring(source: &Grid, target: &mut Grid, row: usize, col: usize) -> bool {
    let mut values = [EMPTY; 8];
    for (slot, &(dr, dc)) in values.iter_mut().zip(&RING) {
        match source.shifted(row, col, dr, dc).and_then(|(r, c)| source.get(r, c)) {
            Some(color) => *slot = color,
            None => return false,
        }
    }
    let in_target = RING
        .iter()
        .all(|&(dr, dc)| target.shifted(row, col, dr, dc).is_some());
    if !in_target {
        return false;
    }
    for (k, &(dr, dc)) in RING.iter().enumerate() {
        if let Some((r, c)) = target.shifted(row, col, dr, dc) {
            target.set(r, c, values[(k + RING.len() - 1) % RING.len()]);
        }
    }
    true
}

/// Rotate `count` random interior rings; each reads the pre-step grid.
pub(super) fn vortex(grid: &Grid, count: usize, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    if grid.rows() < 3 || grid.cols() < 3 {
        return next;
    }
    for _ in 0..count {
        let row = 1 + rng.random_range(0..grid.rows() - 2);
        let col = 1 + rng.random_range(0..grid.cols() - 2);
        rotate_ring(grid, &mut next, row, col);
    }
    next
}

/// Swap colors between distinct random occupied cells, at most `swaps` times and never
/// more than half the occupied count.
pub(super) fn scramble(grid: &Grid, swaps: usize, rng: &mut dyn RngCore) -> Grid {
    let mut next = grid.clone();
    let occupied: Vec<(usize, usize)> = grid.occupied().map(|(row, col, _)| (row, col)).collect();
    if occupied.len() < 2 {
        return next;
    }
    for _ in 0..swaps.min(occupied.len() / 2) {
        let first = rng.random_range(0..occupied.len());
        let mut second = rng.random_range(0..occupied.len());
        while second == first {
            second = rng.random_range(0..occupied.len());
        }
        let (r1, c1) = occupied[first];
        let (r2, c2) = occupied[second];
        if let (Some(a), Some(b)) = (next.get(r1, c1), next.get(r2, c2)) {
            next.set(r1, c1, b);
            next.set(r2, c2, a);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn numbered(rows: usize, cols: usize) -> Grid {
        let cells = (1..=(rows * cols) as u32).collect();
        Grid::from_cells(rows, cols, cells).expect("grid")
    }

    fn sorted(grid: &Grid) -> Vec<u32> {
        let mut cells = grid.cells().to_vec();
        cells.sort_unstable();
        cells
    }

    #[test]
    fn ring_rotates_clockwise() {
        let grid = numbered(3, 3);
        let mut next = grid.clone();
        assert!(rotate_ring(&grid, &mut next, 1, 1));
        // 1 2 3      4 1 2
        // 4 5 6  ->  7 5 3
        // 7 8 9      8 9 6
        assert_eq!(next.cells(), &[4, 1, 2, 7, 5, 3, 8, 9, 6]);
    }

    #[test]
    fn eight_rotations_restore_the_ring() {
        let original = numbered(5, 6);
        let mut grid = original.clone();
        for turn in 1..=8 {
            let mut next = grid.clone();
            assert!(rotate_ring(&grid, &mut next, 2, 3));
            grid = next;
            assert_eq!(grid == original, turn == 8, "turn {turn}");
        }
    }

    #[test]
    fn ring_on_the_border_is_refused() {
        let grid = numbered(3, 3);
        let mut next = grid.clone();
        assert!(!rotate_ring(&grid, &mut next, 0, 1));
        assert_eq!(next, grid);
    }

    #[test]
    fn vortex_preserves_the_color_multiset_for_single_anchor() {
        let grid = numbered(3, 3);
        let mut rng = SmallRng::seed_from_u64(4);
        let next = vortex(&grid, 1, &mut rng);
        assert_eq!(sorted(&next), sorted(&grid));
        assert_eq!(next.get(1, 1), Some(5));
    }

    #[test]
    fn vortex_is_a_no_op_without_interior() {
        let grid = numbered(2, 9);
        let mut rng = SmallRng::seed_from_u64(4);
        assert_eq!(vortex(&grid, 50, &mut rng), grid);
    }

    #[test]
    fn scramble_permutes_colors() {
        let mut rng = SmallRng::seed_from_u64(0x5C4A);
        let mut grid = Grid::new(8, 8);
        for idx in 0..40 {
            grid.set(idx / 8, (idx * 3) % 8, (idx % 7 + 1) as u32);
        }
        for swaps in [0, 1, 15, 1000] {
            let next = scramble(&grid, swaps, &mut rng);
            assert_eq!(sorted(&next), sorted(&grid));
            let empty_cells: Vec<_> = grid
                .cells()
                .iter()
                .zip(next.cells())
                .filter(|(before, _)| **before == EMPTY)
                .map(|(_, after)| *after)
                .collect();
            assert!(empty_cells.iter().all(|&color| color == EMPTY));
        }
    }

    #[test]
    fn scramble_needs_two_cells() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, 4);
        let mut rng = SmallRng::seed_from_u64(2);
        assert_eq!(scramble(&grid, 10, &mut rng), grid);
    }
}
