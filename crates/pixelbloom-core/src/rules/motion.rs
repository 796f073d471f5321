//! Moving rules: Jitter and Flow. A move vacates the origin and fills one empty cell,
//! so occupancy is conserved exactly.

use rand::{Rng, RngCore};
use smallvec::SmallVec;

use super::neighborhood::{MOORE, PendingWrites, neighbors, scan_order};
use crate::config::{Cardinal, Direction};
use crate::grid::{EMPTY, Grid};

fn apply_moves(grid: &Grid, pending: PendingWrites, vacated: &[(usize, usize)]) -> Grid {
    let mut next = grid.clone();
    for &(row, col) in vacated {
        next.set(row, col, EMPTY);
    }
    pending.apply(&mut next);
    next
}

/// Each occupied cell moves into a random empty neighbor with `chance`. The first origin to
/// claim a destination wins; losers stay put.
pub(super) fn jitter(grid: &Grid, chance: f64, rng: &mut dyn RngCore) -> Grid {
    let mut pending = PendingWrites::for_grid(grid);
    let mut vacated = Vec::new();
    for (row, col, color) in grid.occupied() {
        if rng.random::<f64>() >= chance {
            continue;
        }
        let empty: SmallVec<[(usize, usize); 8]> = neighbors(grid, row, col, &MOORE)
            .into_iter()
            .filter(|&(nr, nc)| grid.get(nr, nc) == Some(EMPTY))
            .collect();
        if empty.is_empty() {
            continue;
        }
        let (nr, nc) = empty[rng.random_range(0..empty.len())];
        if pending.claim(nr, nc, color) {
            vacated.push((row, col));
        }
    }
    apply_moves(grid, pending, &vacated)
}

/// Each occupied cell moves one step in `direction` with `chance` when the destination is
/// empty. Cells nearest the leading edge are scanned first.
pub(super) fn flow(grid: &Grid, direction: Cardinal, chance: f64, rng: &mut dyn RngCore) -> Grid {
    let direction = Direction::from(direction);
    let (dr, dc) = direction.delta();
    let mut pending = PendingWrites::for_grid(grid);
    let mut vacated = Vec::new();
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
        if rng.random::<f64>() >= chance {
            continue;
        }
        let Some((nr, nc)) = grid.shifted(row, col, dr, dc) else {
            continue;
        };
        if grid.get(nr, nc) == Some(EMPTY) && pending.claim(nr, nc, color) {
            vacated.push((row, col));
        }
    }
    apply_moves(grid, pending, &vacated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn scattered(rng: &mut SmallRng, rows: usize, cols: usize) -> Grid {
        let mut grid = Grid::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                if rng.random::<f64>() < 0.45 {
                    grid.set(row, col, rng.random_range(1..6));
                }
            }
        }
        grid
    }

    fn sorted_colors(grid: &Grid) -> Vec<u32> {
        let mut colors: Vec<u32> = grid.occupied().map(|(_, _, color)| color).collect();
        colors.sort_unstable();
        colors
    }

    #[test]
    fn jitter_conserves_occupancy_and_colors() {
        let mut rng = SmallRng::seed_from_u64(0xA11CE);
        for chance in [0.0, 0.4, 1.0] {
            let mut grid = scattered(&mut rng, 16, 11);
            for _ in 0..10 {
                let next = jitter(&grid, chance, &mut rng);
                assert_eq!(next.occupied_count(), grid.occupied_count());
                assert_eq!(sorted_colors(&next), sorted_colors(&grid));
                grid = next;
            }
        }
    }

    #[test]
    fn flow_conserves_occupancy_in_every_direction() {
        let mut rng = SmallRng::seed_from_u64(0xF10);
        for direction in [Cardinal::Up, Cardinal::Down, Cardinal::Left, Cardinal::Right] {
            let mut grid = scattered(&mut rng, 9, 14);
            for _ in 0..10 {
                let next = flow(&grid, direction, 0.7, &mut rng);
                assert_eq!(next.occupied_count(), grid.occupied_count());
                assert_eq!(sorted_colors(&next), sorted_colors(&grid));
                grid = next;
            }
        }
    }

    #[test]
    fn flow_moves_a_column_one_step_without_collapsing() {
        let grid = Grid::from_rows(vec![vec![1], vec![2], vec![0], vec![0]]).expect("grid");
        let mut rng = SmallRng::seed_from_u64(3);
        let next = flow(&grid, Cardinal::Down, 1.0, &mut rng);
        // Only the leading cell has an empty destination in the old grid.
        assert_eq!(next.cells(), &[1, 0, 2, 0]);
        let next = flow(&next, Cardinal::Down, 1.0, &mut rng);
        assert_eq!(next.cells(), &[0, 1, 0, 2]);
    }

    #[test]
    fn flow_stops_at_the_edge() {
        let grid = Grid::from_rows(vec![vec![0, 0, 3]]).expect("grid");
        let mut rng = SmallRng::seed_from_u64(8);
        assert_eq!(flow(&grid, Cardinal::Right, 1.0, &mut rng), grid);
    }

    #[test]
    fn jitter_leaves_boxed_in_cells_alone() {
        let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).expect("grid");
        let mut rng = SmallRng::seed_from_u64(6);
        assert_eq!(jitter(&grid, 1.0, &mut rng), grid);
    }
}
