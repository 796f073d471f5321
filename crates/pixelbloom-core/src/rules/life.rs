//! Life-like birth/death rules (Conway and Tendrils).

use rand::{Rng, RngCore};

use super::neighborhood::{occupied_neighbor_colors, plurality};
use crate::ColorIndex;
use crate::config::LifeRules;
use crate::grid::{EMPTY, Grid};

/// Color given to a birth that has no colored neighbor to inherit from.
const FALLBACK_COLOR: ColorIndex = 1;

/// Starts from a copy of `grid`; failing survivors die with `death_chance` and empty cells
/// whose live count is in `born` take the plurality neighbor color.
pub(super) fn evolve(
    grid: &Grid,
    rules: &LifeRules,
    death_chance: f64,
    rng: &mut dyn RngCore,
) -> Grid {
    let mut next = grid.clone();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let colors = occupied_neighbor_colors(grid, row, col);
            let live = colors.len();
            if grid.is_occupied(row, col) {
                if !rules.survives(live) && rng.random::<f64>() < death_chance {
                    next.set(row, col, EMPTY);
                }
            } else if rules.is_born(live) {
                let color = plurality(&colors).map_or(FALLBACK_COLOR, |(color, _)| color);
                next.set(row, col, color);
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn lone_cell() -> Grid {
        let mut grid = Grid::new(10, 10);
        grid.set(5, 5, 1);
        grid
    }

    #[test]
    fn isolated_cell_dies_when_death_is_certain() {
        let mut rng = SmallRng::seed_from_u64(1);
        let next = evolve(&lone_cell(), &LifeRules::conway(), 1.0, &mut rng);
        assert!(next.is_blank());
    }

    #[test]
    fn isolated_cell_survives_when_death_is_disabled() {
        let mut rng = SmallRng::seed_from_u64(1);
        let grid = lone_cell();
        let next = evolve(&grid, &LifeRules::conway(), 0.0, &mut rng);
        assert_eq!(next, grid);
    }

    #[test]
    fn birth_takes_plurality_color_with_lowest_index_tie_break() {
        // Center has three live neighbors: two of color 4 and one of 2.
        let grid = Grid::from_rows(vec![vec![4, 0, 4], vec![0, 0, 0], vec![0, 2, 0]])
            .expect("grid");
        let mut rng = SmallRng::seed_from_u64(3);
        let next = evolve(&grid, &LifeRules::conway(), 0.0, &mut rng);
        assert_eq!(next.get(1, 1), Some(4));

        // Three distinct colors tie at one apiece; the lowest index wins.
        let grid = Grid::from_rows(vec![vec![6, 0, 3], vec![0, 0, 0], vec![0, 5, 0]])
            .expect("grid");
        let next = evolve(&grid, &LifeRules::conway(), 0.0, &mut rng);
        assert_eq!(next.get(1, 1), Some(3));
    }

    #[test]
    fn tendrils_grow_from_single_neighbors() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, 7);
        let mut rng = SmallRng::seed_from_u64(9);
        let next = evolve(&grid, &LifeRules::tendrils(), 0.0, &mut rng);
        assert_eq!(next.occupied_count(), 9);
        assert!(next.cells().iter().all(|&color| color == 7));
    }

    #[test]
    fn birth_without_colored_neighbors_uses_fallback() {
        let rules = LifeRules {
            born: vec![0],
            survive: vec![],
        };
        let grid = Grid::new(2, 2);
        let mut rng = SmallRng::seed_from_u64(2);
        let next = evolve(&grid, &rules, 0.0, &mut rng);
        assert!(next.cells().iter().all(|&color| color == FALLBACK_COLOR));
    }
}
