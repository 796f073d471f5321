//! Occupancy indexing for nearest-cell queries over a bounded pixel grid.

use ordered_float::OrderedFloat;
use thiserror::Error;

/// Errors emitted by occupancy index implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., zero bucket size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An occupied cell was reported outside the declared grid.
    #[error("cell ({row}, {col}) lies outside a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Closest occupied cell returned by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nearest {
    pub row: usize,
    pub col: usize,
    /// Euclidean distance from the query origin.
    pub distance: OrderedFloat<f64>,
}

/// Ordering key: squared distance first, then row-major position.
type RankKey = (u64, usize, usize);

fn rank(origin: (usize, usize), cell: (usize, usize)) -> RankKey {
    let dr = origin.0.abs_diff(cell.0) as u64;
    let dc = origin.1.abs_diff(cell.1) as u64;
    (dr * dr + dc * dc, cell.0, cell.1)
}

fn to_nearest(key: RankKey) -> Nearest {
    Nearest {
        row: key.1,
        col: key.2,
        distance: OrderedFloat((key.0 as f64).sqrt()),
    }
}

fn check_bounds(rows: usize, cols: usize, cell: (usize, usize)) -> Result<(), IndexError> {
    if cell.0 >= rows || cell.1 >= cols {
        return Err(IndexError::OutOfBounds {
            row: cell.0,
            col: cell.1,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Common behaviour exposed by occupancy indices.
pub trait OccupancyIndex {
    /// Rebuild internal structures from the occupied cells of a `rows x cols` grid.
    fn rebuild(
        &mut self,
        rows: usize,
        cols: usize,
        occupied: &[(usize, usize)],
    ) -> Result<(), IndexError>;

    /// Closest occupied cell whose squared distance from `(row, col)` is strictly greater
    /// than `min_distance_sq`. Equal distances resolve to the first cell in row-major order.
    fn nearest_beyond(&self, row: usize, col: usize, min_distance_sq: u64) -> Option<Nearest>;

    /// Number of indexed cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force index scanning every occupied cell per query.
#[derive(Debug, Clone, Default)]
pub struct LinearScanIndex {
    cells: Vec<(usize, usize)>,
}

impl LinearScanIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OccupancyIndex for LinearScanIndex {
    fn rebuild(
        &mut self,
        rows: usize,
        cols: usize,
        occupied: &[(usize, usize)],
    ) -> Result<(), IndexError> {
        self.cells.clear();
        for &cell in occupied {
            check_bounds(rows, cols, cell)?;
            self.cells.push(cell);
        }
        Ok(())
    }

    fn nearest_beyond(&self, row: usize, col: usize, min_distance_sq: u64) -> Option<Nearest> {
        self.cells
            .iter()
            .map(|&cell| rank((row, col), cell))
            .filter(|key| key.0 > min_distance_sq)
            .min()
            .map(to_nearest)
    }

    fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Uniform bucket grid; queries expand square rings of buckets around the origin.
#[derive(Debug, Clone)]
pub struct UniformGridIndex {
    /// Edge length (in cells) of each bucket.
    pub bucket_size: usize,
    bucket_rows: usize,
    bucket_cols: usize,
    buckets: Vec<Vec<(usize, usize)>>,
    len: usize,
}

impl UniformGridIndex {
    /// Create an empty index with the provided bucket edge length.
    #[must_use]
    pub fn new(bucket_size: usize) -> Self {
        Self {
            bucket_size,
            bucket_rows: 0,
            bucket_cols: 0,
            buckets: Vec::new(),
            len: 0,
        }
    }

    fn bucket_of(&self, row: usize, col: usize) -> (usize, usize) {
        (
            (row / self.bucket_size).min(self.bucket_rows.saturating_sub(1)),
            (col / self.bucket_size).min(self.bucket_cols.saturating_sub(1)),
        )
    }

    fn scan_ring(
        &self,
        center: (usize, usize),
        ring: usize,
        origin: (usize, usize),
        min_distance_sq: u64,
        best: &mut Option<RankKey>,
    ) {
        let ring = ring as isize;
        let (cr, cc) = (center.0 as isize, center.1 as isize);
        for br in (cr - ring)..=(cr + ring) {
            if br < 0 || br >= self.bucket_rows as isize {
                continue;
            }
            for bc in (cc - ring)..=(cc + ring) {
                if bc < 0 || bc >= self.bucket_cols as isize {
                    continue;
                }
                // Interior buckets were covered by smaller rings.
                if (br - cr).abs() != ring && (bc - cc).abs() != ring {
                    continue;
                }
                let bucket = &self.buckets[br as usize * self.bucket_cols + bc as usize];
                for &cell in bucket {
                    let key = rank(origin, cell);
                    if key.0 > min_distance_sq && best.is_none_or(|current| key < current) {
                        *best = Some(key);
                    }
                }
            }
        }
    }
}

impl Default for UniformGridIndex {
    fn default() -> Self {
        Self::new(16)
    }
}

impl OccupancyIndex for UniformGridIndex {
    fn rebuild(
        &mut self,
        rows: usize,
        cols: usize,
        occupied: &[(usize, usize)],
    ) -> Result<(), IndexError> {
        if self.bucket_size == 0 {
            return Err(IndexError::InvalidConfig("bucket_size must be positive"));
        }
        self.bucket_rows = rows.div_ceil(self.bucket_size);
        self.bucket_cols = cols.div_ceil(self.bucket_size);
        let bucket_count = self.bucket_rows * self.bucket_cols;
        self.buckets.iter_mut().for_each(Vec::clear);
        self.buckets.resize_with(bucket_count, Vec::new);
        self.buckets.truncate(bucket_count);
        self.len = 0;
        for &cell in occupied {
            check_bounds(rows, cols, cell)?;
            let (br, bc) = self.bucket_of(cell.0, cell.1);
            self.buckets[br * self.bucket_cols + bc].push(cell);
            self.len += 1;
        }
        Ok(())
    }

    fn nearest_beyond(&self, row: usize, col: usize, min_distance_sq: u64) -> Option<Nearest> {
        if self.len == 0 {
            return None;
        }
        let center = self.bucket_of(row, col);
        let max_ring = self.bucket_rows.max(self.bucket_cols);
        let mut best: Option<RankKey> = None;
        for ring in 0..=max_ring {
            self.scan_ring(center, ring, (row, col), min_distance_sq, &mut best);
            // Anything in ring + 1 or beyond is more than `ring * bucket_size` away.
            let reach = (ring * self.bucket_size) as u64;
            if best.is_some_and(|key| key.0 <= reach * reach) {
                break;
            }
        }
        best.map(to_nearest)
    }

    fn len(&self) -> usize {
        self.len
    }
}
