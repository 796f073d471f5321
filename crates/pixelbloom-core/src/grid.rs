//! Grid, palette, and canvas model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ColorIndex;

/// Cell value meaning "no color".
pub const EMPTY: ColorIndex = 0;

/// Alpha values below this threshold import as empty cells.
const IMPORT_ALPHA_CUTOFF: u8 = 128;

/// Errors raised when building grids or palettes from external data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Flat storage length disagrees with the declared shape.
    #[error("grid storage holds {len} cells but the shape is {rows}x{cols}")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },
    /// A row-of-rows input was not rectangular.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// RGBA pixel buffer does not match the image dimensions.
    #[error("expected {expected} RGBA bytes for the image, found {found}")]
    RgbaLength { expected: usize, found: usize },
    /// Color literal was not `#rrggbb`.
    #[error("invalid color literal `{0}`")]
    InvalidColor(String),
}

/// Rectangular row-major buffer of palette indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<ColorIndex>,
}

impl Grid {
    /// All-empty grid of the given shape.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![EMPTY; rows * cols],
        }
    }

    /// Wrap flat row-major storage, rejecting a length that disagrees with the shape.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<ColorIndex>) -> Result<Self, GridError> {
        if cells.len() != rows * cols {
            return Err(GridError::ShapeMismatch {
                rows,
                cols,
                len: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build from nested rows; every row must have the length of the first.
    pub fn from_rows(rows: Vec<Vec<ColorIndex>>) -> Result<Self, GridError> {
        let cols = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::RaggedRow {
                    row: index,
                    expected: cols,
                    found: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: row_count,
            cols,
            cells,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn cells(&self) -> &[ColorIndex] {
        &self.cells
    }

    #[must_use]
    pub fn cells_mut(&mut self) -> &mut [ColorIndex] {
        &mut self.cells
    }

    /// Borrow one row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[ColorIndex]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Color at `(row, col)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<ColorIndex> {
        if row < self.rows && col < self.cols {
            Some(self.cells[self.offset(row, col)])
        } else {
            None
        }
    }

    /// Resolve a signed displacement from `(row, col)` to an in-bounds coordinate.
    #[inline]
    #[must_use]
    pub fn shifted(&self, row: usize, col: usize, dr: isize, dc: isize) -> Option<(usize, usize)> {
        let nr = row.checked_add_signed(dr)?;
        let nc = col.checked_add_signed(dc)?;
        (nr < self.rows && nc < self.cols).then_some((nr, nc))
    }

    /// Write a cell; out-of-bounds writes are ignored and report `false`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, color: ColorIndex) -> bool {
        if row < self.rows && col < self.cols {
            let idx = self.offset(row, col);
            self.cells[idx] = color;
            true
        } else {
            false
        }
    }

    #[inline]
    #[must_use]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some_and(|color| color != EMPTY)
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&color| color != EMPTY).count()
    }

    /// Whether every cell is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&color| color == EMPTY)
    }

    /// Occupied cells in row-major order as `(row, col, color)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, ColorIndex)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &color)| color != EMPTY)
            .map(move |(idx, &color)| (idx / cols, idx % cols, color))
    }

    /// Number of cells whose value differs from `other`; shapes must match.
    #[must_use]
    pub fn diff_count(&self, other: &Grid) -> usize {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        self.cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Overwrite every cell.
    pub fn fill(&mut self, color: ColorIndex) {
        self.cells.fill(color);
    }

    /// Copy of this grid reshaped to `rows x cols`, keeping the overlapping top-left block.
    #[must_use]
    pub fn resized(&self, rows: usize, cols: usize) -> Grid {
        let mut next = Grid::new(rows, cols);
        let keep_cols = cols.min(self.cols);
        for row in 0..rows.min(self.rows) {
            let src = row * self.cols;
            let dst = row * cols;
            next.cells[dst..dst + keep_cols].copy_from_slice(&self.cells[src..src + keep_cols]);
        }
        next
    }

    /// Panics when storage and declared shape disagree. Every rule relies on rectangularity,
    /// so this is a contract violation rather than a recoverable error.
    #[track_caller]
    pub fn assert_coherent(&self) {
        assert_eq!(
            self.cells.len(),
            self.rows * self.cols,
            "grid storage disagrees with its declared {}x{} shape",
            self.rows,
            self.cols
        );
    }
}

/// Opaque RGB color; serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GridError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Ordered, append-only color table. Slot 0 is the background swatch and is never
/// referenced by grid cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(vec![
            Rgb::new(0x00, 0x00, 0x00),
            Rgb::new(0xff, 0x6b, 0x6b),
            Rgb::new(0x4e, 0xcd, 0xc4),
            Rgb::new(0x45, 0xb7, 0xd1),
            Rgb::new(0x96, 0xce, 0xb4),
            Rgb::new(0xfe, 0xca, 0x57),
            Rgb::new(0xff, 0x9f, 0xf3),
            Rgb::new(0x54, 0xa0, 0xff),
            Rgb::new(0x5f, 0x27, 0xcd),
        ])
    }
}

impl Palette {
    #[must_use]
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    #[must_use]
    pub fn get(&self, index: ColorIndex) -> Option<Rgb> {
        self.colors.get(index as usize).copied()
    }

    /// Append a color, returning its new index.
    pub fn push(&mut self, color: Rgb) -> ColorIndex {
        self.colors.push(color);
        (self.colors.len() - 1) as ColorIndex
    }

    /// Overwrite an existing slot in place.
    pub fn set(&mut self, index: ColorIndex, color: Rgb) -> bool {
        match self.colors.get_mut(index as usize) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Index reserved for the uncommitted preview color (one past the last slot).
    #[must_use]
    pub fn preview_index(&self) -> ColorIndex {
        self.colors.len() as ColorIndex
    }

    /// Indices usable for painting: every slot except the background.
    #[must_use]
    pub fn paint_indices(&self) -> std::ops::Range<ColorIndex> {
        1..self.preview_index().max(1)
    }

    /// Concrete color for a cell value; the preview sentinel maps to `preview`.
    #[must_use]
    pub fn resolve(&self, index: ColorIndex, preview: Option<Rgb>) -> Option<Rgb> {
        if index == EMPTY {
            None
        } else if index == self.preview_index() {
            preview
        } else {
            self.get(index)
        }
    }

    /// Quantize an RGBA image into a grid, appending unseen colors to the palette.
    ///
    /// Pixels below 50% alpha become empty. Existing colors keep their indices; the
    /// background slot is never matched so black pixels still import as visible cells.
    pub fn import_rgba(
        &mut self,
        width: usize,
        height: usize,
        rgba: &[u8],
    ) -> Result<Grid, GridError> {
        let expected = width * height * 4;
        if rgba.len() != expected {
            return Err(GridError::RgbaLength {
                expected,
                found: rgba.len(),
            });
        }
        let mut lookup: HashMap<Rgb, ColorIndex> = self
            .colors
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, &color)| (color, idx as ColorIndex))
            .collect();
        let mut cells = Vec::with_capacity(width * height);
        for pixel in rgba.chunks_exact(4) {
            if pixel[3] < IMPORT_ALPHA_CUTOFF {
                cells.push(EMPTY);
                continue;
            }
            let color = Rgb::new(pixel[0], pixel[1], pixel[2]);
            let index = *lookup.entry(color).or_insert_with(|| {
                self.colors.push(color);
                (self.colors.len() - 1) as ColorIndex
            });
            cells.push(index);
        }
        Grid::from_cells(height, width, cells)
    }
}

/// Grid plus palette plus the snapshot that `clear` restores.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    grid: Grid,
    palette: Palette,
    original: Option<Grid>,
    preview: Option<Rgb>,
}

impl Canvas {
    /// Empty canvas with the default palette.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_palette(Grid::new(rows, cols), Palette::default())
    }

    #[must_use]
    pub fn with_palette(grid: Grid, palette: Palette) -> Self {
        Self {
            grid,
            palette,
            original: None,
            preview: None,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Swap in a freshly stepped grid.
    pub fn replace_grid(&mut self, grid: Grid) {
        grid.assert_coherent();
        self.grid = grid;
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    #[must_use]
    pub fn original(&self) -> Option<&Grid> {
        self.original.as_ref()
    }

    #[must_use]
    pub const fn preview(&self) -> Option<Rgb> {
        self.preview
    }

    /// Set or drop the uncommitted custom color.
    pub fn set_preview(&mut self, color: Option<Rgb>) {
        self.preview = color;
    }

    /// Save the preview color onto palette slot `index`.
    pub fn commit_preview(&mut self, index: ColorIndex) -> bool {
        match self.preview.take() {
            Some(color) => self.palette.set(index, color),
            None => false,
        }
    }

    /// Brush write of a single cell.
    pub fn paint(&mut self, row: usize, col: usize, color: ColorIndex) -> bool {
        self.grid.set(row, col, color)
    }

    /// Reshape, keeping the overlapping top-left region.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.grid = self.grid.resized(rows, cols);
    }

    /// Restore the imported original, or blank the grid when nothing was imported.
    pub fn clear(&mut self) {
        self.grid = match &self.original {
            Some(original) => original.clone(),
            None => Grid::new(self.grid.rows(), self.grid.cols()),
        };
        self.preview = None;
    }

    /// Replace the grid with a quantized image and remember it for `clear`.
    pub fn import_rgba(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<(), GridError> {
        let grid = self.palette.import_rgba(width, height, rgba)?;
        self.original = Some(grid.clone());
        self.grid = grid;
        Ok(())
    }
}

#[cfg(test)]
impl Grid {
    /// Drop the last stored cell without touching the declared shape.
    pub(crate) fn with_missing_cell(mut self) -> Self {
        self.cells.pop();
        self
    }
}
