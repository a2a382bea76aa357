//! Shape grid genome
//!
//! A fixed-size two-dimensional boolean lattice. Each cell marks whether
//! material is present at that site of the simulated sail.

use std::fmt;
use std::ops::{Index, Range};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GenomeError;

/// Row-major boolean grid
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl ShapeGrid {
    /// Create a grid from a row-major cell buffer
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self, GenomeError> {
        if cells.len() != rows * cols {
            return Err(GenomeError::InvalidShape(format!(
                "{} cells cannot fill a {}x{} grid",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build from parts whose lengths the caller has already checked
    pub(crate) fn from_raw(rows: usize, cols: usize, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    /// Create a grid with every cell set to `value`
    pub fn filled(rows: usize, cols: usize, value: bool) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    /// Create an empty (all false) grid
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, false)
    }

    /// Create a grid from nested rows
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, GenomeError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(GenomeError::InvalidShape(format!(
                "ragged rows: expected width {}, found {}",
                width,
                bad.len()
            )));
        }
        Ok(Self {
            rows: height,
            cols: width,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Generate a grid where each cell is set independently with probability `density`
    pub fn random<R: Rng>(rows: usize, cols: usize, density: f64, rng: &mut R) -> Self {
        let cells = (0..rows * cols).map(|_| rng.gen_bool(density)).collect();
        Self { rows, cols, cells }
    }

    /// Number of rows (first axis)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (second axis)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a cell
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Set a cell; out-of-range coordinates are ignored
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = value;
        }
    }

    /// Flip a cell; out-of-range coordinates are ignored
    pub fn flip(&mut self, row: usize, col: usize) {
        if row < self.rows && col < self.cols {
            let cell = &mut self.cells[row * self.cols + col];
            *cell = !*cell;
        }
    }

    /// Row-major view of all cells
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Mutable row-major view of all cells
    pub fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    /// A single row
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks() panics on zero, and a zero-width grid has no cells anyway
        self.cells.chunks(self.cols.max(1))
    }

    /// Coordinates of every set cell, in row-major order
    pub fn active_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(move |(i, _)| (i / cols, i % cols))
    }

    /// Count set cells
    pub fn count_ones(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Logical complement
    pub fn complement(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(|c| !c).collect(),
        }
    }

    /// Number of differing cells
    pub fn hamming_distance(&self, other: &Self) -> usize {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    fn check_same_shape(&self, other: &Self) -> Result<(), GenomeError> {
        if self.shape() != other.shape() {
            return Err(GenomeError::DimensionMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }

    /// Exchange a block of whole rows with another grid
    ///
    /// Values are swapped, so the two grids never share storage afterwards.
    pub fn swap_rows_with(&mut self, other: &mut Self, rows: Range<usize>) -> Result<(), GenomeError> {
        self.check_same_shape(other)?;
        if rows.end > self.rows {
            return Err(GenomeError::InvalidShape(format!(
                "row range {:?} exceeds {} rows",
                rows, self.rows
            )));
        }
        let span = rows.start * self.cols..rows.end * self.cols;
        self.cells[span.clone()].swap_with_slice(&mut other.cells[span]);
        Ok(())
    }

    /// Exchange a rectangular block with another grid
    pub fn swap_region_with(
        &mut self,
        other: &mut Self,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<(), GenomeError> {
        self.check_same_shape(other)?;
        if rows.end > self.rows || cols.end > self.cols {
            return Err(GenomeError::InvalidShape(format!(
                "region {:?}x{:?} exceeds {}x{} grid",
                rows, cols, self.rows, self.cols
            )));
        }
        for r in rows {
            let span = r * self.cols + cols.start..r * self.cols + cols.end;
            self.cells[span.clone()].swap_with_slice(&mut other.cells[span]);
        }
        Ok(())
    }

    /// Repeat the grid `row_reps` times down and `col_reps` times across
    pub fn tile(&self, row_reps: usize, col_reps: usize) -> Self {
        let rows = self.rows * row_reps;
        let cols = self.cols * col_reps;
        let mut cells = Vec::with_capacity(rows * cols);
        for _ in 0..row_reps {
            for row in self.iter_rows() {
                for _ in 0..col_reps {
                    cells.extend_from_slice(row);
                }
            }
        }
        Self { rows, cols, cells }
    }

    /// Reverse the column order of every row
    pub fn flip_cols(&self) -> Self {
        let mut cells = Vec::with_capacity(self.len());
        for row in self.iter_rows() {
            cells.extend(row.iter().rev());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }

    /// Reverse the row order
    pub fn flip_rows(&self) -> Self {
        let mut cells = Vec::with_capacity(self.len());
        for r in (0..self.rows).rev() {
            cells.extend_from_slice(self.row(r));
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }

    /// Place `other` to the right of this grid
    pub fn hstack(&self, other: &Self) -> Result<Self, GenomeError> {
        if self.rows != other.rows {
            return Err(GenomeError::DimensionMismatch {
                expected: (self.rows, other.cols),
                actual: other.shape(),
            });
        }
        let mut cells = Vec::with_capacity(self.len() + other.len());
        for r in 0..self.rows {
            cells.extend_from_slice(self.row(r));
            cells.extend_from_slice(other.row(r));
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols + other.cols,
            cells,
        })
    }

    /// Place `other` below this grid
    pub fn vstack(&self, other: &Self) -> Result<Self, GenomeError> {
        if self.cols != other.cols {
            return Err(GenomeError::DimensionMismatch {
                expected: (other.rows, self.cols),
                actual: other.shape(),
            });
        }
        let mut cells = self.cells.clone();
        cells.extend_from_slice(&other.cells);
        Ok(Self {
            rows: self.rows + other.rows,
            cols: self.cols,
            cells,
        })
    }

    /// Copy out a sub-grid
    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        let mut cells = Vec::with_capacity(rows.len() * cols.len());
        for r in rows.clone() {
            cells.extend_from_slice(&self.row(r)[cols.clone()]);
        }
        Self {
            rows: rows.len(),
            cols: cols.len(),
            cells,
        }
    }
}

impl Index<(usize, usize)> for ShapeGrid {
    type Output = bool;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        &self.cells[row * self.cols + col]
    }
}

impl fmt::Display for ShapeGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let line: String = row.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Shape and fill density of freshly generated grids
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Probability that a generated cell is set
    pub density: f64,
}

impl GridLayout {
    /// Square `size × size` layout with density 0.5
    pub fn square(size: usize) -> Self {
        Self {
            rows: size,
            cols: size,
            density: 0.5,
        }
    }

    /// Half-grid layout for symmetric optimization
    ///
    /// Odd sizes are rounded up to the next even number; the result is
    /// `size` rows by `size / 2` columns.
    pub fn half(size: usize) -> Self {
        let even = if size % 2 == 0 { size } else { size + 1 };
        Self {
            rows: even,
            cols: even / 2,
            density: 0.5,
        }
    }

    /// Set the fill density
    pub fn with_density(mut self, density: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&density),
            "Density must be in [0, 1]"
        );
        self.density = density;
        self
    }

    /// Generate a random grid with this layout
    pub fn generate<R: Rng>(&self, rng: &mut R) -> ShapeGrid {
        ShapeGrid::random(self.rows, self.cols, self.density, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(rows: &[&str]) -> ShapeGrid {
        ShapeGrid::from_rows(
            rows.iter()
                .map(|r| r.chars().map(|c| c == '#').collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(ShapeGrid::new(2, 2, vec![true; 3]).is_err());
        assert!(ShapeGrid::new(2, 3, vec![false; 6]).is_ok());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = ShapeGrid::from_rows(vec![vec![true, false], vec![true]]);
        assert!(matches!(err, Err(GenomeError::InvalidShape(_))));
    }

    #[test]
    fn test_random_density_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ShapeGrid::random(5, 5, 0.0, &mut rng).count_ones(), 0);
        assert_eq!(ShapeGrid::random(5, 5, 1.0, &mut rng).count_ones(), 25);
    }

    #[test]
    fn test_random_density_half() {
        let mut rng = StdRng::seed_from_u64(7);
        let g = GridLayout::square(40).generate(&mut rng);
        let ones = g.count_ones();
        // 1600 Bernoulli(0.5) draws
        assert!(ones > 650 && ones < 950, "got {ones}");
    }

    #[test]
    fn test_half_layout_rounds_odd_up() {
        let layout = GridLayout::half(7);
        assert_eq!((layout.rows, layout.cols), (8, 4));
        let layout = GridLayout::half(10);
        assert_eq!((layout.rows, layout.cols), (10, 5));
    }

    #[test]
    fn test_get_set_flip() {
        let mut g = ShapeGrid::empty(3, 2);
        g.set(2, 1, true);
        assert_eq!(g.get(2, 1), Some(true));
        assert!(g[(2, 1)]);
        g.flip(2, 1);
        assert_eq!(g.get(2, 1), Some(false));
        assert_eq!(g.get(3, 0), None);
    }

    #[test]
    fn test_active_cells_row_major() {
        let g = grid(&["#.", ".#"]);
        let cells: Vec<_> = g.active_cells().collect();
        assert_eq!(cells, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_complement() {
        let g = grid(&["#.", ".."]);
        assert_eq!(g.complement(), grid(&[".#", "##"]));
        assert_eq!(g.hamming_distance(&g.complement()), 4);
    }

    #[test]
    fn test_swap_rows_with() {
        let mut a = grid(&["##", "##", "##"]);
        let mut b = grid(&["..", "..", ".."]);
        a.swap_rows_with(&mut b, 1..3).unwrap();
        assert_eq!(a, grid(&["##", "..", ".."]));
        assert_eq!(b, grid(&["..", "##", "##"]));
    }

    #[test]
    fn test_swap_region_with() {
        let mut a = grid(&["###", "###", "###"]);
        let mut b = grid(&["...", "...", "..."]);
        a.swap_region_with(&mut b, 1..2, 0..2).unwrap();
        assert_eq!(a, grid(&["###", "..#", "###"]));
        assert_eq!(b, grid(&["...", "##.", "..."]));
    }

    #[test]
    fn test_swap_shape_mismatch() {
        let mut a = ShapeGrid::empty(2, 2);
        let mut b = ShapeGrid::empty(2, 3);
        assert!(a.swap_rows_with(&mut b, 0..1).is_err());
    }

    #[test]
    fn test_tile() {
        let g = grid(&["#."]);
        let tiled = g.tile(2, 2);
        assert_eq!(tiled, grid(&["#.#.", "#.#."]));
        assert_eq!(g.tile(1, 1), g);
    }

    #[test]
    fn test_flip_and_stack() {
        let g = grid(&["#.", ".."]);
        assert_eq!(g.flip_cols(), grid(&[".#", ".."]));
        assert_eq!(g.flip_rows(), grid(&["..", "#."]));
        assert_eq!(g.hstack(&g).unwrap(), grid(&["#.#.", "...."]));
        assert_eq!(g.vstack(&g).unwrap(), grid(&["#.", "..", "#.", ".."]));
        assert!(g.hstack(&ShapeGrid::empty(3, 2)).is_err());
    }

    #[test]
    fn test_slice() {
        let g = grid(&["#..", ".#.", "..#"]);
        assert_eq!(g.slice(1..3, 1..3), grid(&["#.", ".#"]));
    }

    #[test]
    fn test_display() {
        let g = grid(&["#.", ".#"]);
        assert_eq!(g.to_string(), "#.\n.#\n");
    }
}
