//! Reflection adapters for symmetric optimization
//!
//! Evolving half (or quarter) of a sail and reflecting it before simulation
//! restricts the search to mirror-symmetric shapes.

use serde::{Deserialize, Serialize};

use crate::error::GenomeError;
use crate::genome::grid::ShapeGrid;

/// Which half of a grid is kept when symmetrizing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// Half grid to full grid, reflected across the vertical axis
pub fn mirror_columns(half: &ShapeGrid) -> ShapeGrid {
    let mut cells = Vec::with_capacity(half.len() * 2);
    for row in half.iter_rows() {
        cells.extend_from_slice(row);
        cells.extend(row.iter().rev());
    }
    ShapeGrid::from_raw(half.rows(), half.cols() * 2, cells)
}

/// Quarter grid to full grid, reflected across both axes
pub fn quarter_to_full(quarter: &ShapeGrid) -> Result<ShapeGrid, GenomeError> {
    let top = quarter.hstack(&quarter.flip_cols())?;
    let bottom = top.flip_rows();
    top.vstack(&bottom)
}

/// Make a full grid left/right symmetric by reflecting one half over the other
///
/// For odd widths the middle column is dropped, so the result has an even
/// width of `2 * (cols / 2)`.
pub fn symmetrize(grid: &ShapeGrid, side: Side) -> ShapeGrid {
    let half_width = grid.cols() / 2;
    match side {
        Side::Left => mirror_columns(&grid.slice(0..grid.rows(), 0..half_width)),
        Side::Right => {
            let right = grid.slice(0..grid.rows(), grid.cols() - half_width..grid.cols());
            mirror_columns(&right.flip_cols())
        }
    }
}

/// Check left/right mirror symmetry
pub fn is_mirror_symmetric(grid: &ShapeGrid) -> bool {
    grid.flip_cols() == *grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> ShapeGrid {
        ShapeGrid::from_rows(
            rows.iter()
                .map(|r| r.chars().map(|c| c == '#').collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_mirror_columns() {
        let half = grid(&["#.", ".."]);
        let full = mirror_columns(&half);
        assert_eq!(full, grid(&["#..#", "...."]));
        assert!(is_mirror_symmetric(&full));
    }

    #[test]
    fn test_quarter_to_full() {
        let quarter = grid(&["#.", ".."]);
        let full = quarter_to_full(&quarter).unwrap();
        assert_eq!(full, grid(&["#..#", "....", "....", "#..#"]));
    }

    #[test]
    fn test_symmetrize_left_and_right() {
        let g = grid(&["##..", "#..."]);
        assert_eq!(symmetrize(&g, Side::Left), grid(&["####", "#..#"]));
        assert_eq!(symmetrize(&g, Side::Right), grid(&["....", "...."]));
    }

    #[test]
    fn test_symmetrize_odd_width_drops_middle() {
        let g = grid(&["#.#.."]);
        let sym = symmetrize(&g, Side::Left);
        assert_eq!(sym.shape(), (1, 4));
        assert_eq!(sym, grid(&["#..#"]));
    }
}
