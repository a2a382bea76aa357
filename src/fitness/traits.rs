//! Fitness oracle traits
//!
//! The genetic core scores grids through the [`FitnessOracle`] port. The
//! simulator adapter is one implementation; stubs and decorators are others.

use std::sync::Arc;

use crate::error::OracleError;
use crate::evaluation::id::EvaluationId;
use crate::genome::grid::ShapeGrid;
use crate::genome::symmetry::mirror_columns;

/// Fitness oracle trait
///
/// Scores a grid (higher = better). `id` is unique among all evaluations
/// active at the same time; implementations that touch the filesystem must
/// scope their files by it. Calls may block for a long time.
pub trait FitnessOracle: Send + Sync {
    /// Evaluate one grid
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError>;
}

impl<O: FitnessOracle + ?Sized> FitnessOracle for &O {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        (**self).evaluate(grid, id)
    }
}

impl<O: FitnessOracle + ?Sized> FitnessOracle for Box<O> {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        (**self).evaluate(grid, id)
    }
}

impl<O: FitnessOracle + ?Sized> FitnessOracle for Arc<O> {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        (**self).evaluate(grid, id)
    }
}

/// Oracle backed by a closure
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&ShapeGrid) -> Result<f64, OracleError> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> FitnessOracle for FnOracle<F>
where
    F: Fn(&ShapeGrid) -> Result<f64, OracleError> + Send + Sync,
{
    fn evaluate(&self, grid: &ShapeGrid, _id: &EvaluationId) -> Result<f64, OracleError> {
        (self.f)(grid)
    }
}

/// Repeats the grid `factor × factor` times before delegating
#[derive(Clone, Debug)]
pub struct TiledOracle<O> {
    inner: O,
    factor: usize,
}

impl<O: FitnessOracle> TiledOracle<O> {
    /// Wrap an oracle; a factor of 1 is the identity
    pub fn new(inner: O, factor: usize) -> Self {
        assert!(factor >= 1, "Tile factor must be at least 1");
        Self { inner, factor }
    }

    /// Tile factor
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// The wrapped oracle
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: FitnessOracle> FitnessOracle for TiledOracle<O> {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        if self.factor == 1 {
            return self.inner.evaluate(grid, id);
        }
        self.inner.evaluate(&grid.tile(self.factor, self.factor), id)
    }
}

/// Reflects a half grid into a full symmetric grid before delegating
#[derive(Clone, Debug)]
pub struct MirroredOracle<O> {
    inner: O,
}

impl<O: FitnessOracle> MirroredOracle<O> {
    /// Wrap an oracle
    pub fn new(inner: O) -> Self {
        Self { inner }
    }

    /// The wrapped oracle
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: FitnessOracle> FitnessOracle for MirroredOracle<O> {
    fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
        self.inner.evaluate(&mirror_columns(grid), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::symmetry::is_mirror_symmetric;

    fn shape_oracle() -> FnOracle<impl Fn(&ShapeGrid) -> Result<f64, OracleError> + Send + Sync> {
        FnOracle::new(|g: &ShapeGrid| Ok((g.rows() * 1000 + g.cols()) as f64))
    }

    #[test]
    fn test_fn_oracle() {
        let oracle = FnOracle::new(|g: &ShapeGrid| Ok(g.count_ones() as f64));
        let grid = ShapeGrid::filled(2, 3, true);
        assert_eq!(oracle.evaluate(&grid, &EvaluationId::next()).unwrap(), 6.0);
    }

    #[test]
    fn test_tiled_oracle() {
        let grid = ShapeGrid::empty(2, 3);
        let id = EvaluationId::next();
        assert_eq!(
            TiledOracle::new(shape_oracle(), 3).evaluate(&grid, &id).unwrap(),
            6009.0
        );
        assert_eq!(
            TiledOracle::new(shape_oracle(), 1).evaluate(&grid, &id).unwrap(),
            2003.0
        );
    }

    #[test]
    fn test_mirrored_oracle_sees_symmetric_grid() {
        let oracle = MirroredOracle::new(FnOracle::new(|g: &ShapeGrid| {
            Ok(if is_mirror_symmetric(g) { g.cols() as f64 } else { -1.0 })
        }));
        let mut half = ShapeGrid::empty(4, 2);
        half.set(1, 0, true);
        assert_eq!(oracle.evaluate(&half, &EvaluationId::next()).unwrap(), 4.0);
    }

    #[test]
    fn test_boxed_and_shared_oracles() {
        let boxed: Box<dyn FitnessOracle> = Box::new(shape_oracle());
        let shared = Arc::new(shape_oracle());
        let grid = ShapeGrid::empty(1, 1);
        let id = EvaluationId::next();
        assert_eq!(boxed.evaluate(&grid, &id).unwrap(), 1001.0);
        assert_eq!(shared.evaluate(&grid, &id).unwrap(), 1001.0);
    }

    #[test]
    fn test_errors_propagate() {
        let failing = TiledOracle::new(
            FnOracle::new(|_: &ShapeGrid| Err(OracleError::Other("boom".to_string()))),
            2,
        );
        let err = failing
            .evaluate(&ShapeGrid::empty(1, 1), &EvaluationId::next())
            .unwrap_err();
        assert!(matches!(err, OracleError::Other(_)));
    }
}
