//! Stub oracles
//!
//! Cheap deterministic oracles for exercising the genetic core without the
//! external simulator.

use crate::error::OracleError;
use crate::evaluation::id::EvaluationId;
use crate::fitness::traits::FitnessOracle;
use crate::genome::grid::ShapeGrid;

/// Counts the set cells. Optimum when every cell is set.
#[derive(Clone, Debug, Default)]
pub struct CountOnes;

impl FitnessOracle for CountOnes {
    fn evaluate(&self, grid: &ShapeGrid, _id: &EvaluationId) -> Result<f64, OracleError> {
        Ok(grid.count_ones() as f64)
    }
}

/// Number of cells matching a target grid
///
/// Optimum equals the cell count, reached only at the target itself.
#[derive(Clone, Debug)]
pub struct TargetMatch {
    target: ShapeGrid,
}

impl TargetMatch {
    /// Create a new target-matching oracle
    pub fn new(target: ShapeGrid) -> Self {
        Self { target }
    }

    /// The target grid
    pub fn target(&self) -> &ShapeGrid {
        &self.target
    }
}

impl FitnessOracle for TargetMatch {
    fn evaluate(&self, grid: &ShapeGrid, _id: &EvaluationId) -> Result<f64, OracleError> {
        if grid.shape() != self.target.shape() {
            return Err(OracleError::Other(format!(
                "grid shape {:?} does not match target {:?}",
                grid.shape(),
                self.target.shape()
            )));
        }
        Ok((grid.len() - grid.hamming_distance(&self.target)) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ones() {
        let mut grid = ShapeGrid::empty(3, 3);
        grid.set(0, 0, true);
        grid.set(2, 1, true);
        assert_eq!(CountOnes.evaluate(&grid, &EvaluationId::next()).unwrap(), 2.0);
    }

    #[test]
    fn test_target_match() {
        let target = ShapeGrid::filled(2, 2, true);
        let oracle = TargetMatch::new(target.clone());
        let id = EvaluationId::next();
        assert_eq!(oracle.evaluate(&target, &id).unwrap(), 4.0);
        assert_eq!(oracle.evaluate(&target.complement(), &id).unwrap(), 0.0);
        assert!(oracle.evaluate(&ShapeGrid::empty(1, 2), &id).is_err());
    }
}
