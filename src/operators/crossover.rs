//! Crossover operators
//!
//! Row-block and square-region exchange between two shape grids, plus the
//! self-adaptive variant that also blends strategy parameters.

use std::ops::Range;

use rand::Rng;

use crate::error::{GenomeError, OperatorError, OperatorResult};
use crate::genome::grid::ShapeGrid;
use crate::genome::traits::EvolutionaryGenome;
use crate::hyperparameter::self_adaptive::{AdaptiveGenome, BlendWeights};
use crate::operators::traits::CrossoverOperator;

/// Two distinct ordered cut points on one axis, `1 <= start < end <= len`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutPoints {
    start: usize,
    end: usize,
}

impl CutPoints {
    /// Validate a fixed pair of cut points for an axis of length `len`
    pub fn new(start: usize, end: usize, len: usize) -> Option<Self> {
        (1 <= start && start < end && end <= len).then_some(Self { start, end })
    }

    /// Draw cut points for an axis of length `len`
    ///
    /// The first point is uniform on `1..=len`, the second on `1..=len-1`;
    /// if the second is not below the first it is shifted up by one,
    /// otherwise the two are swapped. Axes shorter than 2 have no valid pair.
    pub fn draw<R: Rng>(len: usize, rng: &mut R) -> Option<Self> {
        if len < 2 {
            return None;
        }
        let first = rng.gen_range(1..=len);
        let second = rng.gen_range(1..len);
        let (start, end) = if second >= first {
            (first, second + 1)
        } else {
            (second, first)
        };
        Some(Self { start, end })
    }

    /// First index of the exchanged block
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index of the exchanged block
    pub fn end(&self) -> usize {
        self.end
    }

    /// Half-open block `[start, end)`
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

fn check_parents(a: &ShapeGrid, b: &ShapeGrid) -> Result<(), OperatorError> {
    if a.shape() != b.shape() {
        return Err(OperatorError::CrossoverFailed(format!(
            "Parent shapes do not match: {:?} vs {:?}",
            a.shape(),
            b.shape()
        )));
    }
    Ok(())
}

/// Two-point crossover along the first grid axis
///
/// Exchanges the row block `[p1, p2)` between the parents.
#[derive(Clone, Debug, Default)]
pub struct TwoPointCrossover;

impl TwoPointCrossover {
    /// Create a new two-point crossover
    pub fn new() -> Self {
        Self
    }

    /// Exchange the row block selected by `cuts` in place
    ///
    /// Applying the same cuts twice restores both grids.
    pub fn apply(a: &mut ShapeGrid, b: &mut ShapeGrid, cuts: CutPoints) -> Result<(), GenomeError> {
        a.swap_rows_with(b, cuts.range())
    }

    fn recombine<R: Rng>(a: &mut ShapeGrid, b: &mut ShapeGrid, rng: &mut R) -> Result<(), OperatorError> {
        check_parents(a, b)?;
        match CutPoints::draw(a.rows(), rng) {
            Some(cuts) => Self::apply(a, b, cuts)
                .map_err(|e| OperatorError::CrossoverFailed(e.to_string())),
            // A single row cannot be split; parents pass through
            None => Ok(()),
        }
    }
}

impl<G: EvolutionaryGenome> CrossoverOperator<G> for TwoPointCrossover {
    fn crossover<R: Rng>(&self, parent1: &G, parent2: &G, rng: &mut R) -> OperatorResult<(G, G)> {
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();
        match Self::recombine(child1.grid_mut(), child2.grid_mut(), rng) {
            Ok(()) => OperatorResult::Success((child1, child2)),
            Err(e) => OperatorResult::Failed(e),
        }
    }
}

/// Square-region crossover
///
/// Draws cut points independently on both axes and exchanges the
/// rectangular block where the row range and column range intersect.
#[derive(Clone, Debug, Default)]
pub struct SquareCrossover;

impl SquareCrossover {
    /// Create a new square-region crossover
    pub fn new() -> Self {
        Self
    }

    /// Exchange the block selected by `rows` x `cols` in place
    pub fn apply(
        a: &mut ShapeGrid,
        b: &mut ShapeGrid,
        rows: CutPoints,
        cols: CutPoints,
    ) -> Result<(), GenomeError> {
        a.swap_region_with(b, rows.range(), cols.range())
    }
}

impl<G: EvolutionaryGenome> CrossoverOperator<G> for SquareCrossover {
    fn crossover<R: Rng>(&self, parent1: &G, parent2: &G, rng: &mut R) -> OperatorResult<(G, G)> {
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();
        if let Err(e) = check_parents(child1.grid(), child2.grid()) {
            return OperatorResult::Failed(e);
        }
        let rows = CutPoints::draw(child1.grid().rows(), rng);
        let cols = CutPoints::draw(child1.grid().cols(), rng);
        if let (Some(rows), Some(cols)) = (rows, cols) {
            if let Err(e) = Self::apply(child1.grid_mut(), child2.grid_mut(), rows, cols) {
                return OperatorResult::Failed(OperatorError::CrossoverFailed(e.to_string()));
            }
        }
        OperatorResult::Success((child1, child2))
    }
}

/// Self-adaptive crossover
///
/// Both offspring receive the same blended strategy parameters, using three
/// independent weights drawn from N(0.5, 0.15) and clipped into (0, 1).
/// Grids are recombined with [`TwoPointCrossover`].
#[derive(Clone, Debug)]
pub struct AdaptiveCrossover {
    /// Mean of the blend-weight distribution
    pub weight_mean: f64,
    /// Standard deviation of the blend-weight distribution
    pub weight_std_dev: f64,
}

impl AdaptiveCrossover {
    /// Create with the default N(0.5, 0.15) blend weights
    pub fn new() -> Self {
        Self {
            weight_mean: 0.5,
            weight_std_dev: 0.15,
        }
    }

    /// Use a different blend-weight distribution
    pub fn with_weights(mut self, mean: f64, std_dev: f64) -> Self {
        assert!(std_dev >= 0.0, "Standard deviation must be non-negative");
        self.weight_mean = mean;
        self.weight_std_dev = std_dev;
        self
    }
}

impl Default for AdaptiveCrossover {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossoverOperator<AdaptiveGenome> for AdaptiveCrossover {
    fn crossover<R: Rng>(
        &self,
        parent1: &AdaptiveGenome,
        parent2: &AdaptiveGenome,
        rng: &mut R,
    ) -> OperatorResult<(AdaptiveGenome, AdaptiveGenome)> {
        let weights = BlendWeights::sample(self.weight_mean, self.weight_std_dev, rng);
        let params = parent1.params.blend(&parent2.params, weights);

        let mut grid1 = parent1.grid.clone();
        let mut grid2 = parent2.grid.clone();
        if let Err(e) = TwoPointCrossover::recombine(&mut grid1, &mut grid2, rng) {
            return OperatorResult::Failed(e);
        }
        OperatorResult::Success((
            AdaptiveGenome::new(grid1, params),
            AdaptiveGenome::new(grid2, params),
        ))
    }
}
