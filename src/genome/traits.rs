//! Core genome traits
//!
//! This module defines the `EvolutionaryGenome` trait shared by plain and
//! self-adaptive grid genomes.

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use crate::genome::grid::{GridLayout, ShapeGrid};

/// Core genome abstraction for the evolutionary engine.
///
/// Every genome carries exactly one [`ShapeGrid`]; fitness is a function of
/// that grid alone. Genomes must be cloneable, serializable, and thread-safe
/// so populations can be evaluated across worker threads.
pub trait EvolutionaryGenome: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The grid that is handed to the fitness oracle
    fn grid(&self) -> &ShapeGrid;

    /// Mutable access to the grid
    fn grid_mut(&mut self) -> &mut ShapeGrid;

    /// Generate a random genome with the given layout
    fn generate<R: Rng>(layout: &GridLayout, rng: &mut R) -> Self;
}

impl EvolutionaryGenome for ShapeGrid {
    fn grid(&self) -> &ShapeGrid {
        self
    }

    fn grid_mut(&mut self) -> &mut ShapeGrid {
        self
    }

    fn generate<R: Rng>(layout: &GridLayout, rng: &mut R) -> Self {
        layout.generate(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_respects_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let g = ShapeGrid::generate(&GridLayout::half(5), &mut rng);
        assert_eq!(g.shape(), (6, 3));
        assert_eq!(g.grid().len(), 18);
    }
}
