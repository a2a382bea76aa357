//! Mutation operators
//!
//! Per-cell bit flipping, and its self-adaptive variant that also perturbs
//! the individual's strategy parameters.

use rand::Rng;

use crate::genome::grid::ShapeGrid;
use crate::genome::traits::EvolutionaryGenome;
use crate::hyperparameter::self_adaptive::{AdaptiveGenome, StrategyNoise};
use crate::operators::traits::MutationOperator;

fn flip_cells<R: Rng>(grid: &mut ShapeGrid, probability: f64, rng: &mut R) {
    for cell in grid.cells_mut() {
        if rng.gen::<f64>() < probability {
            *cell = !*cell;
        }
    }
}

/// Bit-flip mutation
///
/// Inverts every cell independently with probability `indpb`. An `indpb`
/// of 0 is the identity and 1 yields the exact complement.
#[derive(Clone, Debug)]
pub struct BitFlipMutation {
    /// Per-cell flip probability
    pub indpb: f64,
}

impl BitFlipMutation {
    /// Create a new bit-flip mutation
    pub fn new(indpb: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&indpb),
            "Probability must be in [0, 1]"
        );
        Self { indpb }
    }
}

impl<G: EvolutionaryGenome> MutationOperator<G> for BitFlipMutation {
    fn mutate<R: Rng>(&self, genome: &mut G, rng: &mut R) {
        flip_cells(genome.grid_mut(), self.indpb, rng);
    }
}

/// Self-adaptive mutation
///
/// Flips cells using the individual's own `mutation_step`, then perturbs its
/// strategy parameters with gaussian noise and reclips them into (0, 1).
#[derive(Clone, Debug, Default)]
pub struct AdaptiveMutation {
    /// Noise applied to the strategy parameters
    pub noise: StrategyNoise,
}

impl AdaptiveMutation {
    /// Create with the default noise (0.1, 0.05, 0.005)
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom strategy noise
    pub fn with_noise(noise: StrategyNoise) -> Self {
        Self { noise }
    }
}

impl MutationOperator<AdaptiveGenome> for AdaptiveMutation {
    fn mutate<R: Rng>(&self, genome: &mut AdaptiveGenome, rng: &mut R) {
        flip_cells(&mut genome.grid, genome.params.mutation_step, rng);
        genome.params.perturb(&self.noise, rng);
    }
}
