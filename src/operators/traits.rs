//! Operator traits
//!
//! This module defines the core operator traits for genetic algorithms.

use rand::Rng;

use crate::error::{OperatorError, OperatorResult};
use crate::genome::traits::EvolutionaryGenome;

/// Selection operator trait
///
/// Selection only looks at fitness values, so operators work on the fitness
/// column of a population and return indices into it.
pub trait SelectionOperator: Send + Sync {
    /// Select `count` indices, with replacement overall
    fn select<R: Rng>(
        &self,
        fitness: &[f64],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, OperatorError>;
}

/// Crossover operator trait
///
/// Combines genetic material from two parents to create offspring. Offspring
/// are fresh values; they never share storage with the parents.
pub trait CrossoverOperator<G: EvolutionaryGenome>: Send + Sync {
    /// Apply crossover to two parents and produce two offspring
    fn crossover<R: Rng>(&self, parent1: &G, parent2: &G, rng: &mut R) -> OperatorResult<(G, G)>;
}

/// Mutation operator trait
///
/// Applies random changes to a genome.
pub trait MutationOperator<G: EvolutionaryGenome>: Send + Sync {
    /// Apply mutation to a genome in place
    fn mutate<R: Rng>(&self, genome: &mut G, rng: &mut R);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::grid::ShapeGrid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct UniformPick;

    impl SelectionOperator for UniformPick {
        fn select<R: Rng>(
            &self,
            fitness: &[f64],
            count: usize,
            rng: &mut R,
        ) -> Result<Vec<usize>, OperatorError> {
            if fitness.is_empty() {
                return Err(OperatorError::SelectionFailed("empty".to_string()));
            }
            Ok((0..count).map(|_| rng.gen_range(0..fitness.len())).collect())
        }
    }

    struct SwapParents;

    impl CrossoverOperator<ShapeGrid> for SwapParents {
        fn crossover<R: Rng>(
            &self,
            parent1: &ShapeGrid,
            parent2: &ShapeGrid,
            _rng: &mut R,
        ) -> OperatorResult<(ShapeGrid, ShapeGrid)> {
            OperatorResult::Success((parent2.clone(), parent1.clone()))
        }
    }

    struct Invert;

    impl MutationOperator<ShapeGrid> for Invert {
        fn mutate<R: Rng>(&self, genome: &mut ShapeGrid, _rng: &mut R) {
            *genome = genome.complement();
        }
    }

    #[test]
    fn test_mock_selection() {
        let mut rng = StdRng::seed_from_u64(0);
        let picks = UniformPick.select(&[1.0, 2.0, 3.0], 5, &mut rng).unwrap();
        assert_eq!(picks.len(), 5);
        assert!(picks.iter().all(|&i| i < 3));
        assert!(UniformPick.select(&[], 1, &mut rng).is_err());
    }

    #[test]
    fn test_mock_crossover_and_mutation() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = ShapeGrid::empty(2, 2);
        let b = ShapeGrid::filled(2, 2, true);
        let (mut c1, c2) = SwapParents.crossover(&a, &b, &mut rng).genome().unwrap();
        assert_eq!(c1, b);
        assert_eq!(c2, a);

        Invert.mutate(&mut c1, &mut rng);
        assert_eq!(c1, a);
        assert_eq!(b.count_ones(), 4);
    }
}
