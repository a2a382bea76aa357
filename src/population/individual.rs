//! Individual wrapper type
//!
//! This module provides the Individual type that wraps a genome with its fitness.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::genome::traits::EvolutionaryGenome;

/// An individual in the population
///
/// Fitness is `None` until the oracle has scored the current grid. Any
/// change to the grid through the accessors below invalidates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Individual<G>
where
    G: EvolutionaryGenome,
{
    genome: G,
    fitness: Option<f64>,
}

impl<G> Individual<G>
where
    G: EvolutionaryGenome,
{
    /// Create a new individual with an unevaluated genome
    pub fn new(genome: G) -> Self {
        Self {
            genome,
            fitness: None,
        }
    }

    /// Create a new individual with a known fitness
    pub fn with_fitness(genome: G, fitness: f64) -> Self {
        Self {
            genome,
            fitness: Some(fitness),
        }
    }

    /// Check if this individual has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// The fitness value, if evaluated
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Set the fitness value
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Mark the fitness as stale
    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Get a reference to the genome
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Get a mutable reference to the genome
    ///
    /// The fitness is invalidated unconditionally. Use [`Individual::modify`]
    /// to keep it when the grid ends up unchanged.
    pub fn genome_mut(&mut self) -> &mut G {
        self.fitness = None;
        &mut self.genome
    }

    /// Apply `f` to the genome, invalidating fitness only if the grid changed
    ///
    /// Returns whether the grid changed.
    pub fn modify<T>(&mut self, f: impl FnOnce(&mut G) -> T) -> (T, bool) {
        let before = self.genome.grid().clone();
        let out = f(&mut self.genome);
        let changed = *self.genome.grid() != before;
        if changed {
            self.fitness = None;
        }
        (out, changed)
    }

    /// Replace the genome, keeping the fitness when the grid is identical
    pub fn replace_genome(&mut self, genome: G) {
        if genome.grid() != self.genome.grid() {
            self.fitness = None;
        }
        self.genome = genome;
    }

    /// Take the genome out of this individual
    pub fn into_genome(self) -> G {
        self.genome
    }

    /// Check if this individual is better than another
    pub fn is_better_than(&self, other: &Self) -> bool {
        match (self.fitness, other.fitness) {
            (Some(f1), Some(f2)) => f1 > f2,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl<G> PartialEq for Individual<G>
where
    G: EvolutionaryGenome + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.genome == other.genome && self.fitness == other.fitness
    }
}

impl<G> PartialOrd for Individual<G>
where
    G: EvolutionaryGenome + PartialEq,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.fitness, other.fitness) {
            (Some(f1), Some(f2)) => f1.partial_cmp(&f2),
            (Some(_), None) => Some(Ordering::Greater),
            (None, Some(_)) => Some(Ordering::Less),
            (None, None) => Some(Ordering::Equal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::grid::ShapeGrid;
    use crate::hyperparameter::self_adaptive::{AdaptiveGenome, AdaptiveParams};

    #[test]
    fn test_individual_new() {
        let individual = Individual::new(ShapeGrid::empty(2, 2));
        assert!(!individual.is_evaluated());
        assert_eq!(individual.fitness(), None);
    }

    #[test]
    fn test_individual_set_fitness() {
        let mut individual = Individual::new(ShapeGrid::empty(2, 2));
        individual.set_fitness(3.5);
        assert_eq!(individual.fitness(), Some(3.5));
    }

    #[test]
    fn test_genome_mut_invalidates() {
        let mut individual = Individual::with_fitness(ShapeGrid::empty(2, 2), 1.0);
        individual.genome_mut().flip(0, 0);
        assert!(!individual.is_evaluated());
    }

    #[test]
    fn test_modify_keeps_fitness_when_unchanged() {
        let mut individual = Individual::with_fitness(ShapeGrid::empty(2, 2), 1.0);
        let (_, changed) = individual.modify(|g| {
            g.flip(1, 1);
            g.flip(1, 1);
        });
        assert!(!changed);
        assert_eq!(individual.fitness(), Some(1.0));

        let (_, changed) = individual.modify(|g| g.flip(0, 1));
        assert!(changed);
        assert!(!individual.is_evaluated());
    }

    #[test]
    fn test_param_only_change_keeps_fitness() {
        let genome = AdaptiveGenome::new(ShapeGrid::empty(2, 2), AdaptiveParams::default());
        let mut individual = Individual::with_fitness(genome, 2.0);
        individual.modify(|g| g.params.mutation_step = 0.3);
        assert_eq!(individual.fitness(), Some(2.0));
        assert_eq!(individual.genome().params.mutation_step, 0.3);
    }

    #[test]
    fn test_replace_genome() {
        let mut individual = Individual::with_fitness(ShapeGrid::empty(2, 2), 1.0);
        individual.replace_genome(ShapeGrid::empty(2, 2));
        assert!(individual.is_evaluated());
        individual.replace_genome(ShapeGrid::filled(2, 2, true));
        assert!(!individual.is_evaluated());
    }

    #[test]
    fn test_individual_is_better_than() {
        let ind1 = Individual::with_fitness(ShapeGrid::empty(1, 1), 100.0);
        let ind2 = Individual::with_fitness(ShapeGrid::empty(1, 1), 50.0);
        let ind3 = Individual::new(ShapeGrid::empty(1, 1));

        assert!(ind1.is_better_than(&ind2));
        assert!(!ind2.is_better_than(&ind1));
        assert!(ind2.is_better_than(&ind3));
        assert!(!ind3.is_better_than(&ind2));
        assert!(ind1 > ind2);
    }
}
