//! Population type
//!
//! This module provides the Population container type.

use rand::Rng;

use crate::genome::grid::GridLayout;
use crate::genome::traits::EvolutionaryGenome;
use crate::population::individual::Individual;

/// An ordered, fixed-size population of individuals
///
/// Order matters only where crossover pairs adjacent entries.
#[derive(Clone, Debug)]
pub struct Population<G>
where
    G: EvolutionaryGenome,
{
    individuals: Vec<Individual<G>>,
    generation: usize,
}

impl<G> Population<G>
where
    G: EvolutionaryGenome,
{
    /// Create a population from a vector of individuals
    pub fn from_individuals(individuals: Vec<Individual<G>>) -> Self {
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Wrap unevaluated genomes
    pub fn from_genomes(genomes: impl IntoIterator<Item = G>) -> Self {
        Self::from_individuals(genomes.into_iter().map(Individual::new).collect())
    }

    /// Create a random population
    pub fn random<R: Rng>(size: usize, layout: &GridLayout, rng: &mut R) -> Self {
        Self::from_genomes((0..size).map(|_| G::generate(layout, rng)))
    }

    /// Get the current generation
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Set the generation number
    pub fn set_generation(&mut self, generation: usize) {
        self.generation = generation;
    }

    /// Get the population size
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get an individual by index
    pub fn get(&self, index: usize) -> Option<&Individual<G>> {
        self.individuals.get(index)
    }

    /// Get an iterator over the individuals
    pub fn iter(&self) -> impl Iterator<Item = &Individual<G>> {
        self.individuals.iter()
    }

    /// Get a mutable iterator over the individuals
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Individual<G>> {
        self.individuals.iter_mut()
    }

    /// Get the underlying slice of individuals
    pub fn individuals(&self) -> &[Individual<G>] {
        &self.individuals
    }

    /// Get mutable access to the individuals
    pub fn individuals_mut(&mut self) -> &mut [Individual<G>] {
        &mut self.individuals
    }

    /// Get the best evaluated individual; ties keep the earliest
    pub fn best(&self) -> Option<&Individual<G>> {
        self.individuals
            .iter()
            .filter_map(|i| i.fitness().map(|f| (i, f)))
            .fold(None, |best: Option<(&Individual<G>, f64)>, (i, f)| match best {
                Some((_, bf)) if bf >= f => best,
                _ => Some((i, f)),
            })
            .map(|(i, _)| i)
    }

    /// Check if all individuals have been evaluated
    pub fn all_evaluated(&self) -> bool {
        self.individuals.iter().all(|i| i.is_evaluated())
    }

    /// Fitness of every individual, in order
    ///
    /// Fails with the index of the first unevaluated individual.
    pub fn fitness_values(&self) -> Result<Vec<f64>, usize> {
        self.individuals
            .iter()
            .enumerate()
            .map(|(idx, i)| i.fitness().ok_or(idx))
            .collect()
    }
}

impl<G> FromIterator<Individual<G>> for Population<G>
where
    G: EvolutionaryGenome,
{
    fn from_iter<I: IntoIterator<Item = Individual<G>>>(iter: I) -> Self {
        Self::from_individuals(iter.into_iter().collect())
    }
}

impl<G> IntoIterator for Population<G>
where
    G: EvolutionaryGenome,
{
    type Item = Individual<G>;
    type IntoIter = std::vec::IntoIter<Individual<G>>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl<'a, G> IntoIterator for &'a Population<G>
where
    G: EvolutionaryGenome,
{
    type Item = &'a Individual<G>;
    type IntoIter = std::slice::Iter<'a, Individual<G>>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

impl<G> std::ops::Index<usize> for Population<G>
where
    G: EvolutionaryGenome,
{
    type Output = Individual<G>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.individuals[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::grid::ShapeGrid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(values: &[f64]) -> Population<ShapeGrid> {
        values
            .iter()
            .map(|&f| Individual::with_fitness(ShapeGrid::empty(2, 2), f))
            .collect()
    }

    #[test]
    fn test_population_random() {
        let mut rng = StdRng::seed_from_u64(42);
        let population: Population<ShapeGrid> =
            Population::random(10, &GridLayout::square(4), &mut rng);
        assert_eq!(population.len(), 10);
        assert!(population.iter().all(|i| i.genome().shape() == (4, 4)));
        assert!(!population.all_evaluated());
    }

    #[test]
    fn test_population_best() {
        let population = scored(&[10.0, 50.0, 30.0]);
        assert_eq!(population.best().and_then(|i| i.fitness()), Some(50.0));
    }

    #[test]
    fn test_best_ties_keep_first() {
        let mut population = scored(&[5.0, 5.0]);
        population.individuals_mut()[1].genome_mut().flip(0, 0);
        population.individuals_mut()[1].set_fitness(5.0);
        let best = population.best().unwrap();
        assert_eq!(best.genome().count_ones(), 0);
    }

    #[test]
    fn test_best_ignores_unevaluated() {
        let mut population = scored(&[1.0, 2.0]);
        population.individuals_mut()[1].invalidate();
        assert_eq!(population.best().and_then(|i| i.fitness()), Some(1.0));
    }

    #[test]
    fn test_fitness_values() {
        let mut population = scored(&[1.0, 2.0, 3.0]);
        assert_eq!(population.fitness_values(), Ok(vec![1.0, 2.0, 3.0]));
        population.individuals_mut()[2].invalidate();
        assert_eq!(population.fitness_values(), Err(2));
    }
}
