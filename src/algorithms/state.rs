//! Generational loop state
//!
//! State shared by the generational drivers: the current population, the
//! hall of fame and the statistics log, plus the variation step both
//! drivers apply to their selected pools.

use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use crate::diagnostics::{EvolutionResult, GenerationStats, StatisticsLog, TimingStats};
use crate::error::{EvoResult, EvolutionError};
use crate::evaluation::dispatcher::Dispatcher;
use crate::fitness::traits::FitnessOracle;
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::population::hall_of_fame::HallOfFame;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// Mutable state of a generational run
///
/// The driver is the single writer of every field. The population is
/// replaced wholesale each generation; the log only grows.
#[derive(Clone, Debug)]
pub struct EvolutionState<G>
where
    G: EvolutionaryGenome,
{
    /// Current population, fully evaluated between generations
    pub population: Population<G>,
    /// Best-ever individual
    pub hall_of_fame: HallOfFame<G>,
    /// Per-generation statistics, generation 0 first
    pub stats: StatisticsLog,
    /// Total oracle calls so far
    pub evaluations: usize,
    started: Instant,
}

impl<G> EvolutionState<G>
where
    G: EvolutionaryGenome,
{
    /// Evaluate the initial population and record generation 0
    pub fn initialize<O>(
        mut population: Population<G>,
        dispatcher: &Dispatcher,
        oracle: &O,
    ) -> EvoResult<Self>
    where
        O: FitnessOracle + ?Sized,
    {
        if population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let started = Instant::now();
        population.set_generation(0);

        let eval_start = Instant::now();
        let evaluations = dispatcher.evaluate(&mut population, oracle)?;
        let timing = TimingStats::new().with_evaluation(eval_start.elapsed());

        let mut state = Self {
            population,
            hall_of_fame: HallOfFame::new(),
            stats: StatisticsLog::new(),
            evaluations: 0,
            started,
        };
        state.record(evaluations, timing.with_total(started.elapsed()))?;
        Ok(state)
    }

    /// Current generation number
    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    /// Evaluate `offspring`, update the hall of fame and log, and make it
    /// the current population
    pub fn advance<O>(
        &mut self,
        mut offspring: Population<G>,
        dispatcher: &Dispatcher,
        oracle: &O,
        timing: TimingStats,
        generation_start: Instant,
    ) -> EvoResult<&GenerationStats>
    where
        O: FitnessOracle + ?Sized,
    {
        offspring.set_generation(self.generation() + 1);

        let eval_start = Instant::now();
        let evaluations = dispatcher.evaluate(&mut offspring, oracle)?;
        let timing = timing.with_evaluation(eval_start.elapsed());

        self.population = offspring;
        self.record(evaluations, timing.with_total(generation_start.elapsed()))
    }

    fn record(&mut self, evaluations: usize, timing: TimingStats) -> EvoResult<&GenerationStats> {
        self.evaluations += evaluations;
        self.hall_of_fame.update(self.population.iter());
        let best_ever = self.hall_of_fame.best_fitness().unwrap_or(f64::NEG_INFINITY);

        let stats = GenerationStats::from_population(&self.population, self.generation(), evaluations)?
            .with_best_ever(best_ever)
            .with_timing(timing);
        info!(
            "gen {:>4} | nevals {:>4} | mean {:.6} | std {:.6} | max {:.6} | best {:.6}",
            stats.generation, stats.evaluations, stats.mean, stats.std, stats.max, stats.best_ever
        );
        self.stats.record(stats);
        self.stats
            .last()
            .ok_or_else(|| EvolutionError::Configuration("statistics log is empty".to_string()))
    }

    /// Select a pool the size of the population, cloning the chosen individuals
    pub fn select_pool<S, R>(&self, selection: &S, rng: &mut R) -> EvoResult<Vec<Individual<G>>>
    where
        S: SelectionOperator,
        R: Rng,
    {
        let fitness = self
            .population
            .fitness_values()
            .map_err(EvolutionError::Unevaluated)?;
        let chosen = selection.select(&fitness, fitness.len(), rng)?;
        Ok(chosen
            .into_iter()
            .map(|i| self.population[i].clone())
            .collect())
    }

    /// Finish the run
    pub fn into_result(mut self) -> EvoResult<EvolutionResult<G>> {
        self.stats.set_runtime(self.started.elapsed());
        let generations = self.generation();
        let best = self
            .hall_of_fame
            .into_best()
            .ok_or(EvolutionError::EmptyPopulation)?;
        let best_fitness = best
            .fitness()
            .ok_or(EvolutionError::Unevaluated(0))?;
        Ok(
            EvolutionResult::new(best.into_genome(), best_fitness, generations, self.evaluations)
                .with_stats(self.stats),
        )
    }
}

/// Crossover on adjacent pairs, then mutation of every offspring
///
/// Pairs are `(0, 1), (2, 3), ...`; an odd trailing individual is only
/// mutated. `crossover_gate` gives the probability that a pair is
/// recombined, from its first member; `mutation_gate` the probability that
/// an individual is mutated. Fitness is invalidated only for individuals
/// whose grid changed. Returns the time spent.
pub fn vary<G, C, M, R>(
    offspring: &mut [Individual<G>],
    crossover: &C,
    mutation: &M,
    crossover_gate: impl Fn(&G) -> f64,
    mutation_gate: impl Fn(&G) -> f64,
    rng: &mut R,
) -> EvoResult<Duration>
where
    G: EvolutionaryGenome,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    R: Rng,
{
    let start = Instant::now();
    for pair in offspring.chunks_mut(2) {
        if let [first, second] = pair {
            if rng.gen::<f64>() < crossover_gate(first.genome()) {
                let (child1, child2) = crossover
                    .crossover(first.genome(), second.genome(), rng)
                    .into_result()?;
                first.replace_genome(child1);
                second.replace_genome(child2);
            }
        }
    }
    for individual in offspring.iter_mut() {
        if rng.gen::<f64>() < mutation_gate(individual.genome()) {
            individual.modify(|genome| mutation.mutate(genome, rng));
        }
    }
    Ok(start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::benchmarks::CountOnes;
    use crate::genome::grid::{GridLayout, ShapeGrid};
    use crate::operators::crossover::TwoPointCrossover;
    use crate::operators::mutation::BitFlipMutation;
    use crate::operators::selection::TournamentSelection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn initial(size: usize, seed: u64) -> EvolutionState<ShapeGrid> {
        let mut rng = StdRng::seed_from_u64(seed);
        let population = Population::random(size, &GridLayout::square(4), &mut rng);
        EvolutionState::initialize(population, &Dispatcher::sequential(), &CountOnes).unwrap()
    }

    #[test]
    fn test_initialize_records_generation_zero() {
        let state = initial(6, 1);
        assert_eq!(state.generation(), 0);
        assert_eq!(state.evaluations, 6);
        assert_eq!(state.stats.len(), 1);
        assert!(state.population.all_evaluated());
        let best = state.population.best().and_then(|b| b.fitness());
        assert_eq!(state.hall_of_fame.best_fitness(), best);
        assert_eq!(state.stats.last().map(|s| s.best_ever), best);
    }

    #[test]
    fn test_initialize_rejects_empty() {
        let empty: Population<ShapeGrid> = Population::from_individuals(Vec::new());
        let err = EvolutionState::initialize(empty, &Dispatcher::sequential(), &CountOnes);
        assert!(matches!(err, Err(EvolutionError::EmptyPopulation)));
    }

    #[test]
    fn test_vary_identity_when_gates_closed() {
        let mut rng = StdRng::seed_from_u64(2);
        let state = initial(5, 2);
        let mut pool: Vec<_> = state.population.individuals().to_vec();
        vary(
            &mut pool,
            &TwoPointCrossover::new(),
            &BitFlipMutation::new(1.0),
            |_| 0.0,
            |_| 0.0,
            &mut rng,
        )
        .unwrap();
        assert!(pool.iter().all(|i| i.is_evaluated()));
        for (a, b) in pool.iter().zip(state.population.iter()) {
            assert_eq!(a.genome(), b.genome());
        }
    }

    #[test]
    fn test_vary_mutation_invalidates_changed() {
        let mut rng = StdRng::seed_from_u64(3);
        let state = initial(5, 3);
        let mut pool: Vec<_> = state.population.individuals().to_vec();
        vary(
            &mut pool,
            &TwoPointCrossover::new(),
            &BitFlipMutation::new(1.0),
            |_| 0.0,
            |_| 1.0,
            &mut rng,
        )
        .unwrap();
        for (a, b) in pool.iter().zip(state.population.iter()) {
            assert_eq!(*a.genome(), b.genome().complement());
            assert!(!a.is_evaluated());
        }
    }

    #[test]
    fn test_advance_keeps_hall_of_fame_monotonic() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = initial(8, 4);
        let dispatcher = Dispatcher::sequential();
        let selection = TournamentSelection::new(2);
        let mut previous = state.hall_of_fame.best_fitness().unwrap();
        for _ in 0..5 {
            let start = Instant::now();
            let mut pool = state.select_pool(&selection, &mut rng).unwrap();
            vary(
                &mut pool,
                &TwoPointCrossover::new(),
                &BitFlipMutation::new(0.2),
                |_| 0.7,
                |_| 0.5,
                &mut rng,
            )
            .unwrap();
            state
                .advance(
                    Population::from_individuals(pool),
                    &dispatcher,
                    &CountOnes,
                    TimingStats::new(),
                    start,
                )
                .unwrap();
            let current = state.hall_of_fame.best_fitness().unwrap();
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(state.generation(), 5);
        assert_eq!(state.stats.len(), 6);
        assert_eq!(state.population.len(), 8);

        let result = state.into_result().unwrap();
        assert_eq!(result.generations, 5);
        assert_eq!(result.best_fitness, previous);
    }
}
