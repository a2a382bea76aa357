//! Simple Genetic Algorithm
//!
//! This module implements the generational loop over shape grids: select a
//! pool, recombine adjacent pairs, mutate, evaluate, and replace the whole
//! population. Only the hall of fame carries the best grid across
//! generations.

use std::time::Instant;

use rand::Rng;

use crate::algorithms::state::{vary, EvolutionState};
use crate::diagnostics::{EvolutionResult, TimingStats};
use crate::error::{EvoResult, EvolutionError};
use crate::evaluation::dispatcher::{DispatchMode, Dispatcher};
use crate::fitness::traits::FitnessOracle;
use crate::genome::grid::GridLayout;
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::population::population::Population;

/// Configuration for the Simple GA
#[derive(Clone, Debug)]
pub struct SimpleGAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations after generation 0
    pub generations: usize,
    /// Probability that an adjacent pair is recombined
    pub crossover_probability: f64,
    /// Probability that an offspring is mutated
    pub mutation_probability: f64,
    /// Shape of randomly generated grids
    pub layout: GridLayout,
    /// How unevaluated individuals are dispatched
    pub dispatch: DispatchMode,
}

impl Default for SimpleGAConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 50,
            crossover_probability: 0.5,
            mutation_probability: 0.2,
            layout: GridLayout::square(10),
            dispatch: DispatchMode::Sequential,
        }
    }
}

impl SimpleGAConfig {
    /// Reject configurations the loop cannot run
    pub fn validate(&self) -> EvoResult<()> {
        if self.population_size == 0 {
            return Err(EvolutionError::Configuration(
                "population size must be positive".to_string(),
            ));
        }
        for (name, p) in [
            ("crossover probability", self.crossover_probability),
            ("mutation probability", self.mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EvolutionError::Configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

/// Builder for SimpleGA
pub struct SimpleGABuilder<G, S, C, M, O>
where
    G: EvolutionaryGenome,
{
    config: SimpleGAConfig,
    selection: Option<S>,
    crossover: Option<C>,
    mutation: Option<M>,
    oracle: Option<O>,
    _phantom: std::marker::PhantomData<G>,
}

impl<G> SimpleGABuilder<G, (), (), (), ()>
where
    G: EvolutionaryGenome,
{
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SimpleGAConfig::default(),
            selection: None,
            crossover: None,
            mutation: None,
            oracle: None,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<G> Default for SimpleGABuilder<G, (), (), (), ()>
where
    G: EvolutionaryGenome,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G, S, C, M, O> SimpleGABuilder<G, S, C, M, O>
where
    G: EvolutionaryGenome,
{
    /// Replace the whole configuration
    pub fn config(mut self, config: SimpleGAConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set the number of generations
    pub fn generations(mut self, generations: usize) -> Self {
        self.config.generations = generations;
        self
    }

    /// Set the crossover probability
    pub fn crossover_probability(mut self, probability: f64) -> Self {
        self.config.crossover_probability = probability;
        self
    }

    /// Set the mutation probability
    pub fn mutation_probability(mut self, probability: f64) -> Self {
        self.config.mutation_probability = probability;
        self
    }

    /// Set the layout of random grids
    pub fn layout(mut self, layout: GridLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the dispatch mode
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.config.dispatch = mode;
        self
    }

    /// Set the selection operator
    pub fn selection<NewS>(self, selection: NewS) -> SimpleGABuilder<G, NewS, C, M, O>
    where
        NewS: SelectionOperator,
    {
        SimpleGABuilder {
            config: self.config,
            selection: Some(selection),
            crossover: self.crossover,
            mutation: self.mutation,
            oracle: self.oracle,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Set the crossover operator
    pub fn crossover<NewC>(self, crossover: NewC) -> SimpleGABuilder<G, S, NewC, M, O>
    where
        NewC: CrossoverOperator<G>,
    {
        SimpleGABuilder {
            config: self.config,
            selection: self.selection,
            crossover: Some(crossover),
            mutation: self.mutation,
            oracle: self.oracle,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Set the mutation operator
    pub fn mutation<NewM>(self, mutation: NewM) -> SimpleGABuilder<G, S, C, NewM, O>
    where
        NewM: MutationOperator<G>,
    {
        SimpleGABuilder {
            config: self.config,
            selection: self.selection,
            crossover: self.crossover,
            mutation: Some(mutation),
            oracle: self.oracle,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Set the fitness oracle
    pub fn oracle<NewO>(self, oracle: NewO) -> SimpleGABuilder<G, S, C, M, NewO>
    where
        NewO: FitnessOracle,
    {
        SimpleGABuilder {
            config: self.config,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            oracle: Some(oracle),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<G, S, C, M, O> SimpleGABuilder<G, S, C, M, O>
where
    G: EvolutionaryGenome,
    S: SelectionOperator,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    O: FitnessOracle,
{
    /// Build the SimpleGA instance
    pub fn build(self) -> EvoResult<SimpleGA<G, S, C, M, O>> {
        self.config.validate()?;

        let selection = self.selection.ok_or_else(|| {
            EvolutionError::Configuration("Selection operator must be specified".to_string())
        })?;

        let crossover = self.crossover.ok_or_else(|| {
            EvolutionError::Configuration("Crossover operator must be specified".to_string())
        })?;

        let mutation = self.mutation.ok_or_else(|| {
            EvolutionError::Configuration("Mutation operator must be specified".to_string())
        })?;

        let oracle = self.oracle.ok_or_else(|| {
            EvolutionError::Configuration("Fitness oracle must be specified".to_string())
        })?;

        let dispatcher = Dispatcher::from_mode(self.config.dispatch)?;

        Ok(SimpleGA {
            config: self.config,
            selection,
            crossover,
            mutation,
            oracle,
            dispatcher,
            _phantom: std::marker::PhantomData,
        })
    }
}

/// Simple Genetic Algorithm
///
/// Fully generational: the offspring replace the population every
/// generation, with no elitism.
pub struct SimpleGA<G, S, C, M, O>
where
    G: EvolutionaryGenome,
{
    config: SimpleGAConfig,
    selection: S,
    crossover: C,
    mutation: M,
    oracle: O,
    dispatcher: Dispatcher,
    _phantom: std::marker::PhantomData<G>,
}

impl<G, S, C, M, O> SimpleGA<G, S, C, M, O>
where
    G: EvolutionaryGenome,
    S: SelectionOperator,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    O: FitnessOracle,
{
    /// Create a builder for SimpleGA
    pub fn builder() -> SimpleGABuilder<G, (), (), (), ()> {
        SimpleGABuilder::new()
    }

    /// Configuration in use
    pub fn config(&self) -> &SimpleGAConfig {
        &self.config
    }

    /// Run from a random population of the configured layout
    pub fn run<R: Rng>(&self, rng: &mut R) -> EvoResult<EvolutionResult<G>> {
        let population = Population::random(self.config.population_size, &self.config.layout, rng);
        self.run_from(population, rng)
    }

    /// Run from an existing population
    pub fn run_from<R: Rng>(
        &self,
        population: Population<G>,
        rng: &mut R,
    ) -> EvoResult<EvolutionResult<G>> {
        let mut state = EvolutionState::initialize(population, &self.dispatcher, &self.oracle)?;

        for _ in 0..self.config.generations {
            let generation_start = Instant::now();

            let selection_start = Instant::now();
            let mut pool = state.select_pool(&self.selection, rng)?;
            let selection_time = selection_start.elapsed();

            let variation_time = vary(
                &mut pool,
                &self.crossover,
                &self.mutation,
                |_| self.config.crossover_probability,
                |_| self.config.mutation_probability,
                rng,
            )?;

            let timing = TimingStats::new()
                .with_selection(selection_time)
                .with_variation(variation_time);
            state.advance(
                Population::from_individuals(pool),
                &self.dispatcher,
                &self.oracle,
                timing,
                generation_start,
            )?;
        }

        state.into_result()
    }
}
