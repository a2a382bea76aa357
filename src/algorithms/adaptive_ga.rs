//! Self-adaptive Genetic Algorithm
//!
//! Every individual carries its own crossover probability, mutation
//! probability and per-cell flip rate. Pairs recombine with the first
//! parent's crossover probability, offspring mutate with their own mutation
//! probability, and the strategy parameters are blended and perturbed along
//! with the grids. Selection is stochastic universal sampling, so fitness
//! values must be non-negative.

use std::time::Instant;

use rand::Rng;

use crate::algorithms::state::{vary, EvolutionState};
use crate::diagnostics::{EvolutionResult, TimingStats};
use crate::error::{EvoResult, EvolutionError};
use crate::evaluation::dispatcher::{DispatchMode, Dispatcher};
use crate::fitness::traits::FitnessOracle;
use crate::genome::grid::GridLayout;
use crate::hyperparameter::self_adaptive::{AdaptiveGenome, AdaptiveParams};
use crate::operators::crossover::AdaptiveCrossover;
use crate::operators::mutation::AdaptiveMutation;
use crate::operators::selection::StochasticUniversalSampling;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// Configuration for the self-adaptive GA
#[derive(Clone, Debug)]
pub struct AdaptiveGAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations after generation 0
    pub generations: usize,
    /// Strategy parameters given to every initial individual
    pub initial_params: AdaptiveParams,
    /// Shape of randomly generated grids
    pub layout: GridLayout,
    /// How unevaluated individuals are dispatched
    pub dispatch: DispatchMode,
}

impl Default for AdaptiveGAConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 50,
            initial_params: AdaptiveParams::default(),
            layout: GridLayout::square(10),
            dispatch: DispatchMode::Sequential,
        }
    }
}

/// Builder for AdaptiveGA
pub struct AdaptiveGABuilder<O> {
    config: AdaptiveGAConfig,
    crossover: AdaptiveCrossover,
    mutation: AdaptiveMutation,
    oracle: Option<O>,
}

impl AdaptiveGABuilder<()> {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: AdaptiveGAConfig::default(),
            crossover: AdaptiveCrossover::new(),
            mutation: AdaptiveMutation::new(),
            oracle: None,
        }
    }
}

impl Default for AdaptiveGABuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> AdaptiveGABuilder<O> {
    /// Replace the whole configuration
    pub fn config(mut self, config: AdaptiveGAConfig) -> Self {
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

    /// Set the initial strategy parameters
    pub fn initial_params(mut self, params: AdaptiveParams) -> Self {
        self.config.initial_params = params;
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

    /// Set the crossover operator
    pub fn crossover(mut self, crossover: AdaptiveCrossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Set the mutation operator
    pub fn mutation(mut self, mutation: AdaptiveMutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Set the fitness oracle
    pub fn oracle<NewO>(self, oracle: NewO) -> AdaptiveGABuilder<NewO>
    where
        NewO: FitnessOracle,
    {
        AdaptiveGABuilder {
            config: self.config,
            crossover: self.crossover,
            mutation: self.mutation,
            oracle: Some(oracle),
        }
    }
}

impl<O: FitnessOracle> AdaptiveGABuilder<O> {
    /// Build the AdaptiveGA instance
    pub fn build(self) -> EvoResult<AdaptiveGA<O>> {
        if self.config.population_size == 0 {
            return Err(EvolutionError::Configuration(
                "population size must be positive".to_string(),
            ));
        }
        let oracle = self.oracle.ok_or_else(|| {
            EvolutionError::Configuration("Fitness oracle must be specified".to_string())
        })?;
        let dispatcher = Dispatcher::from_mode(self.config.dispatch)?;

        Ok(AdaptiveGA {
            config: self.config,
            selection: StochasticUniversalSampling::new(),
            crossover: self.crossover,
            mutation: self.mutation,
            oracle,
            dispatcher,
        })
    }
}

/// Self-adaptive Genetic Algorithm
pub struct AdaptiveGA<O> {
    config: AdaptiveGAConfig,
    selection: StochasticUniversalSampling,
    crossover: AdaptiveCrossover,
    mutation: AdaptiveMutation,
    oracle: O,
    dispatcher: Dispatcher,
}

impl<O: FitnessOracle> AdaptiveGA<O> {
    /// Create a builder for AdaptiveGA
    pub fn builder() -> AdaptiveGABuilder<()> {
        AdaptiveGABuilder::new()
    }

    /// Configuration in use
    pub fn config(&self) -> &AdaptiveGAConfig {
        &self.config
    }

    /// Run from a random population carrying the initial parameters
    pub fn run<R: Rng>(&self, rng: &mut R) -> EvoResult<EvolutionResult<AdaptiveGenome>> {
        let population = (0..self.config.population_size)
            .map(|_| {
                Individual::new(AdaptiveGenome::generate_with(
                    &self.config.layout,
                    self.config.initial_params,
                    rng,
                ))
            })
            .collect();
        self.run_from(population, rng)
    }

    /// Run from an existing population
    pub fn run_from<R: Rng>(
        &self,
        population: Population<AdaptiveGenome>,
        rng: &mut R,
    ) -> EvoResult<EvolutionResult<AdaptiveGenome>> {
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
                |g: &AdaptiveGenome| g.params.crossover_probability,
                |g: &AdaptiveGenome| g.params.mutation_probability,
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
