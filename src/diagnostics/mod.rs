//! Diagnostics and statistics
//!
//! This module provides the per-generation statistics log of an
//! evolutionary run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::genome::traits::EvolutionaryGenome;
use crate::population::population::Population;

/// Statistics for a single generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (0 is the initial population)
    pub generation: usize,
    /// Oracle calls made in this generation
    pub evaluations: usize,
    /// Mean fitness
    pub mean: f64,
    /// Population standard deviation of fitness
    pub std: f64,
    /// Lowest fitness
    pub min: f64,
    /// Highest fitness
    pub max: f64,
    /// Best-ever fitness after this generation
    pub best_ever: f64,
    /// Timing information
    pub timing: TimingStats,
}

/// Timing statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Time spent on fitness evaluation (ms)
    pub evaluation_ms: f64,
    /// Time spent on selection (ms)
    pub selection_ms: f64,
    /// Time spent on crossover and mutation (ms)
    pub variation_ms: f64,
    /// Total generation time (ms)
    pub total_ms: f64,
}

impl TimingStats {
    /// Create new timing stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Set evaluation time
    pub fn with_evaluation(mut self, duration: Duration) -> Self {
        self.evaluation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set selection time
    pub fn with_selection(mut self, duration: Duration) -> Self {
        self.selection_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set variation time
    pub fn with_variation(mut self, duration: Duration) -> Self {
        self.variation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set total time
    pub fn with_total(mut self, duration: Duration) -> Self {
        self.total_ms = duration.as_secs_f64() * 1000.0;
        self
    }
}

impl GenerationStats {
    /// Aggregate a set of fitness values
    ///
    /// An empty set yields zero mean and spread with infinite bounds.
    pub fn from_fitness(fitness: &[f64], generation: usize, evaluations: usize) -> Self {
        let n = fitness.len() as f64;
        let (min, max) = fitness
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| {
                (lo.min(f), hi.max(f))
            });
        let (mean, std) = if fitness.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = fitness.iter().sum::<f64>() / n;
            let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        };

        Self {
            generation,
            evaluations,
            mean,
            std,
            min,
            max,
            best_ever: max,
            timing: TimingStats::default(),
        }
    }

    /// Compute statistics from a fully evaluated population
    pub fn from_population<G>(
        population: &Population<G>,
        generation: usize,
        evaluations: usize,
    ) -> EvoResult<Self>
    where
        G: EvolutionaryGenome,
    {
        let fitness = population
            .fitness_values()
            .map_err(EvolutionError::Unevaluated)?;
        Ok(Self::from_fitness(&fitness, generation, evaluations))
    }

    /// Set the best-ever fitness
    pub fn with_best_ever(mut self, best_ever: f64) -> Self {
        self.best_ever = best_ever;
        self
    }

    /// Set timing information
    pub fn with_timing(mut self, timing: TimingStats) -> Self {
        self.timing = timing;
        self
    }
}

/// Append-only statistics log for an entire run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsLog {
    generations: Vec<GenerationStats>,
    /// Total runtime in milliseconds
    pub total_runtime_ms: f64,
}

impl StatisticsLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation's statistics
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// All recorded entries, oldest first
    pub fn generations(&self) -> &[GenerationStats] {
        &self.generations
    }

    /// Get the number of generations recorded
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&GenerationStats> {
        self.generations.last()
    }

    /// Highest fitness seen in any generation
    pub fn best_fitness(&self) -> Option<f64> {
        self.generations
            .iter()
            .map(|g| g.max)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Per-generation maximum fitness
    pub fn max_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.max).collect()
    }

    /// Per-generation mean fitness
    pub fn mean_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.mean).collect()
    }

    /// Best-ever fitness after each generation
    pub fn best_ever_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_ever).collect()
    }

    /// Total oracle calls across the run
    pub fn total_evaluations(&self) -> usize {
        self.generations.iter().map(|g| g.evaluations).sum()
    }

    /// Set the total runtime
    pub fn set_runtime(&mut self, duration: Duration) {
        self.total_runtime_ms = duration.as_secs_f64() * 1000.0;
    }

    /// Render the log as a table, one row per generation
    pub fn table(&self) -> String {
        let mut out = format!(
            "{:>4} {:>6} {:>12} {:>12} {:>12} {:>12}\n",
            "gen", "nevals", "avg", "std", "min", "max"
        );
        for g in &self.generations {
            out.push_str(&format!(
                "{:>4} {:>6} {:>12.6} {:>12.6} {:>12.6} {:>12.6}\n",
                g.generation, g.evaluations, g.mean, g.std, g.min, g.max
            ));
        }
        out
    }

    /// Get a summary of the evolution run
    pub fn summary(&self) -> String {
        let best = self.best_fitness().unwrap_or(f64::NEG_INFINITY);
        let final_best = self.last().map_or(f64::NEG_INFINITY, |g| g.best_ever);

        format!(
            "Evolution Summary:\n\
             - Generations: {}\n\
             - Evaluations: {}\n\
             - Best fitness: {:.6}\n\
             - Final best: {:.6}\n\
             - Runtime: {:.2}ms",
            self.len().saturating_sub(1),
            self.total_evaluations(),
            best,
            final_best,
            self.total_runtime_ms,
        )
    }
}

/// Result of an evolution run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EvolutionResult<G>
where
    G: EvolutionaryGenome,
{
    /// The best genome found
    pub best_genome: G,
    /// The best fitness value
    pub best_fitness: f64,
    /// Number of generations completed
    pub generations: usize,
    /// Total fitness evaluations
    pub evaluations: usize,
    /// Statistics for the run
    pub stats: StatisticsLog,
}

impl<G> EvolutionResult<G>
where
    G: EvolutionaryGenome,
{
    /// Create a new evolution result
    pub fn new(best_genome: G, best_fitness: f64, generations: usize, evaluations: usize) -> Self {
        Self {
            best_genome,
            best_fitness,
            generations,
            evaluations,
            stats: StatisticsLog::new(),
        }
    }

    /// Add statistics to the result
    pub fn with_stats(mut self, stats: StatisticsLog) -> Self {
        self.stats = stats;
        self
    }
}

pub mod prelude {
    pub use super::{EvolutionResult, GenerationStats, StatisticsLog, TimingStats};
}
