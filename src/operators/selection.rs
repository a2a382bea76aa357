//! Selection operators
//!
//! Tournament selection for the plain driver and stochastic universal
//! sampling for the self-adaptive driver.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::OperatorError;
use crate::operators::traits::SelectionOperator;

/// How tournament contestants are drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContestantSampling {
    /// Contestants are drawn uniformly with replacement
    #[default]
    WithReplacement,
    /// Contestants within one tournament are distinct individuals
    Distinct,
}

/// Tournament selection operator
///
/// Each pick is the fittest of `tournament_size` contestants, drawn with
/// replacement unless [`ContestantSampling::Distinct`] is selected. Picks
/// are independent, so the output is with replacement overall.
#[derive(Clone, Debug)]
pub struct TournamentSelection {
    /// Tournament size (number of individuals competing)
    pub tournament_size: usize,
    /// Contestant sampling mode
    pub sampling: ContestantSampling,
}

impl TournamentSelection {
    /// Create a new tournament selection with the given size
    pub fn new(tournament_size: usize) -> Self {
        assert!(tournament_size >= 1, "Tournament size must be at least 1");
        Self {
            tournament_size,
            sampling: ContestantSampling::WithReplacement,
        }
    }

    /// Set the contestant sampling mode
    pub fn with_sampling(mut self, sampling: ContestantSampling) -> Self {
        self.sampling = sampling;
        self
    }

    fn pick<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize {
        let better = |a: &usize, b: &usize| {
            fitness[*a]
                .partial_cmp(&fitness[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
        };
        let n = fitness.len();
        let winner = match self.sampling {
            ContestantSampling::Distinct => {
                index::sample(rng, n, self.tournament_size.min(n))
                    .into_iter()
                    .max_by(better)
            }
            ContestantSampling::WithReplacement => (0..self.tournament_size)
                .map(|_| rng.gen_range(0..n))
                .max_by(better),
        };
        // tournament_size >= 1 and n >= 1, so there is always a contestant
        winner.unwrap_or(0)
    }
}

impl SelectionOperator for TournamentSelection {
    fn select<R: Rng>(
        &self,
        fitness: &[f64],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, OperatorError> {
        if fitness.is_empty() {
            return Err(OperatorError::SelectionFailed(
                "Population cannot be empty".to_string(),
            ));
        }
        Ok((0..count).map(|_| self.pick(fitness, rng)).collect())
    }
}

/// Stochastic universal sampling
///
/// Individuals are sorted by descending fitness and laid end to end on a
/// wheel of circumference `total`. A single offset in `[0, total / k)` places
/// `k` equally spaced pointers; each pointer picks the first individual whose
/// cumulative fitness reaches it.
///
/// Fitness values must be finite and non-negative with a positive sum, and
/// `k` may not exceed the population size. Violations are rejected with
/// [`OperatorError::SelectionFailed`].
#[derive(Clone, Debug, Default)]
pub struct StochasticUniversalSampling;

impl StochasticUniversalSampling {
    /// Create a new SUS operator
    pub fn new() -> Self {
        Self
    }
}

impl SelectionOperator for StochasticUniversalSampling {
    fn select<R: Rng>(
        &self,
        fitness: &[f64],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, OperatorError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > fitness.len() {
            return Err(OperatorError::SelectionFailed(format!(
                "cannot sample {} of {} individuals",
                count,
                fitness.len()
            )));
        }
        if let Some(bad) = fitness.iter().find(|f| !f.is_finite() || **f < 0.0) {
            return Err(OperatorError::SelectionFailed(format!(
                "fitness {bad} is not a finite non-negative value"
            )));
        }
        let total: f64 = fitness.iter().sum();
        if total <= 0.0 {
            return Err(OperatorError::SelectionFailed(
                "total fitness must be positive".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..fitness.len()).collect();
        order.sort_by(|&a, &b| {
            fitness[b]
                .partial_cmp(&fitness[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let distance = total / count as f64;
        let start = rng.gen_range(0.0..distance);

        let mut chosen = Vec::with_capacity(count);
        let mut pos = 0;
        let mut cumulative = fitness[order[0]];
        for i in 0..count {
            let pointer = start + i as f64 * distance;
            while cumulative < pointer && pos + 1 < order.len() {
                pos += 1;
                cumulative += fitness[order[pos]];
            }
            chosen.push(order[pos]);
        }
        Ok(chosen)
    }
}
