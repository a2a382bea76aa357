//! Best-ever tracker
//!
//! Keeps a copy of the single best individual seen across all generations.

use serde::{Deserialize, Serialize};

use crate::genome::traits::EvolutionaryGenome;
use crate::population::individual::Individual;

/// Single-slot hall of fame
///
/// Candidates are compared by grid content: an identical grid is never a
/// new record, and only a strictly greater fitness replaces the holder.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct HallOfFame<G>
where
    G: EvolutionaryGenome,
{
    best: Option<Individual<G>>,
    replacements: usize,
}

impl<G> Default for HallOfFame<G>
where
    G: EvolutionaryGenome,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G> HallOfFame<G>
where
    G: EvolutionaryGenome,
{
    /// Create an empty hall of fame
    pub fn new() -> Self {
        Self {
            best: None,
            replacements: 0,
        }
    }

    /// Offer a candidate; returns true if it became the new record
    ///
    /// Unevaluated candidates are ignored.
    pub fn offer(&mut self, candidate: &Individual<G>) -> bool {
        let Some(fitness) = candidate.fitness() else {
            return false;
        };
        let improves = match &self.best {
            None => true,
            Some(held) => {
                held.genome().grid() != candidate.genome().grid()
                    && held.fitness().map_or(true, |f| fitness > f)
            }
        };
        if improves {
            self.best = Some(candidate.clone());
            self.replacements += 1;
        }
        improves
    }

    /// Offer the best individual of an evaluated population
    pub fn update<'a>(&mut self, candidates: impl IntoIterator<Item = &'a Individual<G>>) -> bool
    where
        G: 'a,
    {
        let best = candidates
            .into_iter()
            .filter_map(|i| i.fitness().map(|f| (i, f)))
            .fold(None, |best: Option<(&Individual<G>, f64)>, (i, f)| match best {
                Some((_, bf)) if bf >= f => best,
                _ => Some((i, f)),
            });
        match best {
            Some((individual, _)) => self.offer(individual),
            None => false,
        }
    }

    /// The current record holder
    pub fn best(&self) -> Option<&Individual<G>> {
        self.best.as_ref()
    }

    /// Fitness of the record holder
    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().and_then(Individual::fitness)
    }

    /// Number of times the record changed
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Check if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.best.is_none()
    }

    /// Take the record holder out
    pub fn into_best(self) -> Option<Individual<G>> {
        self.best
    }
}
