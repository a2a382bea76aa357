//! Evaluation dispatcher
//!
//! Maps the fitness oracle over every unevaluated individual of a
//! population, either in order on the calling thread or across a dedicated
//! worker pool. Identifiers are allocated here, before any work is handed
//! out, so no two in-flight evaluations can share one.

#[cfg(feature = "parallel")]
use std::sync::Arc;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, OracleError};
use crate::evaluation::id::EvaluationId;
use crate::fitness::traits::FitnessOracle;
use crate::genome::traits::EvolutionaryGenome;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// How evaluations are scheduled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// One evaluation at a time on the calling thread
    #[default]
    Sequential,
    /// Concurrent evaluation; `workers == 0` uses one worker per core
    Parallel { workers: usize },
}

/// Dispatches oracle calls for a population
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    mode: DispatchMode,
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Dispatcher {
    /// Sequential dispatcher
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Concurrent dispatcher with its own worker pool
    ///
    /// Without the `parallel` feature this falls back to sequential dispatch.
    #[cfg(feature = "parallel")]
    pub fn parallel(workers: usize) -> EvoResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dipole-eval-{i}"))
            .build()
            .map_err(|e| {
                crate::error::EvolutionError::Configuration(format!(
                    "cannot start {workers} evaluation workers: {e}"
                ))
            })?;
        Ok(Self {
            mode: DispatchMode::Parallel { workers },
            pool: Some(Arc::new(pool)),
        })
    }

    /// Concurrent dispatcher with its own worker pool
    ///
    /// Without the `parallel` feature this falls back to sequential dispatch.
    #[cfg(not(feature = "parallel"))]
    pub fn parallel(workers: usize) -> EvoResult<Self> {
        log::warn!(
            "built without the parallel feature; {} workers requested, evaluating sequentially",
            workers
        );
        Ok(Self::sequential())
    }

    /// Build a dispatcher for the given mode
    pub fn from_mode(mode: DispatchMode) -> EvoResult<Self> {
        match mode {
            DispatchMode::Sequential => Ok(Self::sequential()),
            DispatchMode::Parallel { workers } => Self::parallel(workers),
        }
    }

    /// Scheduling mode in effect
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Evaluate every unevaluated individual
    ///
    /// Returns the number of oracle calls made. The first oracle failure
    /// aborts dispatch; individuals already scored keep their fitness.
    pub fn evaluate<G, O>(&self, population: &mut Population<G>, oracle: &O) -> Result<usize, OracleError>
    where
        G: EvolutionaryGenome,
        O: FitnessOracle + ?Sized,
    {
        let pending: Vec<&mut Individual<G>> = population
            .iter_mut()
            .filter(|i| !i.is_evaluated())
            .collect();
        let count = pending.len();
        let jobs: Vec<(&mut Individual<G>, EvaluationId)> = pending
            .into_iter()
            .zip(EvaluationId::allocate(count))
            .collect();
        debug!("dispatching {} evaluations ({:?})", count, self.mode);

        self.run(jobs, oracle)?;
        Ok(count)
    }

    #[cfg(feature = "parallel")]
    fn run<G, O>(&self, jobs: Vec<(&mut Individual<G>, EvaluationId)>, oracle: &O) -> Result<(), OracleError>
    where
        G: EvolutionaryGenome,
        O: FitnessOracle + ?Sized,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                jobs.into_par_iter()
                    .try_for_each(|(individual, id)| evaluate_one(individual, &id, oracle))
            }),
            None => jobs
                .into_iter()
                .try_for_each(|(individual, id)| evaluate_one(individual, &id, oracle)),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run<G, O>(&self, jobs: Vec<(&mut Individual<G>, EvaluationId)>, oracle: &O) -> Result<(), OracleError>
    where
        G: EvolutionaryGenome,
        O: FitnessOracle + ?Sized,
    {
        jobs.into_iter()
            .try_for_each(|(individual, id)| evaluate_one(individual, &id, oracle))
    }
}

fn evaluate_one<G, O>(individual: &mut Individual<G>, id: &EvaluationId, oracle: &O) -> Result<(), OracleError>
where
    G: EvolutionaryGenome,
    O: FitnessOracle + ?Sized,
{
    let fitness = oracle.evaluate(individual.genome().grid(), id)?;
    individual.set_fitness(fitness);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::benchmarks::CountOnes;
    use crate::fitness::traits::FnOracle;
    use crate::genome::grid::{GridLayout, ShapeGrid};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn population(size: usize) -> Population<ShapeGrid> {
        let mut rng = StdRng::seed_from_u64(12);
        Population::random(size, &GridLayout::square(4), &mut rng)
    }

    /// Records every id it sees and fails on duplicates
    struct IdRecorder {
        seen: Mutex<HashSet<EvaluationId>>,
    }

    impl FitnessOracle for IdRecorder {
        fn evaluate(&self, grid: &ShapeGrid, id: &EvaluationId) -> Result<f64, OracleError> {
            let mut seen = self
                .seen
                .lock()
                .map_err(|_| OracleError::Other("poisoned".to_string()))?;
            if !seen.insert(*id) {
                return Err(OracleError::Other(format!("duplicate id {id}")));
            }
            Ok(grid.count_ones() as f64)
        }
    }

    #[test]
    fn test_sequential_evaluates_all() {
        let mut pop = population(10);
        let n = Dispatcher::sequential().evaluate(&mut pop, &CountOnes).unwrap();
        assert_eq!(n, 10);
        assert!(pop.all_evaluated());
        for ind in pop.iter() {
            assert_eq!(ind.fitness(), Some(ind.genome().count_ones() as f64));
        }
    }

    #[test]
    fn test_skips_evaluated_individuals() {
        let mut pop = population(6);
        pop.individuals_mut()[2].set_fitness(-1.0);
        let calls = AtomicUsize::new(0);
        let oracle = FnOracle::new(|g: &ShapeGrid| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(g.count_ones() as f64)
        });
        let n = Dispatcher::sequential().evaluate(&mut pop, &oracle).unwrap();
        assert_eq!(n, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(pop[2].fitness(), Some(-1.0));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut seq = population(32);
        let mut par = seq.clone();
        Dispatcher::sequential().evaluate(&mut seq, &CountOnes).unwrap();
        Dispatcher::parallel(4).unwrap().evaluate(&mut par, &CountOnes).unwrap();
        assert_eq!(seq.fitness_values(), par.fitness_values());
    }

    #[test]
    fn test_ids_unique_under_concurrency() {
        let oracle = IdRecorder {
            seen: Mutex::new(HashSet::new()),
        };
        let dispatcher = Dispatcher::parallel(8).unwrap();
        for _ in 0..5 {
            let mut pop = population(40);
            dispatcher.evaluate(&mut pop, &oracle).unwrap();
        }
        assert_eq!(oracle.seen.lock().unwrap().len(), 200);
    }

    #[test]
    fn test_oracle_failure_aborts() {
        let mut pop = population(8);
        let oracle = FnOracle::new(|_: &ShapeGrid| Err(OracleError::Other("down".to_string())));
        for dispatcher in [Dispatcher::sequential(), Dispatcher::parallel(2).unwrap()] {
            let err = dispatcher.evaluate(&mut pop, &oracle).unwrap_err();
            assert!(matches!(err, OracleError::Other(_)));
        }
    }

    #[test]
    fn test_from_mode() {
        let d = Dispatcher::from_mode(DispatchMode::Sequential).unwrap();
        assert_eq!(d.mode(), DispatchMode::Sequential);
        let d = Dispatcher::from_mode(DispatchMode::Parallel { workers: 2 }).unwrap();
        #[cfg(feature = "parallel")]
        assert_eq!(d.mode(), DispatchMode::Parallel { workers: 2 });
        #[cfg(not(feature = "parallel"))]
        assert_eq!(d.mode(), DispatchMode::Sequential);
    }
}
