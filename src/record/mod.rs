//! Experiment recording
//!
//! Persists the outcome of a run next to earlier ones: binary artifacts for
//! the best grid and the statistics log, and one row per run in a CSV
//! history table.

pub mod experiment;

pub mod prelude {
    pub use super::experiment::*;
}
