//! Error types for dipole-evo
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for genome operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// Cell buffer does not match the requested shape
    #[error("Invalid grid shape: {0}")]
    InvalidShape(String),

    /// Two grids that must share a shape do not
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Strategy parameter outside (0, 1)
    #[error("Strategy parameter {name} out of range: {value}")]
    ParameterOutOfRange { name: &'static str, value: f64 },
}

/// Error type for operator failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Crossover operation failed
    #[error("Crossover failed: {0}")]
    CrossoverFailed(String),

    /// Selection operation failed
    #[error("Selection failed: {0}")]
    SelectionFailed(String),
}

/// Error type for the fitness oracle
///
/// Every variant is fatal to a run; there is no retry.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The simulator process could not be started
    #[error("Failed to launch simulator {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The simulator wrote to its error stream
    #[error("Simulator reported an error: {0}")]
    Invocation(String),

    /// An output file was missing or malformed
    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Writing or cleaning up a work unit failed
    #[error("Work unit IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Oracle-specific failure raised by stub or wrapped oracles
    #[error("Oracle failure: {0}")]
    Other(String),
}

/// Error type for experiment recording
#[derive(Debug, Error)]
pub enum RecordError {
    /// IO error while writing artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Run-history table error
    #[error("Run history error: {0}")]
    Table(String),
}

/// Top-level error type for evolution operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Genome error
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Fitness evaluation failed
    #[error("Fitness evaluation failed: {0}")]
    Oracle(#[from] OracleError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Recording failed
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,

    /// An individual reached selection without a fitness value
    #[error("Individual {0} has not been evaluated")]
    Unevaluated(usize),
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;

/// Result of an operator application
#[derive(Debug, Clone)]
pub enum OperatorResult<G> {
    /// Operation succeeded
    Success(G),
    /// Operation failed unrecoverably
    Failed(OperatorError),
}

impl<G> OperatorResult<G> {
    /// Returns the genome if successful, None if failed
    pub fn genome(self) -> Option<G> {
        match self {
            Self::Success(g) => Some(g),
            Self::Failed(_) => None,
        }
    }

    /// Returns true if the operation was successful
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Maps the genome type
    pub fn map<U, F: FnOnce(G) -> U>(self, f: F) -> OperatorResult<U> {
        match self {
            Self::Success(g) => OperatorResult::Success(f(g)),
            Self::Failed(e) => OperatorResult::Failed(e),
        }
    }

    /// Convert into a `Result`, surfacing the operator error
    pub fn into_result(self) -> Result<G, OperatorError> {
        match self {
            Self::Success(g) => Ok(g),
            Self::Failed(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_error_display() {
        let err = GenomeError::DimensionMismatch {
            expected: (4, 4),
            actual: (4, 2),
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected (4, 4), got (4, 2)"
        );

        let err = GenomeError::ParameterOutOfRange {
            name: "mutation_step",
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "Strategy parameter mutation_step out of range: 1.5"
        );
    }

    #[test]
    fn test_oracle_error_display() {
        let err = OracleError::Invocation("ERROR: (../src/param.c:1234) bad shape".to_string());
        assert!(err.to_string().contains("bad shape"));

        let err = OracleError::Parse {
            path: PathBuf::from("experiment1/CrossSec-X"),
            reason: "missing tuple".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse experiment1/CrossSec-X: missing tuple"
        );
    }

    #[test]
    fn test_evolution_error_from_oracle_error() {
        let oracle_err = OracleError::Other("stub".to_string());
        let evo_err: EvolutionError = oracle_err.into();
        assert!(matches!(evo_err, EvolutionError::Oracle(_)));
    }

    #[test]
    fn test_operator_result_success() {
        let result: OperatorResult<i32> = OperatorResult::Success(42);
        assert!(result.is_ok());
        assert_eq!(result.genome(), Some(42));
    }

    #[test]
    fn test_operator_result_failed() {
        let result: OperatorResult<i32> =
            OperatorResult::Failed(OperatorError::CrossoverFailed("test".to_string()));
        assert!(!result.is_ok());
        assert_eq!(result.genome(), None);
    }

    #[test]
    fn test_operator_result_map_and_into_result() {
        let result: OperatorResult<i32> = OperatorResult::Success(21);
        assert_eq!(result.map(|x| x * 2).into_result(), Ok(42));

        let failed: OperatorResult<i32> =
            OperatorResult::Failed(OperatorError::SelectionFailed("empty".to_string()));
        assert!(failed.into_result().is_err());
    }
}
