//! Run parameters
//!
//! The nine values that parameterize a run, in the order the command line
//! takes them: density factor, tile factor, grid size, population size,
//! generation count, tournament size, crossover probability, mutation
//! probability and per-cell flip probability.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::genome::grid::GridLayout;
use crate::hyperparameter::self_adaptive::AdaptiveParams;

/// Number of positional run parameters
pub const RUN_PARAMETER_COUNT: usize = 9;

/// Parameters of one evolutionary run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Scales the simulator's dipoles-per-wavelength
    pub density_factor: f64,
    /// Each grid is repeated `tile_factor × tile_factor` times before simulation
    pub tile_factor: usize,
    /// Edge length of the evolved grid
    pub grid_size: usize,
    /// Population size
    pub population_size: usize,
    /// Number of generations after generation 0
    pub generations: usize,
    /// Tournament size
    pub tournament_size: usize,
    /// Probability that an adjacent pair is recombined
    pub crossover_probability: f64,
    /// Probability that an offspring is mutated
    pub mutation_probability: f64,
    /// Per-cell flip probability
    pub indpb: f64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            density_factor: 1.0,
            tile_factor: 1,
            grid_size: 10,
            population_size: 20,
            generations: 10,
            tournament_size: 3,
            crossover_probability: 0.5,
            mutation_probability: 0.2,
            indpb: 0.05,
        }
    }
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> EvoResult<T> {
    value.trim().parse().map_err(|_| {
        EvolutionError::Configuration(format!("cannot parse {} from {:?}", name, value))
    })
}

impl RunParameters {
    /// Parse from the trailing nine arguments; anything before them is ignored
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> EvoResult<Self> {
        if args.len() < RUN_PARAMETER_COUNT {
            return Err(EvolutionError::Configuration(format!(
                "expected {} run parameters, got {}",
                RUN_PARAMETER_COUNT,
                args.len()
            )));
        }
        let a: Vec<&str> = args[args.len() - RUN_PARAMETER_COUNT..]
            .iter()
            .map(AsRef::as_ref)
            .collect();
        let params = Self {
            density_factor: parse_field("density factor", a[0])?,
            tile_factor: parse_field("tile factor", a[1])?,
            grid_size: parse_field("grid size", a[2])?,
            population_size: parse_field("population size", a[3])?,
            generations: parse_field("generation count", a[4])?,
            tournament_size: parse_field("tournament size", a[5])?,
            crossover_probability: parse_field("crossover probability", a[6])?,
            mutation_probability: parse_field("mutation probability", a[7])?,
            indpb: parse_field("per-cell mutation probability", a[8])?,
        };
        params.validate()?;
        Ok(params)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: &Path) -> EvoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EvolutionError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let params: Self = serde_json::from_str(&text).map_err(|e| {
            EvolutionError::Configuration(format!("invalid run parameters in {}: {}", path.display(), e))
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Check ranges
    pub fn validate(&self) -> EvoResult<()> {
        if !(self.density_factor.is_finite() && self.density_factor > 0.0) {
            return Err(EvolutionError::Configuration(format!(
                "density factor must be positive, got {}",
                self.density_factor
            )));
        }
        for (name, value) in [
            ("tile factor", self.tile_factor),
            ("grid size", self.grid_size),
            ("population size", self.population_size),
            ("tournament size", self.tournament_size),
        ] {
            if value == 0 {
                return Err(EvolutionError::Configuration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        for (name, p) in [
            ("crossover probability", self.crossover_probability),
            ("mutation probability", self.mutation_probability),
            ("per-cell mutation probability", self.indpb),
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

    /// Layout of the evolved grids; symmetric runs evolve the left half only
    pub fn layout(&self, symmetric: bool) -> GridLayout {
        if symmetric {
            GridLayout::half(self.grid_size)
        } else {
            GridLayout::square(self.grid_size)
        }
    }

    /// Initial strategy parameters for the self-adaptive driver
    pub fn initial_params(&self) -> AdaptiveParams {
        AdaptiveParams::clipped(
            self.crossover_probability,
            self.mutation_probability,
            self.indpb,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_from_args_uses_trailing_nine() {
        let args = [
            "dipole-evo", "--adaptive", "1.5", "2", "8", "20", "30", "3", "0.5", "0.2", "0.05",
        ];
        let params = RunParameters::from_args(&args).unwrap();
        assert_relative_eq!(params.density_factor, 1.5);
        assert_eq!(params.tile_factor, 2);
        assert_eq!(params.grid_size, 8);
        assert_eq!(params.population_size, 20);
        assert_eq!(params.generations, 30);
        assert_eq!(params.tournament_size, 3);
        assert_relative_eq!(params.crossover_probability, 0.5);
        assert_relative_eq!(params.mutation_probability, 0.2);
        assert_relative_eq!(params.indpb, 0.05);
    }

    #[test]
    fn test_from_args_errors() {
        assert!(RunParameters::from_args(&["1", "2"]).is_err());
        let bad_int = ["1.0", "x", "8", "20", "30", "3", "0.5", "0.2", "0.05"];
        assert!(matches!(
            RunParameters::from_args(&bad_int),
            Err(EvolutionError::Configuration(_))
        ));
        let bad_prob = ["1.0", "1", "8", "20", "30", "3", "1.5", "0.2", "0.05"];
        assert!(RunParameters::from_args(&bad_prob).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(RunParameters::default().validate().is_ok());

        let params = RunParameters {
            tournament_size: 0,
            ..RunParameters::default()
        };
        assert!(params.validate().is_err());

        // Contestants are drawn with replacement, so tournaments may exceed the population
        let params = RunParameters {
            population_size: 4,
            tournament_size: 6,
            ..RunParameters::default()
        };
        assert!(params.validate().is_ok());

        let params = RunParameters {
            density_factor: 0.0,
            ..RunParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let params = RunParameters {
            grid_size: 12,
            tile_factor: 3,
            ..RunParameters::default()
        };
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string_pretty(&params).unwrap().as_bytes())
            .unwrap();
        drop(file);

        assert_eq!(RunParameters::from_json_file(&path).unwrap(), params);
        assert!(RunParameters::from_json_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_layout() {
        let params = RunParameters {
            grid_size: 6,
            ..RunParameters::default()
        };
        assert_eq!(params.layout(false).cols, 6);
        assert_eq!(params.layout(true).cols, 3);
        assert_eq!(params.layout(true).rows, 6);
    }
}
