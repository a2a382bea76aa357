//! Self-adaptive control mechanisms
//!
//! In the self-adaptive variant the crossover probability, mutation
//! probability and per-cell mutation step are carried by each individual and
//! evolve alongside its grid.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::GenomeError;
use crate::genome::grid::{GridLayout, ShapeGrid};
use crate::genome::traits::EvolutionaryGenome;

/// Smallest distance a clipped strategy parameter keeps from 0 and 1
pub const PARAM_EPSILON: f64 = 1e-6;

/// Clamp a value into `[PARAM_EPSILON, 1 - PARAM_EPSILON]`
///
/// Values at or beyond either boundary are clamped, never rejected.
pub fn clip_unit(value: f64) -> f64 {
    if value.is_nan() {
        return PARAM_EPSILON;
    }
    value.clamp(PARAM_EPSILON, 1.0 - PARAM_EPSILON)
}

/// Strategy parameters that evolve with the grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveParams {
    /// Probability that a pair led by this individual is recombined
    pub crossover_probability: f64,
    /// Probability that this individual is mutated
    pub mutation_probability: f64,
    /// Per-cell flip probability when mutated
    pub mutation_step: f64,
}

impl AdaptiveParams {
    /// Create strategy parameters, each strictly inside (0, 1)
    pub fn new(
        crossover_probability: f64,
        mutation_probability: f64,
        mutation_step: f64,
    ) -> Result<Self, GenomeError> {
        let check = |name: &'static str, value: f64| {
            if value > 0.0 && value < 1.0 {
                Ok(value)
            } else {
                Err(GenomeError::ParameterOutOfRange { name, value })
            }
        };
        Ok(Self {
            crossover_probability: check("crossover_probability", crossover_probability)?,
            mutation_probability: check("mutation_probability", mutation_probability)?,
            mutation_step: check("mutation_step", mutation_step)?,
        })
    }

    /// Create strategy parameters, clipping each into (0, 1)
    pub fn clipped(crossover_probability: f64, mutation_probability: f64, mutation_step: f64) -> Self {
        Self {
            crossover_probability: clip_unit(crossover_probability),
            mutation_probability: clip_unit(mutation_probability),
            mutation_step: clip_unit(mutation_step),
        }
    }

    /// Linear blend `w * self + (1 - w) * other`, one weight per parameter
    ///
    /// A weight of exactly 1 returns this value and exactly 0 returns
    /// `other`'s value.
    pub fn blend(&self, other: &Self, weights: BlendWeights) -> Self {
        let mix = |w: f64, a: f64, b: f64| w * a + (1.0 - w) * b;
        Self {
            crossover_probability: mix(
                weights.crossover,
                self.crossover_probability,
                other.crossover_probability,
            ),
            mutation_probability: mix(
                weights.mutation,
                self.mutation_probability,
                other.mutation_probability,
            ),
            mutation_step: mix(weights.step, self.mutation_step, other.mutation_step),
        }
    }

    /// Add independent gaussian noise to every parameter and reclip
    pub fn perturb<R: Rng>(&mut self, noise: &StrategyNoise, rng: &mut R) {
        self.crossover_probability = clip_unit(
            self.crossover_probability + StrategyNoise::draw(noise.crossover_sd, rng),
        );
        self.mutation_probability = clip_unit(
            self.mutation_probability + StrategyNoise::draw(noise.mutation_sd, rng),
        );
        self.mutation_step =
            clip_unit(self.mutation_step + StrategyNoise::draw(noise.step_sd, rng));
    }
}

/// Per-parameter blend weights for adaptive crossover
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWeights {
    pub crossover: f64,
    pub mutation: f64,
    pub step: f64,
}

impl BlendWeights {
    /// Same weight for every parameter
    pub fn uniform(weight: f64) -> Self {
        Self {
            crossover: weight,
            mutation: weight,
            step: weight,
        }
    }

    /// Draw three independent weights from N(mean, std_dev), each clipped into (0, 1)
    pub fn sample<R: Rng>(mean: f64, std_dev: f64, rng: &mut R) -> Self {
        let mut draw = || clip_unit(mean + std_dev * rng.sample::<f64, _>(StandardNormal));
        Self {
            crossover: draw(),
            mutation: draw(),
            step: draw(),
        }
    }
}

/// Gaussian noise applied to strategy parameters on mutation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyNoise {
    crossover_sd: f64,
    mutation_sd: f64,
    step_sd: f64,
}

impl StrategyNoise {
    /// Zero-mean noise with the given standard deviations
    pub fn new(crossover_sd: f64, mutation_sd: f64, step_sd: f64) -> Result<Self, GenomeError> {
        let check = |name: &'static str, sd: f64| {
            if sd.is_finite() && sd >= 0.0 {
                Ok(sd)
            } else {
                Err(GenomeError::ParameterOutOfRange { name, value: sd })
            }
        };
        Ok(Self {
            crossover_sd: check("crossover_sd", crossover_sd)?,
            mutation_sd: check("mutation_sd", mutation_sd)?,
            step_sd: check("step_sd", step_sd)?,
        })
    }

    /// Standard deviations (crossover, mutation, step)
    pub fn std_devs(&self) -> (f64, f64, f64) {
        (self.crossover_sd, self.mutation_sd, self.step_sd)
    }

    fn draw<R: Rng>(sd: f64, rng: &mut R) -> f64 {
        sd * rng.sample::<f64, _>(StandardNormal)
    }
}

impl Default for StrategyNoise {
    fn default() -> Self {
        Self {
            crossover_sd: 0.1,
            mutation_sd: 0.05,
            step_sd: 0.005,
        }
    }
}

/// Grid genome with self-adaptive strategy parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveGenome {
    /// The grid
    pub grid: ShapeGrid,
    /// Strategy parameters
    pub params: AdaptiveParams,
}

impl AdaptiveGenome {
    /// Create a new adaptive genome
    pub fn new(grid: ShapeGrid, params: AdaptiveParams) -> Self {
        Self { grid, params }
    }

    /// Generate a random grid carrying the given initial parameters
    pub fn generate_with<R: Rng>(layout: &GridLayout, params: AdaptiveParams, rng: &mut R) -> Self {
        Self {
            grid: layout.generate(rng),
            params,
        }
    }
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            crossover_probability: 0.5,
            mutation_probability: 0.2,
            mutation_step: 0.05,
        }
    }
}

impl EvolutionaryGenome for AdaptiveGenome {
    fn grid(&self) -> &ShapeGrid {
        &self.grid
    }

    fn grid_mut(&mut self) -> &mut ShapeGrid {
        &mut self.grid
    }

    fn generate<R: Rng>(layout: &GridLayout, rng: &mut R) -> Self {
        Self::generate_with(layout, AdaptiveParams::default(), rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_rejects_boundaries() {
        assert!(AdaptiveParams::new(0.5, 0.5, 0.5).is_ok());
        assert!(AdaptiveParams::new(0.0, 0.5, 0.5).is_err());
        assert!(AdaptiveParams::new(0.5, 1.0, 0.5).is_err());
        assert!(matches!(
            AdaptiveParams::new(0.5, 0.5, -0.1),
            Err(GenomeError::ParameterOutOfRange {
                name: "mutation_step",
                ..
            })
        ));
    }

    #[test]
    fn test_clip_unit() {
        assert_eq!(clip_unit(0.0), PARAM_EPSILON);
        assert_eq!(clip_unit(-3.0), PARAM_EPSILON);
        assert_eq!(clip_unit(1.0), 1.0 - PARAM_EPSILON);
        assert_eq!(clip_unit(0.25), 0.25);
        assert_eq!(clip_unit(f64::NAN), PARAM_EPSILON);
    }

    #[test]
    fn test_blend_exact_weights() {
        let a = AdaptiveParams::new(0.9, 0.3, 0.01).unwrap();
        let b = AdaptiveParams::new(0.1, 0.7, 0.2).unwrap();

        assert_eq!(a.blend(&b, BlendWeights::uniform(1.0)), a);
        assert_eq!(a.blend(&b, BlendWeights::uniform(0.0)), b);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = AdaptiveParams::new(0.8, 0.2, 0.1).unwrap();
        let b = AdaptiveParams::new(0.4, 0.6, 0.3).unwrap();
        let mid = a.blend(&b, BlendWeights::uniform(0.5));
        assert_relative_eq!(mid.crossover_probability, 0.6, epsilon = 1e-12);
        assert_relative_eq!(mid.mutation_probability, 0.4, epsilon = 1e-12);
        assert_relative_eq!(mid.mutation_step, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_sampled_weights_in_open_unit_interval() {
        let mut rng = StdRng::seed_from_u64(11);
        // Wide distribution so many draws land outside [0, 1]
        for _ in 0..1000 {
            let w = BlendWeights::sample(0.5, 2.0, &mut rng);
            for v in [w.crossover, w.mutation, w.step] {
                assert!(v > 0.0 && v < 1.0);
            }
        }
    }

    #[test]
    fn test_perturb_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let noise = StrategyNoise::new(1.0, 1.0, 1.0).unwrap();
        let mut params = AdaptiveParams::new(0.5, 0.5, 0.5).unwrap();
        for _ in 0..500 {
            params.perturb(&noise, &mut rng);
            assert!(params.crossover_probability > 0.0 && params.crossover_probability < 1.0);
            assert!(params.mutation_probability > 0.0 && params.mutation_probability < 1.0);
            assert!(params.mutation_step > 0.0 && params.mutation_step < 1.0);
        }
    }

    #[test]
    fn test_default_noise() {
        let (c, m, s) = StrategyNoise::default().std_devs();
        assert_relative_eq!(c, 0.1);
        assert_relative_eq!(m, 0.05);
        assert_relative_eq!(s, 0.005);
    }

    #[test]
    fn test_noise_rejects_negative_sd() {
        assert!(StrategyNoise::new(0.1, -1.0, 0.1).is_err());
    }

    #[test]
    fn test_adaptive_genome_grid_access() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = AdaptiveParams::new(0.6, 0.3, 0.02).unwrap();
        let mut genome = AdaptiveGenome::generate_with(&GridLayout::square(3), params, &mut rng);
        assert_eq!(genome.grid().shape(), (3, 3));
        let before = genome.grid().get(0, 0);
        genome.grid_mut().flip(0, 0);
        assert_ne!(genome.grid().get(0, 0), before);
        assert_eq!(genome.params, params);
    }
}
