//! # dipole-evo
//!
//! Evolutionary optimization of binary shape grids (light sails) whose
//! fitness is the optical force computed by an external discrete-dipole
//! simulator.
//!
//! ## Core Concepts
//!
//! - **Shape grids**: a sail is a boolean occupancy grid; each set cell is a
//!   column of dipoles in the simulated geometry
//! - **Fitness oracle**: grids are scored through the [`fitness::traits::FitnessOracle`]
//!   port, so the genetic core runs against stubs in tests and against the
//!   simulator in production
//! - **Collision-free dispatch**: every evaluation gets a process-unique
//!   identifier that scopes its files, so evaluations can run concurrently
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dipole_evo::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let result = SimpleGABuilder::<ShapeGrid, _, _, _, _>::new()
//!     .population_size(20)
//!     .generations(10)
//!     .layout(GridLayout::square(10))
//!     .selection(TournamentSelection::new(3))
//!     .crossover(TwoPointCrossover::new())
//!     .mutation(BitFlipMutation::new(0.05))
//!     .oracle(AddaOracle::new(SimulatorConfig::new("adda")))
//!     .build()?
//!     .run(&mut rng)?;
//! ```

pub mod algorithms;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod fitness;
pub mod genome;
pub mod hyperparameter;
pub mod operators;
pub mod population;
pub mod record;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::config::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::evaluation::prelude::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::hyperparameter::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::population::prelude::*;
    pub use crate::record::prelude::*;
}
