//! Fitness evaluation
//!
//! This module provides the oracle port, its decorators, stub oracles and
//! the adapter for the external discrete-dipole simulator.

pub mod adda;
pub mod benchmarks;
pub mod traits;

pub mod prelude {
    pub use super::adda::*;
    pub use super::benchmarks::*;
    pub use super::traits::*;
}
