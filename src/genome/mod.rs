//! Genome abstractions and implementations
//!
//! This module provides the core `EvolutionaryGenome` trait, the `ShapeGrid`
//! genome, and reflection adapters for symmetric sails.

pub mod grid;
pub mod symmetry;
pub mod traits;

pub mod prelude {
    pub use super::grid::*;
    pub use super::symmetry::*;
    pub use super::traits::*;
}
