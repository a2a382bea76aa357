//! Evolutionary algorithms
//!
//! Generational drivers over shape grids: a fixed-rate GA and a
//! self-adaptive variant sharing the same loop state.

pub mod adaptive_ga;
pub mod simple_ga;
pub mod state;

pub mod prelude {
    pub use super::adaptive_ga::*;
    pub use super::simple_ga::*;
    pub use super::state::*;
}
