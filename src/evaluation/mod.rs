//! Fitness evaluation dispatch
//!
//! This module provides per-evaluation identifiers and the dispatcher that
//! maps an oracle over a population.

pub mod dispatcher;
pub mod id;

pub mod prelude {
    pub use super::dispatcher::*;
    pub use super::id::*;
}
