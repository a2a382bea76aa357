//! Hyperparameter adaptation mechanisms
//!
//! Self-adaptive control: strategy parameters are encoded in the genome and
//! evolve with it.

pub mod self_adaptive;

pub mod prelude {
    pub use super::self_adaptive::*;
}
