//! Core types and traits for the DeepQ reinforcement learning library
//!
//! This crate provides the foundational pieces shared by DQN-style agents:
//! the transition record, the value-estimator contract, numeric helpers
//! for action-value vectors, and the common configuration and error types.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod estimator;
pub mod math;
pub mod transition;

// Re-export core traits and types
pub use config::AgentConfig;
pub use error::{DqnError, Result};
pub use estimator::{check_state_dim, ValueEstimator, WeightSnapshot};
pub use math::{argmax, max};
pub use transition::Transition;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AgentConfig, DqnError, Result, Transition, ValueEstimator, WeightSnapshot};
}
