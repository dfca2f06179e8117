//! Deep Q-Network agent implementation
//!
//! This crate provides the DQN learning algorithm and its supporting
//! pieces:
//! - Experience replay with ring-buffer eviction
//! - A single-hidden-layer Q-network with manual backpropagation
//! - Epsilon-greedy exploration with optional decay schedules
//! - A learning loop with warm-up gating and periodic target sync

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod dqn;
pub mod network;
pub mod policy;
pub mod schedule;

// Re-export the agent
pub use dqn::{DqnAgent, DqnConfig, TrainMetrics};

// Re-export supporting pieces
pub use buffer::ReplayBuffer;
pub use network::{Activation, QNetwork};
pub use policy::EpsilonGreedy;
pub use schedule::{ConstantSchedule, ExponentialSchedule, LinearSchedule, Schedule};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Activation, DqnAgent, DqnConfig, EpsilonGreedy, QNetwork, ReplayBuffer};
    pub use deepq_core::prelude::*;
}
