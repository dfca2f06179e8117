//! Shared agent configuration

use serde::{Deserialize, Serialize};

/// Configuration shared by value-based agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Discount factor
    pub gamma: f64,
    /// Batch size for training
    pub batch_size: usize,
    /// Replay buffer capacity
    pub buffer_capacity: usize,
    /// Minimum buffer occupancy before learning begins
    pub warmup_threshold: usize,
    /// Copy weights into the target network every this many learn steps
    pub sync_interval: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.99,
            batch_size: 64,
            buffer_capacity: 10_000,
            warmup_threshold: 2000,
            sync_interval: 2000,
        }
    }
}
