//! Error types for the DeepQ core library

use thiserror::Error;

/// Core error type for DQN operations
#[derive(Error, Debug)]
pub enum DqnError {
    /// Invalid agent or network configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Action index outside the estimator's output range
    #[error("Invalid action: index {action} out of range for {num_actions} actions")]
    InvalidAction {
        /// The offending action index
        action: usize,
        /// Number of actions the estimator produces values for
        num_actions: usize,
    },

    /// Dimension mismatch at an API boundary
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for DQN operations
pub type Result<T> = std::result::Result<T, DqnError>;
