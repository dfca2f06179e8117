//! Transition records produced by environment interaction

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Single observed environment transition.
///
/// Owns independent copies of both state vectors. Callers are free to
/// reuse their own buffers after handing a transition over; nothing here
/// aliases caller memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: Array1<f64>,
    /// State observed after taking the action
    pub next_state: Array1<f64>,
    /// Index of the action taken
    pub action: usize,
    /// Reward received
    pub reward: f64,
    /// Whether the episode ended on this transition
    pub done: bool,
}

impl Transition {
    /// Create a transition by copying the caller's state slices.
    #[must_use]
    pub fn new(state: &[f64], next_state: &[f64], action: usize, reward: f64, done: bool) -> Self {
        Self {
            state: Array1::from_vec(state.to_vec()),
            next_state: Array1::from_vec(next_state.to_vec()),
            action,
            reward,
            done,
        }
    }

    /// Dimensionality of the stored state vectors.
    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.state.len()
    }
}
