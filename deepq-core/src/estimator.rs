//! Value estimator contract consumed by the learning loop

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{DqnError, Result};

/// Flat snapshot of an estimator's parameters.
///
/// Produced by [`ValueEstimator::weights`] and consumed by
/// [`ValueEstimator::set_weights`]; fully reconstructs prediction behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot(pub Vec<f64>);

impl WeightSnapshot {
    /// Number of parameters in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Action-value function approximator.
///
/// The learning loop drives this interface and nothing else: prediction,
/// a single in-place gradient step, and full parameter transfer for target
/// network synchronization. Implementations guarantee `predict` returns a
/// vector of length [`output_dim`](ValueEstimator::output_dim), which is
/// non-zero for any validly constructed estimator.
pub trait ValueEstimator {
    /// Q-values for every action in the given state. Pure, no side effects.
    fn predict(&self, state: &ArrayView1<f64>) -> Array1<f64>;

    /// One in-place gradient-descent step nudging `predicted` toward
    /// `target` for `state`. Mutates internal parameters.
    fn backward(
        &mut self,
        state: &ArrayView1<f64>,
        predicted: &ArrayView1<f64>,
        target: &ArrayView1<f64>,
        learning_rate: f64,
    );

    /// Snapshot of all parameters.
    fn weights(&self) -> WeightSnapshot;

    /// Overwrite all parameters from a snapshot.
    ///
    /// # Errors
    /// Returns [`DqnError::DimensionMismatch`] if the snapshot length does
    /// not match this estimator's parameter count.
    fn set_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()>;

    /// Expected state dimensionality.
    fn input_dim(&self) -> usize;

    /// Number of actions (length of the prediction vector).
    fn output_dim(&self) -> usize;
}

/// Validate a state slice against an expected dimension.
///
/// # Errors
/// Returns [`DqnError::DimensionMismatch`] on a shape mismatch.
pub fn check_state_dim(state: &[f64], expected: usize) -> Result<()> {
    if state.len() != expected {
        return Err(DqnError::DimensionMismatch {
            expected,
            actual: state.len(),
        });
    }
    Ok(())
}
