//! Epsilon-greedy action selection

use ndarray::ArrayView1;
use rand::Rng;

use deepq_core::{argmax, ValueEstimator};

/// Epsilon-greedy policy over an action-value estimator.
///
/// Explores with probability `epsilon` by drawing a uniform action index;
/// otherwise exploits the estimator's argmax. Argmax ties break to the
/// lowest index.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    /// Exploration probability in `[0, 1]`
    pub epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a policy with a fixed exploration rate.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Select an action for `state` over `num_actions` choices.
    ///
    /// # Panics
    /// Panics if `num_actions` is zero; a zero-action space is a fatal
    /// misconfiguration.
    pub fn select_action<E, R>(
        &self,
        estimator: &E,
        state: &ArrayView1<f64>,
        num_actions: usize,
        rng: &mut R,
    ) -> usize
    where
        E: ValueEstimator + ?Sized,
        R: Rng,
    {
        assert!(num_actions > 0, "epsilon-greedy over zero actions");
        if rng.gen::<f64>() < self.epsilon {
            rng.gen_range(0..num_actions)
        } else {
            argmax(&estimator.predict(state).view())
        }
    }
}
