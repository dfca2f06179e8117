//! Fully-connected Q-network with manual backpropagation

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use deepq_core::{DqnError, Result, ValueEstimator, WeightSnapshot};

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
    /// Rectified linear unit
    #[default]
    Relu,
    /// Logistic sigmoid
    Sigmoid,
}

impl Activation {
    fn apply(self, x: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Relu => x.mapv(|v| v.max(0.0)),
            Self::Sigmoid => x.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        }
    }

    /// Derivative expressed in terms of the activated output.
    fn derivative_from_output(self, y: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Relu => y.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Self::Sigmoid => y.mapv(|v| v * (1.0 - v)),
        }
    }
}

/// Single-hidden-layer feed-forward Q-network.
///
/// Linear output head, hidden activation per [`Activation`], trained by
/// per-sample gradient descent on squared error. Parameters are owned by
/// the network and only ever mutated through [`ValueEstimator::backward`]
/// and [`ValueEstimator::set_weights`].
#[derive(Debug, Clone)]
pub struct QNetwork {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    activation: Activation,
    /// Input-to-hidden weights, shape (input, hidden)
    w1: Array2<f64>,
    /// Hidden biases
    b1: Array1<f64>,
    /// Hidden-to-output weights, shape (hidden, output)
    w2: Array2<f64>,
    /// Output biases
    b2: Array1<f64>,
}

impl QNetwork {
    /// Create a new network with Xavier-initialized weights.
    ///
    /// # Errors
    /// Returns [`DqnError::Config`] if any layer size is zero.
    pub fn new<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(DqnError::Config(format!(
                "network layer sizes must be non-zero, got {input_size}x{hidden_size}x{output_size}"
            )));
        }
        Ok(Self {
            input_size,
            hidden_size,
            output_size,
            activation,
            w1: Self::xavier_init(input_size, hidden_size, rng),
            b1: Array1::zeros(hidden_size),
            w2: Self::xavier_init(hidden_size, output_size, rng),
            b2: Array1::zeros(output_size),
        })
    }

    /// Xavier initialization for a weight matrix
    fn xavier_init<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Array2<f64> {
        let limit = (6.0 / (in_dim + out_dim) as f64).sqrt();
        Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..limit))
    }

    /// Hidden-layer activations for an input
    fn hidden(&self, state: &ArrayView1<f64>) -> Array1<f64> {
        let pre = state.dot(&self.w1) + &self.b1;
        self.activation.apply(&pre)
    }

    /// Total number of parameters in a snapshot
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.input_size * self.hidden_size
            + self.hidden_size
            + self.hidden_size * self.output_size
            + self.output_size
    }
}

impl ValueEstimator for QNetwork {
    fn predict(&self, state: &ArrayView1<f64>) -> Array1<f64> {
        self.hidden(state).dot(&self.w2) + &self.b2
    }

    fn backward(
        &mut self,
        state: &ArrayView1<f64>,
        predicted: &ArrayView1<f64>,
        target: &ArrayView1<f64>,
        learning_rate: f64,
    ) {
        let hidden = self.hidden(state);

        // Squared-error gradient at the linear output head.
        let delta_out = predicted.to_owned() - target;

        // Backprop into the hidden layer.
        let delta_hidden =
            self.w2.dot(&delta_out) * self.activation.derivative_from_output(&hidden);

        let input = state.to_owned();
        let dw2 = hidden
            .insert_axis(Axis(1))
            .dot(&delta_out.view().insert_axis(Axis(0)));
        let dw1 = input
            .insert_axis(Axis(1))
            .dot(&delta_hidden.view().insert_axis(Axis(0)));

        self.w2 = &self.w2 - &(dw2 * learning_rate);
        self.b2 = &self.b2 - &(delta_out * learning_rate);
        self.w1 = &self.w1 - &(dw1 * learning_rate);
        self.b1 = &self.b1 - &(delta_hidden * learning_rate);
    }

    fn weights(&self) -> WeightSnapshot {
        let mut params = Vec::with_capacity(self.param_count());
        params.extend(self.w1.iter().copied());
        params.extend(self.b1.iter().copied());
        params.extend(self.w2.iter().copied());
        params.extend(self.b2.iter().copied());
        WeightSnapshot(params)
    }

    fn set_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()> {
        if snapshot.len() != self.param_count() {
            return Err(DqnError::DimensionMismatch {
                expected: self.param_count(),
                actual: snapshot.len(),
            });
        }
        let mut offset = 0;
        for value in self.w1.iter_mut() {
            *value = snapshot.0[offset];
            offset += 1;
        }
        for value in self.b1.iter_mut() {
            *value = snapshot.0[offset];
            offset += 1;
        }
        for value in self.w2.iter_mut() {
            *value = snapshot.0[offset];
            offset += 1;
        }
        for value in self.b2.iter_mut() {
            *value = snapshot.0[offset];
            offset += 1;
        }
        Ok(())
    }

    fn input_dim(&self) -> usize {
        self.input_size
    }

    fn output_dim(&self) -> usize {
        self.output_size
    }
}
