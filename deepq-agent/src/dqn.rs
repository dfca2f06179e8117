//! Deep Q-Network agent: learning loop and target synchronization

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use deepq_core::{
    check_state_dim, max, AgentConfig, DqnError, Result, Transition, ValueEstimator,
    WeightSnapshot,
};

use crate::buffer::ReplayBuffer;
use crate::network::{Activation, QNetwork};
use crate::policy::EpsilonGreedy;
use crate::schedule::Schedule;

/// DQN-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Base agent configuration
    #[serde(flatten)]
    pub base: AgentConfig,
    /// Exploration probability for the epsilon-greedy policy
    pub epsilon: f64,
    /// Hidden-layer activation for the built-in Q-network
    pub activation: Activation,
    /// Seed for the agent's random source; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            base: AgentConfig::default(),
            epsilon: 0.1,
            activation: Activation::default(),
            seed: None,
        }
    }
}

/// Counters and the most recent loss observed during training
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainMetrics {
    /// Learning steps completed (one per post-warm-up `train` call)
    pub learn_steps: usize,
    /// Transitions inserted into the replay buffer
    pub transitions_seen: usize,
    /// Target synchronizations performed after construction
    pub syncs: usize,
    /// Mean squared TD error over the most recent batch
    pub last_loss: Option<f64>,
}

/// Serialized agent state for save/load
#[derive(Serialize, Deserialize)]
struct AgentSnapshot {
    config: DqnConfig,
    learn_step: usize,
    q_weights: WeightSnapshot,
    target_weights: WeightSnapshot,
}

/// Deep Q-Network agent.
///
/// Owns the online and target estimators, the replay buffer, the
/// exploration policy and the random source. All learning happens inside
/// [`train`](DqnAgent::train): insert, warm-up gate, sample, per-transition
/// TD target and gradient step, then a periodic full target sync.
pub struct DqnAgent<E: ValueEstimator = QNetwork> {
    q_network: E,
    target_network: E,
    buffer: ReplayBuffer,
    policy: EpsilonGreedy,
    epsilon_schedule: Option<Box<dyn Schedule>>,
    config: DqnConfig,
    learn_step: usize,
    metrics: TrainMetrics,
    rng: StdRng,
    input_size: usize,
    num_actions: usize,
}

impl DqnAgent<QNetwork> {
    /// Construct an agent with freshly initialized Q- and target networks.
    ///
    /// The target network starts as an exact copy of the online network's
    /// parameters, eliminating initial divergence between the two.
    ///
    /// # Errors
    /// Returns [`DqnError::Config`] for zero layer sizes or an inconsistent
    /// configuration (zero batch size or sync interval, warm-up threshold
    /// above buffer capacity).
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        config: DqnConfig,
    ) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let q_network =
            QNetwork::new(input_size, hidden_size, output_size, config.activation, &mut rng)?;
        let target_network =
            QNetwork::new(input_size, hidden_size, output_size, config.activation, &mut rng)?;
        Self::from_estimators(q_network, target_network, config, rng)
    }
}

impl<E: ValueEstimator> DqnAgent<E> {
    /// Construct an agent around caller-provided estimators.
    ///
    /// Both estimators must share their architecture; the target is
    /// immediately overwritten with the online network's parameters.
    ///
    /// # Errors
    /// Returns [`DqnError::Config`] for an inconsistent configuration or
    /// mismatched estimator dimensions.
    pub fn from_estimators(
        q_network: E,
        mut target_network: E,
        config: DqnConfig,
        rng: StdRng,
    ) -> Result<Self> {
        validate_config(&config.base)?;
        if q_network.input_dim() != target_network.input_dim()
            || q_network.output_dim() != target_network.output_dim()
        {
            return Err(DqnError::Config(
                "online and target estimators must share their architecture".into(),
            ));
        }
        if q_network.output_dim() == 0 {
            return Err(DqnError::Config("estimator has zero actions".into()));
        }

        // Construction-time sync.
        target_network.set_weights(&q_network.weights())?;

        let input_size = q_network.input_dim();
        let num_actions = q_network.output_dim();
        debug!(
            input_size,
            num_actions,
            buffer_capacity = config.base.buffer_capacity,
            sync_interval = config.base.sync_interval,
            "constructed DQN agent"
        );

        Ok(Self {
            q_network,
            target_network,
            buffer: ReplayBuffer::new(config.base.buffer_capacity),
            policy: EpsilonGreedy::new(config.epsilon),
            epsilon_schedule: None,
            config,
            learn_step: 0,
            metrics: TrainMetrics::default(),
            rng,
            input_size,
            num_actions,
        })
    }

    /// Ingest one transition and, once warmed up, run one learning step.
    ///
    /// The transition is always stored (state vectors are copied, never
    /// aliased). Below the warm-up threshold the call returns without
    /// learning. Otherwise a batch is sampled with replacement and each
    /// sampled transition gets its own TD target and gradient step, in
    /// sampling order. The learn-step counter advances once per call, and
    /// every `sync_interval` steps the target network is overwritten with
    /// the online network's parameters.
    ///
    /// # Errors
    /// Returns [`DqnError::DimensionMismatch`] for a state of the wrong
    /// length and [`DqnError::InvalidAction`] for an out-of-range action.
    pub fn train(
        &mut self,
        state: &[f64],
        next_state: &[f64],
        action: usize,
        reward: f64,
        done: bool,
    ) -> Result<()> {
        check_state_dim(state, self.input_size)?;
        check_state_dim(next_state, self.input_size)?;
        if action >= self.num_actions {
            return Err(DqnError::InvalidAction {
                action,
                num_actions: self.num_actions,
            });
        }

        self.buffer
            .push(Transition::new(state, next_state, action, reward, done));
        self.metrics.transitions_seen += 1;

        if self.buffer.len() < self.config.base.warmup_threshold {
            return Ok(());
        }
        if self.buffer.len() == self.config.base.warmup_threshold && self.learn_step == 0 {
            debug!(
                occupancy = self.buffer.len(),
                "warm-up complete, learning begins"
            );
        }

        let batch = self
            .buffer
            .sample(self.config.base.batch_size, &mut self.rng);
        let mut squared_td_sum = 0.0;

        for transition in &batch {
            let next_q = self.target_network.predict(&transition.next_state.view());
            let max_next = max(&next_q.view());

            let cur_q = self.q_network.predict(&transition.state.view());

            // Gradient signal only at the taken action's index.
            let mut target = cur_q.clone();
            target[transition.action] = if transition.done {
                transition.reward
            } else {
                transition.reward + self.config.base.gamma * max_next
            };

            let td = target[transition.action] - cur_q[transition.action];
            squared_td_sum += td * td;

            self.q_network.backward(
                &transition.state.view(),
                &cur_q.view(),
                &target.view(),
                self.config.base.learning_rate,
            );
        }

        self.learn_step += 1;
        self.metrics.learn_steps = self.learn_step;
        self.metrics.last_loss = Some(squared_td_sum / batch.len() as f64);
        trace!(
            learn_step = self.learn_step,
            loss = self.metrics.last_loss,
            "learning step"
        );

        if let Some(schedule) = &self.epsilon_schedule {
            self.policy.epsilon = schedule.value(self.learn_step);
        }

        if self.learn_step % self.config.base.sync_interval == 0 {
            self.sync_target()?;
        }

        Ok(())
    }

    /// Select an action for `state` with the epsilon-greedy policy.
    ///
    /// # Errors
    /// Returns [`DqnError::DimensionMismatch`] for a state of the wrong
    /// length.
    pub fn select_action(&mut self, state: &[f64]) -> Result<usize> {
        check_state_dim(state, self.input_size)?;
        let state = ndarray::ArrayView1::from(state);
        Ok(self
            .policy
            .select_action(&self.q_network, &state, self.num_actions, &mut self.rng))
    }

    /// Overwrite the target network's parameters with the online network's.
    ///
    /// # Errors
    /// Returns an error only if the two estimators disagree on parameter
    /// count, which `from_estimators` rules out.
    pub fn sync_target(&mut self) -> Result<()> {
        self.target_network.set_weights(&self.q_network.weights())?;
        self.metrics.syncs += 1;
        debug!(learn_step = self.learn_step, "synchronized target network");
        Ok(())
    }

    /// Replace the fixed exploration rate with a schedule over learn steps.
    pub fn set_epsilon_schedule(&mut self, schedule: Box<dyn Schedule>) {
        self.policy.epsilon = schedule.value(self.learn_step);
        self.epsilon_schedule = Some(schedule);
    }

    /// Current exploration probability.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon
    }

    /// Training counters and most recent loss.
    #[must_use]
    pub fn metrics(&self) -> &TrainMetrics {
        &self.metrics
    }

    /// Learning steps completed so far.
    #[must_use]
    pub fn learn_step(&self) -> usize {
        self.learn_step
    }

    /// Current replay buffer occupancy.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Read access to the online estimator.
    #[must_use]
    pub fn q_network(&self) -> &E {
        &self.q_network
    }

    /// Read access to the target estimator.
    #[must_use]
    pub fn target_network(&self) -> &E {
        &self.target_network
    }

    /// Persist config, learn-step counter and both parameter snapshots.
    ///
    /// # Errors
    /// Returns serialization or IO errors.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let snapshot = AgentSnapshot {
            config: self.config.clone(),
            learn_step: self.learn_step,
            q_weights: self.q_network.weights(),
            target_weights: self.target_network.weights(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Restore config, learn-step counter and both parameter snapshots.
    ///
    /// The stored configuration passes the same validation as at
    /// construction and must match the live buffer's capacity; a snapshot
    /// that fails either check is rejected before any state is mutated.
    ///
    /// # Errors
    /// Returns serialization or IO errors, [`DqnError::Config`] for an
    /// invalid or mismatched stored configuration, or
    /// [`DqnError::DimensionMismatch`] if the stored snapshots do not fit
    /// this agent's estimators.
    pub fn load_snapshot(&mut self, path: &Path) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: AgentSnapshot = serde_json::from_str(&json)?;

        validate_config(&snapshot.config.base)?;
        if snapshot.config.base.buffer_capacity != self.buffer.capacity() {
            return Err(DqnError::Config(format!(
                "snapshot buffer_capacity {} does not match this agent's buffer capacity {}",
                snapshot.config.base.buffer_capacity,
                self.buffer.capacity()
            )));
        }

        self.q_network.set_weights(&snapshot.q_weights)?;
        self.target_network.set_weights(&snapshot.target_weights)?;
        self.learn_step = snapshot.learn_step;
        self.policy.epsilon = snapshot.config.epsilon;
        self.config = snapshot.config;
        Ok(())
    }
}

fn validate_config(config: &AgentConfig) -> Result<()> {
    if config.batch_size == 0 {
        return Err(DqnError::Config("batch_size must be non-zero".into()));
    }
    if config.sync_interval == 0 {
        return Err(DqnError::Config("sync_interval must be non-zero".into()));
    }
    if config.buffer_capacity == 0 {
        return Err(DqnError::Config("buffer_capacity must be non-zero".into()));
    }
    if config.warmup_threshold > config.buffer_capacity {
        return Err(DqnError::Config(format!(
            "warmup_threshold {} exceeds buffer_capacity {}",
            config.warmup_threshold, config.buffer_capacity
        )));
    }
    Ok(())
}
