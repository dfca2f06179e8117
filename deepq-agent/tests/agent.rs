//! Behavioral tests for the DQN learning loop, driven through a
//! call-recording estimator.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;

use deepq_agent::{Activation, DqnAgent, DqnConfig, LinearSchedule};
use deepq_core::{AgentConfig, DqnError, Result, ValueEstimator, WeightSnapshot};

/// One recorded `backward` invocation.
#[derive(Debug, Clone)]
struct BackwardCall {
    predicted: Vec<f64>,
    target: Vec<f64>,
}

/// Deterministic estimator whose "parameters" are its fixed Q-values.
///
/// `backward` bumps the first Q-value so the online network visibly
/// diverges from the target between syncs, and every call is recorded.
struct RecordingEstimator {
    q: Vec<f64>,
    bump_on_backward: f64,
    calls: Rc<RefCell<Vec<BackwardCall>>>,
}

impl RecordingEstimator {
    fn new(q: Vec<f64>, bump_on_backward: f64) -> (Self, Rc<RefCell<Vec<BackwardCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                q,
                bump_on_backward,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    fn silent(q: Vec<f64>) -> Self {
        Self {
            q,
            bump_on_backward: 0.0,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl ValueEstimator for RecordingEstimator {
    fn predict(&self, _state: &ArrayView1<f64>) -> Array1<f64> {
        Array1::from_vec(self.q.clone())
    }

    fn backward(
        &mut self,
        _state: &ArrayView1<f64>,
        predicted: &ArrayView1<f64>,
        target: &ArrayView1<f64>,
        _learning_rate: f64,
    ) {
        self.calls.borrow_mut().push(BackwardCall {
            predicted: predicted.to_vec(),
            target: target.to_vec(),
        });
        self.q[0] += self.bump_on_backward;
    }

    fn weights(&self) -> WeightSnapshot {
        WeightSnapshot(self.q.clone())
    }

    fn set_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()> {
        if snapshot.len() != self.q.len() {
            return Err(DqnError::DimensionMismatch {
                expected: self.q.len(),
                actual: snapshot.len(),
            });
        }
        self.q = snapshot.0.clone();
        Ok(())
    }

    fn input_dim(&self) -> usize {
        1
    }

    fn output_dim(&self) -> usize {
        self.q.len()
    }
}

/// Opt-in log output for debugging test runs, driven by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(warmup: usize, batch: usize, sync: usize) -> DqnConfig {
    DqnConfig {
        base: AgentConfig {
            learning_rate: 0.1,
            gamma: 0.9,
            batch_size: batch,
            buffer_capacity: 64,
            warmup_threshold: warmup,
            sync_interval: sync,
        },
        epsilon: 0.0,
        activation: Activation::Relu,
        seed: Some(11),
    }
}

fn mock_agent(
    warmup: usize,
    batch: usize,
    sync: usize,
    bump: f64,
) -> (DqnAgent<RecordingEstimator>, Rc<RefCell<Vec<BackwardCall>>>) {
    let (online, calls) = RecordingEstimator::new(vec![0.5, 2.0], bump);
    let target = RecordingEstimator::silent(vec![9.0, 9.0]);
    let agent = DqnAgent::from_estimators(
        online,
        target,
        config(warmup, batch, sync),
        StdRng::seed_from_u64(11),
    )
    .unwrap();
    (agent, calls)
}

#[test]
fn construction_syncs_target_to_online_network() {
    let (agent, _) = mock_agent(4, 2, 100, 0.0);
    assert_eq!(
        agent.target_network().weights(),
        agent.q_network().weights()
    );
}

#[test]
fn no_gradient_steps_below_warmup_threshold() {
    let (mut agent, calls) = mock_agent(3, 2, 100, 0.0);
    agent.train(&[0.0], &[0.0], 0, 1.0, false).unwrap();
    agent.train(&[0.0], &[0.0], 0, 1.0, false).unwrap();
    assert!(calls.borrow().is_empty());
    assert_eq!(agent.learn_step(), 0);

    agent.train(&[0.0], &[0.0], 0, 1.0, false).unwrap();
    assert_eq!(calls.borrow().len(), 2, "one backward per sampled transition");
    assert_eq!(agent.learn_step(), 1);
}

#[test]
fn target_differs_from_prediction_at_exactly_the_taken_action() {
    let (mut agent, calls) = mock_agent(1, 8, 100, 0.0);
    agent.train(&[0.0], &[0.0], 1, -3.0, false).unwrap();

    for call in calls.borrow().iter() {
        let diffs: Vec<usize> = call
            .predicted
            .iter()
            .zip(call.target.iter())
            .enumerate()
            .filter(|(_, (p, t))| p != t)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diffs, vec![1]);
    }
}

#[test]
fn terminal_target_is_exactly_the_reward() {
    let (mut agent, calls) = mock_agent(1, 4, 100, 0.0);
    agent.train(&[0.0], &[0.0], 0, 5.0, true).unwrap();

    for call in calls.borrow().iter() {
        assert_eq!(call.target[0], 5.0);
    }
}

#[test]
fn non_terminal_target_bootstraps_from_the_target_network() {
    let (mut agent, calls) = mock_agent(1, 4, 100, 0.0);
    agent.train(&[0.0], &[0.0], 0, 1.0, false).unwrap();

    // Target network holds the construction-time copy of [0.5, 2.0],
    // so max_next = 2.0 and target[0] = 1.0 + 0.9 * 2.0.
    for call in calls.borrow().iter() {
        assert_eq!(call.target[0], 1.0 + 0.9 * 2.0);
    }
}

#[test]
fn target_network_changes_only_at_sync_multiples() {
    let (mut agent, _) = mock_agent(1, 1, 3, 1.0);

    let mut target_history = vec![agent.target_network().weights()];
    for _ in 0..7 {
        agent.train(&[0.0], &[0.0], 0, 0.0, true).unwrap();
        target_history.push(agent.target_network().weights());
    }

    // Steps 1..=7; syncs at learn steps 3 and 6 only.
    for step in 1..=7 {
        let changed = target_history[step] != target_history[step - 1];
        assert_eq!(changed, step % 3 == 0, "unexpected sync state at step {step}");
    }
    // After a sync the target matches the online network exactly: three
    // backward bumps of 1.0 on top of the initial [0.5, 2.0].
    assert_eq!(target_history[3], WeightSnapshot(vec![3.5, 2.0]));
    assert_eq!(agent.metrics().syncs, 2);
}

#[test]
fn end_to_end_terminal_scenario() {
    let warmup = 5;
    let (mut agent, calls) = mock_agent(warmup, 4, 100, 0.0);

    for _ in 0..warmup - 1 {
        agent.train(&[0.7], &[0.7], 0, 5.0, true).unwrap();
    }
    assert!(calls.borrow().is_empty());

    agent.train(&[0.7], &[0.7], 0, 5.0, true).unwrap();

    let recorded = calls.borrow();
    assert!(!recorded.is_empty());
    for call in recorded.iter() {
        assert_eq!(call.target[0], 5.0);
    }
}

#[test]
fn learn_step_advances_once_per_call_not_per_transition() {
    let (mut agent, calls) = mock_agent(1, 16, 1000, 0.0);
    agent.train(&[0.0], &[0.0], 0, 0.0, true).unwrap();
    agent.train(&[0.0], &[0.0], 0, 0.0, true).unwrap();
    assert_eq!(agent.learn_step(), 2);
    assert_eq!(calls.borrow().len(), 32);
}

#[test]
fn boundary_validation_rejects_bad_shapes_and_actions() {
    let (mut agent, _) = mock_agent(1, 1, 100, 0.0);

    let err = agent.train(&[0.0, 1.0], &[0.0], 0, 0.0, false).unwrap_err();
    assert!(matches!(err, DqnError::DimensionMismatch { expected: 1, actual: 2 }));

    let err = agent.train(&[0.0], &[0.0], 7, 0.0, false).unwrap_err();
    assert!(matches!(err, DqnError::InvalidAction { action: 7, num_actions: 2 }));

    let err = agent.select_action(&[0.0, 1.0]).unwrap_err();
    assert!(matches!(err, DqnError::DimensionMismatch { .. }));
}

#[test]
fn greedy_selection_uses_the_online_network() {
    let (mut agent, _) = mock_agent(1, 1, 100, 0.0);
    // epsilon = 0.0, online Q-values are [0.5, 2.0].
    for _ in 0..10 {
        assert_eq!(agent.select_action(&[0.0]).unwrap(), 1);
    }
}

#[test]
fn invalid_configs_are_rejected_at_construction() {
    let make = |base: AgentConfig| {
        let online = RecordingEstimator::silent(vec![0.0, 0.0]);
        let target = RecordingEstimator::silent(vec![0.0, 0.0]);
        DqnAgent::from_estimators(
            online,
            target,
            DqnConfig {
                base,
                ..DqnConfig::default()
            },
            StdRng::seed_from_u64(0),
        )
    };

    let mut zero_batch = AgentConfig::default();
    zero_batch.batch_size = 0;
    assert!(matches!(make(zero_batch), Err(DqnError::Config(_))));

    let mut zero_sync = AgentConfig::default();
    zero_sync.sync_interval = 0;
    assert!(matches!(make(zero_sync), Err(DqnError::Config(_))));

    let mut warmup_too_big = AgentConfig::default();
    warmup_too_big.warmup_threshold = warmup_too_big.buffer_capacity + 1;
    assert!(matches!(make(warmup_too_big), Err(DqnError::Config(_))));
}

#[test]
fn epsilon_schedule_follows_learn_steps() {
    let (mut agent, _) = mock_agent(1, 1, 1000, 0.0);
    agent.set_epsilon_schedule(Box::new(LinearSchedule::new(1.0, 0.0, 10)));
    assert_eq!(agent.epsilon(), 1.0);

    for _ in 0..5 {
        agent.train(&[0.0], &[0.0], 0, 0.0, true).unwrap();
    }
    assert!((agent.epsilon() - 0.5).abs() < 1e-12);

    for _ in 0..20 {
        agent.train(&[0.0], &[0.0], 0, 0.0, true).unwrap();
    }
    assert_eq!(agent.epsilon(), 0.0);
}

#[test]
fn snapshot_save_load_restores_prediction_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.json");

    let mut source = DqnAgent::new(
        3,
        8,
        2,
        DqnConfig {
            base: AgentConfig {
                warmup_threshold: 1,
                batch_size: 4,
                ..AgentConfig::default()
            },
            seed: Some(42),
            ..DqnConfig::default()
        },
    )
    .unwrap();
    // Diverge from the initial weights a little before saving.
    for i in 0..5 {
        source
            .train(&[0.1, 0.2, 0.3], &[0.2, 0.3, 0.4], i % 2, 1.0, false)
            .unwrap();
    }
    source.save_snapshot(&path).unwrap();

    let mut restored = DqnAgent::new(
        3,
        8,
        2,
        DqnConfig {
            seed: Some(7),
            ..DqnConfig::default()
        },
    )
    .unwrap();
    restored.load_snapshot(&path).unwrap();

    let state = ndarray::arr1(&[0.5, -0.5, 0.25]);
    assert_eq!(
        source.q_network().predict(&state.view()),
        restored.q_network().predict(&state.view())
    );
    assert_eq!(
        source.target_network().predict(&state.view()),
        restored.target_network().predict(&state.view())
    );
    assert_eq!(source.learn_step(), restored.learn_step());
}

#[test]
fn load_snapshot_rejects_invalid_or_mismatched_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.json");

    let mut agent = DqnAgent::new(
        2,
        4,
        2,
        DqnConfig {
            seed: Some(1),
            ..DqnConfig::default()
        },
    )
    .unwrap();
    agent.save_snapshot(&path).unwrap();
    let json = std::fs::read_to_string(&path).unwrap();

    // An externally edited snapshot with a zero sync interval must not
    // load; it would make the next learning step divide by zero.
    let tampered = json.replace("\"sync_interval\": 2000", "\"sync_interval\": 0");
    assert_ne!(json, tampered);
    std::fs::write(&path, &tampered).unwrap();
    assert!(matches!(
        agent.load_snapshot(&path).unwrap_err(),
        DqnError::Config(_)
    ));

    // A stored capacity that differs from the live buffer is rejected too.
    let mismatched = json.replace("\"buffer_capacity\": 10000", "\"buffer_capacity\": 32");
    assert_ne!(json, mismatched);
    std::fs::write(&path, &mismatched).unwrap();
    assert!(matches!(
        agent.load_snapshot(&path).unwrap_err(),
        DqnError::Config(_)
    ));

    // The rejected loads left the agent usable with its original config.
    agent.train(&[0.1, 0.2], &[0.2, 0.3], 0, 1.0, true).unwrap();

    // The untampered snapshot still loads.
    std::fs::write(&path, &json).unwrap();
    agent.load_snapshot(&path).unwrap();
}

#[test]
fn real_network_agent_trains_end_to_end() {
    init_tracing();
    let mut agent = DqnAgent::new(
        2,
        8,
        2,
        DqnConfig {
            base: AgentConfig {
                learning_rate: 0.05,
                gamma: 0.9,
                batch_size: 8,
                buffer_capacity: 128,
                warmup_threshold: 16,
                sync_interval: 10,
            },
            epsilon: 0.0,
            activation: Activation::Sigmoid,
            seed: Some(3),
        },
    )
    .unwrap();

    // Action 0 always pays 1.0, action 1 pays nothing; terminal one-step
    // episodes so the TD target is just the reward.
    for i in 0..200 {
        let action = i % 2;
        let reward = if action == 0 { 1.0 } else { 0.0 };
        agent
            .train(&[0.3, 0.6], &[0.3, 0.6], action, reward, true)
            .unwrap();
    }

    assert!(agent.metrics().learn_steps > 0);
    assert!(agent.metrics().syncs > 0);
    assert_eq!(agent.select_action(&[0.3, 0.6]).unwrap(), 0);

    let q = agent.q_network().predict(&ndarray::arr1(&[0.3, 0.6]).view());
    assert!(q[0] > q[1], "Q-values did not separate: {q}");
}
