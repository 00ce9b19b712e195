use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::exploration::EpsilonGreedy;
use crate::action::argmax;
use crate::config::DqnConfig;
use crate::error::{DqnError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{GradientClipper, Optimizer, OptimizerWrapper};
use crate::replay_buffer::{ReplayBuffer, Transition};

/// Diagnostics of one learning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateInfo {
    /// TD loss before the optimizer step
    pub loss: f32,

    /// Mean `Q(s)[a]` over the batch before the optimizer step
    pub mean_q: f32,

    /// Global gradient norm before clipping
    pub grad_norm: f32,

    /// Epsilon after this step's decay
    pub epsilon: f32,
}

/// Deep Q-Network agent with a hard-synchronized target network.
///
/// The agent exclusively owns its policy network, target network, optimizer,
/// replay buffer and random number generator.
///
/// # Example
///
/// ```rust
/// use signal_dqn::agent::DqnAgent;
/// use signal_dqn::config::DqnConfig;
/// use ndarray::array;
///
/// let config = DqnConfig::default().hidden_sizes(&[16]).buffer_capacity(100).seed(1);
/// let mut agent = DqnAgent::new(2, 3, config).unwrap();
///
/// let state = array![0.1, -0.2];
/// let action = agent.select_action(state.view()).unwrap();
/// assert!(action < 3);
///
/// agent.remember(state, action, -1.0, array![0.2, -0.1], false).unwrap();
/// // Not enough data yet for a batch of 32: the update is skipped.
/// assert!(agent.update(32).unwrap().is_none());
/// ```
pub struct DqnAgent {
    config: DqnConfig,
    state_dim: usize,
    action_dim: usize,
    policy_network: NeuralNetwork,
    target_network: NeuralNetwork,
    optimizer: OptimizerWrapper,
    clipper: GradientClipper,
    buffer: ReplayBuffer,
    exploration: EpsilonGreedy,
    train_steps: usize,
    rng: StdRng,
}

/// On-disk form of an agent. The replay buffer is not persisted.
#[derive(Serialize, Deserialize)]
struct AgentCheckpoint {
    config: DqnConfig,
    state_dim: usize,
    action_dim: usize,
    policy_network: NeuralNetwork,
    target_network: NeuralNetwork,
    optimizer: OptimizerWrapper,
    exploration: EpsilonGreedy,
    train_steps: usize,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Seed for an agent resumed after `train_steps` learning steps. Differs per
/// checkpoint so a resumed run does not replay the fresh run's random stream.
fn resume_seed(seed: Option<u64>, train_steps: usize) -> Option<u64> {
    seed.map(|seed| seed ^ (train_steps as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl DqnAgent {
    /// Create an agent for `state_dim`-long observations and `action_dim`
    /// discrete actions. The target network starts as a copy of the policy
    /// network.
    pub fn new(state_dim: usize, action_dim: usize, config: DqnConfig) -> Result<Self> {
        config.validate()?;
        if action_dim == 0 {
            return Err(DqnError::invalid_parameter(
                "action_dim",
                "must be greater than 0",
            ));
        }

        let mut rng = seeded_rng(config.seed);
        let policy_network =
            NeuralNetwork::mlp(state_dim, &config.hidden_sizes, action_dim, &mut rng)?;
        let target_network = policy_network.clone();
        let buffer = ReplayBuffer::new(config.buffer_capacity, state_dim)?;
        let exploration =
            EpsilonGreedy::new(config.epsilon_start, config.epsilon_min, config.epsilon_decay)?;

        Ok(DqnAgent {
            optimizer: config.optimizer.build(),
            clipper: config.gradient_clipper(),
            state_dim,
            action_dim,
            policy_network,
            target_network,
            buffer,
            exploration,
            train_steps: 0,
            rng,
            config,
        })
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.value()
    }

    /// Reset epsilon, e.g. before evaluation. Decay continues from the new value.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.exploration.set(epsilon);
    }

    /// Number of optimizer steps performed.
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn policy_network(&self) -> &NeuralNetwork {
        &self.policy_network
    }

    pub fn target_network(&self) -> &NeuralNetwork {
        &self.target_network
    }

    fn check_state(&self, what: &'static str, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.state_dim {
            return Err(DqnError::shape_mismatch(what, self.state_dim, state.len()));
        }
        Ok(())
    }

    /// Q-values of the policy network for `state`.
    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state("state", state)?;
        Ok(self.policy_network.predict(state))
    }

    /// Q-values of the target network for `state`.
    pub fn target_q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state("state", state)?;
        Ok(self.target_network.predict(state))
    }

    /// `argmax Q(state)`, ties resolved to the lowest action index.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_values(state)?;
        argmax(q_values.iter().copied())
            .ok_or_else(|| DqnError::invalid_parameter("q_values", "no finite Q-value to maximize"))
    }

    /// Epsilon-greedy action: uniform random with probability epsilon,
    /// greedy otherwise.
    pub fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        self.check_state("state", state)?;
        if self.exploration.explore(&mut self.rng) {
            Ok(self.rng.gen_range(0..self.action_dim))
        } else {
            self.greedy_action(state)
        }
    }

    /// Store one transition in the replay buffer.
    pub fn remember(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Result<()> {
        if action >= self.action_dim {
            return Err(DqnError::InvalidAction {
                action,
                action_dim: self.action_dim,
            });
        }
        self.buffer
            .push(Transition::new(state, action, reward, next_state, done))
    }

    /// Bootstrapped targets `r + gamma * max_a' Q_target(s')[a']`, with the
    /// bootstrap term dropped for terminal transitions.
    ///
    /// The target network is only evaluated, never differentiated.
    pub fn compute_targets(&self, batch: &[&Transition]) -> Result<Array1<f32>> {
        for transition in batch {
            self.check_state("next_state", transition.next_state.view())?;
        }
        let next_states = stack_states(batch.iter().map(|t| t.next_state.view()), self.state_dim);
        let next_q = self.target_network.predict_batch(next_states.view());
        let gamma = self.config.gamma;

        Ok(batch
            .iter()
            .zip(next_q.axis_iter(Axis(0)))
            .map(|(transition, row)| {
                if transition.done {
                    transition.reward
                } else {
                    let max_next = row.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                    transition.reward + gamma * max_next
                }
            })
            .collect())
    }

    /// One learning step on a uniformly sampled mini-batch.
    ///
    /// Returns `Ok(None)` without touching any state when the buffer holds
    /// fewer than `batch_size` transitions.
    pub fn update(&mut self, batch_size: usize) -> Result<Option<UpdateInfo>> {
        if batch_size == 0 {
            return Err(DqnError::invalid_parameter(
                "batch_size",
                "must be greater than 0",
            ));
        }

        let batch = match self.buffer.sample(batch_size, &mut self.rng) {
            Ok(batch) => batch,
            Err(err) if err.is_insufficient_data() => {
                debug!("skipping update: {}", err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let targets = self.compute_targets(&batch)?;
        let states = stack_states(batch.iter().map(|t| t.state.view()), self.state_dim);
        let actions: Vec<usize> = batch.iter().map(|t| t.action).collect();

        let (outputs, trace) = self.policy_network.forward_batch(states.view());
        let current: Array1<f32> = actions
            .iter()
            .enumerate()
            .map(|(i, &a)| outputs[[i, a]])
            .collect();

        let loss_fn = self.config.loss;
        let loss = loss_fn.compute(current.view(), targets.view());
        let q_grad = loss_fn.gradient(current.view(), targets.view());

        // Only the taken action's output receives gradient.
        let mut output_errors = Array2::<f32>::zeros(outputs.dim());
        for (i, (&a, &g)) in actions.iter().zip(q_grad.iter()).enumerate() {
            output_errors[[i, a]] = g;
        }

        let mut gradients = self
            .policy_network
            .backward_batch(&trace, output_errors.view());
        let grad_norm = self.clipper.clip(&mut gradients);
        self.optimizer.apply_gradients(
            &mut self.policy_network,
            &gradients,
            self.config.learning_rate,
        );

        if !loss.is_finite() {
            warn!("non-finite TD loss {} at train step {}", loss, self.train_steps);
        }

        self.train_steps += 1;
        let epsilon = self.exploration.decay();

        Ok(Some(UpdateInfo {
            loss,
            mean_q: current.mean().unwrap_or(0.0),
            grad_norm,
            epsilon,
        }))
    }

    /// Copy the policy parameters into the target network.
    pub fn sync_target(&mut self) {
        self.target_network.copy_from(&self.policy_network);
        debug!("target network synchronized at train step {}", self.train_steps);
    }

    /// Save networks, optimizer state, epsilon and counters with bincode.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let checkpoint = AgentCheckpoint {
            config: self.config.clone(),
            state_dim: self.state_dim,
            action_dim: self.action_dim,
            policy_network: self.policy_network.clone(),
            target_network: self.target_network.clone(),
            optimizer: self.optimizer.clone(),
            exploration: self.exploration,
            train_steps: self.train_steps,
        };
        let serialized = bincode::serialize(&checkpoint)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load an agent written by [`DqnAgent::save`], with an empty replay buffer.
    ///
    /// A seeded agent is reseeded from its seed and step counter.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path)?;
        let checkpoint: AgentCheckpoint = bincode::deserialize(&data)?;
        let config = checkpoint.config;

        if checkpoint.policy_network.input_size() != checkpoint.state_dim
            || checkpoint.policy_network.output_size() != checkpoint.action_dim
        {
            return Err(DqnError::Serialization(
                "checkpoint network shape does not match its recorded dimensions".to_string(),
            ));
        }

        Ok(DqnAgent {
            buffer: ReplayBuffer::new(config.buffer_capacity, checkpoint.state_dim)?,
            clipper: config.gradient_clipper(),
            rng: seeded_rng(resume_seed(config.seed, checkpoint.train_steps)),
            state_dim: checkpoint.state_dim,
            action_dim: checkpoint.action_dim,
            policy_network: checkpoint.policy_network,
            target_network: checkpoint.target_network,
            optimizer: checkpoint.optimizer,
            exploration: checkpoint.exploration,
            train_steps: checkpoint.train_steps,
            config,
        })
    }
}

fn stack_states<'a, I>(rows: I, state_dim: usize) -> Array2<f32>
where
    I: Iterator<Item = ArrayView1<'a, f32>>,
{
    let rows: Vec<ArrayView1<f32>> = rows.collect();
    let mut stacked = Array2::zeros((rows.len(), state_dim));
    for (mut target, row) in stacked.axis_iter_mut(Axis(0)).zip(rows) {
        target.assign(&row);
    }
    stacked
}
