//! Configuration of the agent, the training loop and the built-in environment.
//!
//! Every struct has defaults matching the reference training runs, builder-style
//! setters, and JSON persistence through [`TrainingConfig::load`] and
//! [`TrainingConfig::save`].
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::env::IntersectionConfig;
use crate::error::{DqnError, Result};
use crate::loss::TdLoss;
use crate::optimizer::{Adam, GradientClipper, OptimizerWrapper, SGD};

/// Optimizer selection for the policy network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerConfig {
    Sgd,
    Adam {
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    AdamW {
        beta1: f32,
        beta2: f32,
        epsilon: f32,
        weight_decay: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    pub fn build(&self) -> OptimizerWrapper {
        match *self {
            OptimizerConfig::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::Adam {
                beta1,
                beta2,
                epsilon,
            } => OptimizerWrapper::Adam(Adam::new(beta1, beta2, epsilon)),
            OptimizerConfig::AdamW {
                beta1,
                beta2,
                epsilon,
                weight_decay,
            } => OptimizerWrapper::Adam(
                Adam::new(beta1, beta2, epsilon).with_weight_decay(weight_decay),
            ),
        }
    }
}

/// Configuration of [`DqnAgent`](crate::agent::DqnAgent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Hidden layer widths of the Q-network.
    pub hidden_sizes: Vec<usize>,

    pub learning_rate: f32,

    /// Discount factor.
    pub gamma: f32,

    pub epsilon_start: f32,

    /// Floor for epsilon decay.
    pub epsilon_min: f32,

    /// Multiplicative decay applied after every learning step.
    pub epsilon_decay: f32,

    /// Replay buffer capacity in transitions.
    pub buffer_capacity: usize,

    pub optimizer: OptimizerConfig,

    pub loss: TdLoss,

    /// Rescale gradients whose global norm exceeds this value.
    pub max_grad_norm: Option<f32>,

    /// Seed for network initialization, exploration and sampling.
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            hidden_sizes: vec![128, 128],
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.995,
            buffer_capacity: 50_000,
            optimizer: OptimizerConfig::default(),
            loss: TdLoss::Mse,
            max_grad_norm: None,
            seed: None,
        }
    }
}

impl DqnConfig {
    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.hidden_sizes = sizes.to_vec();
        self
    }

    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    pub fn epsilon_start(mut self, v: f32) -> Self {
        self.epsilon_start = v;
        self
    }

    pub fn epsilon_min(mut self, v: f32) -> Self {
        self.epsilon_min = v;
        self
    }

    pub fn epsilon_decay(mut self, v: f32) -> Self {
        self.epsilon_decay = v;
        self
    }

    pub fn buffer_capacity(mut self, v: usize) -> Self {
        self.buffer_capacity = v;
        self
    }

    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    pub fn loss(mut self, v: TdLoss) -> Self {
        self.loss = v;
        self
    }

    pub fn max_grad_norm(mut self, v: Option<f32>) -> Self {
        self.max_grad_norm = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    pub fn gradient_clipper(&self) -> GradientClipper {
        match self.max_grad_norm {
            Some(max_norm) => GradientClipper::ClipByGlobalNorm { max_norm },
            None => GradientClipper::None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter(
                "hidden_sizes",
                "hidden layers need at least one unit",
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(DqnError::invalid_parameter(
                "learning_rate",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DqnError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(DqnError::invalid_parameter(
                "epsilon",
                "epsilon_start and epsilon_min must lie in [0, 1]",
            ));
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(DqnError::invalid_parameter(
                "epsilon_min",
                "must not exceed epsilon_start",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(DqnError::invalid_parameter(
                "epsilon_decay",
                "must lie in (0, 1]",
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(DqnError::invalid_parameter(
                "buffer_capacity",
                "must be greater than 0",
            ));
        }
        if let Some(max_norm) = self.max_grad_norm {
            if !(max_norm > 0.0) {
                return Err(DqnError::invalid_parameter(
                    "max_grad_norm",
                    "must be positive",
                ));
            }
        }
        if let TdLoss::Huber { delta } = self.loss {
            if !(delta > 0.0) {
                return Err(DqnError::invalid_parameter("loss", "Huber delta must be positive"));
            }
        }
        Ok(())
    }
}

/// When the target network is overwritten with the policy network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSync {
    /// After every episode.
    EveryEpisode,

    /// After every n-th environment step, counted across episodes.
    EverySteps(usize),
}

impl Default for TargetSync {
    fn default() -> Self {
        TargetSync::EveryEpisode
    }
}

/// Configuration of [`TrainingSession`](crate::trainer::TrainingSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,

    /// Step cap per episode.
    pub max_steps: usize,

    pub batch_size: usize,

    pub target_sync: TargetSync,

    /// Log every n-th episode.
    pub log_interval: usize,

    /// Length of the metrics history.
    pub history_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 100,
            max_steps: 1000,
            batch_size: 64,
            target_sync: TargetSync::EveryEpisode,
            log_interval: 1,
            history_size: 1000,
        }
    }
}

impl TrainerConfig {
    pub fn num_episodes(mut self, v: usize) -> Self {
        self.num_episodes = v;
        self
    }

    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    pub fn target_sync(mut self, v: TargetSync) -> Self {
        self.target_sync = v;
        self
    }

    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    pub fn history_size(mut self, v: usize) -> Self {
        self.history_size = v;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(DqnError::invalid_parameter("max_steps", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if self.target_sync == TargetSync::EverySteps(0) {
            return Err(DqnError::invalid_parameter(
                "target_sync",
                "step interval must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Everything a training run needs, as stored in a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub agent: DqnConfig,
    pub trainer: TrainerConfig,
    pub env: IntersectionConfig,
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.trainer.validate()?;
        self.env.validate()
    }

    /// Constructs [`TrainingConfig`] from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves [`TrainingConfig`] as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        TrainingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = TrainingConfig {
            agent: DqnConfig::default().seed(7).hidden_sizes(&[16]),
            trainer: TrainerConfig::default().target_sync(TargetSync::EverySteps(250)),
            env: IntersectionConfig::default(),
        };
        config.save(&path).unwrap();
        assert_eq!(TrainingConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{ "agent": { "gamma": 0.9 } }"#).unwrap();
        assert_eq!(config.agent.gamma, 0.9);
        assert_eq!(config.agent.epsilon_decay, 0.995);
        assert_eq!(config.trainer, TrainerConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(DqnConfig::default().gamma(1.5).validate().is_err());
        assert!(DqnConfig::default().epsilon_min(0.5).epsilon_start(0.1).validate().is_err());
        assert!(DqnConfig::default().buffer_capacity(0).validate().is_err());
        assert!(TrainerConfig::default().batch_size(0).validate().is_err());
        assert!(TrainerConfig::default()
            .target_sync(TargetSync::EverySteps(0))
            .validate()
            .is_err());
    }
}
