use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Bounded training history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// TD loss per learning step
    pub losses: VecDeque<f32>,

    /// Return per episode
    pub episode_rewards: VecDeque<f32>,

    /// Steps per episode
    pub episode_lengths: VecDeque<usize>,

    /// Epsilon at the end of each episode
    pub epsilons: VecDeque<f32>,
}

impl TrainingMetrics {
    pub fn new(history_size: usize) -> Self {
        TrainingMetrics {
            losses: VecDeque::with_capacity(history_size),
            episode_rewards: VecDeque::with_capacity(history_size),
            episode_lengths: VecDeque::with_capacity(history_size),
            epsilons: VecDeque::with_capacity(history_size),
        }
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, history_size: usize) {
    if queue.len() >= history_size {
        queue.pop_front();
    }
    queue.push_back(value);
}

fn tail_mean<'a, I>(values: I, window: usize) -> Option<f32>
where
    I: DoubleEndedIterator<Item = &'a f32> + ExactSizeIterator,
{
    let n = window.min(values.len());
    if n == 0 {
        return None;
    }
    let sum: f32 = values.rev().take(n).sum();
    Some(sum / n as f32)
}

/// Tracks metrics during training
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,

    current_episode_reward: f32,
    current_episode_length: usize,
    episode_count: usize,
    total_steps: usize,
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        MetricsTracker {
            metrics: TrainingMetrics::new(history_size),
            history_size,
            current_episode_reward: 0.0,
            current_episode_length: 0,
            episode_count: 0,
            total_steps: 0,
        }
    }

    /// Record a training loss
    pub fn record_loss(&mut self, loss: f32) {
        push_bounded(&mut self.metrics.losses, loss, self.history_size);
    }

    /// Start a new episode
    pub fn start_episode(&mut self) {
        self.current_episode_reward = 0.0;
        self.current_episode_length = 0;
    }

    /// Record a step within an episode
    pub fn step(&mut self, reward: f32) {
        self.current_episode_reward += reward;
        self.current_episode_length += 1;
        self.total_steps += 1;
    }

    /// End the current episode
    pub fn end_episode(&mut self, epsilon: f32) {
        push_bounded(
            &mut self.metrics.episode_rewards,
            self.current_episode_reward,
            self.history_size,
        );
        push_bounded(
            &mut self.metrics.episode_lengths,
            self.current_episode_length,
            self.history_size,
        );
        push_bounded(&mut self.metrics.epsilons, epsilon, self.history_size);
        self.episode_count += 1;
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn current_episode_reward(&self) -> f32 {
        self.current_episode_reward
    }

    /// Mean of the most recent `window` losses
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        tail_mean(self.metrics.losses.iter(), window)
    }

    /// Mean of the most recent `window` episode returns
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        tail_mean(self.metrics.episode_rewards.iter(), window)
    }

    pub fn best_episode_reward(&self) -> Option<f32> {
        self.metrics
            .episode_rewards
            .iter()
            .copied()
            .fold(None, |best, r| Some(best.map_or(r, |b: f32| b.max(r))))
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.history_size);
    }

    /// Save metrics as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load metrics saved by [`MetricsTracker::save`]
    pub fn load(&mut self, path: impl AsRef<Path>) -> crate::error::Result<()> {
        let data = std::fs::read_to_string(path)?;
        self.metrics = serde_json::from_str(&data)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}
