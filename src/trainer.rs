//! Episode-driven training of a [`DqnAgent`] against an [`Environment`].
use log::{error, info};
use ndarray::Array1;

use crate::agent::DqnAgent;
use crate::config::{TargetSync, TrainerConfig, TrainingConfig};
use crate::env::Environment;
use crate::error::{DqnError, Result};
use crate::metrics::MetricsTracker;

/// Statistics of one finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Zero-based episode index within the session
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f32,
    /// Epsilon when the episode ended
    pub epsilon: f32,
    /// Learning steps performed during the episode
    pub updates: usize,
    /// Mean TD loss over the episode's learning steps
    pub mean_loss: Option<f32>,
    /// Whether the environment signalled termination before the step cap
    pub terminated: bool,
}

/// Result of [`TrainingSession::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: Vec<EpisodeStats>,
    pub total_steps: usize,
    pub target_syncs: usize,
    pub final_epsilon: f32,
}

impl TrainingSummary {
    pub fn best_return(&self) -> Option<f32> {
        self.episodes
            .iter()
            .map(|e| e.total_reward)
            .fold(None, |best, r| Some(best.map_or(r, |b: f32| b.max(r))))
    }
}

/// Owns the environment, the agent and the run counters of one training run.
///
/// Environment steps and learning steps strictly alternate; nothing here is
/// shared across threads.
pub struct TrainingSession<E: Environment> {
    env: E,
    agent: DqnAgent,
    config: TrainerConfig,
    episode: usize,
    total_steps: usize,
    target_syncs: usize,
    metrics: MetricsTracker,
}

impl<E: Environment> TrainingSession<E> {
    pub fn new(env: E, agent: DqnAgent, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        if env.state_dim() != agent.state_dim() {
            return Err(DqnError::shape_mismatch(
                "observation",
                agent.state_dim(),
                env.state_dim(),
            ));
        }
        if env.action_dim() != agent.action_dim() {
            return Err(DqnError::shape_mismatch(
                "action space",
                agent.action_dim(),
                env.action_dim(),
            ));
        }

        let metrics = MetricsTracker::new(config.history_size);
        Ok(TrainingSession {
            env,
            agent,
            config,
            episode: 0,
            total_steps: 0,
            target_syncs: 0,
            metrics,
        })
    }

    /// Build a fresh agent sized for `env` from `config`.
    pub fn from_config(env: E, config: &TrainingConfig) -> Result<Self> {
        config.agent.validate()?;
        let agent = DqnAgent::new(env.state_dim(), env.action_dim(), config.agent.clone())?;
        Self::new(env, agent, config.trainer.clone())
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DqnAgent {
        &mut self.agent
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Episodes started so far, including failed ones.
    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn target_syncs(&self) -> usize {
        self.target_syncs
    }

    pub fn into_parts(self) -> (E, DqnAgent) {
        (self.env, self.agent)
    }

    fn sync_target(&mut self) {
        self.agent.sync_target();
        self.target_syncs += 1;
    }

    fn observe(&self, observation: Array1<f32>) -> Result<Array1<f32>> {
        if observation.len() != self.agent.state_dim() {
            return Err(DqnError::shape_mismatch(
                "observation",
                self.agent.state_dim(),
                observation.len(),
            ));
        }
        Ok(observation)
    }

    /// Run one episode: reset, then act, store and learn until the environment
    /// terminates or `max_steps` is reached.
    ///
    /// An environment failure abandons the episode and is returned as
    /// [`DqnError::Environment`]; the session stays usable.
    pub fn run_episode(&mut self) -> Result<EpisodeStats> {
        let episode = self.episode;
        self.episode += 1;

        let result = self.play_episode(episode);
        if let Err(err) = &result {
            error!("episode {} aborted: {}", episode + 1, err);
        }
        result
    }

    fn play_episode(&mut self, episode: usize) -> Result<EpisodeStats> {
        let env_failure = |source: E::Error| DqnError::Environment {
            episode,
            source: Box::new(source),
        };

        self.metrics.start_episode();
        let initial = self.env.reset().map_err(env_failure)?;
        let mut state = self.observe(initial)?;

        let mut steps = 0;
        let mut updates = 0;
        let mut loss_sum = 0.0;
        let mut terminated = false;

        while steps < self.config.max_steps {
            let action = self.agent.select_action(state.view())?;
            let step = self.env.step(action).map_err(env_failure)?;
            let next_state = self.observe(step.observation)?;

            self.agent
                .remember(state, action, step.reward, next_state.clone(), step.done)?;
            if let Some(info) = self.agent.update(self.config.batch_size)? {
                updates += 1;
                loss_sum += info.loss;
                self.metrics.record_loss(info.loss);
            }

            self.metrics.step(step.reward);
            state = next_state;
            steps += 1;
            self.total_steps += 1;

            if let TargetSync::EverySteps(interval) = self.config.target_sync {
                if self.total_steps % interval == 0 {
                    self.sync_target();
                }
            }

            if step.done {
                terminated = true;
                break;
            }
        }

        if self.config.target_sync == TargetSync::EveryEpisode {
            self.sync_target();
        }

        let epsilon = self.agent.epsilon();
        self.metrics.end_episode(epsilon);

        let stats = EpisodeStats {
            episode,
            steps,
            total_reward: self.metrics.current_episode_reward(),
            epsilon,
            updates,
            mean_loss: (updates > 0).then(|| loss_sum / updates as f32),
            terminated,
        };

        if self.config.log_interval > 0 && (episode + 1) % self.config.log_interval == 0 {
            info!(
                "episode {}: steps = {}, total reward = {:.2}, epsilon = {:.3}, mean loss = {}",
                episode + 1,
                stats.steps,
                stats.total_reward,
                stats.epsilon,
                stats
                    .mean_loss
                    .map_or_else(|| "n/a".to_string(), |l| format!("{:.4}", l)),
            );
        }

        Ok(stats)
    }

    /// Run `num_episodes` episodes, stopping at the first failure.
    pub fn run(&mut self) -> Result<TrainingSummary> {
        let mut episodes = Vec::with_capacity(self.config.num_episodes);
        for _ in 0..self.config.num_episodes {
            episodes.push(self.run_episode()?);
        }

        let summary = TrainingSummary {
            episodes,
            total_steps: self.total_steps,
            target_syncs: self.target_syncs,
            final_epsilon: self.agent.epsilon(),
        };
        info!(
            "training finished: {} episodes, {} steps, best return = {}",
            summary.episodes.len(),
            summary.total_steps,
            summary
                .best_return()
                .map_or_else(|| "n/a".to_string(), |r| format!("{:.2}", r)),
        );
        Ok(summary)
    }
}
