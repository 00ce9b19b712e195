use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

use super::{Environment, QueueDelayReward, Step};
use crate::error::{DqnError, Result};

/// Configuration of [`IntersectionEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// Number of independently switched signals; also the action count.
    pub num_signals: usize,

    /// Approach lanes per signal. The first half is green in phase 0, the
    /// second half in phase 1.
    pub lanes_per_signal: usize,

    /// Mean vehicle arrivals per lane per step (Poisson).
    pub arrival_rate: f32,

    /// Vehicles a green lane discharges per step.
    pub discharge_rate: f32,

    /// Queue length at which mean lane speed halves.
    pub lane_capacity: f32,

    /// Free-flow speed in m/s.
    pub max_speed: f32,

    /// Decision steps per episode.
    pub max_steps: usize,

    /// Adds action `num_signals`, which keeps every phase unchanged.
    pub allow_hold: bool,

    pub reward: QueueDelayReward,

    pub seed: Option<u64>,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        IntersectionConfig {
            num_signals: 4,
            lanes_per_signal: 4,
            arrival_rate: 0.3,
            discharge_rate: 2.0,
            lane_capacity: 20.0,
            max_speed: 13.9,
            max_steps: 3000,
            allow_hold: false,
            reward: QueueDelayReward::default(),
            seed: None,
        }
    }
}

impl IntersectionConfig {
    pub fn num_signals(mut self, v: usize) -> Self {
        self.num_signals = v;
        self
    }

    pub fn lanes_per_signal(mut self, v: usize) -> Self {
        self.lanes_per_signal = v;
        self
    }

    pub fn arrival_rate(mut self, v: f32) -> Self {
        self.arrival_rate = v;
        self
    }

    pub fn discharge_rate(mut self, v: f32) -> Self {
        self.discharge_rate = v;
        self
    }

    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    pub fn allow_hold(mut self, v: bool) -> Self {
        self.allow_hold = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    pub fn state_dim(&self) -> usize {
        self.num_signals * (self.lanes_per_signal + 1)
    }

    pub fn action_dim(&self) -> usize {
        self.num_signals + usize::from(self.allow_hold)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_signals == 0 {
            return Err(DqnError::invalid_parameter("num_signals", "must be greater than 0"));
        }
        if self.lanes_per_signal < 2 || self.lanes_per_signal % 2 != 0 {
            return Err(DqnError::invalid_parameter(
                "lanes_per_signal",
                "must be an even number of at least 2",
            ));
        }
        if !(self.arrival_rate > 0.0) {
            return Err(DqnError::invalid_parameter("arrival_rate", "must be positive"));
        }
        if !(self.discharge_rate >= 0.0) {
            return Err(DqnError::invalid_parameter("discharge_rate", "must not be negative"));
        }
        if !(self.lane_capacity > 0.0) || !(self.max_speed > 0.0) {
            return Err(DqnError::invalid_parameter(
                "lane_capacity",
                "lane_capacity and max_speed must be positive",
            ));
        }
        if self.max_steps == 0 {
            return Err(DqnError::invalid_parameter("max_steps", "must be greater than 0"));
        }
        Ok(())
    }
}

/// A grid of two-phase signals with Poisson arrivals.
///
/// Action `i` switches the phase of signal `i`. Without
/// [`IntersectionConfig::allow_hold`] every step switches exactly one signal;
/// with it, action `num_signals` leaves all phases as they are. Each step every
/// green lane discharges up to `discharge_rate` vehicles and every lane receives
/// new arrivals. The reward penalizes queued vehicles and speed loss.
pub struct IntersectionEnv {
    config: IntersectionConfig,
    queues: Vec<f32>,
    phases: Vec<usize>,
    arrivals: Poisson<f64>,
    steps: usize,
    finished: bool,
    rng: StdRng,
}

impl IntersectionEnv {
    pub fn new(config: IntersectionConfig) -> Result<Self> {
        config.validate()?;
        let arrivals = Poisson::new(config.arrival_rate as f64)
            .map_err(|e| DqnError::invalid_parameter("arrival_rate".to_string(), e.to_string()))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let lanes = config.num_signals * config.lanes_per_signal;

        Ok(IntersectionEnv {
            queues: vec![0.0; lanes],
            phases: vec![0; config.num_signals],
            arrivals,
            steps: 0,
            finished: false,
            rng,
            config,
        })
    }

    pub fn config(&self) -> &IntersectionConfig {
        &self.config
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn queues(&self) -> &[f32] {
        &self.queues
    }

    pub fn phases(&self) -> &[usize] {
        &self.phases
    }

    fn is_green(&self, lane: usize) -> bool {
        let lanes = self.config.lanes_per_signal;
        let signal = lane / lanes;
        let in_second_half = lane % lanes >= lanes / 2;
        (self.phases[signal] == 1) == in_second_half
    }

    fn observation(&self) -> Array1<f32> {
        let lanes = self.config.lanes_per_signal;
        let mut obs = Vec::with_capacity(self.config.state_dim());
        for (signal, chunk) in self.queues.chunks(lanes).enumerate() {
            obs.extend_from_slice(chunk);
            obs.push(self.phases[signal] as f32);
        }
        Array1::from_vec(obs)
    }

    fn reward(&self) -> f32 {
        let capacity = self.config.lane_capacity;
        let max_speed = self.config.max_speed;
        let (total_queue, total_delay) = self.queues.iter().fold((0.0, 0.0), |(q, d), &queue| {
            let mean_speed = max_speed * capacity / (capacity + queue);
            (q + queue, d + QueueDelayReward::lane_delay(mean_speed, max_speed))
        });
        self.config.reward.reward(total_queue, total_delay)
    }
}

impl Environment for IntersectionEnv {
    type Error = DqnError;

    fn state_dim(&self) -> usize {
        self.config.state_dim()
    }

    fn action_dim(&self) -> usize {
        self.config.action_dim()
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.queues.iter_mut().for_each(|q| *q = 0.0);
        self.phases.iter_mut().for_each(|p| *p = 0);
        self.steps = 0;
        self.finished = false;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if action >= self.config.action_dim() {
            return Err(DqnError::InvalidAction {
                action,
                action_dim: self.config.action_dim(),
            });
        }
        if self.finished {
            return Err(DqnError::invalid_parameter(
                "step",
                "episode has finished; call reset first",
            ));
        }

        if let Some(phase) = self.phases.get_mut(action) {
            *phase = 1 - *phase;
        }

        for lane in 0..self.queues.len() {
            if self.is_green(lane) {
                self.queues[lane] = (self.queues[lane] - self.config.discharge_rate).max(0.0);
            }
            self.queues[lane] += self.arrivals.sample(&mut self.rng) as f32;
        }

        self.steps += 1;
        self.finished = self.steps >= self.config.max_steps;

        Ok(Step::new(self.observation(), self.reward(), self.finished))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_env() -> IntersectionEnv {
        IntersectionEnv::new(
            IntersectionConfig::default()
                .num_signals(2)
                .lanes_per_signal(2)
                .max_steps(5)
                .seed(3),
        )
        .unwrap()
    }

    #[test]
    fn test_observation_layout() {
        let mut env = small_env();
        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), env.state_dim());
        assert_eq!(obs.len(), 6);
        assert!(obs.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_action_switches_phase_of_one_signal() {
        let mut env = small_env();
        env.reset().unwrap();
        let step = env.step(1).unwrap();
        assert_eq!(env.phases(), &[0, 1]);
        assert_eq!(step.observation[2], 0.0);
        assert_eq!(step.observation[5], 1.0);
    }

    #[test]
    fn test_episode_ends_at_max_steps() {
        let mut env = small_env();
        env.reset().unwrap();
        let mut done = false;
        for _ in 0..5 {
            done = env.step(0).unwrap().done;
        }
        assert!(done);
        assert!(env.step(0).is_err());
        env.reset().unwrap();
        assert!(env.step(0).is_ok());
    }

    #[test]
    fn test_reward_is_never_positive() {
        let mut env = small_env();
        env.reset().unwrap();
        for i in 0..5 {
            assert!(env.step(i % 2).unwrap().reward <= 0.0);
        }
    }

    #[test]
    fn test_rejects_invalid_action() {
        let mut env = small_env();
        env.reset().unwrap();
        assert!(matches!(env.step(2), Err(DqnError::InvalidAction { .. })));
    }

    #[test]
    fn test_hold_action_keeps_phases() {
        let mut env = IntersectionEnv::new(
            IntersectionConfig::default()
                .num_signals(2)
                .lanes_per_signal(2)
                .allow_hold(true)
                .seed(3),
        )
        .unwrap();
        assert_eq!(env.action_dim(), 3);
        env.reset().unwrap();
        env.step(0).unwrap();
        let step = env.step(2).unwrap();
        assert_eq!(env.phases(), &[1, 0]);
        assert_eq!(step.observation[2], 1.0);
        assert_eq!(step.observation[5], 0.0);
        assert!(matches!(env.step(3), Err(DqnError::InvalidAction { .. })));
    }

    #[test]
    fn test_rejects_odd_lane_count() {
        let config = IntersectionConfig::default().lanes_per_signal(3);
        assert!(IntersectionEnv::new(config).is_err());
    }
}
