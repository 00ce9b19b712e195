//! # Environment Adapters
//!
//! The training loop only needs [`Environment::reset`] and [`Environment::step`].
//! Bridges to external traffic simulators implement this trait; the crate ships
//! [`IntersectionEnv`], an in-process queue model with the same observation
//! layout as the microsimulator adapter (vehicle count per controlled lane,
//! then the current phase, for each signal).

pub mod intersection;
pub mod reward;

use ndarray::Array1;

pub use intersection::{IntersectionConfig, IntersectionEnv};
pub use reward::QueueDelayReward;

/// Outcome of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

impl Step {
    pub fn new(observation: Array1<f32>, reward: f32, done: bool) -> Self {
        Step {
            observation,
            reward,
            done,
        }
    }
}

/// A controllable, episodic environment with a fixed observation length and a
/// fixed number of discrete actions.
pub trait Environment {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Length of every observation vector.
    fn state_dim(&self) -> usize;

    /// Number of discrete actions; valid actions are `0..action_dim()`.
    fn action_dim(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Array1<f32>, Self::Error>;

    /// Apply `action` and advance the environment by one decision step.
    fn step(&mut self, action: usize) -> Result<Step, Self::Error>;
}
