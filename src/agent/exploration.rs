//! Epsilon-greedy exploration schedule.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// Epsilon with multiplicative decay and a floor.
///
/// Between calls to [`EpsilonGreedy::set`], the value never increases. It never
/// drops below `epsilon_min` unless it was set below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f32,
    epsilon_min: f32,
    decay: f32,
}

impl EpsilonGreedy {
    pub fn new(epsilon_start: f32, epsilon_min: f32, decay: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&epsilon_start) || !(0.0..=1.0).contains(&epsilon_min) {
            return Err(DqnError::invalid_parameter(
                "epsilon",
                "epsilon values must lie in [0, 1]",
            ));
        }
        if epsilon_min > epsilon_start {
            return Err(DqnError::invalid_parameter(
                "epsilon_min",
                "must not exceed the starting epsilon",
            ));
        }
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(DqnError::invalid_parameter("epsilon_decay", "must lie in (0, 1]"));
        }
        Ok(EpsilonGreedy {
            epsilon: epsilon_start,
            epsilon_min,
            decay,
        })
    }

    pub fn value(&self) -> f32 {
        self.epsilon
    }

    /// One multiplicative decay step, floored at `epsilon_min`. A value set
    /// below the floor is never raised back up to it.
    pub fn decay(&mut self) -> f32 {
        let floor = self.epsilon_min.min(self.epsilon);
        self.epsilon = (self.epsilon * self.decay).max(floor);
        self.epsilon
    }

    /// Override the current value, clamped to `[0, 1]`.
    pub fn set(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Per-call Bernoulli draw: `true` means take a random action.
    pub fn explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f32>() < self.epsilon
    }
}
