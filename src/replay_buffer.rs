use ndarray::Array1;
use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

use crate::error::{DqnError, Result};

/// One environment interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Fixed-capacity FIFO store of transitions with uniform sampling.
///
/// Pushing into a full buffer evicts the oldest transition. Every stored
/// transition has `state` and `next_state` of length `state_dim`.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
    state_dim: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize, state_dim: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_parameter(
                "capacity",
                "replay buffer capacity must be greater than 0",
            ));
        }
        if state_dim == 0 {
            return Err(DqnError::invalid_parameter(
                "state_dim",
                "state dimension must be greater than 0",
            ));
        }
        Ok(ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            state_dim,
        })
    }

    pub fn push(&mut self, transition: Transition) -> Result<()> {
        if transition.state.len() != self.state_dim {
            return Err(DqnError::shape_mismatch(
                "state",
                self.state_dim,
                transition.state.len(),
            ));
        }
        if transition.next_state.len() != self.state_dim {
            return Err(DqnError::shape_mismatch(
                "next_state",
                self.state_dim,
                transition.next_state.len(),
            ));
        }

        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
        Ok(())
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if self.buffer.len() < batch_size {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        Ok(index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
