//! # Value-Learning Agent
//!
//! [`DqnAgent`] learns action values off-policy:
//!
//! - **Epsilon-greedy** action selection, a fresh Bernoulli draw on every call
//! - **Experience replay** from a bounded FIFO buffer, sampled uniformly
//! - **Target network** evaluated without gradients for the bootstrapped
//!   target, hard-synchronized on demand with [`DqnAgent::sync_target`]
//!
//! Epsilon decays multiplicatively after every performed learning step and
//! never drops below its floor.

pub mod exploration;

mod dqn;
pub use dqn::{DqnAgent, UpdateInfo};
pub use exploration::EpsilonGreedy;
