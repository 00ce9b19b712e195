//! # signal-dqn - Deep Q-Learning for Traffic-Signal Control
//!
//! signal-dqn trains a signal-switching policy with off-policy temporal-difference
//! learning. An agent explores with an epsilon-greedy policy, stores transitions
//! in a bounded replay buffer, fits a Q-network to bootstrapped targets on
//! uniformly sampled mini-batches, and periodically hard-synchronizes a target
//! network.
//!
//! Simulator bridges plug in through the [`env::Environment`] trait, which only
//! asks for `reset` and `step`. The crate ships an in-process intersection
//! queue model for experiments and tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signal_dqn::config::TrainingConfig;
//! use signal_dqn::env::IntersectionEnv;
//! use signal_dqn::trainer::TrainingSession;
//!
//! let config = TrainingConfig::default();
//! let env = IntersectionEnv::new(config.env.clone()).unwrap();
//! let mut session = TrainingSession::from_config(env, &config).unwrap();
//! let summary = session.run().unwrap();
//! println!("best return: {:?}", summary.best_return());
//! ```
//!
//! ## Module Organization
//!
//! - [`action`] - Discrete action index and its one-hot switch encoding
//! - [`activations`] - Activation functions of the dense layers
//! - [`agent`] - DQN agent and epsilon-greedy schedule
//! - [`config`] - Serializable configuration
//! - [`env`] - Environment trait and the built-in intersection model
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Temporal-difference losses
//! - [`metrics`] - Training history
//! - [`network`] - Q-network
//! - [`optimizer`] - SGD, Adam/AdamW and gradient clipping
//! - [`replay_buffer`] - Experience replay
//! - [`trainer`] - Episode loop and target synchronization

pub mod action;
pub mod activations;
pub mod agent;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
