//! Temporal-difference losses over the Q-values of the taken actions.

pub mod functions;

pub use functions::TdLoss;
