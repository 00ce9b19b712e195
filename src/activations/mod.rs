//! # Activation Functions
//!
//! Element-wise non-linearities for the dense layers of the value network.
//!
//! - **ReLU**: `max(0, x)`, the default for hidden layers
//! - **LeakyReLU**: ReLU with a small negative slope
//! - **Tanh**: outputs between -1 and 1
//! - **Sigmoid**: outputs between 0 and 1
//! - **Linear**: identity, used for the Q-value output layer
//!
//! ```rust
//! use signal_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
