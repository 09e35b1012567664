//! # Activation Functions
//!
//! Element-wise non-linearities for the dense layers of the Q-network.
//!
//! - **ReLU**: `max(0, x)`, the default for hidden layers
//! - **Tanh**: outputs in (-1, 1)
//! - **LeakyReLU**: ReLU with a small negative slope
//! - **Linear**: identity, used on the output layer so Q-values are unbounded
//!
//! ```rust
//! use cartpole_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
