//! # cartpole-dqn - Deep Q-Learning for Cart-Pole Balancing
//!
//! A small, self-contained DQN trainer. It collects experience by interacting
//! with an environment, stores it in a circular replay buffer, samples
//! uniform minibatches from it, and refines an online Q-network against
//! Bellman targets produced by a separately synchronized target network.
//!
//! ## Key Pieces
//!
//! - **Replay buffer**: fixed-capacity ring, uniform sampling without replacement
//! - **Target synchronization**: hard copy or soft (Polyak) blend
//! - **Bellman loss**: `r + gamma * (1 - done) * max_a Q_target(s', a)`, with the
//!   target network evaluated without gradient tracking
//! - **Trainer**: one optimizer step per call, no-op during buffer warm-up
//! - **ε-greedy policy** with an optional decay schedule
//! - **Episode loop** tying everything to an [`env::Environment`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartpole_dqn::agent::DqnAgent;
//! use cartpole_dqn::config::DqnConfig;
//! use cartpole_dqn::env::CartPole;
//!
//! let config = DqnConfig::default();
//! let mut agent = DqnAgent::new(config).unwrap();
//! let mut env = CartPole::new();
//! let report = agent.train(&mut env).unwrap();
//! println!("mean reward: {}", report.reward_statistics().mean);
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - The episodic training loop
//! - [`batch`] - Stacking sampled transitions into matrices
//! - [`config`] - Hyperparameters, JSON loading and validation
//! - [`env`] - Environment trait and the cart-pole simulator
//! - [`error`] - Error types and result handling
//! - [`loss`] - Bellman targets and TD loss
//! - [`network`] - Dense Q-network implementing [`value_function::ValueFunction`]
//! - [`optimizer`] - SGD, Adam and RMSProp over named parameter maps
//! - [`policy`] - ε-greedy action selection
//! - [`replay_buffer`] - Experience replay
//! - [`sync`] - Hard and soft target updates
//! - [`trainer`] - Single optimization steps
//! - [`value_function`] - The estimator interface and parameter maps

pub mod activations;
pub mod agent;
pub mod batch;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod policy;
pub mod replay_buffer;
pub mod sync;
pub mod trainer;
pub mod value_function;

pub use agent::{DqnAgent, DqnAgentBuilder};
pub use config::DqnConfig;
pub use error::{DqnError, Result};

#[cfg(test)]
mod tests;
