//! # DQN Agent
//!
//! [`DqnAgent`] closes the reinforcement-learning loop:
//!
//! 1. pick an action ε-greedily from the online estimator
//! 2. step the environment and store the transition in the replay buffer
//! 3. after the episode, run one train step on a uniformly sampled batch
//! 4. every `target_update_freq` episodes, hard- or soft-sync the target
//!
//! ```rust,no_run
//! use cartpole_dqn::agent::DqnAgentBuilder;
//! use cartpole_dqn::env::CartPole;
//!
//! let mut agent = DqnAgentBuilder::new()
//!     .num_episodes(300)
//!     .epsilon(1.0)
//!     .epsilon_decay(0.99, 0.05)
//!     .soft_sync(0.05)
//!     .build()
//!     .unwrap();
//! let mut env = CartPole::new();
//! let report = agent.train(&mut env).unwrap();
//! println!("average reward over last 50 episodes: {:?}", report.avg_reward(50));
//! ```

mod dqn;
pub use dqn::{DqnAgent, DqnAgentBuilder};
