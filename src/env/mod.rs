//! # Environments
//!
//! The training loop drives anything implementing [`Environment`]. The crate
//! ships [`CartPole`], the classic pole-balancing task.

pub mod cartpole;

pub use cartpole::{CartPole, CartPoleParams};

use ndarray::Array1;
use rand::RngCore;

use crate::error::Result;

/// Result of a single environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub next_state: Array1<f32>,
    pub reward: f32,
    /// The episode reached a true terminal state.
    pub terminated: bool,
    /// The episode was cut off (e.g. a step limit) without terminating.
    pub truncated: bool,
}

impl StepOutcome {
    /// Either flag ends the episode.
    pub fn is_episode_end(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A discrete-action, vector-observation environment.
pub trait Environment {
    fn observation_dim(&self) -> usize;

    fn action_count(&self) -> usize;

    /// Start a new episode and return its initial observation.
    fn reset(&mut self, rng: &mut dyn RngCore) -> Result<Array1<f32>>;

    fn step(&mut self, action: usize) -> Result<StepOutcome>;
}
