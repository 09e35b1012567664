use ndarray::{array, Array1};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use super::{Environment, StepOutcome};

/// Physical constants and episode limits for [`CartPole`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartPoleParams {
    pub gravity: f32,
    pub mass_cart: f32,
    pub mass_pole: f32,
    /// Half the pole length
    pub length: f32,
    pub force_mag: f32,
    /// Seconds between state updates
    pub dt: f32,
    pub x_threshold: f32,
    pub theta_threshold: f32,
    /// Steps after which the episode is truncated
    pub max_steps: usize,
}

impl Default for CartPoleParams {
    fn default() -> Self {
        CartPoleParams {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 10.0,
            dt: 0.02,
            x_threshold: 2.4,
            theta_threshold: 12.0_f32.to_radians(),
            max_steps: 500,
        }
    }
}

/// Cart-pole balancing task.
///
/// Observation is `[x, x_dot, theta, theta_dot]`; action 0 pushes left,
/// action 1 pushes right. Every step is worth a reward of 1.
#[derive(Clone, Debug)]
pub struct CartPole {
    pub params: CartPoleParams,
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    steps: usize,
    done: bool,
}

impl CartPole {
    pub fn new() -> Self {
        Self::with_params(CartPoleParams::default())
    }

    pub fn with_params(params: CartPoleParams) -> Self {
        CartPole {
            params,
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            // Must reset before stepping
            done: true,
        }
    }

    pub fn state(&self) -> Array1<f32> {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn observation_dim(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self, rng: &mut dyn RngCore) -> Result<Array1<f32>> {
        self.x = rng.gen_range(-0.05..0.05);
        self.x_dot = rng.gen_range(-0.05..0.05);
        self.theta = rng.gen_range(-0.05..0.05);
        self.theta_dot = rng.gen_range(-0.05..0.05);
        self.steps = 0;
        self.done = false;

        Ok(self.state())
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        if action >= self.action_count() {
            return Err(DqnError::InvalidAction {
                action,
                num_actions: self.action_count(),
            });
        }
        if self.done {
            return Err(DqnError::NumericalError(
                "step() called on a finished episode; call reset() first".to_string(),
            ));
        }

        let p = &self.params;
        let force = if action == 1 { p.force_mag } else { -p.force_mag };
        let total_mass = p.mass_cart + p.mass_pole;
        let pole_mass_length = p.mass_pole * p.length;

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp = (force + pole_mass_length * self.theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (p.gravity * sin_theta - cos_theta * temp)
            / (p.length * (4.0 / 3.0 - p.mass_pole * cos_theta.powi(2) / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        // Explicit Euler
        self.x += p.dt * self.x_dot;
        self.x_dot += p.dt * x_acc;
        self.theta += p.dt * self.theta_dot;
        self.theta_dot += p.dt * theta_acc;
        self.steps += 1;

        let terminated = self.x.abs() > p.x_threshold || self.theta.abs() > p.theta_threshold;
        let truncated = !terminated && self.steps >= p.max_steps;
        self.done = terminated || truncated;

        Ok(StepOutcome {
            next_state: self.state(),
            reward: 1.0,
            terminated,
            truncated,
        })
    }
}
