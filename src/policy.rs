use ndarray::ArrayView1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::value_function::ValueFunction;

/// Index of the largest value; the first one wins ties and NaN never wins.
///
/// Returns `None` for an empty view or one that is all NaN.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// ε-greedy action selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f32,
    num_actions: usize,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f32, num_actions: usize) -> Result<Self> {
        check_epsilon("epsilon", epsilon)?;
        if num_actions == 0 {
            return Err(DqnError::invalid_hyperparameter("num_actions", "must be positive"));
        }
        Ok(EpsilonGreedy { epsilon, num_actions })
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn set_epsilon(&mut self, epsilon: f32) -> Result<()> {
        check_epsilon("epsilon", epsilon)?;
        self.epsilon = epsilon;
        Ok(())
    }

    /// With probability ε a uniformly random action, otherwise the greedy one.
    pub fn select_action<V, R>(&self, state: ArrayView1<f32>, online: &V, rng: &mut R) -> Result<usize>
    where
        V: ValueFunction + ?Sized,
        R: Rng + ?Sized,
    {
        if rng.gen::<f32>() < self.epsilon {
            return Ok(rng.gen_range(0..self.num_actions));
        }
        self.greedy_action(state, online)
    }

    pub fn greedy_action<V>(&self, state: ArrayView1<f32>, online: &V) -> Result<usize>
    where
        V: ValueFunction + ?Sized,
    {
        let q_values = online.q_values(state)?;
        if q_values.len() != self.num_actions {
            return Err(DqnError::dimension_mismatch(
                format!("{} action-values", self.num_actions),
                format!("{} action-values", q_values.len()),
            ));
        }
        argmax(q_values.view())
            .ok_or_else(|| DqnError::NumericalError("no finite Q-values to choose from".to_string()))
    }
}

/// Multiplicative per-episode ε decay, floored at `min`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub min: f32,
    pub decay: f32,
}

impl EpsilonSchedule {
    /// A schedule that keeps ε fixed.
    pub fn constant(epsilon: f32) -> Self {
        EpsilonSchedule {
            start: epsilon,
            min: epsilon,
            decay: 1.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_epsilon("epsilon", self.start)?;
        check_epsilon("epsilon_min", self.min)?;
        if self.min > self.start {
            return Err(DqnError::invalid_hyperparameter(
                "epsilon_min".to_string(),
                format!("{} exceeds starting epsilon {}", self.min, self.start),
            ));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(DqnError::invalid_hyperparameter(
                "epsilon_decay".to_string(),
                format!("must lie in (0, 1], got {}", self.decay),
            ));
        }
        Ok(())
    }

    /// ε to use during zero-based `episode`.
    pub fn value_at(&self, episode: usize) -> f32 {
        if self.decay >= 1.0 {
            return self.start;
        }
        let exponent = i32::try_from(episode).unwrap_or(i32::MAX);
        (self.start * self.decay.powi(exponent)).max(self.min)
    }
}

fn check_epsilon(name: &str, epsilon: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(DqnError::invalid_hyperparameter(
            name.to_string(),
            format!("must lie in [0, 1], got {}", epsilon),
        ));
    }
    Ok(())
}
