use ndarray::{Array1, Array2};

use crate::error::{DqnError, Result};
use crate::replay_buffer::Transition;

/// A sampled minibatch stacked into row-major matrices.
#[derive(Clone, Debug)]
pub struct Batch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    /// 1.0 for terminal transitions, 0.0 otherwise.
    pub dones: Array1<f32>,
}

impl Batch {
    pub fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let first = transitions.first().ok_or(DqnError::InsufficientData {
            requested: 1,
            available: 0,
        })?;

        let batch_size = transitions.len();
        let state_size = first.state.len();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, transition) in transitions.iter().enumerate() {
            if transition.state.len() != state_size || transition.next_state.len() != state_size {
                return Err(DqnError::dimension_mismatch(
                    format!("states of length {}", state_size),
                    format!(
                        "state {} / next_state {} at row {}",
                        transition.state.len(),
                        transition.next_state.len(),
                        i
                    ),
                ));
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
            actions.push(transition.action);
            rewards[i] = transition.reward;
            dones[i] = if transition.done { 1.0 } else { 0.0 };
        }

        Ok(Batch {
            states,
            actions,
            rewards,
            next_states,
            dones,
        })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
