//! # Bellman Loss
//!
//! Turns a sampled [`Batch`] into a scalar training signal:
//!
//! ```text
//! predicted[i] = Q_online(s_i)[a_i]
//! target[i]    = r_i + gamma * (1 - done_i) * max_a Q_target(s'_i)[a]
//! loss         = criterion(predicted, target)
//! ```
//!
//! The target estimator is borrowed immutably and evaluated with
//! `evaluate_no_grad`, so targets are constants for the backward pass.

pub mod functions;

pub use functions::TdLoss;

use ndarray::{Array1, Array2, Axis};

use crate::batch::Batch;
use crate::error::{DqnError, Result};
use crate::value_function::ValueFunction;

/// Everything one loss evaluation produces.
#[derive(Clone, Debug)]
pub struct LossOutput {
    pub loss: f32,
    /// Online Q-value of the action actually taken, per row.
    pub predicted: Array1<f32>,
    /// Bellman targets, per row.
    pub targets: Array1<f32>,
    /// dLoss/dQ_online, shaped like the online output. Only the taken action
    /// of each row is non-zero.
    pub output_grad: Array2<f32>,
}

pub(crate) fn check_gamma(gamma: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(DqnError::invalid_hyperparameter(
            "gamma".to_string(),
            format!("must lie in [0, 1], got {}", gamma),
        ));
    }
    Ok(())
}

/// `r + gamma * (1 - done) * max_a Q_target(s')`, computed without gradient tracking.
pub fn bellman_targets<T>(target: &T, batch: &Batch, gamma: f32) -> Result<Array1<f32>>
where
    T: ValueFunction + ?Sized,
{
    check_gamma(gamma)?;
    let next_q_values = target.evaluate_no_grad(batch.next_states.view())?;
    if next_q_values.nrows() != batch.len() || next_q_values.ncols() == 0 {
        return Err(DqnError::dimension_mismatch(
            format!("({}, >0) target outputs", batch.len()),
            format!("{:?}", next_q_values.dim()),
        ));
    }

    let next_best = next_q_values.map_axis(Axis(1), |row| {
        row.iter().fold(f32::NEG_INFINITY, |max, &q| max.max(q))
    });

    // Terminal rows skip the bootstrap term outright, so a non-finite
    // next-state estimate cannot leak into them.
    let mut targets = batch.rewards.clone();
    ndarray::Zip::from(&mut targets)
        .and(&batch.dones)
        .and(&next_best)
        .for_each(|target, &done, &next| {
            if done == 0.0 {
                *target += gamma * next;
            }
        });
    Ok(targets)
}

/// Evaluate the Bellman loss on `batch`.
///
/// The online forward pass records activations, so the returned
/// `output_grad` can be fed straight into `online.backward`.
pub fn compute_loss<O, T>(
    online: &mut O,
    target: &T,
    batch: &Batch,
    gamma: f32,
    criterion: TdLoss,
) -> Result<LossOutput>
where
    O: ValueFunction + ?Sized,
    T: ValueFunction + ?Sized,
{
    if batch.is_empty() {
        return Err(DqnError::InsufficientData {
            requested: 1,
            available: 0,
        });
    }

    let num_actions = online.num_actions();
    if let Some(&action) = batch.actions.iter().find(|&&a| a >= num_actions) {
        return Err(DqnError::InvalidAction { action, num_actions });
    }

    let targets = bellman_targets(target, batch, gamma)?;

    let q_values = online.evaluate(batch.states.view())?;
    let predicted: Array1<f32> = batch
        .actions
        .iter()
        .enumerate()
        .map(|(i, &action)| q_values[[i, action]])
        .collect();

    let loss = criterion.compute(predicted.view(), targets.view());
    let row_grads = criterion.gradient(predicted.view(), targets.view());

    let mut output_grad = Array2::zeros(q_values.raw_dim());
    for (i, &action) in batch.actions.iter().enumerate() {
        output_grad[[i, action]] = row_grads[i];
    }

    Ok(LossOutput {
        loss,
        predicted,
        targets,
        output_grad,
    })
}
