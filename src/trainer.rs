use rand::Rng;
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::error::{DqnError, Result};
use crate::loss::{self, TdLoss};
use crate::optimizer::{GradientClipper, Optimizer, OptimizerWrapper};
use crate::replay_buffer::ReplayBuffer;
use crate::value_function::ValueFunction;

/// Runs single optimization steps on the online estimator.
///
/// The target estimator is only ever borrowed immutably here.
#[derive(Clone, Debug)]
pub struct Trainer {
    optimizer: OptimizerWrapper,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub gamma: f32,
    pub criterion: TdLoss,
    pub clipper: GradientClipper,
    steps: usize,
}

impl Trainer {
    pub fn new(optimizer: OptimizerWrapper, learning_rate: f32, batch_size: usize, gamma: f32) -> Result<Self> {
        if batch_size == 0 {
            return Err(DqnError::invalid_hyperparameter("batch_size", "must be positive"));
        }
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(DqnError::invalid_hyperparameter(
                "learning_rate".to_string(),
                format!("must be a positive finite number, got {}", learning_rate),
            ));
        }
        loss::check_gamma(gamma)?;

        Ok(Trainer {
            optimizer,
            learning_rate,
            batch_size,
            gamma,
            criterion: TdLoss::Mse,
            clipper: GradientClipper::None,
            steps: 0,
        })
    }

    pub fn with_criterion(mut self, criterion: TdLoss) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_clipper(mut self, clipper: GradientClipper) -> Self {
        self.clipper = clipper;
        self
    }

    /// Number of gradient steps applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// One gradient step on `online`.
    ///
    /// Returns `Ok(None)` while the buffer holds fewer than `batch_size`
    /// transitions; nothing is touched in that case.
    pub fn train_step<O, T, R>(
        &mut self,
        online: &mut O,
        target: &T,
        buffer: &ReplayBuffer,
        rng: &mut R,
    ) -> Result<Option<f32>>
    where
        O: ValueFunction + ?Sized,
        T: ValueFunction + ?Sized,
        R: Rng + ?Sized,
    {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }

        let transitions = match buffer.sample(self.batch_size, rng) {
            Ok(transitions) => transitions,
            Err(e) if !e.is_fatal() => return Ok(None),
            Err(e) => return Err(e),
        };
        let batch = Batch::from_transitions(&transitions)?;

        let output = loss::compute_loss(online, target, &batch, self.gamma, self.criterion)?;
        if !output.loss.is_finite() {
            warn!(loss = output.loss, "non-finite TD loss");
        }

        let mut gradients = online.backward(output.output_grad.view())?;
        let grad_norm = self.clipper.clip(&mut gradients);

        let mut parameters = online.parameters();
        self.optimizer.step(&mut parameters, &gradients, self.learning_rate)?;
        online.set_parameters(&parameters)?;

        self.steps += 1;
        debug!(step = self.steps, loss = output.loss, grad_norm, "train step");
        Ok(Some(output.loss))
    }
}
