use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Criterion comparing predicted Q-values against Bellman targets.
///
/// Both variants average over the batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TdLoss {
    /// Mean squared error
    #[default]
    Mse,
    /// Huber loss (smooth L1): quadratic within `delta`, linear outside
    Huber { delta: f32 },
}

impl TdLoss {
    pub fn compute(&self, predicted: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let n = predicted.len().max(1) as f32;
        let diff = &predicted - &targets;
        match self {
            TdLoss::Mse => diff.mapv(|x| x * x).sum() / n,
            TdLoss::Huber { delta } => {
                let delta = *delta;
                diff.mapv(|x| {
                    let abs_x = x.abs();
                    if abs_x <= delta {
                        0.5 * x * x
                    } else {
                        delta * abs_x - 0.5 * delta * delta
                    }
                })
                .sum()
                    / n
            }
        }
    }

    /// Derivative of [`TdLoss::compute`] with respect to each prediction.
    pub fn gradient(&self, predicted: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predicted.len().max(1) as f32;
        let diff = &predicted - &targets;
        match self {
            TdLoss::Mse => diff.mapv(|x| 2.0 * x / n),
            TdLoss::Huber { delta } => {
                let delta = *delta;
                diff.mapv(|x| x.max(-delta).min(delta) / n)
            }
        }
    }
}
