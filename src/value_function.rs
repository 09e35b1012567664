//! # Value Function Interface
//!
//! The DQN core only ever talks to its estimators through [`ValueFunction`]:
//! a differentiable mapping from a batch of states to a batch of action-values,
//! plus get/set access to its parameters as a named tensor map.
//!
//! Two independently constructed instances play the online and target roles.
//! Target evaluation goes through [`ValueFunction::evaluate_no_grad`], which
//! takes `&self`, so the Bellman targets cannot feed a backward pass.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// Named parameter tensors, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    tensors: BTreeMap<String, ArrayD<f32>>,
}

impl Parameters {
    pub fn new() -> Self {
        Parameters {
            tensors: BTreeMap::new(),
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, tensor: ArrayD<f32>) -> Option<ArrayD<f32>> {
        self.tensors.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ArrayD<f32>> {
        self.tensors.get_mut(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayD<f32>)> {
        self.tensors.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ArrayD<f32>)> {
        self.tensors.iter_mut().map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar parameters.
    pub fn num_elements(&self) -> usize {
        self.tensors.values().map(|t| t.len()).sum()
    }

    pub fn same_keys(&self, other: &Parameters) -> bool {
        self.tensors.len() == other.tensors.len()
            && self.tensors.keys().zip(other.tensors.keys()).all(|(a, b)| a == b)
    }

    /// Fails with `ParameterMismatch` unless both maps have the same keys and
    /// every tensor pair has the same shape.
    pub fn check_compatible(&self, other: &Parameters) -> Result<()> {
        if !self.same_keys(other) {
            let ours: Vec<&str> = self.keys().collect();
            let theirs: Vec<&str> = other.keys().collect();
            return Err(DqnError::parameter_mismatch(format!(
                "key sets differ: {:?} vs {:?}",
                ours, theirs
            )));
        }
        for (name, tensor) in self.iter() {
            let counterpart = &other.tensors[name];
            if tensor.shape() != counterpart.shape() {
                return Err(DqnError::parameter_mismatch(format!(
                    "'{}' has shape {:?} vs {:?}",
                    name,
                    tensor.shape(),
                    counterpart.shape()
                )));
            }
        }
        Ok(())
    }

    /// Largest absolute elementwise difference across all tensors.
    pub fn max_abs_diff(&self, other: &Parameters) -> Result<f32> {
        self.check_compatible(other)?;
        Ok(self
            .iter()
            .map(|(name, tensor)| {
                tensor
                    .iter()
                    .zip(other.tensors[name].iter())
                    .fold(0.0f32, |acc, (a, b)| acc.max((a - b).abs()))
            })
            .fold(0.0f32, f32::max))
    }

    /// L2 norm over every element of every tensor.
    pub fn global_norm(&self) -> f32 {
        self.tensors
            .values()
            .map(|t| t.iter().map(|&x| x * x).sum::<f32>())
            .sum::<f32>()
            .sqrt()
    }

    pub fn scale(&mut self, factor: f32) {
        for tensor in self.tensors.values_mut() {
            tensor.mapv_inplace(|x| x * factor);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.tensors.values().all(|t| t.iter().all(|x| x.is_finite()))
    }
}

/// A differentiable state → action-value mapping.
pub trait ValueFunction {
    /// Length of the state vector.
    fn input_size(&self) -> usize;

    /// Number of action-values produced per state.
    fn num_actions(&self) -> usize;

    /// Forward pass that records what the next [`ValueFunction::backward`] needs.
    fn evaluate(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Forward pass with no gradient bookkeeping.
    fn evaluate_no_grad(&self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Backpropagate `output_grad` (dL/dQ for the last `evaluate` call) and
    /// return gradients keyed like [`ValueFunction::parameters`].
    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<Parameters>;

    fn parameters(&self) -> Parameters;

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()>;

    /// Action-values for a single state.
    fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = state.insert_axis(Axis(0));
        let output = self.evaluate_no_grad(batch)?;
        Ok(output.index_axis_move(Axis(0), 0))
    }
}
