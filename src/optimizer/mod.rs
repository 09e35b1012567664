pub mod gradient_clipper;

use std::collections::BTreeMap;

use ndarray::ArrayD;

use crate::error::{DqnError, Result};
use crate::value_function::Parameters;

pub use gradient_clipper::GradientClipper;

/// Applies one update to a parameter map given gradients with the same keys.
pub trait Optimizer {
    fn step(&mut self, parameters: &mut Parameters, gradients: &Parameters, learning_rate: f32) -> Result<()>;
}

#[derive(Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl Optimizer for OptimizerWrapper {
    fn step(&mut self, parameters: &mut Parameters, gradients: &Parameters, learning_rate: f32) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.step(parameters, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(parameters, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.step(parameters, gradients, learning_rate),
        }
    }
}

fn paired<'a>(
    parameters: &'a mut Parameters,
    gradients: &'a Parameters,
) -> Result<impl Iterator<Item = (&'a str, &'a mut ArrayD<f32>, &'a ArrayD<f32>)>> {
    parameters.check_compatible(gradients)?;
    Ok(parameters
        .iter_mut()
        .zip(gradients.iter())
        .map(|((name, param), (_, grad))| (name, param, grad)))
}

fn zeros_like(tensor: &ArrayD<f32>) -> ArrayD<f32> {
    ArrayD::zeros(tensor.raw_dim())
}

#[derive(Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn step(&mut self, parameters: &mut Parameters, gradients: &Parameters, learning_rate: f32) -> Result<()> {
        for (_, param, grad) in paired(parameters, gradients)? {
            param.zip_mut_with(grad, |w, &g| *w -= learning_rate * g);
        }
        Ok(())
    }
}

/// Adam with first/second moment estimates kept per parameter name.
#[derive(Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m: BTreeMap<String, ArrayD<f32>>,
    v: BTreeMap<String, ArrayD<f32>>,
    pub t: i32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Result<Self> {
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(DqnError::invalid_hyperparameter(
                    name.to_string(),
                    format!("must lie in [0, 1), got {}", beta),
                ));
            }
        }
        if !(epsilon > 0.0) {
            return Err(DqnError::invalid_hyperparameter("adam_epsilon", "must be positive"));
        }
        Ok(Adam {
            beta1,
            beta2,
            epsilon,
            m: BTreeMap::new(),
            v: BTreeMap::new(),
            t: 0,
        })
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: BTreeMap::new(),
            v: BTreeMap::new(),
            t: 0,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, parameters: &mut Parameters, gradients: &Parameters, learning_rate: f32) -> Result<()> {
        self.t += 1;
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let bias_correction1 = 1.0 - beta1.powi(self.t);
        let bias_correction2 = 1.0 - beta2.powi(self.t);

        for (name, param, grad) in paired(parameters, gradients)? {
            let m = self.m.entry(name.to_string()).or_insert_with(|| zeros_like(grad));
            let v = self.v.entry(name.to_string()).or_insert_with(|| zeros_like(grad));

            m.zip_mut_with(grad, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
            v.zip_mut_with(grad, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

            ndarray::Zip::from(param)
                .and(&*m)
                .and(&*v)
                .for_each(|w, &m, &v| {
                    let m_hat = m / bias_correction1;
                    let v_hat = v / bias_correction2;
                    *w -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
                });
        }
        Ok(())
    }
}

/// RMSProp optimizer
#[derive(Clone, Debug)]
pub struct RMSProp {
    pub beta: f32,
    pub epsilon: f32,
    v: BTreeMap<String, ArrayD<f32>>,
}

impl RMSProp {
    pub fn new(beta: f32, epsilon: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&beta) {
            return Err(DqnError::invalid_hyperparameter(
                "rmsprop_beta".to_string(),
                format!("must lie in [0, 1), got {}", beta),
            ));
        }
        Ok(RMSProp {
            beta,
            epsilon,
            v: BTreeMap::new(),
        })
    }
}

impl Default for RMSProp {
    fn default() -> Self {
        RMSProp {
            beta: 0.9,
            epsilon: 1e-8,
            v: BTreeMap::new(),
        }
    }
}

impl Optimizer for RMSProp {
    fn step(&mut self, parameters: &mut Parameters, gradients: &Parameters, learning_rate: f32) -> Result<()> {
        let (beta, epsilon) = (self.beta, self.epsilon);
        for (name, param, grad) in paired(parameters, gradients)? {
            let v = self.v.entry(name.to_string()).or_insert_with(|| zeros_like(grad));

            // Moving average of squared gradients
            v.zip_mut_with(grad, |v, &g| *v = beta * *v + (1.0 - beta) * g * g);

            ndarray::Zip::from(param)
                .and(grad)
                .and(&*v)
                .for_each(|w, &g, &v| *w -= learning_rate * g / (v.sqrt() + epsilon));
        }
        Ok(())
    }
}
