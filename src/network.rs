use ndarray::{Array2, ArrayView2, Ix1, Ix2};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::DenseLayer;
use crate::value_function::{Parameters, ValueFunction};

/// A feed-forward network of dense layers.
///
/// Parameters are exposed as `layer{i}.weights` (shape `in x out`) and
/// `layer{i}.biases` (shape `out`).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create a network with the given layer sizes and one activation per layer.
    pub fn new<R: Rng + ?Sized>(layer_sizes: &[usize], activations: &[Activation], rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_hyperparameter(
                "layer_sizes",
                "network must have at least input and output layers",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::invalid_hyperparameter(
                "activations".to_string(),
                format!(
                    "expected {} activations, got {}",
                    layer_sizes.len() - 1,
                    activations.len()
                ),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(NeuralNetwork { layers })
    }

    /// ReLU hidden layers followed by a linear output layer.
    pub fn mlp<R: Rng + ?Sized>(input_size: usize, hidden_sizes: &[usize], output_size: usize, rng: &mut R) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend_from_slice(hidden_sizes);
        layer_sizes.push(output_size);

        let mut activations = vec![Activation::Relu; hidden_sizes.len()];
        activations.push(Activation::Linear);

        Self::new(&layer_sizes, &activations, rng)
    }

    fn weights_key(index: usize) -> String {
        format!("layer{}.weights", index)
    }

    fn biases_key(index: usize) -> String {
        format!("layer{}.biases", index)
    }

    fn check_input(&self, states: &ArrayView2<f32>) -> Result<()> {
        let expected = self.input_size();
        if states.ncols() != expected {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", expected),
                format!("{} input features", states.ncols()),
            ));
        }
        Ok(())
    }
}

impl ValueFunction for NeuralNetwork {
    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    fn num_actions(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    fn evaluate(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;
        let mut current_output = states.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        Ok(current_output)
    }

    fn evaluate_no_grad(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;
        let mut current_output = states.to_owned();
        for layer in &self.layers {
            current_output = layer.forward_no_grad(current_output.view());
        }
        Ok(current_output)
    }

    fn backward(&mut self, output_grad: ArrayView2<f32>) -> Result<Parameters> {
        let mut gradients = Parameters::new();
        let mut current_error = output_grad.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_batch(current_error.view())?;
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
            gradients.insert(Self::weights_key(i), weight_gradients.into_dyn());
            gradients.insert(Self::biases_key(i), bias_gradients.into_dyn());
        }

        for layer in &mut self.layers {
            layer.clear_cache();
        }
        Ok(gradients)
    }

    fn parameters(&self) -> Parameters {
        let mut parameters = Parameters::new();
        for (i, layer) in self.layers.iter().enumerate() {
            parameters.insert(Self::weights_key(i), layer.weights.clone().into_dyn());
            parameters.insert(Self::biases_key(i), layer.biases.clone().into_dyn());
        }
        parameters
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        self.parameters().check_compatible(parameters)?;

        for (i, layer) in self.layers.iter_mut().enumerate() {
            let weights_key = Self::weights_key(i);
            let biases_key = Self::biases_key(i);
            let missing = || DqnError::parameter_mismatch(format!("layer {} is missing", i));

            let weights = parameters
                .get(&weights_key)
                .ok_or_else(missing)?
                .clone()
                .into_dimensionality::<Ix2>()
                .map_err(|e| DqnError::parameter_mismatch(format!("{}: {}", weights_key, e)))?;
            let biases = parameters
                .get(&biases_key)
                .ok_or_else(missing)?
                .clone()
                .into_dimensionality::<Ix1>()
                .map_err(|e| DqnError::parameter_mismatch(format!("{}: {}", biases_key, e)))?;

            layer.weights = weights;
            layer.biases = biases;
        }
        Ok(())
    }
}
