// Test modules for all components
pub mod test_agent;
pub mod test_optimizer;
pub mod test_sync;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::network::NeuralNetwork;
use crate::replay_buffer::Transition;

/// Single linear layer with the given weights, so Q = s·W + b.
pub(crate) fn linear_network(weights: Array2<f32>, biases: Array1<f32>) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(0);
    let (inputs, outputs) = weights.dim();
    let mut network = NeuralNetwork::new(&[inputs, outputs], &[Activation::Linear], &mut rng).unwrap();
    network.layers[0].weights = weights;
    network.layers[0].biases = biases;
    network
}

pub(crate) fn small_mlp(seed: u64) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    NeuralNetwork::mlp(2, &[8], 3, &mut rng).unwrap()
}

pub(crate) fn transition(state: &[f32], action: usize, reward: f32, next_state: &[f32], done: bool) -> Transition {
    Transition::new(
        Array1::from_vec(state.to_vec()),
        action,
        reward,
        Array1::from_vec(next_state.to_vec()),
        done,
    )
}

/// Transition tagged by `id` in its reward and first state element.
pub(crate) fn tagged(id: usize) -> Transition {
    transition(&[id as f32, 0.0], id % 3, id as f32, &[id as f32 + 1.0, 0.0], false)
}
