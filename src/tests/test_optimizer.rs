use ndarray::{arr1, arr2, ArrayD};

use crate::error::DqnError;
use crate::optimizer::{Adam, GradientClipper, Optimizer, OptimizerWrapper, RMSProp, SGD};
use crate::value_function::Parameters;

fn params(weights: &[f32], biases: &[f32]) -> Parameters {
    let mut p = Parameters::new();
    p.insert("layer0.weights", arr1(weights).into_dyn());
    p.insert("layer0.biases", arr1(biases).into_dyn());
    p
}

fn values(p: &Parameters, key: &str) -> Vec<f32> {
    p.get(key).unwrap().iter().copied().collect()
}

fn assert_close(actual: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < tol, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn test_sgd_update() {
    let mut optimizer = SGD::new();
    let mut p = params(&[1.0, -1.0], &[0.5]);
    let g = params(&[0.1, -0.2], &[1.0]);

    optimizer.step(&mut p, &g, 0.01).unwrap();

    assert_close(&values(&p, "layer0.weights"), &[0.999, -0.998], 1e-6);
    assert_close(&values(&p, "layer0.biases"), &[0.49], 1e-6);
}

#[test]
fn test_adam_first_step_has_learning_rate_magnitude() {
    let mut optimizer = Adam::default();
    let mut p = params(&[1.0, 1.0], &[0.0]);
    let g = params(&[5.0, -0.01], &[0.0]);

    optimizer.step(&mut p, &g, 0.1).unwrap();

    // Bias-corrected first step is lr * sign(g)
    assert_close(&values(&p, "layer0.weights"), &[0.9, 1.1], 1e-4);
    assert_close(&values(&p, "layer0.biases"), &[0.0], 1e-6);
    assert_eq!(optimizer.t, 1);
}

#[test]
fn test_adam_rejects_bad_betas() {
    assert!(Adam::new(1.0, 0.999, 1e-8).is_err());
    assert!(Adam::new(0.9, -0.1, 1e-8).is_err());
    assert!(Adam::new(0.9, 0.999, 0.0).is_err());
    assert!(Adam::new(0.9, 0.999, 1e-8).is_ok());
}

#[test]
fn test_rmsprop_first_step() {
    let mut optimizer = RMSProp::default();
    let mut p = params(&[0.0], &[0.0]);
    let g = params(&[2.0], &[0.0]);

    optimizer.step(&mut p, &g, 0.01).unwrap();

    // v = 0.1 * g^2, so the step is lr / sqrt(0.1)
    let expected = -0.01 / 0.1f32.sqrt();
    assert_close(&values(&p, "layer0.weights"), &[expected], 1e-5);
    assert!(RMSProp::new(1.5, 1e-8).is_err());

    let mut explicit = RMSProp::new(0.9, 1e-8).unwrap();
    let mut p = params(&[0.0], &[0.0]);
    explicit.step(&mut p, &g, 0.01).unwrap();
    assert_close(&values(&p, "layer0.weights"), &[expected], 1e-5);
}

#[test]
fn test_wrapper_dispatches() {
    let mut wrapped = OptimizerWrapper::SGD(SGD::new());
    let mut p = params(&[1.0], &[1.0]);
    let g = params(&[1.0], &[1.0]);
    wrapped.step(&mut p, &g, 0.5).unwrap();
    assert_close(&values(&p, "layer0.weights"), &[0.5], 1e-6);
}

#[test]
fn test_mismatched_gradients_are_rejected() {
    let mut p = params(&[1.0, 2.0], &[0.0]);
    let before = p.clone();

    let mut wrong_shape = params(&[1.0], &[0.0]);
    assert!(matches!(
        SGD::new().step(&mut p, &wrong_shape, 0.1),
        Err(DqnError::ParameterMismatch { .. })
    ));

    wrong_shape.insert("layer1.weights", ArrayD::zeros(vec![1]));
    assert!(Adam::default().step(&mut p, &wrong_shape, 0.1).is_err());
    assert_eq!(p, before);
}

#[test]
fn test_clip_by_global_norm() {
    let mut g = Parameters::new();
    g.insert("a", arr1(&[3.0, 0.0]).into_dyn());
    g.insert("b", arr2(&[[0.0], [4.0]]).into_dyn());

    let norm = GradientClipper::ClipByGlobalNorm { max_norm: 1.0 }.clip(&mut g);

    assert!((norm - 5.0).abs() < 1e-6);
    assert!((g.global_norm() - 1.0).abs() < 1e-5);
    assert_close(&values(&g, "a"), &[0.6, 0.0], 1e-6);
}

#[test]
fn test_clip_leaves_small_gradients_alone() {
    let mut g = params(&[0.1, 0.2], &[0.0]);
    let before = g.clone();
    GradientClipper::ClipByGlobalNorm { max_norm: 10.0 }.clip(&mut g);
    assert_eq!(g, before);

    GradientClipper::None.clip(&mut g);
    assert_eq!(g, before);
    assert_eq!(GradientClipper::from_max_norm(None), GradientClipper::None);
}

#[test]
fn test_clip_by_value() {
    let mut g = params(&[-3.0, 0.5], &[2.0]);
    GradientClipper::ClipByValue { min: -1.0, max: 1.0 }.clip(&mut g);
    assert_close(&values(&g, "layer0.weights"), &[-1.0, 0.5], 1e-6);
    assert_close(&values(&g, "layer0.biases"), &[1.0], 1e-6);
}
