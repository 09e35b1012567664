use ndarray::arr1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::small_mlp;
use crate::error::DqnError;
use crate::network::NeuralNetwork;
use crate::sync::{sync, sync_networks, SyncMode};
use crate::value_function::{Parameters, ValueFunction};

fn single(key: &str, values: &[f32]) -> Parameters {
    let mut p = Parameters::new();
    p.insert(key, arr1(values).into_dyn());
    p
}

#[test]
fn test_hard_sync_copies_exactly() {
    let online = small_mlp(1);
    let mut target = small_mlp(2);

    sync_networks(&online, &mut target, SyncMode::Hard).unwrap();

    assert_eq!(online.parameters(), target.parameters());
}

#[test]
fn test_hard_sync_is_idempotent() {
    let online = small_mlp(1);
    let mut target = small_mlp(2);
    sync_networks(&online, &mut target, SyncMode::Hard).unwrap();
    let once = target.parameters();
    sync_networks(&online, &mut target, SyncMode::Hard).unwrap();
    assert_eq!(once, target.parameters());
}

#[test]
fn test_soft_sync_blends() {
    let online = single("w", &[1.0, 0.0, -2.0]);
    let mut target = single("w", &[0.0, 1.0, 2.0]);

    sync(&online, &mut target, SyncMode::Soft { tau: 0.25 }).unwrap();

    let got: Vec<f32> = target.get("w").unwrap().iter().copied().collect();
    let expected = [0.25, 0.75, 1.0];
    for (g, e) in got.iter().zip(expected.iter()) {
        assert!((g - e).abs() < 1e-6, "{:?}", got);
    }
}

#[test]
fn test_soft_sync_stays_between_endpoints() {
    let online = small_mlp(1).parameters();
    let original = small_mlp(2).parameters();
    let mut target = original.clone();

    sync(&online, &mut target, SyncMode::Soft { tau: 0.3 }).unwrap();

    for (name, blended) in target.iter() {
        let a = online.get(name).unwrap();
        let b = original.get(name).unwrap();
        for ((&t, &o), &p) in blended.iter().zip(a.iter()).zip(b.iter()) {
            let (lo, hi) = if o < p { (o, p) } else { (p, o) };
            assert!(t >= lo - 1e-6 && t <= hi + 1e-6);
        }
    }
}

#[test]
fn test_soft_sync_with_tau_one_is_hard() {
    let online = small_mlp(1);
    let mut soft_target = small_mlp(2);
    let mut hard_target = small_mlp(2);

    sync_networks(&online, &mut soft_target, SyncMode::Soft { tau: 1.0 }).unwrap();
    sync_networks(&online, &mut hard_target, SyncMode::Hard).unwrap();

    assert!(soft_target.parameters().max_abs_diff(&hard_target.parameters()).unwrap() < 1e-7);
}

#[test]
fn test_repeated_soft_sync_converges() {
    let online = small_mlp(1);
    let mut target = small_mlp(2);
    let start = online.parameters().max_abs_diff(&target.parameters()).unwrap();

    for _ in 0..200 {
        sync_networks(&online, &mut target, SyncMode::Soft { tau: 0.1 }).unwrap();
    }

    let end = online.parameters().max_abs_diff(&target.parameters()).unwrap();
    assert!(end < start * 1e-3);
}

#[test]
fn test_sync_leaves_online_untouched() {
    let online = small_mlp(1);
    let before = online.parameters();
    let mut target = small_mlp(2);
    sync_networks(&online, &mut target, SyncMode::Soft { tau: 0.5 }).unwrap();
    assert_eq!(online.parameters(), before);
}

#[test]
fn test_invalid_tau() {
    for tau in [0.0, -0.1, 1.5, f32::NAN] {
        let online = single("w", &[1.0]);
        let mut target = single("w", &[0.0]);
        let result = sync(&online, &mut target, SyncMode::Soft { tau });
        assert!(matches!(result, Err(DqnError::InvalidHyperparameter { .. })), "tau = {}", tau);
        assert_eq!(target, single("w", &[0.0]));
    }
}

#[test]
fn test_mismatched_keys() {
    let online = single("w", &[1.0]);
    let mut target = single("v", &[0.0]);
    let result = sync(&online, &mut target, SyncMode::Hard);
    assert!(matches!(result, Err(DqnError::ParameterMismatch { .. })));
    assert_eq!(target, single("v", &[0.0]));
}

#[test]
fn test_mismatched_shapes() {
    let mut rng = StdRng::seed_from_u64(0);
    let online = small_mlp(1);
    let mut target = NeuralNetwork::mlp(2, &[4], 3, &mut rng).unwrap();
    let before = target.parameters();

    let result = sync_networks(&online, &mut target, SyncMode::Soft { tau: 0.5 });
    assert!(matches!(result, Err(DqnError::ParameterMismatch { .. })));
    assert_eq!(target.parameters(), before);
}

#[test]
fn test_sync_mode_from_flag() {
    assert_eq!(SyncMode::from_flag(false, 0.3), SyncMode::Hard);
    assert_eq!(SyncMode::from_flag(true, 0.3), SyncMode::Soft { tau: 0.3 });
    assert!(SyncMode::Hard.validate().is_ok());
}
