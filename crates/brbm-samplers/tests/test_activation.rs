//! Statistical and determinism checks for `activate`.

use brbm_core::backend::{cpu_device, from_host, to_host, CpuBackend};
use brbm_samplers::{activate, Activation, RngKey};
use burn::tensor::Tensor;

#[test]
fn test_deterministic_is_idempotent() {
    let device = cpu_device();
    let values: Vec<f32> = (0..100).map(|i| i as f32 / 99.0).collect();
    let p: Tensor<CpuBackend, 2> = from_host(values.clone(), 10, 10, &device).unwrap();

    let once = activate(p.clone(), Activation::Deterministic).unwrap();
    let again = activate(p, Activation::Deterministic).unwrap();
    let twice = activate(once.clone(), Activation::Deterministic).unwrap();

    let once = to_host(once).unwrap();
    assert_eq!(once, to_host(again).unwrap());
    assert_eq!(once, to_host(twice).unwrap());

    for (out, p) in once.iter().zip(&values) {
        let expected = if *p >= 0.5 { 1.0 } else { 0.0 };
        assert_eq!(*out, expected, "p = {p}");
    }
}

#[test]
fn test_stochastic_mean_converges_to_probability() {
    let device = cpu_device();
    let rows = 10_000;
    let targets = [0.05f32, 0.3, 0.5, 0.8];
    let cols = targets.len();
    let values: Vec<f32> = (0..rows).flat_map(|_| targets).collect();

    for (trial, key) in RngKey::new(2024).split(5).into_iter().enumerate() {
        let p: Tensor<CpuBackend, 2> = from_host(values.clone(), rows, cols, &device).unwrap();
        let sample = activate(p, Activation::Stochastic(key)).unwrap();
        let means = to_host(sample.mean_dim(0)).unwrap();

        for (m, t) in means.iter().zip(targets) {
            assert!(
                (m - t).abs() < 0.05,
                "trial {trial}: empirical mean {m} too far from {t}"
            );
        }
    }
}

#[test]
fn test_different_keys_give_different_samples() {
    let device = cpu_device();
    let p: Tensor<CpuBackend, 2> = from_host(vec![0.5; 256], 16, 16, &device).unwrap();
    let (k1, k2) = RngKey::new(0).split_two();

    let a = to_host(activate(p.clone(), Activation::Stochastic(k1)).unwrap()).unwrap();
    let b = to_host(activate(p, Activation::Stochastic(k2)).unwrap()).unwrap();
    assert_ne!(a, b);
}
