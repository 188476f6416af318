//! Deterministic settling of ambient states onto fixed points of the
//! thresholded up-down map `x -> round(p(x | round(p(h | x))))`.

use crate::dynamics::{prob_ambient_given_latent, prob_latent_given_ambient};
use crate::rbm::BernoulliRBM;
use brbm_core::error::{ensure_width, Result};
use brbm_samplers::{activate, Activation};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

/// One thresholded up-down pass: ambient -> latent -> ambient.
pub fn reconstruct<B: Backend>(rbm: &BernoulliRBM<B>, ambient: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
    let latent = activate(prob_latent_given_ambient(rbm, ambient)?, Activation::Deterministic)?;
    activate(prob_ambient_given_latent(rbm, latent)?, Activation::Deterministic)
}

/// Iterate [`reconstruct`] until the state stops moving.
///
/// At iteration `step` the new state is compared with the current one; if the
/// largest absolute elementwise change is below `tol` the loop stops and
/// returns the current state with `step`. Otherwise the new state is adopted.
///
/// # Returns
///
/// `(state, step)` where `step < max_iter` on convergence and `step == max_iter`
/// when the iteration budget ran out. `max_iter == 0` returns the input unchanged.
pub fn relax<B: Backend>(
    rbm: &BernoulliRBM<B>,
    ambient: Tensor<B, 2>,
    max_iter: usize,
    tol: f32,
) -> Result<(Tensor<B, 2>, usize)> {
    ensure_width("ambient batch", rbm.ambient_size(), ambient.dims())?;
    if ambient.dims()[0] == 0 {
        return Ok((ambient, 0));
    }

    let mut ambient = ambient;
    for step in 0..max_iter {
        let new_ambient = reconstruct(rbm, ambient.clone())?;
        let change: f32 = (new_ambient.clone() - ambient.clone())
            .abs()
            .max()
            .into_scalar()
            .elem();
        if change < tol {
            return Ok((ambient, step));
        }
        ambient = new_ambient;
    }
    Ok((ambient, max_iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brbm_core::backend::{cpu_device, from_host, to_host, CpuBackend};
    use burn::tensor::TensorData;

    /// Two ambient units copy one latent unit: x = (h, h).
    fn copy_rbm() -> BernoulliRBM<CpuBackend> {
        let device = cpu_device();
        BernoulliRBM::from_tensors(
            from_host(vec![4.0, 4.0], 2, 1, &device).unwrap(),
            Tensor::from_data(TensorData::new(vec![-2.0f32, -2.0], [2]), &device),
            Tensor::from_data(TensorData::new(vec![-2.0f32], [1]), &device),
        )
        .unwrap()
    }

    #[test]
    fn test_fixed_point_returns_immediately() {
        let rbm = copy_rbm();
        let x = from_host(vec![1.0, 1.0, 0.0, 0.0], 2, 2, &cpu_device()).unwrap();

        let (out, step) = relax(&rbm, x, 10, 0.5).unwrap();
        assert_eq!(step, 0);
        assert_eq!(to_host(out).unwrap(), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_settles_onto_fixed_point() {
        let rbm = copy_rbm();
        // (1, 0): x·W - 2 = 2 -> h = 1 -> x = (1, 1)
        let x = from_host(vec![1.0, 0.0], 1, 2, &cpu_device()).unwrap();

        let (out, step) = relax(&rbm, x, 10, 0.5).unwrap();
        assert_eq!(step, 1);
        assert_eq!(to_host(out).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_budget_is_respected() {
        let rbm = copy_rbm();
        let x = from_host(vec![1.0, 0.0], 1, 2, &cpu_device()).unwrap();

        // tol = 0 can never be met since the change is never negative
        let (out, step) = relax(&rbm, x, 3, 0.0).unwrap();
        assert_eq!(step, 3);
        assert_eq!(to_host(out).unwrap(), vec![1.0, 1.0]);

        let x = from_host(vec![1.0, 0.0], 1, 2, &cpu_device()).unwrap();
        let (out, step) = relax(&rbm, x, 0, 0.5).unwrap();
        assert_eq!(step, 0);
        assert_eq!(to_host(out).unwrap(), vec![1.0, 0.0]);
    }
}
