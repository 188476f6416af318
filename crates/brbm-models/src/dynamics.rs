//! Conditional distributions and energy of the Bernoulli RBM.
//!
//! Because the graph is bipartite, each layer is conditionally independent
//! given the other:
//!
//! - p(h = 1 | x) = σ(x·W + b)
//! - p(x = 1 | h) = σ(h·Wᵀ + v)
//!
//! All functions work on batches, one configuration per row.

use crate::rbm::BernoulliRBM;
use brbm_core::error::{ensure_width, Result};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Probability of each latent unit being on, `[batch, latent_size]`.
pub fn prob_latent_given_ambient<B: Backend>(
    rbm: &BernoulliRBM<B>,
    ambient: Tensor<B, 2>,
) -> Result<Tensor<B, 2>> {
    ensure_width("ambient batch", rbm.ambient_size(), ambient.dims())?;
    let b = rbm.latent_bias().clone().unsqueeze_dim::<2>(0);
    Ok(sigmoid(ambient.matmul(rbm.kernel().clone()) + b))
}

/// Probability of each ambient unit being on, `[batch, ambient_size]`.
pub fn prob_ambient_given_latent<B: Backend>(
    rbm: &BernoulliRBM<B>,
    latent: Tensor<B, 2>,
) -> Result<Tensor<B, 2>> {
    ensure_width("latent batch", rbm.latent_size(), latent.dims())?;
    let v = rbm.ambient_bias().clone().unsqueeze_dim::<2>(0);
    Ok(sigmoid(latent.matmul(rbm.kernel().clone().transpose()) + v))
}

/// Energy of each (ambient, latent) row pair, `[batch]`.
///
/// E(x, h) = -Σ_j (x·W)_j h_j - mean_j(h_j b_j) - mean_i(x_i v_i)
///
/// The bias terms are averaged over units rather than summed. Training never
/// differentiates this function, it only feeds the logged mean energy, and
/// logged values stay comparable across runs as long as the form is unchanged.
pub fn get_energy<B: Backend>(
    rbm: &BernoulliRBM<B>,
    ambient: Tensor<B, 2>,
    latent: Tensor<B, 2>,
) -> Result<Tensor<B, 1>> {
    ensure_width("ambient batch", rbm.ambient_size(), ambient.dims())?;
    ensure_width("latent batch", rbm.latent_size(), latent.dims())?;
    let [batch, _] = ambient.dims();
    let [latent_batch, _] = latent.dims();
    brbm_core::error::ensure_shape("latent batch rows", &[batch], &[latent_batch])?;

    let b = rbm.latent_bias().clone().unsqueeze_dim::<2>(0);
    let v = rbm.ambient_bias().clone().unsqueeze_dim::<2>(0);

    let interaction = (ambient.clone().matmul(rbm.kernel().clone()) * latent.clone()).sum_dim(1);
    let latent_term = (latent * b).mean_dim(1);
    let ambient_term = (ambient * v).mean_dim(1);

    Ok((interaction + latent_term + ambient_term).neg().reshape([batch]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brbm_core::backend::{cpu_device, from_host, to_host, CpuBackend};
    use burn::tensor::TensorData;

    fn tiny_rbm() -> BernoulliRBM<CpuBackend> {
        let device = cpu_device();
        BernoulliRBM::from_tensors(
            from_host(vec![1.0, -2.0, 0.5, 3.0], 2, 2, &device).unwrap(),
            Tensor::from_data(TensorData::new(vec![0.2f32, -0.4], [2]), &device),
            Tensor::from_data(TensorData::new(vec![0.1f32, 0.3], [2]), &device),
        )
        .unwrap()
    }

    #[test]
    fn test_prob_latent_matches_manual() {
        let rbm = tiny_rbm();
        let x = from_host(vec![1.0, 1.0], 1, 2, &cpu_device()).unwrap();
        let p = to_host(prob_latent_given_ambient(&rbm, x).unwrap()).unwrap();

        // x·W = [1.5, 1.0], + b = [1.6, 1.3]
        let s = |a: f32| 1.0 / (1.0 + (-a).exp());
        assert!((p[0] - s(1.6)).abs() < 1e-6);
        assert!((p[1] - s(1.3)).abs() < 1e-6);
    }

    #[test]
    fn test_prob_ambient_matches_manual() {
        let rbm = tiny_rbm();
        let h = from_host(vec![0.0, 1.0], 1, 2, &cpu_device()).unwrap();
        let p = to_host(prob_ambient_given_latent(&rbm, h).unwrap()).unwrap();

        // h·Wᵀ = [-2, 3], + v = [-1.8, 2.6]
        let s = |a: f32| 1.0 / (1.0 + (-a).exp());
        assert!((p[0] - s(-1.8)).abs() < 1e-6);
        assert!((p[1] - s(2.6)).abs() < 1e-6);
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let rbm = tiny_rbm();
        let x = from_host(vec![1.0, 1.0, 0.0], 1, 3, &cpu_device()).unwrap();
        assert!(prob_latent_given_ambient(&rbm, x).is_err());
    }
}
