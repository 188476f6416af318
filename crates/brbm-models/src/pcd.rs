//! Persistent contrastive divergence chain.
//!
//! The fantasy particles form a Markov chain that is advanced a few block
//! Gibbs steps after every parameter update and never reset during training.

use crate::dynamics::{prob_ambient_given_latent, prob_latent_given_ambient};
use crate::rbm::BernoulliRBM;
use brbm_core::error::{ensure_width, Result};
use brbm_samplers::{activate, random_binary, Activation, RngKey};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Start a chain of `num_samples` particles with every latent unit a fair coin.
pub fn init_fantasy_latent<B: Backend>(
    rbm: &BernoulliRBM<B>,
    num_samples: usize,
    key: RngKey,
) -> Result<Tensor<B, 2>> {
    random_binary(key, num_samples, rbm.latent_size(), &rbm.device())
}

/// Advance the chain by `mc_steps` rounds of block Gibbs sampling.
///
/// Each round samples ambient given latent, then latent given that ambient.
/// `mc_steps == 0` returns `fantasy_latent` untouched.
pub fn contrastive_divergence<B: Backend>(
    rbm: &BernoulliRBM<B>,
    fantasy_latent: Tensor<B, 2>,
    mc_steps: usize,
    key: RngKey,
) -> Result<Tensor<B, 2>> {
    ensure_width("fantasy latent", rbm.latent_size(), fantasy_latent.dims())?;

    let mut latent = fantasy_latent;
    for step_key in key.split(mc_steps) {
        let (key_ambient, key_latent) = step_key.split_two();
        let ambient_prob = prob_ambient_given_latent(rbm, latent)?;
        let ambient = activate(ambient_prob, Activation::Stochastic(key_ambient))?;
        let latent_prob = prob_latent_given_ambient(rbm, ambient)?;
        latent = activate(latent_prob, Activation::Stochastic(key_latent))?;
    }
    Ok(latent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brbm_core::backend::{cpu_device, from_host, to_host, CpuBackend};
    use burn::tensor::TensorData;

    fn rbm(latent_bias: f32) -> BernoulliRBM<CpuBackend> {
        let device = cpu_device();
        BernoulliRBM::from_tensors(
            Tensor::zeros([3, 2], &device),
            Tensor::zeros([3], &device),
            Tensor::from_data(TensorData::new(vec![latent_bias; 2], [2]), &device),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_steps_is_identity() {
        let rbm = rbm(0.0);
        let latent = from_host(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], 3, 2, &cpu_device()).unwrap();
        let out = contrastive_divergence(&rbm, latent, 0, RngKey::new(1)).unwrap();
        assert_eq!(to_host(out).unwrap(), vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_chain_follows_strong_bias() {
        // With no coupling the latent layer is driven by its bias alone
        let rbm = rbm(50.0);
        let latent = Tensor::zeros([4, 2], &cpu_device());
        let out = contrastive_divergence(&rbm, latent, 2, RngKey::new(5)).unwrap();
        assert_eq!(out.dims(), [4, 2]);
        assert_eq!(to_host(out).unwrap(), vec![1.0; 8]);
    }

    #[test]
    fn test_chain_is_reproducible() {
        let rbm = rbm(0.0);
        let start = init_fantasy_latent(&rbm, 16, RngKey::new(2)).unwrap();
        let a = contrastive_divergence(&rbm, start.clone(), 3, RngKey::new(8)).unwrap();
        let b = contrastive_divergence(&rbm, start, 3, RngKey::new(8)).unwrap();
        assert_eq!(to_host(a).unwrap(), to_host(b).unwrap());
    }

    #[test]
    fn test_rejects_wrong_width() {
        let rbm = rbm(0.0);
        let latent = Tensor::zeros([4, 3], &cpu_device());
        assert!(contrastive_divergence(&rbm, latent, 1, RngKey::new(0)).is_err());
    }
}
