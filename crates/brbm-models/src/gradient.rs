//! Contrastive-divergence gradient estimation.
//!
//! Uses the standard two-phase Monte Carlo estimator, written as
//! negative phase minus positive phase so that an optimizer *descending*
//! along it raises the likelihood of the data:
//!
//! - ΔW = ⟨x hᵀ⟩₋ - ⟨x hᵀ⟩₊
//! - Δb = ⟨h⟩₋ - ⟨h⟩₊
//! - Δv = ⟨x⟩₋ - ⟨x⟩₊
//!
//! ⟨·⟩₊ averages over the data batch with sampled latents, ⟨·⟩₋ over the
//! persistent fantasy particles.

use crate::dynamics::{prob_ambient_given_latent, prob_latent_given_ambient};
use crate::rbm::{BernoulliRBM, ParamKind};
use brbm_core::error::{ensure_shape, BrbmError, Result};
use brbm_samplers::{activate, Activation, RngKey};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// One gradient per parameter, shaped like the parameter it targets.
#[derive(Debug, Clone)]
pub struct RbmGradients<B: Backend> {
    /// `[ambient_size, latent_size]`
    pub kernel: Tensor<B, 2>,
    /// `[ambient_size]`
    pub ambient_bias: Tensor<B, 1>,
    /// `[latent_size]`
    pub latent_bias: Tensor<B, 1>,
}

impl<B: Backend> RbmGradients<B> {
    /// Average gradients computed on separate shards.
    ///
    /// Shards must share one model shape. Gradients are averaged, never summed,
    /// so the step size does not scale with the shard count.
    pub fn average(shards: Vec<RbmGradients<B>>) -> Result<Self> {
        let n = shards.len();
        let mut iter = shards.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| BrbmError::InvalidArgument("cannot average zero gradient shards".into()))?;

        let mut acc = first;
        for shard in iter {
            ensure_shape("kernel gradient", &acc.kernel.dims(), &shard.kernel.dims())?;
            ensure_shape("ambient_bias gradient", &acc.ambient_bias.dims(), &shard.ambient_bias.dims())?;
            ensure_shape("latent_bias gradient", &acc.latent_bias.dims(), &shard.latent_bias.dims())?;
            acc.kernel = acc.kernel + shard.kernel;
            acc.ambient_bias = acc.ambient_bias + shard.ambient_bias;
            acc.latent_bias = acc.latent_bias + shard.latent_bias;
        }

        let scale = n as f32;
        Ok(RbmGradients {
            kernel: acc.kernel.div_scalar(scale),
            ambient_bias: acc.ambient_bias.div_scalar(scale),
            latent_bias: acc.latent_bias.div_scalar(scale),
        })
    }

    /// The gradient for `kind`, flattened.
    pub fn flat(&self, kind: ParamKind) -> Tensor<B, 1> {
        match kind {
            ParamKind::Kernel => {
                let [a, l] = self.kernel.dims();
                self.kernel.clone().reshape([a * l])
            }
            ParamKind::AmbientBias => self.ambient_bias.clone(),
            ParamKind::LatentBias => self.latent_bias.clone(),
        }
    }
}

/// Batch mean of row-wise outer products: (1/n) Σ_r a_r b_rᵀ = aᵀb / n.
fn mean_outer<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2> {
    let n = a.dims()[0] as f32;
    a.transpose().matmul(b).div_scalar(n)
}

/// Column means of a `[rows, cols]` batch as a `[cols]` vector.
fn batch_mean<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 1> {
    let [_, cols] = x.dims();
    x.mean_dim(0).reshape([cols])
}

/// Estimate the CD gradient from one data batch and the current fantasy particles.
///
/// # Arguments
///
/// * `rbm` - The model (not modified)
/// * `real_ambient` - Observed data, `[n, ambient_size]`
/// * `fantasy_latent` - Persistent chain state, `[m, latent_size]`
/// * `key` - Randomness for the two stochastic activations
///
/// The fantasy side of the kernel term uses the ambient *probabilities* rather
/// than samples; the ambient-bias term uses the samples.
pub fn get_grads_and_vars<B: Backend>(
    rbm: &BernoulliRBM<B>,
    real_ambient: Tensor<B, 2>,
    fantasy_latent: Tensor<B, 2>,
    key: RngKey,
) -> Result<RbmGradients<B>> {
    if real_ambient.dims()[0] == 0 || fantasy_latent.dims()[0] == 0 {
        return Err(BrbmError::InvalidArgument(
            "gradient estimation needs at least one real and one fantasy row".into(),
        ));
    }
    let (key_real, key_fantasy) = key.split_two();

    let real_latent_prob = prob_latent_given_ambient(rbm, real_ambient.clone())?;
    let real_latent = activate(real_latent_prob, Activation::Stochastic(key_real))?;
    let fantasy_ambient_prob = prob_ambient_given_latent(rbm, fantasy_latent.clone())?;
    let fantasy_ambient = activate(fantasy_ambient_prob.clone(), Activation::Stochastic(key_fantasy))?;

    let kernel = mean_outer(fantasy_ambient_prob, fantasy_latent.clone())
        - mean_outer(real_ambient.clone(), real_latent.clone());
    let latent_bias = batch_mean(fantasy_latent) - batch_mean(real_latent);
    let ambient_bias = batch_mean(fantasy_ambient) - batch_mean(real_ambient);

    Ok(RbmGradients {
        kernel,
        ambient_bias,
        latent_bias,
    })
}
