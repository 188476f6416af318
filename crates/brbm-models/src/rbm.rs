//! Bernoulli restricted Boltzmann machine parameters.
//!
//! Binary ambient (visible) units `x` and binary latent (hidden) units `h`
//! interact only across layers through `kernel`:
//!
//! E(x, h) = -x·W·h - mean(h ∘ b) - mean(x ∘ v)
//!
//! where `W` is `kernel`, `b` is `latent_bias` and `v` is `ambient_bias`
//! (see [`crate::dynamics::get_energy`] for the exact batched form).

use crate::init::{InitialParams, Initializer};
use brbm_core::backend::{from_host, to_host};
use brbm_core::error::{ensure_shape, BrbmError, Result};
use brbm_core::stats::mean_std;
use brbm_samplers::RngKey;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use std::fmt;

/// Identifies one of the three learnable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Kernel,
    AmbientBias,
    LatentBias,
}

impl ParamKind {
    pub const ALL: [ParamKind; 3] = [ParamKind::Kernel, ParamKind::AmbientBias, ParamKind::LatentBias];

    pub fn name(self) -> &'static str {
        match self {
            ParamKind::Kernel => "kernel",
            ParamKind::AmbientBias => "ambient bias",
            ParamKind::LatentBias => "latent bias",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The model: three parameter tensors with shapes fixed at construction.
#[derive(Debug, Clone)]
pub struct BernoulliRBM<B: Backend> {
    ambient_size: usize,
    latent_size: usize,
    /// `[ambient_size, latent_size]`
    kernel: Tensor<B, 2>,
    /// `[ambient_size]`
    ambient_bias: Tensor<B, 1>,
    /// `[latent_size]`
    latent_bias: Tensor<B, 1>,
}

impl<B: Backend> BernoulliRBM<B> {
    /// Create a model initialized by `initializer`.
    ///
    /// `ambient_size` must match the width of the initializer's reference data.
    pub fn new(
        ambient_size: usize,
        latent_size: usize,
        initializer: &Initializer,
        key: RngKey,
        device: &B::Device,
    ) -> Result<Self> {
        ensure_shape(
            "initializer reference width",
            &[ambient_size],
            &[initializer.ambient_size()],
        )?;
        let params = initializer.initial_params(latent_size, key)?;
        Self::from_initial_params(params, device)
    }

    /// Upload host-side initial values.
    pub fn from_initial_params(params: InitialParams, device: &B::Device) -> Result<Self> {
        let InitialParams {
            ambient_size,
            latent_size,
            kernel,
            ambient_bias,
            latent_bias,
        } = params;
        let kernel = from_host(kernel, ambient_size, latent_size, device)?;
        ensure_shape("ambient_bias", &[ambient_size], &[ambient_bias.len()])?;
        ensure_shape("latent_bias", &[latent_size], &[latent_bias.len()])?;
        let ambient_bias = Tensor::from_data(TensorData::new(ambient_bias, [ambient_size]), device);
        let latent_bias = Tensor::from_data(TensorData::new(latent_bias, [latent_size]), device);
        Self::from_tensors(kernel, ambient_bias, latent_bias)
    }

    /// Assemble a model from existing tensors, checking that their shapes agree.
    pub fn from_tensors(
        kernel: Tensor<B, 2>,
        ambient_bias: Tensor<B, 1>,
        latent_bias: Tensor<B, 1>,
    ) -> Result<Self> {
        let [ambient_size, latent_size] = kernel.dims();
        if ambient_size == 0 || latent_size == 0 {
            return Err(BrbmError::InvalidArgument(format!(
                "ambient_size and latent_size must be positive, got {ambient_size} x {latent_size}"
            )));
        }
        ensure_shape("ambient_bias", &[ambient_size], &ambient_bias.dims())?;
        ensure_shape("latent_bias", &[latent_size], &latent_bias.dims())?;
        Ok(BernoulliRBM {
            ambient_size,
            latent_size,
            kernel,
            ambient_bias,
            latent_bias,
        })
    }

    pub fn ambient_size(&self) -> usize {
        self.ambient_size
    }

    pub fn latent_size(&self) -> usize {
        self.latent_size
    }

    pub fn kernel(&self) -> &Tensor<B, 2> {
        &self.kernel
    }

    pub fn ambient_bias(&self) -> &Tensor<B, 1> {
        &self.ambient_bias
    }

    pub fn latent_bias(&self) -> &Tensor<B, 1> {
        &self.latent_bias
    }

    pub fn device(&self) -> B::Device {
        self.kernel.device()
    }

    /// Total number of learnable scalars.
    pub fn num_params(&self) -> usize {
        self.ambient_size * self.latent_size + self.ambient_size + self.latent_size
    }

    /// Replace all three parameters in place.
    ///
    /// Shapes must match the current ones exactly; on error nothing is replaced.
    pub fn update_params(
        &mut self,
        kernel: Tensor<B, 2>,
        ambient_bias: Tensor<B, 1>,
        latent_bias: Tensor<B, 1>,
    ) -> Result<()> {
        ensure_shape("kernel", &[self.ambient_size, self.latent_size], &kernel.dims())?;
        ensure_shape("ambient_bias", &[self.ambient_size], &ambient_bias.dims())?;
        ensure_shape("latent_bias", &[self.latent_size], &latent_bias.dims())?;
        self.kernel = kernel;
        self.ambient_bias = ambient_bias;
        self.latent_bias = latent_bias;
        Ok(())
    }

    /// Population mean and standard deviation of one parameter.
    pub fn param_stats(&self, kind: ParamKind) -> Result<(f64, f64)> {
        let values = match kind {
            ParamKind::Kernel => to_host(self.kernel.clone())?,
            ParamKind::AmbientBias => to_host(self.ambient_bias.clone())?,
            ParamKind::LatentBias => to_host(self.latent_bias.clone())?,
        };
        Ok(mean_std(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::{InitStrategy, DEFAULT_EPS};
    use brbm_core::backend::{cpu_device, CpuBackend};

    #[test]
    fn test_new_shapes() {
        let device = cpu_device();
        let samples: Tensor<CpuBackend, 2> =
            from_host(vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0], 2, 4, &device).unwrap();
        let init = Initializer::new(InitStrategy::Hinton, samples, DEFAULT_EPS).unwrap();
        let rbm = BernoulliRBM::<CpuBackend>::new(4, 3, &init, RngKey::new(0), &device).unwrap();

        assert_eq!(rbm.kernel().dims(), [4, 3]);
        assert_eq!(rbm.ambient_bias().dims(), [4]);
        assert_eq!(rbm.latent_bias().dims(), [3]);
        assert_eq!(rbm.num_params(), 4 * 3 + 4 + 3);
        assert_eq!(rbm.param_stats(ParamKind::LatentBias).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let init = Initializer::from_activation_rate(InitStrategy::Hinton, vec![0.5; 5], DEFAULT_EPS);
        let result = BernoulliRBM::<CpuBackend>::new(4, 3, &init, RngKey::new(0), &cpu_device());
        assert!(matches!(result, Err(BrbmError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_update_params_keeps_shape() {
        let device = cpu_device();
        let mut rbm = BernoulliRBM::<CpuBackend>::from_tensors(
            Tensor::zeros([4, 2], &device),
            Tensor::zeros([4], &device),
            Tensor::zeros([2], &device),
        )
        .unwrap();

        let bad = rbm.update_params(
            Tensor::zeros([2, 4], &device),
            Tensor::zeros([4], &device),
            Tensor::zeros([2], &device),
        );
        assert!(bad.is_err());
        assert_eq!(rbm.kernel().dims(), [4, 2]);

        rbm.update_params(
            Tensor::ones([4, 2], &device),
            Tensor::zeros([4], &device),
            Tensor::zeros([2], &device),
        )
        .unwrap();
        assert_eq!(rbm.param_stats(ParamKind::Kernel).unwrap(), (1.0, 0.0));
    }

    #[test]
    fn test_from_tensors_rejects_empty() {
        let device = cpu_device();
        let result = BernoulliRBM::<CpuBackend>::from_tensors(
            Tensor::zeros([0, 2], &device),
            Tensor::zeros([0], &device),
            Tensor::zeros([2], &device),
        );
        assert!(result.is_err());
    }
}
