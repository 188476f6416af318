//! Initial parameter values for a Bernoulli RBM.
//!
//! Two strategies are supported, both driven by a reference batch of ambient
//! data `X` (shape `[n, ambient_size]`) with per-feature activation rate
//! `p = mean(X, axis=0)`:
//!
//! | parameter      | Glorot                                   | Hinton                                  |
//! |----------------|------------------------------------------|-----------------------------------------|
//! | `kernel`       | truncated normal, std `sqrt(2/(a+l))/0.8796` | normal, std `0.01`                  |
//! | `ambient_bias` | `1 / (p + eps)`                          | `log(p + eps) - log(1 - p + eps)`       |
//! | `latent_bias`  | zeros                                    | zeros                                   |
//!
//! `eps` keeps both bias formulas finite at `p = 0` and `p = 1`.

use brbm_core::backend::to_host;
use brbm_core::error::{BrbmError, Result};
use brbm_core::stats::column_means;
use brbm_samplers::RngKey;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

pub use brbm_core::config::InitStrategy;

/// Default numerical floor for the bias initializers.
pub const DEFAULT_EPS: f64 = 1e-8;

/// Standard deviation of the Hinton kernel initializer.
pub const HINTON_KERNEL_STD: f64 = 1e-2;

/// Std of a unit normal truncated to [-2, 2]; dividing by it restores unit variance.
const TRUNCATED_NORMAL_STD: f64 = 0.879_625_661_034_239_8;

/// Host-side initial values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialParams {
    pub ambient_size: usize,
    pub latent_size: usize,
    /// `[ambient_size, latent_size]`
    pub kernel: Vec<f32>,
    pub ambient_bias: Vec<f32>,
    pub latent_bias: Vec<f32>,
}

/// Initializer bound to a reference dataset.
#[derive(Debug, Clone)]
pub struct Initializer {
    strategy: InitStrategy,
    eps: f64,
    /// Per-feature activation rate of the reference batch.
    activation_rate: Vec<f64>,
}

impl Initializer {
    /// Bind `strategy` to the reference batch `samples`.
    pub fn new<B: Backend>(strategy: InitStrategy, samples: Tensor<B, 2>, eps: f64) -> Result<Self> {
        let [rows, cols] = samples.dims();
        if rows == 0 || cols == 0 {
            return Err(BrbmError::InvalidArgument(format!(
                "reference samples must be non-empty, got shape [{rows}, {cols}]"
            )));
        }
        let data = to_host(samples)?;
        Ok(Self::from_activation_rate(
            strategy,
            column_means(&data, rows, cols),
            eps,
        ))
    }

    /// Build from precomputed per-feature activation rates.
    pub fn from_activation_rate(strategy: InitStrategy, activation_rate: Vec<f64>, eps: f64) -> Self {
        Initializer {
            strategy,
            eps,
            activation_rate,
        }
    }

    pub fn strategy(&self) -> InitStrategy {
        self.strategy
    }

    pub fn ambient_size(&self) -> usize {
        self.activation_rate.len()
    }

    /// Draw the kernel, `[ambient_size, latent_size]` row-major.
    pub fn kernel(&self, latent_size: usize, key: RngKey) -> Result<Vec<f32>> {
        let ambient_size = self.ambient_size();
        let n = ambient_size * latent_size;
        match self.strategy {
            InitStrategy::Glorot => {
                let fan_avg = (ambient_size + latent_size) as f64 / 2.0;
                let std = (1.0 / fan_avg).sqrt() / TRUNCATED_NORMAL_STD;
                key.truncated_normal(n, std)
            }
            InitStrategy::Hinton => key.normal(n, 0.0, HINTON_KERNEL_STD),
        }
    }

    /// Ambient bias derived from the reference activation rates.
    pub fn ambient_bias(&self) -> Vec<f32> {
        let eps = self.eps;
        self.activation_rate
            .iter()
            .map(|&p| match self.strategy {
                InitStrategy::Glorot => (1.0 / (p + eps)) as f32,
                InitStrategy::Hinton => ((p + eps).ln() - (1.0 - p + eps).ln()) as f32,
            })
            .collect()
    }

    pub fn latent_bias(&self, latent_size: usize) -> Vec<f32> {
        vec![0.0; latent_size]
    }

    /// All three parameters at once.
    pub fn initial_params(&self, latent_size: usize, key: RngKey) -> Result<InitialParams> {
        if latent_size == 0 {
            return Err(BrbmError::InvalidArgument(
                "latent_size must be positive".into(),
            ));
        }
        Ok(InitialParams {
            ambient_size: self.ambient_size(),
            latent_size,
            kernel: self.kernel(latent_size, key)?,
            ambient_bias: self.ambient_bias(),
            latent_bias: self.latent_bias(latent_size),
        })
    }
}
