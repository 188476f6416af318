//! The PCD training loop and its periodic diagnostics.

use crate::dynamics::{get_energy, prob_latent_given_ambient};
use crate::gradient::get_grads_and_vars;
use crate::optim::Optimizer;
use crate::pcd::contrastive_divergence;
use crate::rbm::{BernoulliRBM, ParamKind};
use crate::relax::reconstruct;
use brbm_core::config::TrainingConfig;
use brbm_core::error::{ensure_width, BrbmError, Result};
use brbm_observers::{MetricValue, MetricsSink};
use brbm_samplers::{activate, Activation, RngKey};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

pub const MEAN_ENERGY: &str = "mean energy";
pub const RECON_ACCURACY: &str = "recon accuracy";
pub const LATENT_ON_RATIO: &str = "latent-on ratio";

/// Every key [`Diagnostics::record`] writes, in recording order.
pub const DIAGNOSTIC_KEYS: [&str; 6] = [
    MEAN_ENERGY,
    RECON_ACCURACY,
    LATENT_ON_RATIO,
    "kernel",
    "ambient bias",
    "latent bias",
];

/// Knobs of the training loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainOptions {
    /// Gibbs steps applied to the fantasy chain after each update.
    pub mc_steps: usize,
    /// Diagnostics are recorded on steps divisible by this.
    pub log_every: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            mc_steps: 1,
            log_every: 10,
        }
    }
}

impl From<&TrainingConfig> for TrainOptions {
    fn from(config: &TrainingConfig) -> Self {
        TrainOptions {
            mc_steps: config.mc_steps,
            log_every: config.log_every,
        }
    }
}

/// Snapshot of model health on one data batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Mean energy of the batch paired with its thresholded latents.
    pub mean_energy: f64,
    /// Fraction of ambient units reproduced exactly by one up-down pass.
    pub recon_accuracy: f64,
    /// Fraction of thresholded latent units that are on.
    pub latent_on_ratio: f64,
    /// `(mean, std)` per parameter.
    pub kernel: (f64, f64),
    pub ambient_bias: (f64, f64),
    pub latent_bias: (f64, f64),
}

fn scalar<B: Backend>(key: &str, tensor: Tensor<B, 1>) -> Result<f64> {
    match MetricValue::from_tensor(key, tensor)? {
        MetricValue::Scalar(v) => Ok(v),
        MetricValue::Text(_) => Err(BrbmError::UnsupportedMetric {
            key: key.to_string(),
            reason: "expected a scalar".into(),
        }),
    }
}

impl Diagnostics {
    pub fn compute<B: Backend>(rbm: &BernoulliRBM<B>, real_ambient: Tensor<B, 2>) -> Result<Self> {
        ensure_width("diagnostic batch", rbm.ambient_size(), real_ambient.dims())?;
        let latent = activate(
            prob_latent_given_ambient(rbm, real_ambient.clone())?,
            Activation::Deterministic,
        )?;
        let recon = reconstruct(rbm, real_ambient.clone())?;

        let energy = get_energy(rbm, real_ambient.clone(), latent.clone())?.mean();
        let accuracy = recon.equal(real_ambient).float().mean();
        let on_ratio = latent.mean();

        Ok(Diagnostics {
            mean_energy: scalar(MEAN_ENERGY, energy)?,
            recon_accuracy: scalar(RECON_ACCURACY, accuracy)?,
            latent_on_ratio: scalar(LATENT_ON_RATIO, on_ratio)?,
            kernel: rbm.param_stats(ParamKind::Kernel)?,
            ambient_bias: rbm.param_stats(ParamKind::AmbientBias)?,
            latent_bias: rbm.param_stats(ParamKind::LatentBias)?,
        })
    }

    /// Write every diagnostic into `sink` under [`DIAGNOSTIC_KEYS`].
    pub fn record<S: MetricsSink + ?Sized>(&self, sink: &mut S, step: usize) {
        sink.record(step, MEAN_ENERGY, self.mean_energy.into());
        sink.record(step, RECON_ACCURACY, self.recon_accuracy.into());
        sink.record(step, LATENT_ON_RATIO, self.latent_on_ratio.into());
        for (kind, (mean, std)) in [
            (ParamKind::Kernel, self.kernel),
            (ParamKind::AmbientBias, self.ambient_bias),
            (ParamKind::LatentBias, self.latent_bias),
        ] {
            sink.record(step, kind.name(), format!("{mean:.5} ({std:.5})").into());
        }
    }
}

/// Train `rbm` on `batches` with persistent contrastive divergence.
///
/// Per batch: estimate the gradient against the current fantasy chain, let
/// `optimizer` apply it, then advance the chain `options.mc_steps` Gibbs steps
/// under the updated model. When `history` is given, [`Diagnostics`] are
/// recorded on every `options.log_every`-th step (counting from 0) and the
/// rendered line is logged.
///
/// Returns the final fantasy chain so a later call can resume it. An error
/// aborts between steps, leaving `rbm` at its last successful update.
pub fn train<B, I>(
    rbm: &mut BernoulliRBM<B>,
    optimizer: &mut dyn Optimizer<B>,
    batches: I,
    fantasy_latent: Tensor<B, 2>,
    options: &TrainOptions,
    mut history: Option<&mut dyn MetricsSink>,
    key: RngKey,
) -> Result<Tensor<B, 2>>
where
    B: Backend,
    I: IntoIterator<Item = Tensor<B, 2>>,
{
    if options.log_every == 0 {
        return Err(BrbmError::InvalidArgument("log_every must be positive".into()));
    }
    ensure_width("fantasy latent", rbm.latent_size(), fantasy_latent.dims())?;

    tracing::info!(
        ambient_size = rbm.ambient_size(),
        latent_size = rbm.latent_size(),
        fantasy_particles = fantasy_latent.dims()[0],
        mc_steps = options.mc_steps,
        learning_rate = optimizer.learning_rate(),
        "Starting PCD training"
    );

    let mut fantasy = fantasy_latent;
    let mut key = key;
    let mut steps = 0;
    for (step, real_ambient) in batches.into_iter().enumerate() {
        let (step_key, next_key) = key.split_two();
        key = next_key;
        let (grad_key, chain_key) = step_key.split_two();

        let grads = get_grads_and_vars(rbm, real_ambient.clone(), fantasy.clone(), grad_key)?;
        optimizer.apply_gradients(rbm, grads)?;
        fantasy = contrastive_divergence(rbm, fantasy, options.mc_steps, chain_key)?;
        steps = step + 1;

        if let Some(sink) = history.as_deref_mut() {
            if step % options.log_every == 0 {
                Diagnostics::compute(rbm, real_ambient)?.record(sink, step);
                let line = sink.render(step, None)?;
                tracing::info!("{line}");
            }
        }
    }

    tracing::info!(steps, "Finished PCD training");
    Ok(fantasy)
}
