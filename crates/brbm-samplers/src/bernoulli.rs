use crate::rng::RngKey;
use brbm_core::backend::from_host;
use brbm_core::error::Result;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// How a probability tensor is turned into binary states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Threshold at 0.5. Used for reconstruction and relaxation.
    Deterministic,
    /// Draw one Bernoulli sample per element. Used by the Gibbs chain.
    Stochastic(RngKey),
}

/// Binarize a probability tensor.
///
/// - `Deterministic`: 1 where `prob >= 0.5`, else 0.
/// - `Stochastic(key)`: draws `u ~ U[0, 1)` per element from `key`, 1 where `u <= prob`, else 0.
///
/// The output has the same shape as `prob` and holds exactly 0.0 or 1.0.
pub fn activate<B: Backend>(prob: Tensor<B, 2>, mode: Activation) -> Result<Tensor<B, 2>> {
    match mode {
        Activation::Deterministic => Ok(prob.greater_equal_elem(0.5).float()),
        Activation::Stochastic(key) => {
            let [rows, cols] = prob.dims();
            let device = prob.device();
            let uniform: Tensor<B, 2> = from_host(key.uniform(rows * cols), rows, cols, &device)?;
            Ok(uniform.lower_equal(prob).float())
        }
    }
}

/// A `[rows, cols]` batch of fair coin flips.
pub fn random_binary<B: Backend>(
    key: RngKey,
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    let probs: Tensor<B, 2> = Tensor::full([rows, cols], 0.5, device);
    activate(probs, Activation::Stochastic(key))
}
