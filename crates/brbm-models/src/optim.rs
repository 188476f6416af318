//! Optimizers that apply an [`RbmGradients`] record to a [`BernoulliRBM`].
//!
//! Gradients are descended: `param <- param - step`. Since the estimator
//! returns negative phase minus positive phase, descending it ascends the
//! data log-likelihood.

use crate::gradient::RbmGradients;
use crate::rbm::BernoulliRBM;
use brbm_core::config::{OptimizerKind, TrainingConfig};
use brbm_core::error::{ensure_shape, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Default Adam hyperparameters.
pub const ADAM_BETA1: f64 = 0.9;
pub const ADAM_BETA2: f64 = 0.999;
pub const ADAM_EPSILON: f64 = 1e-7;

/// Applies one gradient record to the model parameters.
///
/// Implementations own whatever per-parameter state they need.
pub trait Optimizer<B: Backend> {
    fn apply_gradients(&mut self, rbm: &mut BernoulliRBM<B>, grads: RbmGradients<B>) -> Result<()>;

    fn learning_rate(&self) -> f64;
}

fn check_grad_shapes<B: Backend>(rbm: &BernoulliRBM<B>, grads: &RbmGradients<B>) -> Result<()> {
    ensure_shape(
        "kernel gradient",
        &[rbm.ambient_size(), rbm.latent_size()],
        &grads.kernel.dims(),
    )?;
    ensure_shape("ambient_bias gradient", &[rbm.ambient_size()], &grads.ambient_bias.dims())?;
    ensure_shape("latent_bias gradient", &[rbm.latent_size()], &grads.latent_bias.dims())
}

/// Plain gradient descent with an optional momentum buffer.
///
/// `buf <- momentum * buf + grad`, `param <- param - lr * buf`.
#[derive(Debug, Clone)]
pub struct Sgd<B: Backend> {
    learning_rate: f64,
    momentum: f64,
    kernel_buf: Option<Tensor<B, 2>>,
    ambient_buf: Option<Tensor<B, 1>>,
    latent_buf: Option<Tensor<B, 1>>,
}

impl<B: Backend> Sgd<B> {
    pub fn new(learning_rate: f64) -> Self {
        Self::with_momentum(learning_rate, 0.0)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Self {
        Sgd {
            learning_rate,
            momentum,
            kernel_buf: None,
            ambient_buf: None,
            latent_buf: None,
        }
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

fn momentum_step<B: Backend, const D: usize>(
    buf: &mut Option<Tensor<B, D>>,
    grad: Tensor<B, D>,
    momentum: f64,
) -> Tensor<B, D> {
    let update = match buf.take() {
        Some(prev) if momentum != 0.0 => prev.mul_scalar(momentum as f32) + grad,
        _ => grad,
    };
    if momentum != 0.0 {
        *buf = Some(update.clone());
    }
    update
}

impl<B: Backend> Optimizer<B> for Sgd<B> {
    fn apply_gradients(&mut self, rbm: &mut BernoulliRBM<B>, grads: RbmGradients<B>) -> Result<()> {
        check_grad_shapes(rbm, &grads)?;
        let lr = self.learning_rate as f32;

        let kernel = momentum_step(&mut self.kernel_buf, grads.kernel, self.momentum);
        let ambient = momentum_step(&mut self.ambient_buf, grads.ambient_bias, self.momentum);
        let latent = momentum_step(&mut self.latent_buf, grads.latent_bias, self.momentum);

        rbm.update_params(
            rbm.kernel().clone() - kernel.mul_scalar(lr),
            rbm.ambient_bias().clone() - ambient.mul_scalar(lr),
            rbm.latent_bias().clone() - latent.mul_scalar(lr),
        )
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

/// First and second moment estimates for one parameter.
#[derive(Debug, Clone)]
struct Moments<B: Backend, const D: usize> {
    m: Tensor<B, D>,
    v: Tensor<B, D>,
}

/// Adam with bias-corrected moment estimates.
///
/// ```text
/// m_t = β1 m_{t-1} + (1 - β1) g
/// v_t = β2 v_{t-1} + (1 - β2) g²
/// param <- param - lr · m̂_t / (√v̂_t + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adam<B: Backend> {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    kernel: Option<Moments<B, 2>>,
    ambient_bias: Option<Moments<B, 1>>,
    latent_bias: Option<Moments<B, 1>>,
}

impl<B: Backend> Adam<B> {
    /// Adam with the default betas and epsilon.
    pub fn new(learning_rate: f64) -> Self {
        Self::with_params(learning_rate, ADAM_BETA1, ADAM_BETA2, ADAM_EPSILON)
    }

    pub fn with_params(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            kernel: None,
            ambient_bias: None,
            latent_bias: None,
        }
    }

    /// Number of updates applied so far.
    pub fn step_count(&self) -> usize {
        self.t as usize
    }

    fn step<const D: usize>(
        &self,
        state: &mut Option<Moments<B, D>>,
        grad: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let (b1, b2) = (self.beta1 as f32, self.beta2 as f32);
        let sq = grad.clone() * grad.clone();
        let moments = match state.take() {
            Some(Moments { m, v }) => Moments {
                m: m.mul_scalar(b1) + grad.mul_scalar(1.0 - b1),
                v: v.mul_scalar(b2) + sq.mul_scalar(1.0 - b2),
            },
            None => Moments {
                m: grad.mul_scalar(1.0 - b1),
                v: sq.mul_scalar(1.0 - b2),
            },
        };

        let m_hat = moments.m.clone().div_scalar((1.0 - self.beta1.powi(self.t)) as f32);
        let v_hat = moments.v.clone().div_scalar((1.0 - self.beta2.powi(self.t)) as f32);
        *state = Some(moments);

        (m_hat / v_hat.sqrt().add_scalar(self.epsilon as f32)).mul_scalar(self.learning_rate as f32)
    }
}

impl<B: Backend> Optimizer<B> for Adam<B> {
    fn apply_gradients(&mut self, rbm: &mut BernoulliRBM<B>, grads: RbmGradients<B>) -> Result<()> {
        check_grad_shapes(rbm, &grads)?;
        self.t += 1;

        let mut kernel_state = self.kernel.take();
        let mut ambient_state = self.ambient_bias.take();
        let mut latent_state = self.latent_bias.take();
        let kernel = self.step(&mut kernel_state, grads.kernel);
        let ambient = self.step(&mut ambient_state, grads.ambient_bias);
        let latent = self.step(&mut latent_state, grads.latent_bias);
        self.kernel = kernel_state;
        self.ambient_bias = ambient_state;
        self.latent_bias = latent_state;

        rbm.update_params(
            rbm.kernel().clone() - kernel,
            rbm.ambient_bias().clone() - ambient,
            rbm.latent_bias().clone() - latent,
        )
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

/// Build the optimizer selected in `config`.
pub fn build_optimizer<B: Backend>(config: &TrainingConfig) -> Box<dyn Optimizer<B>> {
    match config.optimizer {
        OptimizerKind::Adam => Box::new(Adam::<B>::new(config.learning_rate)),
        OptimizerKind::Sgd => Box::new(Sgd::<B>::with_momentum(config.learning_rate, config.momentum)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brbm_core::backend::{cpu_device, to_host, CpuBackend};

    fn unit_rbm(value: f32) -> BernoulliRBM<CpuBackend> {
        let device = cpu_device();
        BernoulliRBM::from_tensors(
            Tensor::full([1, 1], value, &device),
            Tensor::full([1], value, &device),
            Tensor::full([1], value, &device),
        )
        .unwrap()
    }

    fn grads(value: f32) -> RbmGradients<CpuBackend> {
        let device = cpu_device();
        RbmGradients {
            kernel: Tensor::full([1, 1], value, &device),
            ambient_bias: Tensor::full([1], value, &device),
            latent_bias: Tensor::full([1], value, &device),
        }
    }

    fn kernel_value(rbm: &BernoulliRBM<CpuBackend>) -> f32 {
        to_host(rbm.kernel().clone()).unwrap()[0]
    }

    #[test]
    fn test_sgd_descends() {
        let mut rbm = unit_rbm(1.0);
        let mut opt = Sgd::<CpuBackend>::new(0.1);
        opt.apply_gradients(&mut rbm, grads(0.5)).unwrap();
        assert_relative_eq!(kernel_value(&rbm), 0.95, epsilon = 1e-6);
        assert_relative_eq!(to_host(rbm.latent_bias().clone()).unwrap()[0], 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_momentum_accumulates() {
        let mut rbm = unit_rbm(1.0);
        let mut opt = Sgd::<CpuBackend>::with_momentum(0.1, 0.9);
        opt.apply_gradients(&mut rbm, grads(0.5)).unwrap();
        opt.apply_gradients(&mut rbm, grads(0.5)).unwrap();
        // buf: 0.5 then 0.9 * 0.5 + 0.5 = 0.95
        assert_relative_eq!(kernel_value(&rbm), 1.0 - 0.05 - 0.095, epsilon = 1e-6);
    }

    #[test]
    fn test_adam_first_step_is_lr_sized() {
        let mut rbm = unit_rbm(0.0);
        let mut opt = Adam::<CpuBackend>::new(0.01);
        opt.apply_gradients(&mut rbm, grads(0.5)).unwrap();
        // m̂ = g, v̂ = g², so the step is lr * sign(g)
        assert_relative_eq!(kernel_value(&rbm), -0.01, epsilon = 1e-6);
        assert_eq!(opt.step_count(), 1);

        opt.apply_gradients(&mut rbm, grads(-0.5)).unwrap();
        assert!(kernel_value(&rbm) > -0.02);
    }

    #[test]
    fn test_shape_mismatch_leaves_state() {
        let mut rbm = unit_rbm(1.0);
        let mut opt = Adam::<CpuBackend>::new(0.01);
        let device = cpu_device();
        let bad = RbmGradients {
            kernel: Tensor::full([2, 1], 0.5, &device),
            ambient_bias: Tensor::full([1], 0.5, &device),
            latent_bias: Tensor::full([1], 0.5, &device),
        };
        assert!(opt.apply_gradients(&mut rbm, bad).is_err());
        assert_eq!(opt.step_count(), 0);
        assert_eq!(kernel_value(&rbm), 1.0);
    }

    #[test]
    fn test_build_from_config() {
        let config = TrainingConfig::builder()
            .optimizer(OptimizerKind::Sgd)
            .learning_rate(0.5)
            .build()
            .unwrap();
        let opt = build_optimizer::<CpuBackend>(&config);
        assert_eq!(opt.learning_rate(), 0.5);
    }
}
