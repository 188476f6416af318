//! # brbm-models
//!
//! Bernoulli restricted Boltzmann machine trained with persistent contrastive
//! divergence (PCD).
//!
//! - [`rbm`]: the [`BernoulliRBM`] parameter container
//! - [`init`]: Glorot and Hinton initializers driven by a reference batch
//! - [`dynamics`]: conditional probabilities and the energy function
//! - [`relax`]: thresholded reconstruction and settling to a fixed point
//! - [`gradient`]: the two-phase CD gradient estimator
//! - [`pcd`]: the persistent fantasy chain
//! - [`optim`]: SGD (with momentum) and Adam
//! - [`data`]: in-memory binary datasets with shuffled batch streams
//! - [`training`]: the training loop and its diagnostics
//!
//! ## Example
//!
//! ```rust,ignore
//! use brbm_core::backend::{cpu_device, CpuBackend};
//! use brbm_models::*;
//! use brbm_observers::History;
//! use brbm_samplers::RngKey;
//!
//! let device = cpu_device();
//! let dataset = BinaryDataset::new(pixels, 256)?;
//! let (init_key, chain_key, data_key, train_key) = ...;
//!
//! let init = Initializer::new(InitStrategy::Hinton, dataset.to_tensor::<CpuBackend>(&device), 1e-8)?;
//! let mut rbm = BernoulliRBM::new(256, 64, &init, init_key, &device)?;
//! let fantasy = init_fantasy_latent(&rbm, 128, chain_key)?;
//! let mut optimizer = Adam::new(1e-3);
//! let mut history = History::new();
//!
//! let batches = dataset.batches(128, 10, 10_000, data_key, &device)?;
//! let fantasy = train(&mut rbm, &mut optimizer, batches, fantasy,
//!                     &TrainOptions::default(), Some(&mut history), train_key)?;
//! ```

pub mod data;
pub mod dynamics;
pub mod gradient;
pub mod init;
pub mod optim;
pub mod pcd;
pub mod rbm;
pub mod relax;
pub mod training;

pub use data::*;
pub use dynamics::*;
pub use gradient::*;
pub use init::*;
pub use optim::*;
pub use pcd::*;
pub use rbm::*;
pub use relax::*;
pub use training::*;
