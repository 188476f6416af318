//! # brbm-core
//!
//! Core types for the brbm Bernoulli RBM library.
//!
//! - [`backend`]: burn backend aliases (`CpuBackend`, optional `WgpuBackend`) and host transfer helpers
//! - [`config`]: [`TrainingConfig`] resolved from CLI, environment, TOML file and defaults
//! - [`error`]: the shared [`BrbmError`] type and shape checks
//! - [`stats`]: scalar reductions used by training diagnostics
//!
//! ## GPU Backend
//!
//! The `gpu` feature adds the WGPU backend:
//!
//! ```rust,ignore
//! use brbm_core::backend::{init_gpu_device, WgpuBackend};
//!
//! let device = init_gpu_device();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod stats;

pub use backend::*;
pub use config::*;
pub use error::*;
