//! # brbm-samplers
//!
//! Sampling primitives for the brbm Bernoulli RBM library.
//!
//! - **RNG keys**: explicit, splittable randomness via [`RngKey`]
//! - **Activation**: thresholded or sampled binarization of probabilities via [`activate`]
//!
//! ## RNG Key System
//!
//! ```rust
//! use brbm_samplers::RngKey;
//!
//! let key = RngKey::new(42);
//! let (key1, key2) = key.split_two();
//! assert_ne!(key1, key2);
//! ```

pub mod bernoulli;
pub mod rng;

pub use bernoulli::*;
pub use rng::*;
