//! Keyed RNG for deterministic random number generation.
//!
//! Every stochastic call takes an explicit key instead of touching global state,
//! JAX-style. Keys are u64 seeds; splitting and draws use ChaCha8.

use brbm_core::error::{BrbmError, Result};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// An RNG key for deterministic random number generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RngKey(pub u64);

impl RngKey {
    /// Create a new RNG key from a seed.
    pub fn new(seed: u64) -> Self {
        RngKey(seed)
    }

    /// Split this key into multiple independent keys.
    /// This is similar to JAX's `jax.random.split`.
    pub fn split(self, n: usize) -> Vec<RngKey> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![self];
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        (0..n).map(|_| RngKey(rng.next_u64())).collect()
    }

    /// Split into exactly two keys (common case).
    pub fn split_two(self) -> (RngKey, RngKey) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        (RngKey(rng.next_u64()), RngKey(rng.next_u64()))
    }

    /// Get the seed value.
    pub fn seed(&self) -> u64 {
        self.0
    }

    /// A generator seeded from this key.
    pub fn rng(self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }

    /// `n` draws from U[0, 1).
    pub fn uniform(self, n: usize) -> Vec<f32> {
        let mut rng = self.rng();
        (0..n).map(|_| rng.gen::<f32>()).collect()
    }

    /// `n` draws from N(mean, std^2).
    pub fn normal(self, n: usize, mean: f64, std: f64) -> Result<Vec<f32>> {
        let dist = Normal::new(mean, std)
            .map_err(|e| BrbmError::InvalidArgument(format!("normal({mean}, {std}): {e}")))?;
        let mut rng = self.rng();
        Ok((0..n).map(|_| dist.sample(&mut rng) as f32).collect())
    }

    /// `n` draws from N(0, std^2) conditioned on |x| <= 2 std (rejection sampled).
    pub fn truncated_normal(self, n: usize, std: f64) -> Result<Vec<f32>> {
        let dist = Normal::new(0.0, 1.0)
            .map_err(|e| BrbmError::InvalidArgument(format!("standard normal: {e}")))?;
        let mut rng = self.rng();
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let z: f64 = dist.sample(&mut rng);
            if z.abs() <= 2.0 {
                out.push((z * std) as f32);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_key_split() {
        let key = RngKey::new(42);
        let keys = key.split(5);

        assert_eq!(keys.len(), 5);

        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i].0, keys[j].0, "Keys should be unique");
            }
        }
    }

    #[test]
    fn test_rng_key_deterministic() {
        let keys1 = RngKey::new(42).split(10);
        let keys2 = RngKey::new(42).split(10);
        assert_eq!(keys1, keys2);

        assert_eq!(RngKey::new(3).uniform(16), RngKey::new(3).uniform(16));
        assert_ne!(RngKey::new(3).uniform(16), RngKey::new(4).uniform(16));
    }

    #[test]
    fn test_split_two_matches_split() {
        let key = RngKey::new(9);
        let (a, b) = key.split_two();
        assert_eq!(vec![a, b], key.split(2));
    }

    #[test]
    fn test_uniform_range() {
        let draws = RngKey::new(1).uniform(1000);
        assert!(draws.iter().all(|&u| (0.0..1.0).contains(&u)));
    }

    #[test]
    fn test_normal_moments() {
        let draws = RngKey::new(5).normal(20_000, 0.0, 1e-2).expect("normal");
        let mean = draws.iter().map(|&x| f64::from(x)).sum::<f64>() / draws.len() as f64;
        let var = draws
            .iter()
            .map(|&x| (f64::from(x) - mean).powi(2))
            .sum::<f64>()
            / draws.len() as f64;
        assert!(mean.abs() < 1e-3);
        assert!((var.sqrt() - 1e-2).abs() < 1e-3);
    }

    #[test]
    fn test_normal_rejects_negative_std() {
        assert!(RngKey::new(0).normal(4, 0.0, -1.0).is_err());
    }

    #[test]
    fn test_truncated_normal_bounds() {
        let draws = RngKey::new(11).truncated_normal(5000, 0.5).expect("draw");
        assert_eq!(draws.len(), 5000);
        assert!(draws.iter().all(|&x| x.abs() <= 1.0 + 1e-6));
    }
}
