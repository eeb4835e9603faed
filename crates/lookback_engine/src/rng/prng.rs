//! Pseudo-random number generator wrapper for per-step estimation.

use lookback_core::types::{LookbackError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Binomial, Distribution, StandardNormal};

/// Seeded random number generator owned by a single oracle call.
///
/// # Examples
///
/// ```rust
/// use lookback_engine::rng::StepRng;
///
/// let mut rng1 = StepRng::from_seed(12345);
/// let mut rng2 = StepRng::from_seed(12345);
///
/// // Same seed produces identical sequences
/// assert_eq!(rng1.gen_normal(), rng2.gen_normal());
/// assert_eq!(rng1.seed(), 12345);
/// ```
pub struct StepRng {
    inner: StdRng,
    seed: u64,
}

impl StepRng {
    /// Creates a generator initialised with the given seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates a standard normal variate (Ziggurat via `rand_distr`).
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills the buffer with standard normal variates.
    ///
    /// Zero-allocation; empty buffers are a no-op.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = self.gen_normal();
        }
    }

    /// Number of successes in `trials` Bernoulli draws with probability `p`.
    ///
    /// `p` is clamped to [0, 1] to absorb rounding in the caller.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `p` is NaN.
    pub fn binomial(&mut self, trials: u64, p: f64) -> Result<u64> {
        if p.is_nan() {
            return Err(LookbackError::invalid_config(
                "binomial probability is NaN",
            ));
        }
        let dist = Binomial::new(trials, p.clamp(0.0, 1.0))
            .map_err(|e| LookbackError::invalid_config(format!("binomial sampler: {}", e)))?;
        Ok(dist.sample(&mut self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducible_normals() {
        let mut a = StepRng::from_seed(7);
        let mut b = StepRng::from_seed(7);
        let mut buf_a = vec![0.0; 64];
        let mut buf_b = vec![0.0; 64];
        a.fill_normal(&mut buf_a);
        b.fill_normal(&mut buf_b);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = StepRng::from_seed(1);
        let mut b = StepRng::from_seed(2);
        assert_ne!(a.gen_normal(), b.gen_normal());
    }

    #[test]
    fn test_fill_matches_single_draws() {
        let mut a = StepRng::from_seed(3);
        let mut b = StepRng::from_seed(3);
        let mut buffer = vec![0.0; 8];
        a.fill_normal(&mut buffer);
        let singles: Vec<f64> = (0..8).map(|_| b.gen_normal()).collect();
        assert_eq!(buffer, singles);
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = StepRng::from_seed(11);
        let mut buf = vec![0.0; 50_000];
        rng.fill_normal(&mut buf);
        let mean = buf.iter().sum::<f64>() / buf.len() as f64;
        let var = buf.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / buf.len() as f64;
        assert!(mean.abs() < 0.02, "mean = {}", mean);
        assert!((var - 1.0).abs() < 0.03, "var = {}", var);
    }

    #[test]
    fn test_binomial_edges() {
        let mut rng = StepRng::from_seed(5);
        assert_eq!(rng.binomial(100, 0.0).unwrap(), 0);
        assert_eq!(rng.binomial(100, 1.0).unwrap(), 100);
        assert_eq!(rng.binomial(100, 1.0 + 1e-15).unwrap(), 100);
        let k = rng.binomial(1000, 0.3).unwrap();
        assert!(k > 200 && k < 400);
        assert!(rng.binomial(10, f64::NAN).is_err());
    }
}
