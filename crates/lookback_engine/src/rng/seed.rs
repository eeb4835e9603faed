//! Per-step seed derivation.

/// How the base seed is turned into one seed per time step.
///
/// - `Common`: every step uses the base seed (common random numbers). Each
///   step still owns its generator; only the seed is shared.
/// - `PerStep`: each step gets `splitmix64(base ^ step)`, an independent
///   stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SeedScheme {
    /// Same seed for every step.
    #[default]
    Common,
    /// Independent seed per step.
    PerStep,
}

impl SeedScheme {
    /// Seed for zero-based step `step`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lookback_engine::rng::SeedScheme;
    ///
    /// assert_eq!(SeedScheme::Common.seed_for(42, 0), 42);
    /// assert_eq!(SeedScheme::Common.seed_for(42, 9), 42);
    /// assert_ne!(SeedScheme::PerStep.seed_for(42, 0), SeedScheme::PerStep.seed_for(42, 1));
    /// ```
    #[inline]
    pub fn seed_for(&self, base: u64, step: usize) -> u64 {
        match self {
            SeedScheme::Common => base,
            SeedScheme::PerStep => splitmix64(base ^ step as u64),
        }
    }
}

impl std::str::FromStr for SeedScheme {
    type Err = lookback_core::LookbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common" => Ok(SeedScheme::Common),
            "per-step" | "per_step" | "perstep" => Ok(SeedScheme::PerStep),
            other => Err(lookback_core::LookbackError::invalid_config(format!(
                "unknown seed scheme '{}': expected common or per-step",
                other
            ))),
        }
    }
}

/// SplitMix64 finaliser: a bijective mixer over `u64`.
#[inline]
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_per_step_seeds_are_distinct() {
        let seeds: HashSet<u64> = (0..1000).map(|i| SeedScheme::PerStep.seed_for(7, i)).collect();
        assert_eq!(seeds.len(), 1000);
    }

    #[test]
    fn test_per_step_is_deterministic() {
        assert_eq!(
            SeedScheme::PerStep.seed_for(99, 5),
            SeedScheme::PerStep.seed_for(99, 5)
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("common".parse::<SeedScheme>().unwrap(), SeedScheme::Common);
        assert_eq!("per-step".parse::<SeedScheme>().unwrap(), SeedScheme::PerStep);
        assert!("random".parse::<SeedScheme>().is_err());
    }
}
