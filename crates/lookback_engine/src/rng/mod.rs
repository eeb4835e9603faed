//! # Random Number Generation
//!
//! Every oracle call receives an explicit seed and builds its own generator,
//! so no random state is shared between time steps and concurrent steps
//! stay reproducible.
//!
//! ## Module Structure
//!
//! - [`prng`]: seeded PRNG wrapper with normal and binomial sampling
//! - [`seed`]: derivation of per-step seeds from a base seed
//!
//! ## Usage Example
//!
//! ```rust
//! use lookback_engine::rng::{SeedScheme, StepRng};
//!
//! let seed = SeedScheme::PerStep.seed_for(42, 3);
//! let mut rng = StepRng::from_seed(seed);
//!
//! let z = rng.gen_normal();
//! let mut buffer = vec![0.0; 16];
//! rng.fill_normal(&mut buffer);
//! # let _ = z;
//! ```

mod prng;
mod seed;

pub use prng::StepRng;
pub use seed::{splitmix64, SeedScheme};
