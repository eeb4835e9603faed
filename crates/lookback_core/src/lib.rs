//! # lookback_core: Foundation Types for Lookback Scanning
//!
//! ## Layer 1 (Foundation) Role
//!
//! lookback_core is the bottom layer of the workspace, providing:
//! - Market inputs and per-step overrides (`types::market`)
//! - Vanilla payoff specification and strike placement (`types::payoff`)
//! - Error types shared by every layer (`types::error`)
//! - The log-normal terminal distribution model (`distribution`)
//! - Closed-form helpers: normal CDF/PDF/quantile and Black-Scholes (`analytical`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates and keeps external
//! dependencies minimal:
//! - num-traits: generic numerical helpers
//! - thiserror: error derivation
//! - serde: serialisation support (optional)
//!
//! ## Usage Example
//!
//! ```rust
//! use lookback_core::distribution::DistributionModel;
//! use lookback_core::types::{MarketParams, PayoffSpec};
//!
//! let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
//! let model = DistributionModel::new(5).unwrap();
//! let dist = model.derive(40.0 / 365.0, &market).unwrap();
//!
//! assert!(dist.low() >= 0.0);
//! assert!(dist.low() < dist.high());
//!
//! let put = PayoffSpec::put(2.1);
//! assert_eq!(put.intrinsic(2.0), 2.1 - 2.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for market, payoff and strike-region types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod distribution;
pub mod types;

pub use distribution::{DistributionModel, DistributionParams};
pub use types::{
    LookbackError, MarketOverride, MarketParams, OptionKind, PayoffSpec, Result, StrikeRegion,
};
