//! # lookback_engine: Per-Day Pricing Scan for Fixed-Strike Lookbacks
//!
//! ## Layer 2 Role
//!
//! lookback_engine approximates a fixed-strike lookback premium by pricing a
//! vanilla option at every monitored day and keeping the best day:
//! - Seeded, per-call random number generation (`rng`)
//! - Interchangeable pricing oracles behind one trait (`oracle`)
//! - The time-grid scanner with overrides and failure policy (`scan`)
//! - Extremum selection (`select`)
//! - The [`price_lookback`] entry point (`lookback`)
//!
//! ## Data Flow
//!
//! ```text
//! TimeStepScanner ──► DistributionModel (per day) ──► PricingOracle (per day)
//!        │                                                   │
//!        └──────────────── ScanResult ◄──────────────────────┘
//!                              │
//!                      ExtremumSelector ──► LookbackEstimate
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use lookback_core::{MarketParams, PayoffSpec};
//! use lookback_engine::oracle::{OracleSelection, SamplingConfig};
//! use lookback_engine::scan::{StepOverrides, TimeGrid};
//! use lookback_engine::{price_lookback, LookbackRequest};
//!
//! let sampling = SamplingConfig::builder().n_paths(20_000).build().unwrap();
//! let request = LookbackRequest::new(
//!     MarketParams::new(2.0, 0.4, 0.0).unwrap(),
//!     TimeGrid::daily(40).unwrap(),
//!     PayoffSpec::put(2.1),
//!     OracleSelection::Sampling(sampling),
//! )
//! .with_overrides(StepOverrides::new().with_volatility(20, 0.9).with_volatility(21, 0.9));
//!
//! let report = price_lookback(&request).unwrap();
//! println!(
//!     "max payoff {:.4} in [{:.4}, {:.4}] on day {}",
//!     report.estimate.value,
//!     report.estimate.confidence_interval.lower,
//!     report.estimate.confidence_interval.upper,
//!     report.estimate.day,
//! );
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for policies, intervals, results and estimates

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod lookback;
pub mod oracle;
pub mod rng;
pub mod scan;
pub mod select;

pub use lookback::{price_lookback, LookbackReport, LookbackRequest, DEFAULT_RESOLUTION};
pub use oracle::{ConfidenceInterval, OracleSelection, PricingOracle, PricingResult};
pub use scan::{FailurePolicy, ScanConfig, ScanResult, StepOutcome, TimeGrid, TimeStepScanner};
pub use select::{ExtremumSelector, LookbackEstimate};
