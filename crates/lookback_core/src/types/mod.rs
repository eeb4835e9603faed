//! Core value types shared across the workspace.
//!
//! This module provides:
//! - [`MarketParams`] and [`MarketOverride`]: market inputs and partial per-step overrides
//! - [`PayoffSpec`], [`OptionKind`] and [`StrikeRegion`]: the vanilla payoff priced per step
//! - [`LookbackError`]: the error enum used by every layer

pub mod error;
pub mod market;
pub mod payoff;

pub use error::{LookbackError, Result};
pub use market::{MarketOverride, MarketParams};
pub use payoff::{OptionKind, PayoffSpec, StrikeRegion};
