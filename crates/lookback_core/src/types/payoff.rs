//! Vanilla payoff specification priced at every monitored day.
//!
//! A fixed-strike lookback is approximated by pricing the vanilla payoff
//! below against each day's terminal distribution:
//!
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)

use super::error::{LookbackError, Result};

/// Option type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionKind {
    /// Call: max(S - K, 0)
    Call,
    /// Put: max(K - S, 0)
    Put,
}

impl OptionKind {
    /// Returns true for calls.
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, OptionKind::Call)
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKind::Call => write!(f, "call"),
            OptionKind::Put => write!(f, "put"),
        }
    }
}

impl std::str::FromStr for OptionKind {
    type Err = LookbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(OptionKind::Call),
            "put" | "p" => Ok(OptionKind::Put),
            other => Err(LookbackError::invalid_config(format!(
                "unknown option kind '{}': expected call or put",
                other
            ))),
        }
    }
}

/// Where the strike sits relative to the discretised support `[low, high]`.
///
/// Outside the support the payoff is degenerate: either zero everywhere or
/// exercised everywhere. Oracles still price it, and the scanner reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum StrikeRegion {
    /// low < K < high
    #[default]
    Within,
    /// Payoff is zero on the whole support.
    OutOfTheMoneyEverywhere,
    /// Payoff is positive and linear on the whole support.
    InTheMoneyEverywhere,
}

impl StrikeRegion {
    /// Returns true if the strike lies outside the support.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, StrikeRegion::Within)
    }
}

/// Payoff specification: option kind and fixed strike.
///
/// # Examples
/// ```
/// use lookback_core::types::{PayoffSpec, StrikeRegion};
///
/// let call = PayoffSpec::call(100.0);
/// assert_eq!(call.intrinsic(110.0), 10.0);
/// assert_eq!(call.intrinsic(90.0), 0.0);
///
/// assert_eq!(call.strike_region(120.0, 150.0), StrikeRegion::InTheMoneyEverywhere);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayoffSpec {
    /// Call or put.
    pub kind: OptionKind,
    /// Strike price (K > 0).
    pub strike: f64,
}

impl PayoffSpec {
    /// Creates a validated payoff specification.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the strike is not positive and finite.
    pub fn new(kind: OptionKind, strike: f64) -> Result<Self> {
        let spec = Self { kind, strike };
        spec.validate()?;
        Ok(spec)
    }

    /// Call payoff with the given strike.
    #[inline]
    pub fn call(strike: f64) -> Self {
        Self {
            kind: OptionKind::Call,
            strike,
        }
    }

    /// Put payoff with the given strike.
    #[inline]
    pub fn put(strike: f64) -> Self {
        Self {
            kind: OptionKind::Put,
            strike,
        }
    }

    /// Validates the strike.
    pub fn validate(&self) -> Result<()> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(LookbackError::invalid_config(format!(
                "strike must be positive and finite, got {}",
                self.strike
            )));
        }
        Ok(())
    }

    /// Undiscounted payoff at terminal price `spot`.
    #[inline]
    pub fn intrinsic(&self, spot: f64) -> f64 {
        match self.kind {
            OptionKind::Call => (spot - self.strike).max(0.0),
            OptionKind::Put => (self.strike - spot).max(0.0),
        }
    }

    /// Classifies the strike against the support `[low, high]`.
    pub fn strike_region(&self, low: f64, high: f64) -> StrikeRegion {
        let k = self.strike;
        let (never, always) = if self.kind.is_call() {
            (k >= high, k <= low)
        } else {
            (k <= low, k >= high)
        };
        if never {
            StrikeRegion::OutOfTheMoneyEverywhere
        } else if always {
            StrikeRegion::InTheMoneyEverywhere
        } else {
            StrikeRegion::Within
        }
    }

    /// Range `(min, max)` the payoff takes on `[low, high]`.
    ///
    /// Both payoffs are monotone in the terminal price, so the extremes sit
    /// at the support bounds.
    pub fn image(&self, low: f64, high: f64) -> (f64, f64) {
        let (a, b) = (self.intrinsic(low), self.intrinsic(high));
        (a.min(b), a.max(b))
    }
}
