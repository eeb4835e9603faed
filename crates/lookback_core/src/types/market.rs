//! Market inputs for a single pricing request.
//!
//! [`MarketParams`] is immutable for the duration of a scan. Day-specific
//! shocks are expressed as a [`MarketOverride`] that is merged into a copy
//! of the base parameters for the affected step only.

use super::error::{LookbackError, Result};

/// Market parameters for the underlying asset.
///
/// # Examples
/// ```
/// use lookback_core::types::MarketParams;
///
/// let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
/// assert_eq!(market.dividend, 0.0);
///
/// assert!(MarketParams::new(-1.0, 0.4, 0.0).is_err());
/// assert!(MarketParams::new(2.0, -0.1, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketParams {
    /// Spot price (S > 0).
    pub spot: f64,
    /// Annualised volatility (σ ≥ 0).
    pub volatility: f64,
    /// Continuously compounded risk-free rate (r).
    pub rate: f64,
    /// Continuous dividend or convenience yield (q).
    #[cfg_attr(feature = "serde", serde(default))]
    pub dividend: f64,
}

impl MarketParams {
    /// Creates validated market parameters with zero dividend yield.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if spot is not positive, volatility is
    /// negative, or any input is not finite.
    pub fn new(spot: f64, volatility: f64, rate: f64) -> Result<Self> {
        let params = Self {
            spot,
            volatility,
            rate,
            dividend: 0.0,
        };
        params.validate()?;
        Ok(params)
    }

    /// Sets the dividend yield.
    #[inline]
    pub fn with_dividend(mut self, dividend: f64) -> Self {
        self.dividend = dividend;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(LookbackError::invalid_config(format!(
                "spot must be positive and finite, got {}",
                self.spot
            )));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(LookbackError::invalid_config(format!(
                "volatility must be non-negative and finite, got {}",
                self.volatility
            )));
        }
        if !self.rate.is_finite() {
            return Err(LookbackError::invalid_config(format!(
                "rate must be finite, got {}",
                self.rate
            )));
        }
        if !self.dividend.is_finite() {
            return Err(LookbackError::invalid_config(format!(
                "dividend must be finite, got {}",
                self.dividend
            )));
        }
        Ok(())
    }
}

/// Partial market parameters applied to selected time steps.
///
/// Fields left as `None` keep the base value.
///
/// # Examples
/// ```
/// use lookback_core::types::{MarketOverride, MarketParams};
///
/// let base = MarketParams::new(2.0, 0.4, 0.0).unwrap();
/// let shocked = MarketOverride::volatility(0.9).apply(&base);
///
/// assert_eq!(shocked.volatility, 0.9);
/// assert_eq!(shocked.spot, 2.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarketOverride {
    /// Replacement spot price.
    pub spot: Option<f64>,
    /// Replacement volatility.
    pub volatility: Option<f64>,
    /// Replacement risk-free rate.
    pub rate: Option<f64>,
    /// Replacement dividend yield.
    pub dividend: Option<f64>,
}

impl MarketOverride {
    /// An override that replaces only the volatility.
    #[inline]
    pub fn volatility(volatility: f64) -> Self {
        Self {
            volatility: Some(volatility),
            ..Default::default()
        }
    }

    /// Returns true if no field is overridden.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spot.is_none()
            && self.volatility.is_none()
            && self.rate.is_none()
            && self.dividend.is_none()
    }

    /// Merges the override into a copy of `base`.
    pub fn apply(&self, base: &MarketParams) -> MarketParams {
        MarketParams {
            spot: self.spot.unwrap_or(base.spot),
            volatility: self.volatility.unwrap_or(base.volatility),
            rate: self.rate.unwrap_or(base.rate),
            dividend: self.dividend.unwrap_or(base.dividend),
        }
    }
}
