//! Log-normal terminal distribution model.
//!
//! For a time to maturity τ and market parameters (S, σ, r, q) the terminal
//! price under geometric Brownian motion is log-normal with
//!
//! ```text
//! mu    = (r - q - σ²/2)·τ + ln(S)
//! sigma = σ·√τ
//! mean  = exp(mu + sigma²/2)
//! var   = (exp(sigma²) - 1)·exp(2·mu + sigma²)
//! ```
//!
//! The discretised support used by grid-based estimators is
//! `[max(0, mean - 3·stddev), mean + 3·stddev]`, split into
//! `2^resolution` evenly spaced levels.
//!
//! A [`DistributionParams`] is derived fresh for every time step and never
//! shared between steps.

use crate::analytical::{discount_factor, norm_pdf};
use crate::types::{LookbackError, MarketParams, Result};

/// Half-width of the discretised support, in standard deviations.
pub const SUPPORT_STDDEVS: f64 = 3.0;

/// Smallest supported resolution (2 grid levels).
pub const MIN_RESOLUTION: u32 = 1;

/// Largest supported resolution (about one million grid levels).
pub const MAX_RESOLUTION: u32 = 20;

/// Derived parameters of one step's terminal distribution.
///
/// Invariants: `low >= 0`, `low < high`, `sigma > 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistributionParams {
    mu: f64,
    sigma: f64,
    mean: f64,
    variance: f64,
    low: f64,
    high: f64,
    resolution: u32,
    maturity: f64,
    rate: f64,
}

impl DistributionParams {
    /// Log-space mean.
    #[inline]
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Log-space standard deviation.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Mean of the terminal price (the forward).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Variance of the terminal price.
    #[inline]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Standard deviation of the terminal price.
    #[inline]
    pub fn stddev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Lower bound of the discretised support.
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound of the discretised support.
    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Number of discretisation bits.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Number of grid levels, `2^resolution`.
    #[inline]
    pub fn levels(&self) -> usize {
        1usize << self.resolution
    }

    /// Time to maturity in years.
    #[inline]
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Risk-free rate used for discounting.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Discount factor exp(-r·τ).
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        discount_factor(self.rate, self.maturity)
    }

    /// Terminal price at grid level `index` (0 maps to `low`, the last level to `high`).
    #[inline]
    pub fn grid_point(&self, index: usize) -> f64 {
        let step = (self.high - self.low) / (self.levels() - 1) as f64;
        self.low + step * index as f64
    }

    /// Log-normal probability density at `x`.
    ///
    /// Zero for `x <= 0`.
    pub fn density(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let z = (x.ln() - self.mu) / self.sigma;
        norm_pdf(z) / (x * self.sigma)
    }
}

/// Builds a [`DistributionParams`] per time step.
///
/// # Examples
/// ```
/// use lookback_core::distribution::DistributionModel;
/// use lookback_core::types::{LookbackError, MarketParams};
///
/// let model = DistributionModel::new(5).unwrap();
/// let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
///
/// let dist = model.derive(0.5, &market).unwrap();
/// assert_eq!(dist.levels(), 32);
///
/// // Zero maturity collapses the distribution
/// assert!(matches!(
///     model.derive(0.0, &market),
///     Err(LookbackError::DegenerateDistribution { .. })
/// ));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistributionModel {
    resolution: u32,
}

impl DistributionModel {
    /// Creates a model producing `2^resolution` grid levels.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `resolution` is outside
    /// [`MIN_RESOLUTION`, `MAX_RESOLUTION`].
    pub fn new(resolution: u32) -> Result<Self> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(LookbackError::invalid_config(format!(
                "resolution {} outside [{}, {}]",
                resolution, MIN_RESOLUTION, MAX_RESOLUTION
            )));
        }
        Ok(Self { resolution })
    }

    /// Returns the configured resolution.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Derives the terminal distribution at `maturity` years.
    ///
    /// # Errors
    /// - `InvalidConfig` if the market parameters are invalid
    /// - `DegenerateDistribution` if `maturity <= 0`, the volatility is zero,
    ///   or the support collapses or overflows
    pub fn derive(&self, maturity: f64, market: &MarketParams) -> Result<DistributionParams> {
        market.validate()?;

        if !(maturity.is_finite() && maturity > 0.0) {
            return Err(LookbackError::degenerate(
                maturity,
                "maturity must be positive",
            ));
        }

        let sigma = market.volatility * maturity.sqrt();
        if sigma <= 0.0 {
            return Err(LookbackError::degenerate(maturity, "zero log-space volatility"));
        }

        let vol_sq = market.volatility * market.volatility;
        let mu = (market.rate - market.dividend - 0.5 * vol_sq) * maturity + market.spot.ln();
        let sigma_sq = sigma * sigma;
        let mean = (mu + 0.5 * sigma_sq).exp();
        let variance = sigma_sq.exp_m1() * (2.0 * mu + sigma_sq).exp();
        let stddev = variance.sqrt();

        let low = (mean - SUPPORT_STDDEVS * stddev).max(0.0);
        let high = mean + SUPPORT_STDDEVS * stddev;

        if !high.is_finite() {
            return Err(LookbackError::degenerate(maturity, "support is not finite"));
        }
        if high <= low {
            return Err(LookbackError::degenerate(
                maturity,
                format!("collapsed support [{}, {}]", low, high),
            ));
        }

        Ok(DistributionParams {
            mu,
            sigma,
            mean,
            variance,
            low,
            high,
            resolution: self.resolution,
            maturity,
            rate: market.rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market() -> MarketParams {
        MarketParams::new(2.0, 0.4, 0.0).unwrap()
    }

    #[test]
    fn test_log_space_parameters() {
        let model = DistributionModel::new(5).unwrap();
        let tau = 40.0 / 365.0;
        let dist = model.derive(tau, &market()).unwrap();

        assert_relative_eq!(dist.mu(), -0.08 * tau + 2.0_f64.ln(), epsilon = 1e-14);
        assert_relative_eq!(dist.sigma(), 0.4 * tau.sqrt(), epsilon = 1e-14);
        // With r = q = 0 the forward equals spot
        assert_relative_eq!(dist.mean(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_variance_formula() {
        let model = DistributionModel::new(3).unwrap();
        let market = MarketParams::new(100.0, 0.2, 0.05)
            .unwrap()
            .with_dividend(0.01);
        let dist = model.derive(1.0, &market).unwrap();

        let forward = 100.0 * (0.04_f64).exp();
        assert_relative_eq!(dist.mean(), forward, epsilon = 1e-10);
        let expected_var = forward * forward * ((0.04_f64).exp() - 1.0);
        assert_relative_eq!(dist.variance(), expected_var, epsilon = 1e-8);
        assert_relative_eq!(dist.stddev(), expected_var.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_support_bounds() {
        let model = DistributionModel::new(5).unwrap();
        let dist = model.derive(40.0 / 365.0, &market()).unwrap();

        assert_relative_eq!(dist.low(), dist.mean() - 3.0 * dist.stddev(), epsilon = 1e-12);
        assert_relative_eq!(dist.high(), dist.mean() + 3.0 * dist.stddev(), epsilon = 1e-12);
        assert!(dist.low() > 0.0);
    }

    #[test]
    fn test_low_clamped_at_zero() {
        let model = DistributionModel::new(5).unwrap();
        let wild = MarketParams::new(2.0, 1.5, 0.0).unwrap();
        let dist = model.derive(2.0, &wild).unwrap();

        assert_eq!(dist.low(), 0.0);
        assert!(dist.high() > 0.0);
    }

    #[test]
    fn test_grid_points_span_support() {
        let model = DistributionModel::new(4).unwrap();
        let dist = model.derive(0.25, &market()).unwrap();

        assert_eq!(dist.levels(), 16);
        assert_relative_eq!(dist.grid_point(0), dist.low());
        assert_relative_eq!(dist.grid_point(15), dist.high(), epsilon = 1e-12);
    }

    #[test]
    fn test_density_positive_inside_support() {
        let model = DistributionModel::new(4).unwrap();
        let dist = model.derive(0.25, &market()).unwrap();

        assert_eq!(dist.density(0.0), 0.0);
        assert_eq!(dist.density(-1.0), 0.0);
        assert!(dist.density(dist.mean()) > dist.density(dist.high()));

        let x = dist.mean();
        let z = (x.ln() - dist.mu()) / dist.sigma();
        let expected = (-0.5 * z * z).exp() / (x * dist.sigma() * (2.0 * std::f64::consts::PI).sqrt());
        assert_relative_eq!(dist.density(x), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        let model = DistributionModel::new(5).unwrap();

        assert!(matches!(
            model.derive(0.0, &market()),
            Err(LookbackError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            model.derive(-1.0, &market()),
            Err(LookbackError::DegenerateDistribution { .. })
        ));

        let flat = MarketParams::new(2.0, 0.0, 0.0).unwrap();
        assert!(matches!(
            model.derive(1.0, &flat),
            Err(LookbackError::DegenerateDistribution { .. })
        ));
    }

    #[test]
    fn test_invalid_market_is_config_error() {
        let model = DistributionModel::new(5).unwrap();
        let bad = MarketParams {
            spot: -2.0,
            volatility: 0.4,
            rate: 0.0,
            dividend: 0.0,
        };
        assert!(matches!(
            model.derive(1.0, &bad),
            Err(LookbackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_resolution_bounds() {
        assert!(DistributionModel::new(0).is_err());
        assert!(DistributionModel::new(MAX_RESOLUTION + 1).is_err());
        assert_eq!(DistributionModel::new(MAX_RESOLUTION).unwrap().resolution(), 20);
    }

    #[test]
    fn test_discount_factor() {
        let model = DistributionModel::new(3).unwrap();
        let market = MarketParams::new(100.0, 0.2, 0.05).unwrap();
        let dist = model.derive(2.0, &market).unwrap();
        assert_relative_eq!(dist.discount_factor(), (-0.1_f64).exp());
    }
}
