//! Pricing oracles: one capability, interchangeable estimators.
//!
//! A [`PricingOracle`] turns a step's [`DistributionParams`] and a
//! [`PayoffSpec`] into a discounted point estimate and confidence interval.
//! The scanner and the selector only ever see this trait.
//!
//! # Implementations
//!
//! | Oracle | Estimator | Interval |
//! |--------|-----------|----------|
//! | [`SamplingOracle`] | Monte Carlo over terminal log-prices | `mean ± z·se` (or collapsed) |
//! | [`ResolutionBoundedOracle`] | Iterative amplitude estimation over a discretised payoff | Chernoff-bounded, refined to `epsilon` |
//! | [`AnalyticOracle`] | Black-Scholes closed form | point |
//!
//! # Randomness
//!
//! Oracles never hold random state. Each call receives a `seed` and builds
//! its own [`StepRng`](crate::rng::StepRng), so calls for different steps
//! can run concurrently and still reproduce bit for bit.
//!
//! # Examples
//!
//! ```rust
//! use lookback_core::{DistributionModel, MarketParams, PayoffSpec};
//! use lookback_engine::oracle::{PricingOracle, SamplingConfig, SamplingOracle};
//!
//! let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
//! let dist = DistributionModel::new(5).unwrap().derive(40.0 / 365.0, &market).unwrap();
//!
//! let oracle = SamplingOracle::new(
//!     SamplingConfig::builder().n_paths(20_000).build().unwrap(),
//! );
//! let result = oracle.price(&dist, &PayoffSpec::put(2.1), 42).unwrap();
//!
//! assert!(result.expected_payoff > 0.0);
//! assert!(result.confidence_interval.contains(result.expected_payoff));
//! ```

pub mod analytic;
pub mod cancel;
pub mod encoding;
pub mod iterative;
pub mod resolution;
pub mod sampling;

pub use analytic::AnalyticOracle;
pub use cancel::CancelToken;
pub use encoding::DiscretizedPayoff;
pub use resolution::{ResolutionBoundedOracle, ResolutionConfig, ResolutionConfigBuilder};
pub use sampling::{SamplingConfig, SamplingConfigBuilder, SamplingOracle};

use lookback_core::types::{PayoffSpec, Result, StrikeRegion};
use lookback_core::DistributionParams;

/// Closed interval `[lower, upper]` around an estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Creates an interval, swapping the bounds if given out of order.
    #[inline]
    pub fn new(lower: f64, upper: f64) -> Self {
        if lower <= upper {
            Self { lower, upper }
        } else {
            Self {
                lower: upper,
                upper: lower,
            }
        }
    }

    /// Degenerate interval at a single value.
    #[inline]
    pub fn point(value: f64) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    /// Interval width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Half of the interval width.
    #[inline]
    pub fn half_width(&self) -> f64 {
        0.5 * self.width()
    }

    /// Returns true if `value` lies inside the interval.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Result of pricing one vanilla payoff against one terminal distribution.
///
/// Invariants: `expected_payoff >= 0` and
/// `confidence_interval.lower <= expected_payoff <= confidence_interval.upper`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingResult {
    /// Discounted expected payoff.
    pub expected_payoff: f64,
    /// Interval bracketing the expected payoff.
    pub confidence_interval: ConfidenceInterval,
    /// Placement of the strike relative to the discretised support.
    pub strike_region: StrikeRegion,
    /// Samples drawn or oracle shots spent.
    pub evaluations: u64,
}

impl PricingResult {
    /// Builds a result, enforcing the non-negativity and bracketing invariants.
    ///
    /// The estimate is floored at zero and the interval is widened if needed
    /// so that it contains the estimate.
    pub fn new(
        expected_payoff: f64,
        interval: ConfidenceInterval,
        strike_region: StrikeRegion,
        evaluations: u64,
    ) -> Self {
        let expected_payoff = expected_payoff.max(0.0);
        let lower = interval.lower.max(0.0).min(expected_payoff);
        let upper = interval.upper.max(expected_payoff);
        Self {
            expected_payoff,
            confidence_interval: ConfidenceInterval { lower, upper },
            strike_region,
            evaluations,
        }
    }

    /// Result with a collapsed interval.
    #[inline]
    pub fn exact(value: f64, strike_region: StrikeRegion, evaluations: u64) -> Self {
        Self::new(value, ConfidenceInterval::point(value), strike_region, evaluations)
    }
}

/// Capability shared by all estimators.
pub trait PricingOracle: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Prices `payoff` against `distribution`.
    ///
    /// # Arguments
    ///
    /// * `distribution` - Terminal distribution of the step
    /// * `payoff` - Vanilla payoff
    /// * `seed` - Seed for this call's private generator
    ///
    /// # Errors
    ///
    /// Implementations return `InvalidConfig` for invalid inputs and may
    /// return `ConvergenceFailure` or `Cancelled` when a budget is hit.
    fn price(
        &self,
        distribution: &DistributionParams,
        payoff: &PayoffSpec,
        seed: u64,
    ) -> Result<PricingResult>;
}

/// Oracle choice plus its budget configuration.
#[derive(Clone, Debug)]
pub enum OracleSelection {
    /// Monte Carlo sampling.
    Sampling(SamplingConfig),
    /// Iterative amplitude estimation over a discretised payoff.
    ResolutionBounded(ResolutionConfig),
    /// Black-Scholes closed form.
    Analytic,
}

impl OracleSelection {
    /// Instantiates the selected oracle.
    pub fn build(&self) -> Box<dyn PricingOracle> {
        match self {
            OracleSelection::Sampling(config) => Box::new(SamplingOracle::new(config.clone())),
            OracleSelection::ResolutionBounded(config) => {
                Box::new(ResolutionBoundedOracle::new(config.clone()))
            }
            OracleSelection::Analytic => Box::new(AnalyticOracle::new()),
        }
    }

    /// Identifier of the selected oracle.
    pub fn name(&self) -> &'static str {
        match self {
            OracleSelection::Sampling(_) => sampling::NAME,
            OracleSelection::ResolutionBounded(_) => resolution::NAME,
            OracleSelection::Analytic => analytic::NAME,
        }
    }
}
