//! Resolution-bounded oracle.
//!
//! Prices a payoff on the `2^resolution` grid of the step's distribution by
//! iterative amplitude estimation of the encoded payoff (see
//! [`encoding`](super::encoding) and [`iterative`](super::iterative)).
//! Precision is bounded twice: by the grid resolution, which fixes the
//! discretisation bias, and by `epsilon`, the target half-width of the
//! amplitude interval.

use super::iterative::AmplitudeEstimator;
use super::{CancelToken, ConfidenceInterval, DiscretizedPayoff, PricingOracle, PricingResult};
use crate::rng::StepRng;
use lookback_core::types::{LookbackError, PayoffSpec, Result};
use lookback_core::DistributionParams;
use std::time::{Duration, Instant};

/// Identifier reported by [`ResolutionBoundedOracle::name`].
pub const NAME: &str = "resolution-bounded";

/// Default target half-width of the amplitude interval.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default shots per refinement round.
pub const DEFAULT_SHOTS: u64 = 100;

/// Default payoff rescaling factor.
pub const DEFAULT_RESCALING_FACTOR: f64 = 0.25;

/// Default maximum number of refinement rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Resolution-bounded oracle configuration.
///
/// # Examples
///
/// ```rust
/// use lookback_engine::oracle::ResolutionConfig;
///
/// let config = ResolutionConfig::builder()
///     .epsilon(0.005)
///     .shots(200)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.epsilon(), 0.005);
/// assert_eq!(config.rescaling_factor(), 0.25);
///
/// assert!(ResolutionConfig::builder().rescaling_factor(1.5).build().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ResolutionConfig {
    epsilon: f64,
    alpha: f64,
    shots: u64,
    rescaling_factor: f64,
    max_iterations: usize,
    time_budget: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            alpha: DEFAULT_ALPHA,
            shots: DEFAULT_SHOTS,
            rescaling_factor: DEFAULT_RESCALING_FACTOR,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_budget: None,
            cancel: None,
        }
    }
}

impl ResolutionConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> ResolutionConfigBuilder {
        ResolutionConfigBuilder::default()
    }

    /// Target half-width of the amplitude interval.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Significance level; the interval has confidence `1 - alpha`.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Shots per refinement round.
    #[inline]
    pub fn shots(&self) -> u64 {
        self.shots
    }

    /// Payoff rescaling factor `c`.
    #[inline]
    pub fn rescaling_factor(&self) -> f64 {
        self.rescaling_factor
    }

    /// Maximum number of refinement rounds.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Wall-clock budget per priced step.
    #[inline]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Cancellation token shared with the caller.
    #[inline]
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if:
    /// - `epsilon` is outside (0, 0.5]
    /// - `alpha` is outside (0, 1)
    /// - `shots` or `max_iterations` is 0
    /// - `rescaling_factor` is outside (0, 1]
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon <= 0.5) {
            return Err(LookbackError::invalid_config(format!(
                "epsilon must lie in (0, 0.5], got {}",
                self.epsilon
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(LookbackError::invalid_config(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.shots == 0 {
            return Err(LookbackError::invalid_config("shots must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(LookbackError::invalid_config(
                "max_iterations must be positive",
            ));
        }
        if !(self.rescaling_factor > 0.0 && self.rescaling_factor <= 1.0) {
            return Err(LookbackError::invalid_config(format!(
                "rescaling_factor must lie in (0, 1], got {}",
                self.rescaling_factor
            )));
        }
        Ok(())
    }

    fn estimator(&self) -> AmplitudeEstimator {
        AmplitudeEstimator {
            epsilon: self.epsilon,
            alpha: self.alpha,
            shots: self.shots,
            max_iterations: self.max_iterations,
            deadline: self.time_budget.map(|budget| Instant::now() + budget),
            cancel: self.cancel.clone(),
        }
    }
}

/// Builder for [`ResolutionConfig`]. Every field has a default.
#[derive(Clone, Debug, Default)]
pub struct ResolutionConfigBuilder {
    config: ResolutionConfig,
}

impl ResolutionConfigBuilder {
    /// Sets the target half-width of the amplitude interval.
    #[inline]
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Sets the significance level.
    #[inline]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Sets the shots per refinement round.
    #[inline]
    pub fn shots(mut self, shots: u64) -> Self {
        self.config.shots = shots;
        self
    }

    /// Sets the payoff rescaling factor.
    #[inline]
    pub fn rescaling_factor(mut self, c: f64) -> Self {
        self.config.rescaling_factor = c;
        self
    }

    /// Sets the maximum number of refinement rounds.
    #[inline]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Sets a wall-clock budget per priced step.
    #[inline]
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = Some(budget);
        self
    }

    /// Attaches a cancellation token.
    #[inline]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any value is invalid.
    pub fn build(self) -> Result<ResolutionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Grid-based estimator using iterative amplitude estimation.
///
/// The reported interval is the amplitude interval pushed through the
/// linear post-processing map, clamped to the payoff image and discounted.
/// A payoff that is constant on the support is returned exactly.
#[derive(Clone, Debug)]
pub struct ResolutionBoundedOracle {
    config: ResolutionConfig,
}

impl ResolutionBoundedOracle {
    /// Creates an oracle with the given configuration.
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }
}

impl PricingOracle for ResolutionBoundedOracle {
    fn name(&self) -> &'static str {
        NAME
    }

    fn price(
        &self,
        distribution: &DistributionParams,
        payoff: &PayoffSpec,
        seed: u64,
    ) -> Result<PricingResult> {
        self.config.validate()?;
        let encoded = DiscretizedPayoff::encode(distribution, payoff)?;
        let df = encoded.discount_factor();

        if encoded.is_constant() {
            let (f_min, _) = encoded.image();
            return Ok(PricingResult::exact(f_min * df, encoded.strike_region(), 0));
        }

        let c = self.config.rescaling_factor;
        let amplitude = encoded.objective_amplitude(c);

        let mut rng = StepRng::from_seed(seed);
        let estimate = self.config.estimator().estimate(amplitude, &mut rng)?;

        let value = encoded.map_amplitude(estimate.amplitude, c) * df;
        let interval = ConfidenceInterval::new(
            encoded.map_amplitude(estimate.lower, c) * df,
            encoded.map_amplitude(estimate.upper, c) * df,
        );

        Ok(PricingResult::new(
            value,
            interval,
            encoded.strike_region(),
            estimate.shots,
        ))
    }
}
