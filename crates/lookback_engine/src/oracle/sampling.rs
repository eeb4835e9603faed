//! Monte Carlo sampling oracle.
//!
//! Draws terminal log-prices from the step's log-normal law, either in a
//! single shot or as `n_steps` accumulated increments
//!
//! ```text
//! ln S_T = Σ_j (mu / n + sigma / √n · Z_j),   Z_j ~ N(0, 1)
//! ```
//!
//! whose terminal marginal is exactly `N(mu, sigma²)`. The estimate is the
//! discounted sample mean of the vanilla payoff; the statistical error
//! decreases as `O(1/√N)`.

use super::{ConfidenceInterval, PricingOracle, PricingResult};
use crate::rng::StepRng;
use lookback_core::analytical::norm_quantile;
use lookback_core::types::{LookbackError, PayoffSpec, Result};
use lookback_core::DistributionParams;

/// Identifier reported by [`SamplingOracle::name`].
pub const NAME: &str = "sampling";

/// Maximum number of sampled paths.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of increments per path.
pub const MAX_STEPS: usize = 10_000;

/// Default significance level (95% interval).
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Sampling oracle configuration.
///
/// Use [`SamplingConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use lookback_engine::oracle::SamplingConfig;
///
/// let config = SamplingConfig::builder()
///     .n_paths(100_000)
///     .n_steps(10)
///     .alpha(0.01)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.n_paths(), 100_000);
/// assert_eq!(config.n_steps(), 10);
/// ```
#[derive(Clone, Debug)]
pub struct SamplingConfig {
    n_paths: usize,
    n_steps: usize,
    alpha: f64,
    report_interval: bool,
}

impl SamplingConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SamplingConfigBuilder {
        SamplingConfigBuilder::default()
    }

    /// Number of sampled paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Increments per path (1 = single terminal draw).
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Significance level; the interval has confidence `1 - alpha`.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether a standard-error interval is reported.
    #[inline]
    pub fn report_interval(&self) -> bool {
        self.report_interval
    }

    /// Two-sided critical value `z = Φ⁻¹(1 - alpha/2)`.
    #[inline]
    pub fn critical_value(&self) -> f64 {
        norm_quantile(1.0 - 0.5 * self.alpha)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if:
    /// - `n_paths` is 0 or greater than 10,000,000
    /// - `n_steps` is 0 or greater than 10,000
    /// - `alpha` is outside (0, 1)
    pub fn validate(&self) -> Result<()> {
        if self.n_paths == 0 || self.n_paths > MAX_PATHS {
            return Err(LookbackError::invalid_config(format!(
                "n_paths {} outside [1, {}]",
                self.n_paths, MAX_PATHS
            )));
        }
        if self.n_steps == 0 || self.n_steps > MAX_STEPS {
            return Err(LookbackError::invalid_config(format!(
                "n_steps {} outside [1, {}]",
                self.n_steps, MAX_STEPS
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(LookbackError::invalid_config(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Builder for [`SamplingConfig`].
#[derive(Clone, Debug)]
pub struct SamplingConfigBuilder {
    n_paths: Option<usize>,
    n_steps: usize,
    alpha: f64,
    report_interval: bool,
}

impl Default for SamplingConfigBuilder {
    fn default() -> Self {
        Self {
            n_paths: None,
            n_steps: 1,
            alpha: DEFAULT_ALPHA,
            report_interval: true,
        }
    }
}

impl SamplingConfigBuilder {
    /// Sets the number of sampled paths.
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.n_paths = Some(n_paths);
        self
    }

    /// Sets the number of increments per path.
    #[inline]
    pub fn n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Sets the significance level of the reported interval.
    #[inline]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Enables or disables the standard-error interval.
    ///
    /// When disabled the interval collapses to the point estimate.
    #[inline]
    pub fn report_interval(mut self, report: bool) -> Self {
        self.report_interval = report;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `n_paths` is not set or any value is invalid.
    pub fn build(self) -> Result<SamplingConfig> {
        let n_paths = self
            .n_paths
            .ok_or_else(|| LookbackError::invalid_config("n_paths must be specified"))?;

        let config = SamplingConfig {
            n_paths,
            n_steps: self.n_steps,
            alpha: self.alpha,
            report_interval: self.report_interval,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Monte Carlo estimator of the discounted vanilla payoff.
///
/// With `n_paths == 1`, or with the interval disabled, the reported interval
/// collapses to the point estimate.
#[derive(Clone, Debug)]
pub struct SamplingOracle {
    config: SamplingConfig,
}

impl SamplingOracle {
    /// Creates an oracle with the given configuration.
    pub fn new(config: SamplingConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

impl PricingOracle for SamplingOracle {
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
        payoff.validate()?;

        let n_paths = self.config.n_paths;
        let n_steps = self.config.n_steps;

        // Per-increment drift and diffusion in log space
        let drift = distribution.mu() / n_steps as f64;
        let diffusion = distribution.sigma() / (n_steps as f64).sqrt();

        let mut rng = StepRng::from_seed(seed);
        let mut normals = vec![0.0; n_steps];

        // Welford running mean and sum of squared deviations
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for path in 0..n_paths {
            rng.fill_normal(&mut normals);
            let log_terminal: f64 = normals.iter().map(|&z| drift + diffusion * z).sum();
            let value = payoff.intrinsic(log_terminal.exp());

            let delta = value - mean;
            mean += delta / (path + 1) as f64;
            m2 += delta * (value - mean);
        }

        let std_error = if n_paths > 1 {
            (m2 / (n_paths - 1) as f64).sqrt() / (n_paths as f64).sqrt()
        } else {
            0.0
        };

        let df = distribution.discount_factor();
        let price = mean * df;
        let std_error = std_error * df;

        let interval = if self.config.report_interval {
            let half_width = self.config.critical_value() * std_error;
            ConfidenceInterval::new(price - half_width, price + half_width)
        } else {
            ConfidenceInterval::point(price)
        };

        let region = payoff.strike_region(distribution.low(), distribution.high());
        Ok(PricingResult::new(price, interval, region, n_paths as u64))
    }
}
