//! Time-grid scanner.
//!
//! For every step of a [`TimeGrid`] the scanner merges the step's override
//! (if any) into the base market, derives a fresh terminal distribution,
//! prices the vanilla payoff through the configured [`PricingOracle`] and
//! records the outcome. Steps are independent; they run in order or fan out
//! over a Rayon pool, and their outcomes are always assembled in step order.
//!
//! # Failure policy
//!
//! A step whose distribution is degenerate, or whose oracle fails to
//! converge or is cancelled, is handled per [`FailurePolicy`]:
//!
//! | Policy | Behaviour |
//! |--------|-----------|
//! | `FailFast` (default) | abort with `StepFailed` for the earliest failing day |
//! | `SkipAndContinue` | record the day as [`StepOutcome::Skipped`] and go on |
//!
//! `InvalidConfig` is always fatal and is raised before any step is priced.

mod grid;
pub mod parallel;

pub use grid::{StepOverrides, TimeGrid, DEFAULT_DAY_COUNT};
pub use parallel::Execution;

use crate::oracle::{PricingOracle, PricingResult};
use crate::rng::SeedScheme;
use lookback_core::types::{LookbackError, MarketParams, PayoffSpec, Result};
use lookback_core::DistributionModel;
use tracing::{debug, info, warn};

/// Default base seed.
pub const DEFAULT_SEED: u64 = 42;

/// What the scanner does when a single step fails recoverably.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FailurePolicy {
    /// Abort the scan on the earliest failing step.
    #[default]
    FailFast,
    /// Mark the step absent and continue.
    #[cfg_attr(feature = "serde", serde(alias = "skip"))]
    SkipAndContinue,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::SkipAndContinue => write!(f, "skip-and-continue"),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = LookbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "skip" | "skip-and-continue" | "skip_and_continue" => {
                Ok(FailurePolicy::SkipAndContinue)
            }
            other => Err(LookbackError::invalid_config(format!(
                "unknown failure policy '{}': expected fail-fast or skip",
                other
            ))),
        }
    }
}

/// Scanner configuration.
///
/// # Examples
///
/// ```rust
/// use lookback_engine::scan::{FailurePolicy, ScanConfig};
///
/// let config = ScanConfig::builder()
///     .seed(7)
///     .failure_policy(FailurePolicy::SkipAndContinue)
///     .parallel(true)
///     .threads(2)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.seed(), 7);
/// assert!(config.execution().is_parallel());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    seed: u64,
    seed_scheme: SeedScheme,
    failure_policy: FailurePolicy,
    parallel: bool,
    threads: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            seed_scheme: SeedScheme::default(),
            failure_policy: FailurePolicy::default(),
            parallel: false,
            threads: None,
        }
    }
}

impl ScanConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Base seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Per-step seed derivation.
    #[inline]
    pub fn seed_scheme(&self) -> SeedScheme {
        self.seed_scheme
    }

    /// Failure policy.
    #[inline]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Whether steps fan out over a thread pool.
    #[inline]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Explicit pool size, if any.
    #[inline]
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Dispatch mode implied by `parallel` and `threads`.
    pub fn execution(&self) -> Execution {
        match (self.parallel, self.threads) {
            (false, _) => Execution::Sequential,
            (true, Some(threads)) => Execution::Parallel { threads },
            (true, None) => Execution::parallel_default(),
        }
    }

    /// Seed for zero-based `step`.
    #[inline]
    pub fn seed_for(&self, step: usize) -> u64 {
        self.seed_scheme.seed_for(self.seed, step)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if an explicit thread count is 0.
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(LookbackError::invalid_config("threads must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`ScanConfig`]. Every field has a default.
#[derive(Clone, Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Sets the base seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the per-step seed derivation.
    #[inline]
    pub fn seed_scheme(mut self, scheme: SeedScheme) -> Self {
        self.config.seed_scheme = scheme;
        self
    }

    /// Sets the failure policy.
    #[inline]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Enables or disables parallel dispatch.
    #[inline]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Sets the pool size used when parallel.
    #[inline]
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any value is invalid.
    pub fn build(self) -> Result<ScanConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of one step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// The oracle priced the step.
    Priced(PricingResult),
    /// The step failed recoverably and was skipped.
    Skipped(LookbackError),
}

/// One recorded step of a scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanEntry {
    /// Zero-based step index.
    pub step: usize,
    /// One-based day label.
    pub day: usize,
    /// Time to maturity in years.
    pub maturity: f64,
    /// Effective market after applying the step's override.
    pub market: MarketParams,
    /// Pricing outcome.
    pub outcome: StepOutcome,
}

impl ScanEntry {
    /// The pricing result, or `None` if the step was skipped.
    #[inline]
    pub fn result(&self) -> Option<&PricingResult> {
        match &self.outcome {
            StepOutcome::Priced(result) => Some(result),
            StepOutcome::Skipped(_) => None,
        }
    }

    /// The skip reason, if any.
    #[inline]
    pub fn error(&self) -> Option<&LookbackError> {
        match &self.outcome {
            StepOutcome::Priced(_) => None,
            StepOutcome::Skipped(err) => Some(err),
        }
    }

    /// Returns true if the step carries a price.
    #[inline]
    pub fn is_priced(&self) -> bool {
        matches!(self.outcome, StepOutcome::Priced(_))
    }
}

/// Completed scan: one entry per grid step, in day order.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    entries: Vec<ScanEntry>,
}

impl ScanResult {
    /// Wraps entries already in day order.
    pub fn from_entries(entries: Vec<ScanEntry>) -> Self {
        Self { entries }
    }

    /// All entries in day order.
    #[inline]
    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    /// Number of entries, priced or skipped.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the scan holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for one-based `day`.
    pub fn day(&self, day: usize) -> Option<&ScanEntry> {
        self.entries.iter().find(|entry| entry.day == day)
    }

    /// `(day, result)` for every priced step, in day order.
    pub fn priced(&self) -> impl Iterator<Item = (usize, &PricingResult)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result().map(|result| (entry.day, result)))
    }

    /// Entries that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries.iter().filter(|entry| !entry.is_priced())
    }

    /// Number of priced steps.
    pub fn priced_count(&self) -> usize {
        self.priced().count()
    }

    /// Total oracle evaluations over all priced steps.
    pub fn total_evaluations(&self) -> u64 {
        self.priced().map(|(_, result)| result.evaluations).sum()
    }
}

/// Drives one oracle over a time grid.
///
/// # Examples
///
/// ```rust
/// use lookback_core::{DistributionModel, MarketParams, PayoffSpec};
/// use lookback_engine::oracle::AnalyticOracle;
/// use lookback_engine::scan::{ScanConfig, StepOverrides, TimeGrid, TimeStepScanner};
///
/// let scanner = TimeStepScanner::new(
///     Box::new(AnalyticOracle::new()),
///     DistributionModel::new(5).unwrap(),
///     ScanConfig::default(),
/// );
/// let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
/// let scan = scanner
///     .scan(&TimeGrid::daily(10).unwrap(), &market, &StepOverrides::new(), &PayoffSpec::put(2.1))
///     .unwrap();
///
/// assert_eq!(scan.len(), 10);
/// assert_eq!(scan.entries()[0].day, 1);
/// ```
pub struct TimeStepScanner {
    oracle: Box<dyn PricingOracle>,
    model: DistributionModel,
    config: ScanConfig,
}

impl TimeStepScanner {
    /// Creates a scanner.
    pub fn new(oracle: Box<dyn PricingOracle>, model: DistributionModel, config: ScanConfig) -> Self {
        Self {
            oracle,
            model,
            config,
        }
    }

    /// The oracle used for every step.
    #[inline]
    pub fn oracle(&self) -> &dyn PricingOracle {
        self.oracle.as_ref()
    }

    /// The scanner configuration.
    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Prices every step of `grid`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for invalid market, payoff, overrides or config,
    ///   before any step is priced
    /// - `StepFailed` wrapping the earliest recoverable failure under
    ///   [`FailurePolicy::FailFast`]
    pub fn scan(
        &self,
        grid: &TimeGrid,
        market: &MarketParams,
        overrides: &StepOverrides,
        payoff: &PayoffSpec,
    ) -> Result<ScanResult> {
        self.config.validate()?;
        market.validate()?;
        payoff.validate()?;
        overrides.validate(grid.len(), market)?;

        let price = |step: usize| self.price_step(step, grid, market, overrides, payoff);

        let entries = match self.config.execution() {
            Execution::Sequential => self.assemble((0..grid.len()).map(price))?,
            Execution::Parallel { threads } => {
                let outcomes = parallel::parallel_map_steps(grid.len(), threads, price)?;
                self.assemble(outcomes.into_iter())?
            }
        };

        let scan = ScanResult::from_entries(entries);
        info!(
            oracle = self.oracle.name(),
            steps = scan.len(),
            priced = scan.priced_count(),
            skipped = scan.len() - scan.priced_count(),
            evaluations = scan.total_evaluations(),
            "scan complete"
        );
        Ok(scan)
    }

    fn price_step(
        &self,
        step: usize,
        grid: &TimeGrid,
        base: &MarketParams,
        overrides: &StepOverrides,
        payoff: &PayoffSpec,
    ) -> (ScanEntry, Option<LookbackError>) {
        let day = TimeGrid::day(step);
        let maturity = grid.maturities()[step];
        let market = overrides.market_for(step, base);

        let priced = self
            .model
            .derive(maturity, &market)
            .and_then(|dist| self.oracle.price(&dist, payoff, self.config.seed_for(step)));

        match priced {
            Ok(result) => {
                debug!(
                    day,
                    maturity,
                    volatility = market.volatility,
                    estimate = result.expected_payoff,
                    lower = result.confidence_interval.lower,
                    upper = result.confidence_interval.upper,
                    "priced step"
                );
                if result.strike_region.is_degenerate() {
                    warn!(
                        day,
                        strike = payoff.strike,
                        region = ?result.strike_region,
                        "strike outside discretised support"
                    );
                }
                let entry = ScanEntry {
                    step,
                    day,
                    maturity,
                    market,
                    outcome: StepOutcome::Priced(result),
                };
                (entry, None)
            }
            Err(err) => {
                let entry = ScanEntry {
                    step,
                    day,
                    maturity,
                    market,
                    outcome: StepOutcome::Skipped(err.clone()),
                };
                (entry, Some(err))
            }
        }
    }

    /// Applies the failure policy to step outcomes arriving in step order.
    fn assemble<I>(&self, outcomes: I) -> Result<Vec<ScanEntry>>
    where
        I: Iterator<Item = (ScanEntry, Option<LookbackError>)>,
    {
        let mut entries = Vec::new();
        for (entry, failure) in outcomes {
            if let Some(err) = failure {
                if !err.is_recoverable() {
                    return Err(err);
                }
                match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        return Err(LookbackError::StepFailed {
                            day: entry.day,
                            source: Box::new(err),
                        });
                    }
                    FailurePolicy::SkipAndContinue => {
                        warn!(day = entry.day, error = %err, "skipping step");
                    }
                }
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{AnalyticOracle, ConfidenceInterval};
    use lookback_core::StrikeRegion;

    fn market() -> MarketParams {
        MarketParams::new(2.0, 0.4, 0.0).unwrap()
    }

    fn scanner(config: ScanConfig) -> TimeStepScanner {
        TimeStepScanner::new(
            Box::new(AnalyticOracle::new()),
            DistributionModel::new(5).unwrap(),
            config,
        )
    }

    /// Oracle that fails to converge on chosen maturities.
    struct FlakyOracle {
        failing: Vec<f64>,
    }

    impl PricingOracle for FlakyOracle {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn price(
            &self,
            distribution: &lookback_core::DistributionParams,
            _payoff: &PayoffSpec,
            seed: u64,
        ) -> Result<PricingResult> {
            if self.failing.contains(&distribution.maturity()) {
                return Err(LookbackError::ConvergenceFailure {
                    iterations: 1,
                    shots: 1,
                    half_width: 1.0,
                    target: 0.1,
                });
            }
            Ok(PricingResult::new(
                distribution.maturity(),
                ConfidenceInterval::point(distribution.maturity()),
                StrikeRegion::Within,
                seed,
            ))
        }
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("skip".parse::<FailurePolicy>().unwrap(), FailurePolicy::SkipAndContinue);
        assert_eq!("fail-fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert!("retry".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::SkipAndContinue.to_string(), "skip-and-continue");
    }

    #[test]
    fn test_config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert_eq!(config.seed_scheme(), SeedScheme::Common);
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
        assert_eq!(config.execution(), Execution::Sequential);
        assert!(ScanConfig::builder().threads(0).build().is_err());
    }

    #[test]
    fn test_entries_in_day_order_with_effective_market() {
        let overrides = StepOverrides::new().with_volatility(2, 0.9);
        let scan = scanner(ScanConfig::default())
            .scan(&TimeGrid::daily(5).unwrap(), &market(), &overrides, &PayoffSpec::put(2.1))
            .unwrap();

        let days: Vec<usize> = scan.entries().iter().map(|e| e.day).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5]);
        assert_eq!(scan.day(3).unwrap().market.volatility, 0.9);
        assert_eq!(scan.day(4).unwrap().market.volatility, 0.4);
    }

    #[test]
    fn test_override_out_of_grid_is_fatal() {
        let overrides = StepOverrides::new().with_volatility(10, 0.9);
        let result = scanner(ScanConfig::default()).scan(
            &TimeGrid::daily(5).unwrap(),
            &market(),
            &overrides,
            &PayoffSpec::put(2.1),
        );
        assert!(matches!(result, Err(LookbackError::InvalidConfig(_))));
    }

    #[test]
    fn test_fail_fast_reports_earliest_day() {
        let grid = TimeGrid::from_maturities(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let oracle = FlakyOracle {
            failing: vec![0.2, 0.4],
        };
        for parallel in [false, true] {
            let config = ScanConfig::builder().parallel(parallel).threads(4).build().unwrap();
            let scanner = TimeStepScanner::new(
                Box::new(FlakyOracle {
                    failing: oracle.failing.clone(),
                }),
                DistributionModel::new(3).unwrap(),
                config,
            );
            let err = scanner
                .scan(&grid, &market(), &StepOverrides::new(), &PayoffSpec::put(2.1))
                .unwrap_err();
            match err {
                LookbackError::StepFailed { day, source } => {
                    assert_eq!(day, 2);
                    assert!(matches!(*source, LookbackError::ConvergenceFailure { .. }));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_skip_marks_days_absent() {
        let grid = TimeGrid::from_maturities(vec![0.0, 0.1, 0.2]).unwrap();
        let config = ScanConfig::builder()
            .failure_policy(FailurePolicy::SkipAndContinue)
            .build()
            .unwrap();
        let scan = scanner(config)
            .scan(&grid, &market(), &StepOverrides::new(), &PayoffSpec::put(2.1))
            .unwrap();

        assert_eq!(scan.len(), 3);
        assert_eq!(scan.priced_count(), 2);
        let skipped: Vec<usize> = scan.skipped().map(|e| e.day).collect();
        assert_eq!(skipped, vec![1]);
        assert!(matches!(
            scan.day(1).unwrap().error(),
            Some(LookbackError::DegenerateDistribution { .. })
        ));
        assert!(scan.day(1).unwrap().result().is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grid = TimeGrid::daily(30).unwrap();
        let overrides = StepOverrides::new().with_volatility(10, 0.7);
        let sequential = scanner(ScanConfig::default())
            .scan(&grid, &market(), &overrides, &PayoffSpec::put(2.1))
            .unwrap();
        let parallel = scanner(ScanConfig::builder().parallel(true).threads(3).build().unwrap())
            .scan(&grid, &market(), &overrides, &PayoffSpec::put(2.1))
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_seed_scheme_reaches_oracle() {
        let grid = TimeGrid::daily(3).unwrap();
        let config = ScanConfig::builder()
            .seed(5)
            .seed_scheme(SeedScheme::PerStep)
            .build()
            .unwrap();
        let scan = TimeStepScanner::new(
            Box::new(FlakyOracle { failing: vec![] }),
            DistributionModel::new(3).unwrap(),
            config.clone(),
        )
        .scan(&grid, &market(), &StepOverrides::new(), &PayoffSpec::put(2.1))
        .unwrap();

        // The test oracle echoes its seed as the evaluation count
        for (step, (_, result)) in scan.priced().enumerate() {
            assert_eq!(result.evaluations, config.seed_for(step));
        }
    }
}
