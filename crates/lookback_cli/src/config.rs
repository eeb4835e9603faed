//! Run configuration.
//!
//! A run is described by a TOML file:
//!
//! ```toml
//! log_level = "info"
//!
//! [market]
//! spot = 2.0
//! volatility = 0.4
//! rate = 0.0
//!
//! [grid]
//! days = 40
//!
//! [option]
//! kind = "put"
//! strike = 2.1
//!
//! [[overrides]]
//! step = 20
//! volatility = 0.9
//!
//! [oracle]
//! kind = "sampling"
//! n_paths = 100000
//!
//! [scan]
//! seed = 42
//! failure_policy = "fail-fast"
//! parallel = true
//! ```
//!
//! Values are resolved in priority order: CLI flags > environment variables >
//! file > defaults.
//!
//! # Environment Variables
//!
//! - `LOOKBACK_SEED`: base seed
//! - `LOOKBACK_LOG_LEVEL`: log level (trace, debug, info, warn, error)
//! - `LOOKBACK_PARALLEL`: parallel dispatch (true/false)
//! - `LOOKBACK_FAILURE_POLICY`: failure policy (fail-fast, skip)

use crate::error::{CliError, Result};
use lookback_core::{DistributionModel, MarketOverride, MarketParams, PayoffSpec};
use lookback_engine::oracle::{analytic, resolution, sampling, ResolutionConfig, SamplingConfig};
use lookback_engine::rng::SeedScheme;
use lookback_engine::scan::{StepOverrides, DEFAULT_DAY_COUNT, DEFAULT_SEED};
use lookback_engine::{
    FailurePolicy, LookbackRequest, OracleSelection, ScanConfig, TimeGrid, DEFAULT_RESOLUTION,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default number of sampled paths.
pub const DEFAULT_PATHS: usize = 100_000;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level
    #[default]
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(CliError::InvalidArgument(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Which pricing oracle to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OracleKind {
    /// Monte Carlo sampling.
    #[default]
    Sampling,
    /// Iterative amplitude estimation on the discretised payoff.
    #[serde(alias = "resolution")]
    ResolutionBounded,
    /// Black-Scholes closed form.
    Analytic,
}

impl FromStr for OracleKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sampling" | "mc" => Ok(OracleKind::Sampling),
            "resolution-bounded" | "resolution" => Ok(OracleKind::ResolutionBounded),
            "analytic" | "bs" => Ok(OracleKind::Analytic),
            other => Err(CliError::InvalidArgument(format!(
                "unknown oracle '{}': expected sampling, resolution-bounded or analytic",
                other
            ))),
        }
    }
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OracleKind::Sampling => sampling::NAME,
            OracleKind::ResolutionBounded => resolution::NAME,
            OracleKind::Analytic => analytic::NAME,
        };
        f.write_str(name)
    }
}

/// `[grid]`: either `days` daily steps or an explicit maturity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    /// Number of daily steps.
    pub days: Option<usize>,
    /// Days per year for the daily grid.
    pub day_count: f64,
    /// Explicit maturities in years; wins over `days`.
    pub maturities: Option<Vec<f64>>,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            days: None,
            day_count: DEFAULT_DAY_COUNT,
            maturities: None,
        }
    }
}

impl GridSection {
    /// Builds the time grid.
    pub fn to_grid(&self) -> Result<TimeGrid> {
        let grid = match (&self.maturities, self.days) {
            (Some(maturities), _) => TimeGrid::from_maturities(maturities.clone()),
            (None, Some(days)) => TimeGrid::daily_with_day_count(days, self.day_count),
            (None, None) => {
                return Err(CliError::Config(
                    "[grid] needs either `days` or `maturities`".to_string(),
                ))
            }
        };
        grid.map_err(|e| CliError::Config(e.to_string()))
    }
}

/// One `[[overrides]]` entry, keyed by zero-based step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Zero-based step index.
    pub step: usize,
    /// Fields to replace on that step.
    #[serde(flatten)]
    pub market: MarketOverride,
}

/// `[oracle]`: oracle choice, budgets and discretisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSection {
    /// Oracle to run.
    pub kind: OracleKind,
    /// Discretisation bits of each step's distribution.
    pub resolution: u32,
    /// Sampled paths (sampling).
    pub n_paths: usize,
    /// Increments per path (sampling).
    pub n_steps: usize,
    /// Significance level (sampling and resolution-bounded).
    pub alpha: f64,
    /// Report `mean ± z·se` rather than a point (sampling).
    pub report_interval: bool,
    /// Target amplitude half-width (resolution-bounded).
    pub epsilon: f64,
    /// Shots per refinement round (resolution-bounded).
    pub shots: u64,
    /// Payoff rescaling factor (resolution-bounded).
    pub rescaling_factor: f64,
    /// Refinement round limit (resolution-bounded).
    pub max_iterations: usize,
    /// Wall-clock budget per step in milliseconds (resolution-bounded).
    pub time_budget_ms: Option<u64>,
}

impl Default for OracleSection {
    fn default() -> Self {
        Self {
            kind: OracleKind::default(),
            resolution: DEFAULT_RESOLUTION,
            n_paths: DEFAULT_PATHS,
            n_steps: 1,
            alpha: sampling::DEFAULT_ALPHA,
            report_interval: true,
            epsilon: resolution::DEFAULT_EPSILON,
            shots: resolution::DEFAULT_SHOTS,
            rescaling_factor: resolution::DEFAULT_RESCALING_FACTOR,
            max_iterations: resolution::DEFAULT_MAX_ITERATIONS,
            time_budget_ms: None,
        }
    }
}

impl OracleSection {
    /// Builds the engine's oracle selection, validating budgets.
    pub fn to_selection(&self) -> Result<OracleSelection> {
        let selection = match self.kind {
            OracleKind::Sampling => SamplingConfig::builder()
                .n_paths(self.n_paths)
                .n_steps(self.n_steps)
                .alpha(self.alpha)
                .report_interval(self.report_interval)
                .build()
                .map(OracleSelection::Sampling),
            OracleKind::ResolutionBounded => {
                let mut builder = ResolutionConfig::builder()
                    .epsilon(self.epsilon)
                    .alpha(self.alpha)
                    .shots(self.shots)
                    .rescaling_factor(self.rescaling_factor)
                    .max_iterations(self.max_iterations);
                if let Some(ms) = self.time_budget_ms {
                    builder = builder.time_budget(Duration::from_millis(ms));
                }
                builder.build().map(OracleSelection::ResolutionBounded)
            }
            OracleKind::Analytic => Ok(OracleSelection::Analytic),
        };
        selection.map_err(|e| CliError::Config(e.to_string()))
    }
}

/// `[scan]`: seeding, dispatch and failure policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Base seed.
    pub seed: u64,
    /// Per-step seed derivation.
    pub seed_scheme: SeedScheme,
    /// Failure policy.
    pub failure_policy: FailurePolicy,
    /// Fan steps out over a thread pool.
    pub parallel: bool,
    /// Pool size; defaults to the number of CPUs.
    pub threads: Option<usize>,
}

impl Default for ScanSection {
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

impl ScanSection {
    /// Builds the scanner configuration.
    pub fn to_scan_config(&self) -> Result<ScanConfig> {
        let mut builder = ScanConfig::builder()
            .seed(self.seed)
            .seed_scheme(self.seed_scheme)
            .failure_policy(self.failure_policy)
            .parallel(self.parallel);
        if let Some(threads) = self.threads {
            builder = builder.threads(threads);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }
}

/// A complete run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Base market.
    pub market: MarketParams,
    /// Monitoring grid.
    #[serde(default)]
    pub grid: GridSection,
    /// Vanilla payoff priced at each step.
    pub option: PayoffSpec,
    /// Per-step market overrides.
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
    /// Oracle settings.
    #[serde(default)]
    pub oracle: OracleSection,
    /// Scan settings.
    #[serde(default)]
    pub scan: ScanSection,
}

/// Overrides taken from the command line. `None` keeps the lower-priority value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--oracle`
    pub oracle: Option<OracleKind>,
    /// `--paths`
    pub paths: Option<usize>,
    /// `--seed`
    pub seed: Option<u64>,
    /// `--policy`
    pub policy: Option<FailurePolicy>,
    /// `--parallel` or `--sequential`
    pub parallel: Option<bool>,
    /// `--log-level`
    pub log_level: Option<LogLevel>,
}

impl RunConfig {
    /// Parses a run file from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CliError::Parse(e.to_string()))
    }

    /// Loads a run file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Applies `LOOKBACK_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Applies `LOOKBACK_*` variables looked up through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup("LOOKBACK_SEED") {
            self.scan.seed = seed.trim().parse::<u64>().map_err(|_| CliError::Env {
                name: "LOOKBACK_SEED",
                reason: format!("'{}' is not an unsigned integer", seed),
            })?;
        }
        if let Some(level) = lookup("LOOKBACK_LOG_LEVEL") {
            self.log_level = level.parse::<LogLevel>().map_err(|e| CliError::Env {
                name: "LOOKBACK_LOG_LEVEL",
                reason: e.to_string(),
            })?;
        }
        if let Some(parallel) = lookup("LOOKBACK_PARALLEL") {
            self.scan.parallel = parse_bool(&parallel).ok_or_else(|| CliError::Env {
                name: "LOOKBACK_PARALLEL",
                reason: format!("'{}' is not a boolean", parallel),
            })?;
        }
        if let Some(policy) = lookup("LOOKBACK_FAILURE_POLICY") {
            self.scan.failure_policy = policy.parse::<FailurePolicy>().map_err(|e| CliError::Env {
                name: "LOOKBACK_FAILURE_POLICY",
                reason: format!("{}", e),
            })?;
        }
        Ok(())
    }

    /// Applies command line overrides.
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) {
        if let Some(kind) = cli.oracle {
            self.oracle.kind = kind;
        }
        if let Some(paths) = cli.paths {
            self.oracle.n_paths = paths;
        }
        if let Some(seed) = cli.seed {
            self.scan.seed = seed;
        }
        if let Some(policy) = cli.policy {
            self.scan.failure_policy = policy;
        }
        if let Some(parallel) = cli.parallel {
            self.scan.parallel = parallel;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
    }

    /// Per-step overrides, rejecting duplicate steps.
    pub fn step_overrides(&self) -> Result<StepOverrides> {
        let mut overrides = StepOverrides::new();
        for entry in &self.overrides {
            if overrides.get(entry.step).is_some() {
                return Err(CliError::Config(format!(
                    "step {} is overridden more than once",
                    entry.step
                )));
            }
            overrides.insert(entry.step, entry.market);
        }
        Ok(overrides)
    }

    /// Builds a fully validated pricing request.
    pub fn to_request(&self) -> Result<LookbackRequest> {
        let config_error = |e: lookback_core::LookbackError| CliError::Config(e.to_string());

        self.market.validate().map_err(config_error)?;
        self.option.validate().map_err(config_error)?;
        DistributionModel::new(self.oracle.resolution).map_err(config_error)?;

        let grid = self.grid.to_grid()?;
        let overrides = self.step_overrides()?;
        overrides
            .validate(grid.len(), &self.market)
            .map_err(config_error)?;

        Ok(LookbackRequest::new(
            self.market,
            grid,
            self.option,
            self.oracle.to_selection()?,
        )
        .with_overrides(overrides)
        .with_scan_config(self.scan.to_scan_config()?)
        .with_resolution(self.oracle.resolution))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Loads `path`, then applies environment and CLI overrides, then validates.
///
/// Priority: CLI > environment > file > defaults.
pub fn build_config(path: &Path, cli: &CliOverrides) -> Result<RunConfig> {
    let mut config = RunConfig::from_file(path)?;
    config.apply_env()?;
    config.merge_with_cli(cli);
    config.to_request()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookback_core::OptionKind;
    use std::collections::HashMap;
    use std::io::Write;

    const SCENARIO_B: &str = r#"
        [market]
        spot = 2.0
        volatility = 0.4
        rate = 0.0

        [grid]
        days = 40

        [option]
        kind = "put"
        strike = 2.1

        [[overrides]]
        step = 20
        volatility = 0.9

        [[overrides]]
        step = 21
        volatility = 0.9
    "#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_toml_deserialization() {
        let config = RunConfig::from_toml_str(SCENARIO_B).unwrap();

        assert_eq!(config.market.spot, 2.0);
        assert_eq!(config.market.dividend, 0.0);
        assert_eq!(config.grid.days, Some(40));
        assert_eq!(config.option.kind, OptionKind::Put);
        assert_eq!(config.overrides.len(), 2);
        assert_eq!(config.overrides[0].market.volatility, Some(0.9));
        assert_eq!(config.overrides[0].market.spot, None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RunConfig::from_toml_str(SCENARIO_B).unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.oracle.kind, OracleKind::Sampling);
        assert_eq!(config.oracle.n_paths, DEFAULT_PATHS);
        assert_eq!(config.oracle.resolution, DEFAULT_RESOLUTION);
        assert_eq!(config.scan.seed, DEFAULT_SEED);
        assert_eq!(config.scan.failure_policy, FailurePolicy::FailFast);
        assert!(!config.scan.parallel);
    }

    #[test]
    fn test_missing_market_is_parse_error() {
        let err = RunConfig::from_toml_str("[option]\nkind = \"put\"\nstrike = 2.1\n").unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }

    #[test]
    fn test_oracle_section() {
        let text = format!(
            "{}\n[oracle]\nkind = \"resolution-bounded\"\nepsilon = 0.002\nshots = 200\nresolution = 6\n",
            SCENARIO_B
        );
        let config = RunConfig::from_toml_str(&text).unwrap();
        let request = config.to_request().unwrap();

        assert_eq!(request.resolution, 6);
        match request.oracle {
            OracleSelection::ResolutionBounded(resolution) => {
                assert_eq!(resolution.epsilon(), 0.002);
                assert_eq!(resolution.shots(), 200);
            }
            other => panic!("unexpected oracle {other:?}"),
        }
    }

    #[test]
    fn test_to_request() {
        let request = RunConfig::from_toml_str(SCENARIO_B)
            .unwrap()
            .to_request()
            .unwrap();

        assert_eq!(request.grid.len(), 40);
        assert_eq!(request.overrides.len(), 2);
        assert_eq!(request.payoff.strike, 2.1);
        assert!(matches!(request.oracle, OracleSelection::Sampling(_)));
    }

    #[test]
    fn test_explicit_maturities_win_over_days() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config.overrides.clear();
        config.grid.maturities = Some(vec![0.1, 0.2, 0.5]);

        let grid = config.grid.to_grid().unwrap();
        assert_eq!(grid.maturities(), &[0.1, 0.2, 0.5]);
    }

    #[test]
    fn test_empty_grid_section_is_rejected() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config.grid = GridSection::default();
        assert!(matches!(config.to_request(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_out_of_grid_override_is_rejected() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config.grid.days = Some(10);
        assert!(matches!(config.to_request(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_duplicate_override_is_rejected() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config.overrides[1].step = 20;
        assert!(matches!(config.step_overrides(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_budget_is_rejected() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config.oracle.n_paths = 0;
        assert!(matches!(config.to_request(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config
            .apply_env_with(env(&[
                ("LOOKBACK_SEED", "7"),
                ("LOOKBACK_LOG_LEVEL", "debug"),
                ("LOOKBACK_PARALLEL", "true"),
                ("LOOKBACK_FAILURE_POLICY", "skip"),
            ]))
            .unwrap();

        assert_eq!(config.scan.seed, 7);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.scan.parallel);
        assert_eq!(config.scan.failure_policy, FailurePolicy::SkipAndContinue);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        let err = config
            .apply_env_with(env(&[("LOOKBACK_SEED", "minus one")]))
            .unwrap_err();
        assert!(matches!(err, CliError::Env { name: "LOOKBACK_SEED", .. }));
    }

    #[test]
    fn test_cli_beats_env() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config
            .apply_env_with(env(&[("LOOKBACK_SEED", "7")]))
            .unwrap();
        config.merge_with_cli(&CliOverrides {
            seed: Some(11),
            oracle: Some(OracleKind::Analytic),
            ..Default::default()
        });

        assert_eq!(config.scan.seed, 11);
        assert_eq!(config.oracle.kind, OracleKind::Analytic);
        assert_eq!(config.scan.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_cli_can_disable_parallel_from_env() {
        let mut config = RunConfig::from_toml_str(SCENARIO_B).unwrap();
        config
            .apply_env_with(env(&[("LOOKBACK_PARALLEL", "true")]))
            .unwrap();
        assert!(config.scan.parallel);

        config.merge_with_cli(&CliOverrides {
            parallel: Some(false),
            ..Default::default()
        });
        assert!(!config.scan.parallel);
    }

    #[test]
    fn test_build_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO_B.as_bytes()).unwrap();

        let cli = CliOverrides {
            paths: Some(5_000),
            ..Default::default()
        };
        let config = build_config(file.path(), &cli).unwrap();
        assert_eq!(config.oracle.n_paths, 5_000);
    }

    #[test]
    fn test_build_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            build_config(&path, &CliOverrides::default()),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_sample_run_files_are_valid() {
        let configs = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs");
        for name in ["scenario_a.toml", "scenario_b.toml"] {
            let config = RunConfig::from_file(&configs.join(name)).unwrap();
            assert!(config.to_request().is_ok(), "{name}");
        }

        let b = RunConfig::from_file(&configs.join("scenario_b.toml")).unwrap();
        assert_eq!(b.oracle.kind, OracleKind::ResolutionBounded);
        assert_eq!(b.scan.failure_policy, FailurePolicy::SkipAndContinue);
        assert_eq!(b.step_overrides().unwrap().len(), 2);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("trace".parse::<LogLevel>().unwrap().as_filter_str(), "trace");
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_oracle_kind_from_str() {
        assert_eq!("mc".parse::<OracleKind>().unwrap(), OracleKind::Sampling);
        assert_eq!(
            "resolution".parse::<OracleKind>().unwrap(),
            OracleKind::ResolutionBounded
        );
        assert_eq!(OracleKind::ResolutionBounded.to_string(), "resolution-bounded");
        assert!("quantum".parse::<OracleKind>().is_err());
    }
}
