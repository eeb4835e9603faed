//! Single entry point: scan, then select.

use crate::oracle::OracleSelection;
use crate::scan::{ScanConfig, ScanResult, StepOverrides, TimeGrid, TimeStepScanner};
use crate::select::{ExtremumSelector, LookbackEstimate};
use lookback_core::types::{MarketParams, PayoffSpec, Result};
use lookback_core::DistributionModel;
use tracing::info;

/// Default number of discretisation bits per step.
pub const DEFAULT_RESOLUTION: u32 = 5;

/// Everything needed to price one fixed-strike lookback.
#[derive(Clone, Debug)]
pub struct LookbackRequest {
    /// Base market, shared by all steps.
    pub market: MarketParams,
    /// Monitoring grid.
    pub grid: TimeGrid,
    /// Per-step market overrides.
    pub overrides: StepOverrides,
    /// Vanilla payoff priced at every step.
    pub payoff: PayoffSpec,
    /// Oracle and its budget.
    pub oracle: OracleSelection,
    /// Seeding, dispatch and failure policy.
    pub scan: ScanConfig,
    /// Discretisation bits of each step's distribution.
    pub resolution: u32,
}

impl LookbackRequest {
    /// Request with no overrides, default scan settings and default resolution.
    pub fn new(
        market: MarketParams,
        grid: TimeGrid,
        payoff: PayoffSpec,
        oracle: OracleSelection,
    ) -> Self {
        Self {
            market,
            grid,
            overrides: StepOverrides::default(),
            payoff,
            oracle,
            scan: ScanConfig::default(),
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Replaces the overrides.
    pub fn with_overrides(mut self, overrides: StepOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the scan configuration.
    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Replaces the resolution.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Lookback value plus the full scan behind it.
#[derive(Clone, Debug, PartialEq)]
pub struct LookbackReport {
    /// Selected value, interval and day.
    pub estimate: LookbackEstimate,
    /// Every step's outcome, in day order.
    pub scan: ScanResult,
    /// Name of the oracle used.
    pub oracle: &'static str,
}

/// Prices a fixed-strike lookback as the best per-day vanilla price.
///
/// # Errors
///
/// - `InvalidConfig` for any invalid input, before pricing starts
/// - `StepFailed` if a day fails under the fail-fast policy
/// - `EmptyScan` if every day was skipped
///
/// # Examples
///
/// ```rust
/// use lookback_core::{MarketParams, PayoffSpec};
/// use lookback_engine::oracle::OracleSelection;
/// use lookback_engine::scan::TimeGrid;
/// use lookback_engine::{price_lookback, LookbackRequest};
///
/// let request = LookbackRequest::new(
///     MarketParams::new(2.0, 0.4, 0.0).unwrap(),
///     TimeGrid::daily(40).unwrap(),
///     PayoffSpec::put(2.1),
///     OracleSelection::Analytic,
/// );
/// let report = price_lookback(&request).unwrap();
///
/// assert_eq!(report.estimate.day, 40);
/// assert!((report.estimate.value - 0.165).abs() < 2e-3);
/// ```
pub fn price_lookback(request: &LookbackRequest) -> Result<LookbackReport> {
    let model = DistributionModel::new(request.resolution)?;
    let scanner = TimeStepScanner::new(request.oracle.build(), model, request.scan.clone());

    let scan = scanner.scan(
        &request.grid,
        &request.market,
        &request.overrides,
        &request.payoff,
    )?;
    let estimate = ExtremumSelector::new().select(&scan, request.payoff.kind)?;

    info!(
        oracle = request.oracle.name(),
        value = estimate.value,
        lower = estimate.confidence_interval.lower,
        upper = estimate.confidence_interval.upper,
        day = estimate.day,
        "lookback priced"
    );

    Ok(LookbackReport {
        estimate,
        scan,
        oracle: request.oracle.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookback_core::LookbackError;

    fn request() -> LookbackRequest {
        LookbackRequest::new(
            MarketParams::new(2.0, 0.4, 0.0).unwrap(),
            TimeGrid::daily(40).unwrap(),
            PayoffSpec::put(2.1),
            OracleSelection::Analytic,
        )
    }

    #[test]
    fn test_shocked_days_move_the_maximum() {
        let overrides = StepOverrides::new()
            .with_volatility(20, 0.9)
            .with_volatility(21, 0.9);
        let report = price_lookback(&request().with_overrides(overrides)).unwrap();

        assert_eq!(report.estimate.day, 22);
        assert!(report.estimate.value > 0.23 && report.estimate.value < 0.25);
        assert_eq!(report.oracle, "analytic");
        assert_eq!(report.scan.len(), 40);
    }

    #[test]
    fn test_invalid_resolution_is_config_error() {
        let result = price_lookback(&request().with_resolution(0));
        assert!(matches!(result, Err(LookbackError::InvalidConfig(_))));
    }
}
