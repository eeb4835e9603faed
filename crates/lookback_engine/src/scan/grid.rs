//! Monitoring grid and per-step market overrides.

use lookback_core::types::{LookbackError, MarketOverride, MarketParams, Result};
use std::collections::BTreeMap;

/// Default day-count basis of the daily grid.
pub const DEFAULT_DAY_COUNT: f64 = 365.0;

/// Strictly increasing list of maturities, one per monitored step.
///
/// Step `i` (zero-based) is reported as day `i + 1`.
///
/// # Examples
///
/// ```rust
/// use lookback_engine::scan::TimeGrid;
///
/// let grid = TimeGrid::daily(40).unwrap();
/// assert_eq!(grid.len(), 40);
/// assert_eq!(grid.maturity(39), Some(40.0 / 365.0));
/// assert_eq!(TimeGrid::day(39), 40);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    maturities: Vec<f64>,
}

impl TimeGrid {
    /// Daily grid on an Act/365 basis: step `i` matures at `(i + 1) / 365`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `days` is 0.
    pub fn daily(days: usize) -> Result<Self> {
        Self::daily_with_day_count(days, DEFAULT_DAY_COUNT)
    }

    /// Daily grid with a custom day-count basis.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `days` is 0 or `day_count` is not positive.
    pub fn daily_with_day_count(days: usize, day_count: f64) -> Result<Self> {
        if days == 0 {
            return Err(LookbackError::invalid_config("grid must have at least one step"));
        }
        if !(day_count.is_finite() && day_count > 0.0) {
            return Err(LookbackError::invalid_config(format!(
                "day count must be positive, got {}",
                day_count
            )));
        }
        let maturities = (1..=days).map(|d| d as f64 / day_count).collect();
        Ok(Self { maturities })
    }

    /// Grid from explicit maturities in years.
    ///
    /// A zero maturity is accepted; pricing that step yields a degenerate
    /// distribution, handled by the failure policy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the list is empty, contains a negative or
    /// non-finite value, or is not strictly increasing.
    pub fn from_maturities(maturities: Vec<f64>) -> Result<Self> {
        if maturities.is_empty() {
            return Err(LookbackError::invalid_config("grid must have at least one step"));
        }
        if let Some(bad) = maturities.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
            return Err(LookbackError::invalid_config(format!(
                "maturities must be finite and non-negative, got {}",
                bad
            )));
        }
        if maturities.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LookbackError::invalid_config(
                "maturities must be strictly increasing",
            ));
        }
        Ok(Self { maturities })
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.maturities.len()
    }

    /// Always false for a constructed grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.maturities.is_empty()
    }

    /// Maturity of zero-based `step`.
    #[inline]
    pub fn maturity(&self, step: usize) -> Option<f64> {
        self.maturities.get(step).copied()
    }

    /// All maturities in step order.
    #[inline]
    pub fn maturities(&self) -> &[f64] {
        &self.maturities
    }

    /// One-based day label of zero-based `step`.
    #[inline]
    pub fn day(step: usize) -> usize {
        step + 1
    }
}

/// Partial market overrides keyed by zero-based step.
///
/// Steps without an entry use the base market unchanged.
///
/// # Examples
///
/// ```rust
/// use lookback_core::MarketParams;
/// use lookback_engine::scan::StepOverrides;
///
/// let base = MarketParams::new(2.0, 0.4, 0.0).unwrap();
/// let overrides = StepOverrides::new()
///     .with_volatility(20, 0.9)
///     .with_volatility(21, 0.9);
///
/// assert_eq!(overrides.market_for(20, &base).volatility, 0.9);
/// assert_eq!(overrides.market_for(22, &base).volatility, 0.4);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOverrides {
    entries: BTreeMap<usize, MarketOverride>,
}

impl StepOverrides {
    /// Empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the override for `step`.
    pub fn with(mut self, step: usize, market: MarketOverride) -> Self {
        self.insert(step, market);
        self
    }

    /// Adds a volatility-only override for `step`.
    pub fn with_volatility(self, step: usize, volatility: f64) -> Self {
        self.with(step, MarketOverride::volatility(volatility))
    }

    /// Adds or replaces the override for `step`.
    pub fn insert(&mut self, step: usize, market: MarketOverride) {
        self.entries.insert(step, market);
    }

    /// Override registered for `step`.
    #[inline]
    pub fn get(&self, step: usize) -> Option<&MarketOverride> {
        self.entries.get(&step)
    }

    /// Number of overridden steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no step is overridden.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(step, override)` in step order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MarketOverride)> {
        self.entries.iter().map(|(step, market)| (*step, market))
    }

    /// Effective market for `step`.
    pub fn market_for(&self, step: usize, base: &MarketParams) -> MarketParams {
        match self.entries.get(&step) {
            Some(market) => market.apply(base),
            None => *base,
        }
    }

    /// Checks every override against a grid of `steps` steps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a key lies beyond the grid or a merged
    /// market is invalid.
    pub fn validate(&self, steps: usize, base: &MarketParams) -> Result<()> {
        for (step, market) in self.iter() {
            if step >= steps {
                return Err(LookbackError::invalid_config(format!(
                    "override for step {} outside grid of {} steps",
                    step, steps
                )));
            }
            market.apply(base).validate().map_err(|e| {
                LookbackError::invalid_config(format!("override for step {}: {}", step, e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_daily_grid() {
        let grid = TimeGrid::daily(3).unwrap();
        assert_eq!(grid.len(), 3);
        assert_relative_eq!(grid.maturity(0).unwrap(), 1.0 / 365.0);
        assert_relative_eq!(grid.maturity(2).unwrap(), 3.0 / 365.0);
        assert_eq!(grid.maturity(3), None);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_custom_day_count() {
        let grid = TimeGrid::daily_with_day_count(2, 252.0).unwrap();
        assert_relative_eq!(grid.maturity(1).unwrap(), 2.0 / 252.0);
        assert!(TimeGrid::daily_with_day_count(2, 0.0).is_err());
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(matches!(
            TimeGrid::daily(0),
            Err(LookbackError::InvalidConfig(_))
        ));
        assert!(TimeGrid::from_maturities(vec![]).is_err());
    }

    #[test]
    fn test_explicit_maturities() {
        assert!(TimeGrid::from_maturities(vec![0.0, 0.1, 0.2]).is_ok());
        assert!(TimeGrid::from_maturities(vec![0.1, 0.1]).is_err());
        assert!(TimeGrid::from_maturities(vec![0.2, 0.1]).is_err());
        assert!(TimeGrid::from_maturities(vec![-0.1, 0.1]).is_err());
        assert!(TimeGrid::from_maturities(vec![0.1, f64::NAN]).is_err());
    }

    #[test]
    fn test_overrides_validate_range() {
        let base = MarketParams::new(2.0, 0.4, 0.0).unwrap();
        let overrides = StepOverrides::new().with_volatility(5, 0.9);

        assert!(overrides.validate(6, &base).is_ok());
        assert!(matches!(
            overrides.validate(5, &base),
            Err(LookbackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overrides_validate_merged_market() {
        let base = MarketParams::new(2.0, 0.4, 0.0).unwrap();
        let overrides = StepOverrides::new().with_volatility(0, -0.9);
        assert!(overrides.validate(10, &base).is_err());
    }

    #[test]
    fn test_overrides_iterate_in_step_order() {
        let overrides = StepOverrides::new()
            .with_volatility(21, 0.9)
            .with_volatility(20, 0.9);
        let steps: Vec<usize> = overrides.iter().map(|(s, _)| s).collect();
        assert_eq!(steps, vec![20, 21]);
        assert_eq!(overrides.len(), 2);
    }
}
