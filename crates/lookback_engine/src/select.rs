//! Reduction of a scan to the reported lookback value.

use crate::oracle::ConfidenceInterval;
use crate::scan::ScanResult;
use lookback_core::types::{LookbackError, OptionKind, Result};

/// Reported lookback value: the best per-day expected payoff.
///
/// The interval is the winning day's interval, carried over unchanged. It
/// brackets that day's estimate, not the maximum over all days, and so
/// understates the uncertainty of the max statistic.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookbackEstimate {
    /// Maximum per-day discounted expected payoff.
    pub value: f64,
    /// Interval of the winning day.
    pub confidence_interval: ConfidenceInterval,
    /// One-based day of the maximum.
    pub day: usize,
    /// Maturity of the winning day in years.
    pub maturity: f64,
    /// Option kind of the priced payoff.
    pub kind: OptionKind,
}

/// Picks the day with the largest expected payoff.
///
/// Selection is a maximum for calls and puts alike; the option kind only
/// shapes each day's vanilla payoff. Ties go to the earliest day. Skipped
/// days never compete.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtremumSelector;

impl ExtremumSelector {
    /// Creates a selector.
    pub fn new() -> Self {
        Self
    }

    /// Reduces `scan` to a [`LookbackEstimate`].
    ///
    /// # Errors
    ///
    /// Returns `EmptyScan` if no day was priced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lookback_core::{MarketParams, OptionKind, StrikeRegion};
    /// use lookback_engine::oracle::PricingResult;
    /// use lookback_engine::scan::{ScanEntry, ScanResult, StepOutcome};
    /// use lookback_engine::select::ExtremumSelector;
    ///
    /// let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
    /// let entry = |step: usize, value: f64| ScanEntry {
    ///     step,
    ///     day: step + 1,
    ///     maturity: (step + 1) as f64 / 365.0,
    ///     market,
    ///     outcome: StepOutcome::Priced(PricingResult::exact(value, StrikeRegion::Within, 0)),
    /// };
    /// let scan = ScanResult::from_entries(vec![entry(0, 0.1), entry(1, 0.3), entry(2, 0.3)]);
    ///
    /// let best = ExtremumSelector::new().select(&scan, OptionKind::Put).unwrap();
    /// assert_eq!(best.day, 2);
    /// assert_eq!(best.value, 0.3);
    /// ```
    pub fn select(&self, scan: &ScanResult, kind: OptionKind) -> Result<LookbackEstimate> {
        let mut best: Option<LookbackEstimate> = None;

        for entry in scan.entries() {
            let Some(result) = entry.result() else {
                continue;
            };
            let better = best.map_or(true, |b| result.expected_payoff > b.value);
            if better {
                best = Some(LookbackEstimate {
                    value: result.expected_payoff,
                    confidence_interval: result.confidence_interval,
                    day: entry.day,
                    maturity: entry.maturity,
                    kind,
                });
            }
        }

        best.ok_or(LookbackError::EmptyScan)
    }
}
