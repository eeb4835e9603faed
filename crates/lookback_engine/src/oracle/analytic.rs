//! Closed-form reference oracle.

use super::{PricingOracle, PricingResult};
use lookback_core::analytical::black_price;
use lookback_core::types::{PayoffSpec, Result};
use lookback_core::DistributionParams;

/// Identifier reported by [`AnalyticOracle::name`].
pub const NAME: &str = "analytic";

/// Black-Scholes price read off the step's log-normal parameters.
///
/// The forward is the distribution mean and the total volatility is the
/// log-space standard deviation. The seed is ignored and the interval is a
/// point.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyticOracle;

impl AnalyticOracle {
    /// Creates the oracle.
    pub fn new() -> Self {
        Self
    }
}

impl PricingOracle for AnalyticOracle {
    fn name(&self) -> &'static str {
        NAME
    }

    fn price(
        &self,
        distribution: &DistributionParams,
        payoff: &PayoffSpec,
        _seed: u64,
    ) -> Result<PricingResult> {
        payoff.validate()?;
        let value = black_price(
            payoff.kind,
            distribution.mean(),
            payoff.strike,
            distribution.sigma(),
            distribution.discount_factor(),
        );
        let region = payoff.strike_region(distribution.low(), distribution.high());
        Ok(PricingResult::exact(value, region, 0))
    }
}
