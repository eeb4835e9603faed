//! Black-Scholes prices for vanilla options.
//!
//! ## Mathematical Formulas
//!
//! In forward form, with forward F, total volatility v = σ√T and discount
//! factor D:
//!
//! **Call Price**: C = D·(F·N(d₁) - K·N(d₂))
//! **Put Price**: P = D·(K·N(-d₂) - F·N(-d₁))
//!
//! Where:
//! - d₁ = (ln(F/K) + v²/2) / v
//! - d₂ = d₁ - v

use super::distributions::norm_cdf;
use crate::types::{LookbackError, MarketParams, OptionKind, PayoffSpec, Result};

/// Continuously compounded discount factor `exp(-r·τ)`.
#[inline]
pub fn discount_factor(rate: f64, maturity: f64) -> f64 {
    (-rate * maturity).exp()
}

/// Black (1976) price from forward, total volatility and discount factor.
///
/// Falls back to discounted intrinsic value when `total_vol` is zero.
///
/// # Examples
/// ```
/// use lookback_core::analytical::black_price;
/// use lookback_core::types::OptionKind;
///
/// let call = black_price(OptionKind::Call, 100.0, 100.0, 0.2, 1.0);
/// let put = black_price(OptionKind::Put, 100.0, 100.0, 0.2, 1.0);
///
/// // At-the-money forward: call = put
/// assert!((call - put).abs() < 1e-12);
/// ```
pub fn black_price(
    kind: OptionKind,
    forward: f64,
    strike: f64,
    total_vol: f64,
    discount_factor: f64,
) -> f64 {
    if total_vol <= 0.0 {
        let intrinsic = match kind {
            OptionKind::Call => (forward - strike).max(0.0),
            OptionKind::Put => (strike - forward).max(0.0),
        };
        return discount_factor * intrinsic;
    }

    let d1 = ((forward / strike).ln() + 0.5 * total_vol * total_vol) / total_vol;
    let d2 = d1 - total_vol;

    let undiscounted = match kind {
        OptionKind::Call => forward * norm_cdf(d1) - strike * norm_cdf(d2),
        OptionKind::Put => strike * norm_cdf(-d2) - forward * norm_cdf(-d1),
    };
    // The CDF approximation can leave deep out-of-the-money prices a hair below zero
    discount_factor * undiscounted.max(0.0)
}

/// Black-Scholes price of a vanilla option with continuous dividend yield.
///
/// # Errors
/// Returns `InvalidConfig` for invalid market or payoff inputs, or a
/// negative maturity.
///
/// # Examples
/// ```
/// use lookback_core::analytical::black_scholes_price;
/// use lookback_core::types::{MarketParams, PayoffSpec};
///
/// let market = MarketParams::new(2.0, 0.4, 0.0).unwrap();
/// let price = black_scholes_price(&market, 40.0 / 365.0, &PayoffSpec::put(2.1)).unwrap();
/// assert!((price - 0.165).abs() < 2e-3);
/// ```
pub fn black_scholes_price(
    market: &MarketParams,
    maturity: f64,
    payoff: &PayoffSpec,
) -> Result<f64> {
    market.validate()?;
    payoff.validate()?;
    if !(maturity.is_finite() && maturity >= 0.0) {
        return Err(LookbackError::invalid_config(format!(
            "maturity must be non-negative, got {}",
            maturity
        )));
    }

    let forward = market.spot * ((market.rate - market.dividend) * maturity).exp();
    let total_vol = market.volatility * maturity.sqrt();
    Ok(black_price(
        payoff.kind,
        forward,
        payoff.strike,
        total_vol,
        discount_factor(market.rate, maturity),
    ))
}
