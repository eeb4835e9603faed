//! Closed-form helpers.
//!
//! - [`distributions`]: standard normal CDF, PDF and quantile
//! - [`black_scholes`]: vanilla option prices under a log-normal terminal law,
//!   and the discount factor shared with the per-step distribution
//!
//! These back the analytic oracle and serve as the reference against which
//! the estimators are checked.

pub mod black_scholes;
pub mod distributions;

pub use black_scholes::{black_price, black_scholes_price, discount_factor};
pub use distributions::{norm_cdf, norm_pdf, norm_quantile};
