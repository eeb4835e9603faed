//! Standard normal distribution functions.
//!
//! - `norm_cdf`: cumulative distribution function
//! - `norm_pdf`: probability density function, behind the log-normal grid weights
//! - `norm_quantile`: inverse CDF, used to turn a confidence level into a
//!   critical value
//!
//! `norm_cdf` and `norm_pdf` are generic over `T: Float`.

use num_traits::Float;

/// Square root of 2.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function approximation using Horner's method.
///
/// Abramowitz and Stegun formula 7.1.26, maximum error 1.5e-7.
#[inline]
fn erfc_approx<T: Float>(x: T) -> T {
    let one = T::one();
    let abs_x = x.abs();

    let a1 = T::from(0.254829592).unwrap_or(T::zero());
    let a2 = T::from(-0.284496736).unwrap_or(T::zero());
    let a3 = T::from(1.421413741).unwrap_or(T::zero());
    let a4 = T::from(-1.453152027).unwrap_or(T::zero());
    let a5 = T::from(1.061405429).unwrap_or(T::zero());
    let p = T::from(0.3275911).unwrap_or(T::zero());

    let t = one / (one + p * abs_x);
    let poly = a1 + t * (a2 + t * (a3 + t * (a4 + t * a5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < T::zero() {
        (one + one) - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal cumulative distribution function.
///
/// Φ(x) = (1/2) * erfc(-x / sqrt(2)), accurate to about 1e-7.
///
/// # Examples
/// ```
/// use lookback_core::analytical::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert!(norm_cdf(3.0_f64) > 0.99);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    let sqrt_2 = T::from(SQRT_2).unwrap_or(T::one());
    let half = T::from(0.5).unwrap_or(T::zero());
    half * erfc_approx(-x / sqrt_2)
}

/// Standard normal probability density function.
///
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    let frac_1_sqrt_2pi = T::from(FRAC_1_SQRT_2PI).unwrap_or(T::zero());
    let half = T::from(0.5).unwrap_or(T::zero());
    frac_1_sqrt_2pi * (-half * x * x).exp()
}

/// Standard normal quantile (inverse CDF).
///
/// Beasley-Springer-Moro approximation: rational function in the central
/// region `|p - 0.5| <= 0.42`, Chebyshev series in log-log space in the
/// tails. Returns `NaN` for `p` outside `(0, 1)`.
///
/// # Examples
/// ```
/// use lookback_core::analytical::norm_quantile;
///
/// assert!((norm_quantile(0.975) - 1.959964).abs() < 1e-5);
/// assert!(norm_quantile(0.5).abs() < 1e-12);
/// ```
pub fn norm_quantile(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    const A: [f64; 4] = [2.50662823884, -18.61500062529, 41.39119773534, -25.44106049637];
    const B: [f64; 4] = [-8.47351093090, 23.08336743743, -21.06224101826, 3.13082909833];
    const C: [f64; 9] = [
        0.3374754822726147,
        0.9761690190917186,
        0.1607979714918209,
        0.0276438810333863,
        0.0038405729373609,
        0.0003951896511919,
        0.0000321767881768,
        0.0000002888167364,
        0.0000003960315187,
    ];

    let y = p - 0.5;
    if y.abs() <= 0.42 {
        let r = y * y;
        let numer = A[0] + r * (A[1] + r * (A[2] + r * A[3]));
        let denom = 1.0 + r * (B[0] + r * (B[1] + r * (B[2] + r * B[3])));
        return y * numer / denom;
    }

    let r = if y < 0.0 { p } else { 1.0 - p };
    let s = (-r.ln()).ln();
    let z = C
        .iter()
        .rev()
        .fold(0.0, |acc, &coefficient| acc * s + coefficient);

    if y < 0.0 {
        -z
    } else {
        z
    }
}
