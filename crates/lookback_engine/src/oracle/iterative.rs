//! Iterative amplitude estimation, emulated classically.
//!
//! Estimates an amplitude `a = sin²(2π·θ)` with `θ ∈ [0, 1/4]` by repeatedly
//! sampling the amplified success probability `sin²((2k+1)·2π·θ)` for a
//! growing power `k` and intersecting the resulting Chernoff-Hoeffding
//! intervals into an ever narrower interval for `θ`.
//!
//! Each round picks the largest `k` for which the current `θ` interval,
//! scaled by `4k + 2`, still falls inside a single half circle; scaling grows
//! by at least a factor of two between distinct powers. Consecutive rounds at
//! the same power pool their shots. The loop stops once the `θ` interval is
//! narrower than `epsilon / π`, which bounds the amplitude half-width by
//! `epsilon`.

use super::CancelToken;
use crate::rng::StepRng;
use lookback_core::types::{LookbackError, Result};
use std::f64::consts::PI;
use std::time::Instant;
use tracing::trace;

/// Minimum growth of the scaling factor between distinct powers.
const MIN_RATIO: f64 = 2.0;

/// Outcome of one amplitude estimation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmplitudeEstimate {
    /// Midpoint of the final amplitude interval.
    pub amplitude: f64,
    /// Lower amplitude bound.
    pub lower: f64,
    /// Upper amplitude bound.
    pub upper: f64,
    /// Refinement rounds executed.
    pub iterations: usize,
    /// Total shots sampled.
    pub shots: u64,
}

impl AmplitudeEstimate {
    /// Half-width of the amplitude interval.
    #[inline]
    pub fn half_width(&self) -> f64 {
        0.5 * (self.upper - self.lower)
    }
}

/// Budget and stopping rule of one estimation.
#[derive(Clone, Debug)]
pub struct AmplitudeEstimator {
    /// Target half-width of the amplitude interval.
    pub epsilon: f64,
    /// Significance level of the final interval.
    pub alpha: f64,
    /// Shots per round.
    pub shots: u64,
    /// Maximum number of rounds.
    pub max_iterations: usize,
    /// Wall-clock deadline, checked once per round.
    pub deadline: Option<Instant>,
    /// Cancellation flag, checked once per round.
    pub cancel: Option<CancelToken>,
}

impl AmplitudeEstimator {
    /// Upper bound on the number of distinct powers, used to split `alpha`.
    pub fn max_rounds(&self) -> usize {
        let bound = (MIN_RATIO * PI / 8.0 / self.epsilon).ln() / MIN_RATIO.ln();
        bound.max(0.0) as usize + 1
    }

    /// Estimates `amplitude` by sampling from `rng`.
    ///
    /// # Errors
    ///
    /// - `ConvergenceFailure` if `max_iterations` rounds do not reach `epsilon`
    /// - `Cancelled` if the token is tripped or the deadline passes
    pub fn estimate(&self, amplitude: f64, rng: &mut StepRng) -> Result<AmplitudeEstimate> {
        let true_angle = amplitude.clamp(0.0, 1.0).sqrt().asin();
        let max_rounds = self.max_rounds();

        let mut theta_l = 0.0_f64;
        let mut theta_u = 0.25_f64;
        let mut upper_half_circle = true;

        let mut powers: Vec<u64> = vec![0];
        let mut one_counts: Vec<u64> = Vec::new();
        let mut iterations = 0usize;
        let mut total_shots = 0u64;

        while theta_u - theta_l > self.epsilon / PI {
            if iterations >= self.max_iterations {
                let (a_l, a_u) = (amplitude_of(theta_l), amplitude_of(theta_u));
                return Err(LookbackError::ConvergenceFailure {
                    iterations,
                    shots: total_shots,
                    half_width: 0.5 * (a_u - a_l),
                    target: self.epsilon,
                });
            }
            self.check_interrupt(iterations)?;
            iterations += 1;

            let previous = powers.last().copied().unwrap_or(0);
            let (k, upper) = find_next_k(previous, upper_half_circle, theta_l, theta_u);
            upper_half_circle = upper;
            powers.push(k);

            let p = (((2 * k + 1) as f64) * true_angle).sin().powi(2);
            let ones = rng.binomial(self.shots, p)?;
            one_counts.push(ones);
            total_shots += self.shots;

            // Pool rounds that share the current power
            let mut round_shots = self.shots;
            let mut round_ones = ones;
            let mut j = 1;
            while iterations > j && powers[iterations - j] == k {
                round_shots += self.shots;
                round_ones += one_counts[iterations - j - 1];
                j += 1;
            }

            let rate = round_ones as f64 / round_shots as f64;
            let (a_min, a_max) = hoeffding_interval(rate, round_shots, max_rounds, self.alpha);

            let (theta_min_i, theta_max_i) = if upper_half_circle {
                (
                    (1.0 - 2.0 * a_min).acos() / (2.0 * PI),
                    (1.0 - 2.0 * a_max).acos() / (2.0 * PI),
                )
            } else {
                (
                    1.0 - (1.0 - 2.0 * a_max).acos() / (2.0 * PI),
                    1.0 - (1.0 - 2.0 * a_min).acos() / (2.0 * PI),
                )
            };

            // Both bounds share the period of the lower bound; an upper bound
            // sitting exactly on a period boundary must not roll into the next
            let scaling = (4 * k + 2) as f64;
            let period = (scaling * theta_l).floor();
            theta_u = (period + theta_max_i) / scaling;
            theta_l = (period + theta_min_i) / scaling;

            trace!(
                round = iterations,
                k,
                ones,
                theta_l,
                theta_u,
                "amplitude refinement round"
            );
        }

        let lower = amplitude_of(theta_l);
        let upper = amplitude_of(theta_u);
        Ok(AmplitudeEstimate {
            amplitude: 0.5 * (lower + upper),
            lower,
            upper,
            iterations,
            shots: total_shots,
        })
    }

    fn check_interrupt(&self, iterations: usize) -> Result<()> {
        let cancelled = self.cancel.as_ref().is_some_and(CancelToken::is_cancelled);
        let expired = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if cancelled || expired {
            return Err(LookbackError::Cancelled { iterations });
        }
        Ok(())
    }
}

#[inline]
fn amplitude_of(theta: f64) -> f64 {
    (2.0 * PI * theta).sin().powi(2)
}

/// Two-sided Hoeffding interval for a Bernoulli rate, at level
/// `alpha / max_rounds`, clipped to [0, 1].
fn hoeffding_interval(rate: f64, shots: u64, max_rounds: usize, alpha: f64) -> (f64, f64) {
    let eps = ((2.0 * max_rounds as f64 / alpha).ln() / (2.0 * shots as f64)).sqrt();
    ((rate - eps).max(0.0), (rate + eps).min(1.0))
}

/// Largest power `k` whose scaled interval `(4k+2)·[θ_l, θ_u]` stays inside
/// one half circle, or the current power if none grows by `MIN_RATIO`.
fn find_next_k(k: u64, upper_half_circle: bool, theta_l: f64, theta_u: f64) -> (u64, bool) {
    let old_scaling = (4 * k + 2) as f64;
    let max_scaling = (1.0 / (2.0 * (theta_u - theta_l))) as i64;
    let mut scaling = max_scaling - (max_scaling - 2).rem_euclid(4);

    while scaling as f64 >= MIN_RATIO * old_scaling {
        let s = scaling as f64;
        let theta_min = s * theta_l - (s * theta_l).floor();
        let theta_max = s * theta_u - (s * theta_u).floor();

        if theta_min <= theta_max && theta_max <= 0.5 {
            return (((scaling - 2) / 4) as u64, true);
        }
        if theta_max >= 0.5 && theta_max >= theta_min && theta_min >= 0.5 {
            return (((scaling - 2) / 4) as u64, false);
        }
        scaling -= 4;
    }
    (k, upper_half_circle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator(epsilon: f64, shots: u64) -> AmplitudeEstimator {
        AmplitudeEstimator {
            epsilon,
            alpha: 0.05,
            shots,
            max_iterations: 200,
            deadline: None,
            cancel: None,
        }
    }

    #[test]
    fn test_max_rounds() {
        // ln(2π/8/0.01)/ln 2 ≈ 6.3
        assert_eq!(estimator(0.01, 100).max_rounds(), 7);
    }

    #[test]
    fn test_first_round_keeps_k_zero() {
        assert_eq!(find_next_k(0, true, 0.0, 0.25), (0, true));
    }

    #[test]
    fn test_next_k_grows_on_narrow_interval() {
        let (k, upper) = find_next_k(0, true, 0.10, 0.11);
        assert!(k >= 1);
        let s = (4 * k + 2) as f64;
        let lo = s * 0.10 - (s * 0.10).floor();
        let hi = s * 0.11 - (s * 0.11).floor();
        if upper {
            assert!(lo <= hi && hi <= 0.5);
        } else {
            assert!(lo >= 0.5 && hi >= lo);
        }
    }

    #[test]
    fn test_estimate_brackets_amplitude() {
        let mut rng = StepRng::from_seed(2024);
        let target = 0.3;
        let est = estimator(0.005, 100).estimate(target, &mut rng).unwrap();

        assert!(est.half_width() <= 0.005 + 1e-12);
        assert!((est.amplitude - target).abs() < 0.02, "a = {}", est.amplitude);
        assert!(est.shots >= 100);
        assert_eq!(est.shots, est.iterations as u64 * 100);
    }

    #[test]
    fn test_estimate_is_reproducible() {
        let a = estimator(0.01, 50)
            .estimate(0.45, &mut StepRng::from_seed(9))
            .unwrap();
        let b = estimator(0.01, 50)
            .estimate(0.45, &mut StepRng::from_seed(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let mut tight = estimator(1e-6, 10);
        tight.max_iterations = 2;
        let err = tight.estimate(0.4, &mut StepRng::from_seed(1)).unwrap_err();
        match err {
            LookbackError::ConvergenceFailure {
                iterations, target, ..
            } => {
                assert_eq!(iterations, 2);
                assert_eq!(target, 1e-6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_first_round() {
        let token = CancelToken::new();
        token.cancel();
        let mut est = estimator(0.01, 100);
        est.cancel = Some(token);

        assert_eq!(
            est.estimate(0.4, &mut StepRng::from_seed(1)),
            Err(LookbackError::Cancelled { iterations: 0 })
        );
    }

    #[test]
    fn test_expired_deadline() {
        let mut est = estimator(0.01, 100);
        est.deadline = Some(Instant::now());
        assert!(matches!(
            est.estimate(0.4, &mut StepRng::from_seed(1)),
            Err(LookbackError::Cancelled { .. })
        ));
    }
}
