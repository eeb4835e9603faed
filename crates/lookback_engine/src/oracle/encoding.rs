//! Discretised payoff encoding for amplitude estimation.
//!
//! The terminal distribution is sampled on the `2^resolution` grid of its
//! support, weighted by the normalised log-normal density. The payoff is
//! rescaled to `f̃ ∈ [0, 1]` over its image on the support and mapped to an
//! amplitude
//!
//! ```text
//! a = Σ_i p_i · sin²(π/4 + (π/2)·c·(f̃_i - 1/2))
//! ```
//!
//! For a small rescaling factor `c` the map is close to linear,
//! `a ≈ 1/2 + (π/2)·c·(E[f̃] - 1/2)`, and is inverted accordingly. The
//! linearisation bias shrinks with `c`, the estimation cost grows as `1/c`.

use lookback_core::types::{LookbackError, PayoffSpec, Result, StrikeRegion};
use lookback_core::DistributionParams;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Payoff image widths below this are treated as constant.
const FLAT_IMAGE_TOLERANCE: f64 = 1e-14;

/// Grid representation of one payoff against one terminal distribution.
#[derive(Clone, Debug)]
pub struct DiscretizedPayoff {
    probabilities: Vec<f64>,
    values: Vec<f64>,
    image: (f64, f64),
    strike_region: StrikeRegion,
    discount_factor: f64,
}

impl DiscretizedPayoff {
    /// Samples `payoff` on the grid of `distribution`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the strike is invalid
    /// - `DegenerateDistribution` if the grid carries no probability mass
    pub fn encode(distribution: &DistributionParams, payoff: &PayoffSpec) -> Result<Self> {
        payoff.validate()?;

        let levels = distribution.levels();
        let points: Vec<f64> = (0..levels).map(|i| distribution.grid_point(i)).collect();

        let mut probabilities: Vec<f64> = points.iter().map(|&x| distribution.density(x)).collect();
        let total: f64 = probabilities.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(LookbackError::degenerate(
                distribution.maturity(),
                "grid carries no probability mass",
            ));
        }
        for p in probabilities.iter_mut() {
            *p /= total;
        }

        let values: Vec<f64> = points.iter().map(|&x| payoff.intrinsic(x)).collect();
        let image = payoff.image(distribution.low(), distribution.high());

        Ok(Self {
            probabilities,
            values,
            image,
            strike_region: payoff.strike_region(distribution.low(), distribution.high()),
            discount_factor: distribution.discount_factor(),
        })
    }

    /// Normalised grid probabilities.
    #[inline]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// `(f_min, f_max)` of the payoff over the support.
    #[inline]
    pub fn image(&self) -> (f64, f64) {
        self.image
    }

    /// Strike placement relative to the support.
    #[inline]
    pub fn strike_region(&self) -> StrikeRegion {
        self.strike_region
    }

    /// Discount factor of the step.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Returns true if the payoff takes a single value on the support.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.image.1 - self.image.0 <= FLAT_IMAGE_TOLERANCE
    }

    /// Exact undiscounted expectation over the grid, `Σ p_i · f_i`.
    pub fn grid_expectation(&self) -> f64 {
        self.probabilities
            .iter()
            .zip(&self.values)
            .map(|(p, f)| p * f)
            .sum()
    }

    /// Amplitude encoded by the grid for rescaling factor `c`.
    pub fn objective_amplitude(&self, c: f64) -> f64 {
        let (f_min, f_max) = self.image;
        let span = f_max - f_min;
        if span <= FLAT_IMAGE_TOLERANCE {
            return 0.5;
        }
        self.probabilities
            .iter()
            .zip(&self.values)
            .map(|(p, f)| {
                let scaled = (f - f_min) / span;
                let angle = FRAC_PI_4 + FRAC_PI_2 * c * (scaled - 0.5);
                p * angle.sin().powi(2)
            })
            .sum()
    }

    /// Inverts the linearised amplitude map back to an undiscounted payoff
    /// value, clamped to the image.
    pub fn map_amplitude(&self, amplitude: f64, c: f64) -> f64 {
        let (f_min, f_max) = self.image;
        let scaled = (amplitude - 0.5 + PI * c / 4.0) * 2.0 / (PI * c);
        (f_min + scaled * (f_max - f_min)).clamp(f_min, f_max)
    }
}
