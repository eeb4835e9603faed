//! Property tests for the terminal distribution model.
//!
//! Verifies the support invariants (`low >= 0`, `low < high`) over a broad
//! range of market inputs, and that degenerate maturities are rejected.

use lookback_core::analytical::black_scholes_price;
use lookback_core::distribution::DistributionModel;
use lookback_core::types::{LookbackError, MarketParams, PayoffSpec};
use proptest::prelude::*;

proptest! {
    #[test]
    fn support_is_non_negative_and_ordered(
        spot in 0.01_f64..1_000.0,
        vol in 0.01_f64..2.0,
        rate in -0.05_f64..0.2,
        dividend in 0.0_f64..0.1,
        maturity in 1.0e-3_f64..5.0,
        resolution in 1_u32..12,
    ) {
        let market = MarketParams::new(spot, vol, rate).unwrap().with_dividend(dividend);
        let model = DistributionModel::new(resolution).unwrap();
        let dist = model.derive(maturity, &market).unwrap();

        prop_assert!(dist.low() >= 0.0);
        prop_assert!(dist.high() > dist.low());
        prop_assert!(dist.sigma() > 0.0);
        prop_assert!(dist.mean() > 0.0);
        prop_assert_eq!(dist.levels(), 1usize << resolution);
    }

    #[test]
    fn non_positive_maturity_is_degenerate(
        spot in 0.01_f64..1_000.0,
        vol in 0.01_f64..2.0,
        maturity in -5.0_f64..=0.0,
    ) {
        let market = MarketParams::new(spot, vol, 0.0).unwrap();
        let model = DistributionModel::new(5).unwrap();
        let is_degenerate = matches!(
            model.derive(maturity, &market),
            Err(LookbackError::DegenerateDistribution { .. })
        );
        prop_assert!(is_degenerate);
    }

    #[test]
    fn vanilla_prices_are_non_negative(
        spot in 0.5_f64..200.0,
        strike in 0.5_f64..200.0,
        vol in 0.0_f64..1.5,
        maturity in 0.0_f64..3.0,
    ) {
        let market = MarketParams::new(spot, vol, 0.01).unwrap();
        let call = black_scholes_price(&market, maturity, &PayoffSpec::call(strike)).unwrap();
        let put = black_scholes_price(&market, maturity, &PayoffSpec::put(strike)).unwrap();
        prop_assert!(call >= 0.0);
        prop_assert!(put >= 0.0);
    }
}

#[test]
fn forward_grows_with_carry() {
    let model = DistributionModel::new(4).unwrap();
    let market = MarketParams::new(100.0, 0.2, 0.05).unwrap();

    let short = model.derive(0.25, &market).unwrap();
    let long = model.derive(1.0, &market).unwrap();

    assert!(long.mean() > short.mean());
    assert!(long.stddev() > short.stddev());
    assert!(long.high() - long.low() > short.high() - short.low());
}
