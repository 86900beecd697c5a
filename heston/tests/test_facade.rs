//! End-to-end use through the façade: price, Greeks, and a sweep.

use approx::assert_abs_diff_eq;
use heston::core::OptionType;
use heston::models::{ModelParameters, ParameterName};
use heston::pricingengines::{sweep_range, AnalyticHestonEngine, AnalyticHestonGreeks, Greek};

#[test]
fn price_and_delta_through_facade() {
    let params = ModelParameters::new(100.0, 100.0, 1.0, 0.04, 0.05, 0.04, 2.0, 0.3, -0.7).unwrap();
    let engine = AnalyticHestonEngine::new();
    assert_abs_diff_eq!(engine.european_call(&params).unwrap(), 10.394_218_565_150_161, epsilon = 1e-6);

    let greeks = AnalyticHestonGreeks::with_engine(engine);
    let grid = sweep_range(90.0, 110.0, 5.0).unwrap();
    let deltas = greeks
        .sweep(Greek::Delta, OptionType::Call, &params, ParameterName::Spot, &grid)
        .unwrap();
    assert!(deltas.windows(2).all(|w| w[1].1 > w[0].1));
    assert!(deltas.iter().all(|&(_, d)| (0.0..=1.0).contains(&d)));
}
