//! Call/put relations of the Heston Greeks.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use heston_core::{OptionType, Real};
use heston_models::{ModelParameters, ParameterName};
use heston_pricingengines::{
    sweep_range, AnalyticHestonEngine, AnalyticHestonGreeks, Greek, SENSITIVITY_RELATIVE_ACCURACY,
};
use proptest::prelude::*;

fn atm() -> ModelParameters {
    ModelParameters::new(100.0, 100.0, 1.0, 0.04, 0.05, 0.04, 2.0, 0.3, -0.7).unwrap()
}

/// One-day option on a fast mean-reverting, highly skewed variance.
fn golden() -> ModelParameters {
    ModelParameters::new(154.08, 147.0, 1.0 / 365.0, 0.0105, 0.1, 0.0837, 74.32, 3.4532, -0.8912)
        .unwrap()
}

#[test]
fn golden_call_greeks() {
    let g = AnalyticHestonGreeks::new().greeks(OptionType::Call, &golden()).unwrap();
    assert_abs_diff_eq!(g.delta, 0.999_866_169_759_988_4, epsilon = 1e-8);
    assert_relative_eq!(g.gamma, 1.588_827_44e-4, max_relative = 1e-6);
    assert_relative_eq!(g.vega, 0.017_557_535_82, max_relative = 1e-6);
    assert_relative_eq!(g.rho, 0.402_572_599_07, max_relative = 1e-6);
    assert_relative_eq!(g.volga, 1.647_805_000_36, max_relative = 1e-6);
    assert_relative_eq!(g.vanna, -0.019_357_267_67, max_relative = 1e-6);
    assert_relative_eq!(g.theta, -15.008_756_725_6, max_relative = 1e-6);
}

#[test]
fn sensitivities_use_their_own_quadrature() {
    let greeks = AnalyticHestonGreeks::new();
    assert_eq!(
        greeks.sensitivity_engine().integrator().relative_accuracy(),
        SENSITIVITY_RELATIVE_ACCURACY
    );
    // the pricing engine alone cannot resolve the short-dated volga kernel
    let strict = AnalyticHestonGreeks::with_engine(AnalyticHestonEngine::new());
    let err = strict.volga(OptionType::Call, &golden()).unwrap_err();
    assert!(err.is_numerical(), "{err}");
}

#[test]
fn atm_put_reference_values() {
    let greeks = AnalyticHestonGreeks::new();
    let g = greeks.greeks(OptionType::Put, &atm()).unwrap();
    let discount = (-0.05f64).exp();
    assert_abs_diff_eq!(g.delta, -0.691_867_219_327_185_9, epsilon = 1e-8);
    assert_abs_diff_eq!(g.rho, 58.792_503_367_568_43 - 100.0 * discount, epsilon = 1e-6);
    assert_abs_diff_eq!(g.theta, 6.448_620_610_868_927, epsilon = 1e-6);
}

#[test]
fn rho_call_minus_put_is_discounted_strike_times_maturity() {
    let greeks = AnalyticHestonGreeks::new();
    let p = atm().with_parameter(ParameterName::Maturity, 0.5).unwrap();
    let call = greeks.rho(OptionType::Call, &p).unwrap();
    let put = greeks.rho(OptionType::Put, &p).unwrap();
    assert_abs_diff_eq!(call - put, p.k() * p.t() * p.discount_factor(), epsilon = 1e-9);
}

#[test]
fn theta_call_and_put_cancel() {
    let greeks = AnalyticHestonGreeks::new();
    let p = atm();
    let call = greeks.theta(OptionType::Call, &p).unwrap();
    let put = greeks.theta(OptionType::Put, &p).unwrap();
    assert_eq!(call, -put);
    assert!(call < 0.0);
}

#[test]
fn rho_matches_finite_difference_of_call() {
    let greeks = AnalyticHestonGreeks::new();
    let p = atm();
    let h = 1e-5;
    let call_at = |r: Real| {
        let q = p.with_parameter(ParameterName::Rate, r).unwrap();
        greeks.engine().european_call(&q).unwrap()
    };
    let fd = (call_at(0.05 + h) - call_at(0.05 - h)) / (2.0 * h);
    assert_abs_diff_eq!(greeks.rho(OptionType::Call, &p).unwrap(), fd, epsilon = 1e-3);
}

#[test]
fn theta_matches_finite_difference_of_call() {
    let greeks = AnalyticHestonGreeks::new();
    let p = atm();
    let h = 1e-5;
    let call_at = |t: Real| {
        let q = p.with_parameter(ParameterName::Maturity, t).unwrap();
        greeks.engine().european_call(&q).unwrap()
    };
    let fd = -(call_at(1.0 + h) - call_at(1.0 - h)) / (2.0 * h);
    assert_abs_diff_eq!(greeks.theta(OptionType::Call, &p).unwrap(), fd, epsilon = 1e-3);
}

#[test]
fn put_time_decay_follows_from_call_theta() {
    let greeks = AnalyticHestonGreeks::new();
    let p = atm();
    let h = 1e-5;
    let put_at = |t: Real| {
        let q = p.with_parameter(ParameterName::Maturity, t).unwrap();
        greeks.engine().european_put(&q).unwrap()
    };
    let fd = -(put_at(1.0 + h) - put_at(1.0 - h)) / (2.0 * h);
    let call = greeks.theta(OptionType::Call, &p).unwrap();
    let carry = p.r() * p.k() * p.discount_factor();
    assert_abs_diff_eq!(call + carry, fd, epsilon = 1e-3);
    assert_abs_diff_eq!(fd, -1.6925, epsilon = 1e-3);
    assert!((greeks.theta(OptionType::Put, &p).unwrap() - fd).abs() > 1.0);
}

#[test]
fn sweep_vega_over_variance() {
    let greeks = AnalyticHestonGreeks::new();
    let grid = sweep_range(0.01, 0.09, 0.02).unwrap();
    let points = greeks
        .sweep(Greek::Vega, OptionType::Call, &atm(), ParameterName::Variance, &grid)
        .unwrap();
    assert_eq!(points.len(), 5);
    assert!(points.iter().all(|&(_, vega)| vega > 0.0));
    for (x, g) in grid.iter().zip(&points) {
        assert_eq!(*x, g.0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn branch_neutral_greeks_ignore_option_type(
        s in 90.0f64..110.0,
        t in 0.25f64..1.5,
        v in 0.02f64..0.08,
        rho in -0.8f64..0.0,
    ) {
        let greeks = AnalyticHestonGreeks::new();
        let p = ModelParameters::new(s, 100.0, t, v, 0.03, 0.05, 1.5, 0.4, rho).unwrap();
        for greek in [Greek::Gamma, Greek::Vega, Greek::Volga, Greek::Vanna] {
            let call = greeks.value(greek, OptionType::Call, &p).unwrap();
            let put = greeks.value(greek, OptionType::Put, &p).unwrap();
            prop_assert_eq!(call, put, "{}", greek);
        }
    }
}
