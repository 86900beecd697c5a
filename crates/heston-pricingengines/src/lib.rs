//! # heston-pricingengines
//!
//! Semi-analytic Heston engines for European options.
//!
//! ## Engines
//!
//! - [`AnalyticHestonEngine`] — risk-neutral probabilities, call/put prices
//!   and the probability of exercise by Fourier integration
//! - [`AnalyticHestonGreeks`] — delta, gamma, vega, rho, volga, vanna and
//!   theta, plus parameter sweeps

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_heston_engine;
pub mod heston_greeks;

pub use analytic_heston_engine::AnalyticHestonEngine;
pub use heston_greeks::{
    sweep_range, AnalyticHestonGreeks, Greek, Greeks, SENSITIVITY_RELATIVE_ACCURACY,
};
