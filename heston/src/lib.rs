//! # heston
//!
//! Semi-analytic pricing of European options under the Heston
//! stochastic-volatility model, its Greeks, and calibration of the five
//! model parameters to market quotes.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on this crate rather than the individual
//! `heston-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use heston::core::OptionType;
//! use heston::models::ModelParameters;
//! use heston::pricingengines::{AnalyticHestonEngine, AnalyticHestonGreeks};
//!
//! let params = ModelParameters::new(100.0, 100.0, 1.0, 0.04, 0.05, 0.04, 2.0, 0.3, -0.7)?;
//! let engine = AnalyticHestonEngine::new();
//! let call = engine.european_call(&params)?;
//! let put = engine.european_put(&params)?;
//! let forward = params.s() - params.k() * params.discount_factor();
//! assert!((call - put - forward).abs() < 1e-8);
//!
//! let greeks = AnalyticHestonGreeks::new().greeks(OptionType::Call, &params)?;
//! assert!(greeks.gamma > 0.0);
//! # Ok::<(), heston::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use heston_core as core;

/// Quadrature, optimisation, and RNG.
pub use heston_math as math;

/// Model parameters and the characteristic function.
pub use heston_models as models;

/// Pricing and Greek engines.
pub use heston_pricingengines as pricingengines;

/// Calibration to market quotes.
pub use heston_calibration as calibration;
