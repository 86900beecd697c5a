//! # heston-models
//!
//! The Heston stochastic-volatility model: validated pricing inputs, the
//! branch-cut-corrected characteristic function and its time derivatives,
//! and the five-dimensional parameter space searched by calibration.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Model inputs ─────────────────────────────────────────────────────────
pub mod model_parameters;

// ── Characteristic function ──────────────────────────────────────────────
pub mod characteristic_function;

// ── Calibration parameter space ──────────────────────────────────────────
pub mod calibrated_model;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use calibrated_model::{CalibrationGuess, ParameterBounds, CALIBRATED_PARAMETERS};
pub use characteristic_function::{
    characteristic_coefficients, BranchIndex, CharacteristicCoefficients,
    HestonCharacteristicFunction,
};
pub use model_parameters::{ModelParameters, ParameterName};
