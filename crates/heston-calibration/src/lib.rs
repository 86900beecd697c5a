//! # heston-calibration
//!
//! Fits the five Heston parameters to a basket of European call quotes by
//! minimizing the sum of relative pricing errors, locally (Levenberg–Marquardt or Nelder–Mead) or
//! globally (Differential Evolution).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calibrator;
pub mod quotes;

pub use calibrator::{
    CalibrationMode, CalibrationResult, CalibrationSettings, HestonCalibrator, LocalMethod,
};
pub use quotes::{MarketQuote, QuoteBasket};
