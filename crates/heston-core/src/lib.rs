//! # heston-core
//!
//! Core types, error definitions, and the option-type selector shared by
//! every crate in the heston-rs workspace.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `ensure_post!` / `fail!` macros.
pub mod errors;

/// Call / put selector.
pub mod option_type;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A variance level (squared volatility).
pub type Variance = Real;

/// A probability in [0, 1].
pub type Probability = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use option_type::OptionType;
