//! # heston-math
//!
//! Numerical building blocks for the Heston pricing and calibration crates:
//! the `Array` vector type, adaptive quadrature, seeded random numbers and
//! local and global optimizers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

pub mod array;
pub mod integrals;
pub mod optimization;
pub mod random_numbers;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use integrals::{GaussKronrodAdaptive, IntegrationResult, Integrator};
pub use optimization::{
    BoxConstraint, Constraint, CostFunction, DifferentialEvolution, EndCriteria, EndCriteriaType,
    LevenbergMarquardt, NoConstraint, OptimizationResult, Simplex,
};
pub use random_numbers::MersenneTwisterUniformRng;
