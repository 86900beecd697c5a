//! Numerical integration.
//!
//! The [`Integrator`] trait is the quadrature seam used by the pricing
//! engines: integrate a real function over `[a, b]`, where `b` may be
//! `+∞`, and report the estimate together with an error bound.

pub mod gauss_kronrod;

pub use gauss_kronrod::GaussKronrodAdaptive;

use heston_core::{errors::Result, Real, Size};

/// Outcome of a successful integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationResult {
    /// Estimated value of the integral.
    pub value: Real,
    /// Estimated absolute error of `value`.
    pub error: Real,
    /// Number of integrand evaluations spent.
    pub evaluations: Size,
}

/// A numerical integrator.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`. `b` may be `Real::INFINITY`.
    ///
    /// Fails with `Error::Numerical` when the accuracy target cannot be met
    /// within the evaluation budget or the integrand returns a non-finite
    /// value.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<IntegrationResult>;
}
