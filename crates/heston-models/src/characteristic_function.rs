//! Heston characteristic function with the Lord–Kahl branch-cut correction.
//!
//! For branch `j` with `(u₁, b₁) = (½, κ − ρσ)` and `(u₂, b₂) = (−½, κ)`:
//!
//! ```text
//! β = b − ρσφi
//! d = √(β² − σ²(2uφi − φ²))
//! g = (β − d) / (β + d)
//! C = rφit + (κθ/σ²)·[(β − d)t − 2 ln((1 − g e^{−dt}) / (1 − g))]
//! D = ((β − d)/σ²)·(1 − e^{−dt}) / (1 − g e^{−dt})
//! f = exp(C + D·v + iφ ln s)
//! ```
//!
//! `g` is the reciprocal of the ratio in Heston's paper, which keeps
//! `1 − g e^{−dt}` away from the negative real axis so the principal
//! logarithm stays continuous in `φ`.

use heston_core::{
    errors::{Error, Result},
    Real,
};
use num_complex::Complex64;

use crate::model_parameters::ModelParameters;

/// Selector between the two probability measures of the pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchIndex {
    /// `j = 1`: share measure, `u = ½`, `b = κ − ρσ`.
    One,
    /// `j = 2`: risk-neutral measure, `u = −½`, `b = κ`.
    Two,
}

impl BranchIndex {
    /// Both branches, in order.
    pub const BOTH: [BranchIndex; 2] = [BranchIndex::One, BranchIndex::Two];

    /// `1` or `2`.
    pub fn index(self) -> usize {
        match self {
            BranchIndex::One => 1,
            BranchIndex::Two => 2,
        }
    }

    fn u(self) -> Real {
        match self {
            BranchIndex::One => 0.5,
            BranchIndex::Two => -0.5,
        }
    }

    fn b(self, params: &ModelParameters) -> Real {
        match self {
            BranchIndex::One => params.kappa() - params.rho() * params.sigma(),
            BranchIndex::Two => params.kappa(),
        }
    }
}

impl TryFrom<usize> for BranchIndex {
    type Error = Error;

    fn try_from(j: usize) -> Result<Self> {
        match j {
            1 => Ok(BranchIndex::One),
            2 => Ok(BranchIndex::Two),
            _ => Err(Error::InvalidArgument(format!(
                "branch index must be 1 or 2, got {j}"
            ))),
        }
    }
}

/// Intermediate coefficients of one characteristic-function evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicCoefficients {
    /// `κθ`
    pub a: Real,
    /// Branch-dependent drift coefficient.
    pub b: Real,
    /// Principal square root of the discriminant.
    pub d: Complex64,
    /// Reflection ratio `(β − d)/(β + d)`.
    pub g: Complex64,
    /// `C(φ, t)`
    pub big_c: Complex64,
    /// `D(φ, t)`
    pub big_d: Complex64,
    /// The characteristic function value.
    pub f: Complex64,
}

/// Characteristic function of the Heston log-price for fixed inputs.
#[derive(Debug, Clone, Copy)]
pub struct HestonCharacteristicFunction {
    params: ModelParameters,
    ln_s: Real,
}

impl HestonCharacteristicFunction {
    /// Bind the characteristic function to `params`.
    ///
    /// Fails with `Error::Numerical` when `sigma == 0`: every coefficient
    /// divides by `σ²` and the degenerate limit is not evaluated.
    pub fn new(params: ModelParameters) -> Result<Self> {
        if params.sigma() == 0.0 {
            return Err(Error::Numerical(
                "characteristic function is undefined for zero vol-of-vol".into(),
            ));
        }
        Ok(Self {
            params,
            ln_s: params.s().ln(),
        })
    }

    /// The bound inputs.
    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// `β = b − ρσφi`
    fn beta(&self, phi: Real, b: Real) -> Complex64 {
        Complex64::new(b, -self.params.rho() * self.params.sigma() * phi)
    }

    /// Evaluate all coefficients at `phi` on `branch`.
    pub fn evaluate(&self, phi: Real, branch: BranchIndex) -> CharacteristicCoefficients {
        let p = &self.params;
        let (t, sigma) = (p.t(), p.sigma());
        let sigma2 = sigma * sigma;
        let u = branch.u();
        let b = branch.b(p);
        let a = p.kappa() * p.theta();

        let i_phi = Complex64::new(0.0, phi);
        let beta = self.beta(phi, b);
        let d = (beta * beta - sigma2 * (2.0 * u * i_phi - phi * phi)).sqrt();
        let g = (beta - d) / (beta + d);

        let e = (-d * t).exp();
        let one_minus_ge = 1.0 - g * e;

        let big_c = p.r() * i_phi * t
            + (a / sigma2) * ((beta - d) * t - 2.0 * (one_minus_ge / (1.0 - g)).ln());
        let big_d = ((beta - d) / sigma2) * ((1.0 - e) / one_minus_ge);
        let f = (big_c + big_d * p.v() + i_phi * self.ln_s).exp();

        CharacteristicCoefficients {
            a,
            b,
            d,
            g,
            big_c,
            big_d,
            f,
        }
    }

    /// `∂C/∂t` at `phi`, reusing the coefficients of [`Self::evaluate`].
    pub fn dc_dt(&self, phi: Real, c: &CharacteristicCoefficients) -> Complex64 {
        let p = &self.params;
        let sigma2 = p.sigma() * p.sigma();
        let beta = self.beta(phi, c.b);
        let e = (-c.d * p.t()).exp();
        let g_d_e = c.g * c.d * e;

        Complex64::new(0.0, p.r() * phi)
            + (c.a / sigma2) * ((beta - c.d) - 2.0 * g_d_e / (1.0 - c.g * e))
    }

    /// `∂D/∂t` at `phi`, reusing the coefficients of [`Self::evaluate`].
    pub fn dd_dt(&self, phi: Real, c: &CharacteristicCoefficients) -> Complex64 {
        let p = &self.params;
        let sigma2 = p.sigma() * p.sigma();
        let beta = self.beta(phi, c.b);
        let e = (-c.d * p.t()).exp();
        let den = 1.0 - c.g * e;

        ((beta - c.d) / sigma2)
            * (c.d * e / den - c.g * c.d * e * (1.0 - e) / (den * den))
    }
}

/// One-shot evaluation of the coefficients at `(phi, branch)` for `params`.
pub fn characteristic_coefficients(
    phi: Real,
    branch: BranchIndex,
    params: &ModelParameters,
) -> Result<CharacteristicCoefficients> {
    Ok(HestonCharacteristicFunction::new(*params)?.evaluate(phi, branch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_parameters::ParameterName;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn atm() -> ModelParameters {
        ModelParameters::new(100.0, 100.0, 1.0, 0.04, 0.05, 0.04, 2.0, 0.3, -0.7).unwrap()
    }

    #[test]
    fn branch_index_conversion() {
        assert_eq!(BranchIndex::try_from(1).unwrap(), BranchIndex::One);
        assert_eq!(BranchIndex::try_from(2).unwrap().index(), 2);
        assert!(BranchIndex::try_from(0).is_err());
        assert!(BranchIndex::try_from(3).is_err());
    }

    #[test]
    fn zero_sigma_is_numerical_error() {
        let p = atm().with_parameter(ParameterName::Sigma, 0.0).unwrap();
        let err = HestonCharacteristicFunction::new(p).unwrap_err();
        assert!(err.is_numerical());
        assert!(characteristic_coefficients(1.0, BranchIndex::One, &p).is_err());
    }

    #[test]
    fn unit_value_at_origin() {
        // b > 0 on both branches, so d = b, g = 0 and C = D = 0 at φ = 0.
        let cf = HestonCharacteristicFunction::new(atm()).unwrap();
        for branch in BranchIndex::BOTH {
            let c = cf.evaluate(0.0, branch);
            assert_abs_diff_eq!(c.f.re, 1.0, epsilon = 1e-14);
            assert_abs_diff_eq!(c.f.im, 0.0, epsilon = 1e-14);
            assert_abs_diff_eq!(c.g.norm(), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn branch_coefficients() {
        let p = atm();
        let cf = HestonCharacteristicFunction::new(p).unwrap();
        let one = cf.evaluate(0.7, BranchIndex::One);
        let two = cf.evaluate(0.7, BranchIndex::Two);
        assert_abs_diff_eq!(one.a, 0.08, epsilon = 1e-15);
        assert_abs_diff_eq!(one.b, 2.0 + 0.7 * 0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(two.b, 2.0, epsilon = 1e-15);
        assert!(one.d.re >= 0.0 && two.d.re >= 0.0);
    }

    #[test]
    fn coefficients_match_free_function() {
        let p = atm();
        let cf = HestonCharacteristicFunction::new(p).unwrap();
        let direct = characteristic_coefficients(1.3, BranchIndex::Two, &p).unwrap();
        assert_eq!(cf.evaluate(1.3, BranchIndex::Two), direct);
    }

    #[test]
    fn continuous_across_long_maturities() {
        // The uncorrected form jumps whenever its log argument crosses the
        // negative real axis; with the reflected ratio f varies smoothly.
        let p = ModelParameters::new(1.0, 1.0, 10.0, 0.09, 0.0, 0.09, 0.5, 1.0, -0.9).unwrap();
        let cf = HestonCharacteristicFunction::new(p).unwrap();
        for branch in BranchIndex::BOTH {
            let mut prev = cf.evaluate(0.0, branch).f;
            for n in 1..=2_000 {
                let phi = n as Real * 0.01;
                let f = cf.evaluate(phi, branch).f;
                assert!((f - prev).norm() < 0.05, "jump at phi={phi} on {branch:?}");
                prev = f;
            }
        }
    }

    #[test]
    fn time_derivatives_match_finite_differences() {
        let p = atm();
        let h = 1e-5;
        let shifted = |dt: Real| {
            let q = p.with_parameter(ParameterName::Maturity, 1.0 + dt).unwrap();
            HestonCharacteristicFunction::new(q).unwrap()
        };
        let (up, dn) = (shifted(h), shifted(-h));
        let cf = HestonCharacteristicFunction::new(p).unwrap();
        for branch in BranchIndex::BOTH {
            for phi in [0.3, 1.0, 4.5] {
                let c = cf.evaluate(phi, branch);
                let (cu, cd) = (up.evaluate(phi, branch), dn.evaluate(phi, branch));
                let fd_c = (cu.big_c - cd.big_c) / (2.0 * h);
                let fd_d = (cu.big_d - cd.big_d) / (2.0 * h);
                assert!((cf.dc_dt(phi, &c) - fd_c).norm() < 1e-6, "dC/dt at {phi}");
                assert!((cf.dd_dt(phi, &c) - fd_d).norm() < 1e-6, "dD/dt at {phi}");
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Both branches are characteristic functions of ln S_T under a
        // probability measure, so |f| <= 1.
        #[test]
        fn modulus_bounded_by_one(
            phi in 0.01f64..50.0,
            t in 0.05f64..5.0,
            v in 0.0f64..0.5,
            kappa in 0.1f64..5.0,
            theta in 0.0f64..0.5,
            sigma in 0.05f64..1.5,
            rho in -0.95f64..0.95,
        ) {
            prop_assume!(kappa - rho * sigma > 0.05);
            let p = ModelParameters::new(100.0, 100.0, t, v, 0.03, theta, kappa, sigma, rho).unwrap();
            let cf = HestonCharacteristicFunction::new(p).unwrap();
            for branch in BranchIndex::BOTH {
                let f = cf.evaluate(phi, branch).f;
                prop_assert!(f.is_finite());
                prop_assert!(f.norm() <= 1.0 + 1e-9, "|f| = {} on {:?}", f.norm(), branch);
            }
        }
    }
}
