//! The calibratable parameter vector `(v, theta, kappa, sigma, rho)` and the
//! box it is searched over.

use heston_core::{
    ensure,
    errors::{Error, Result},
    Real,
};
use heston_math::{Array, BoxConstraint};
use serde::{Deserialize, Serialize};

use crate::model_parameters::ModelParameters;

/// Number of calibrated parameters.
pub const CALIBRATED_PARAMETERS: usize = 5;

/// A candidate `(v, theta, kappa, sigma, rho)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationGuess {
    /// Initial variance.
    pub v: Real,
    /// Long-run variance.
    pub theta: Real,
    /// Mean-reversion speed.
    pub kappa: Real,
    /// Vol-of-vol.
    pub sigma: Real,
    /// Spot-variance correlation.
    pub rho: Real,
}

impl CalibrationGuess {
    /// Create a guess. Not validated; see [`CalibrationGuess::validate`].
    pub fn new(v: Real, theta: Real, kappa: Real, sigma: Real, rho: Real) -> Self {
        Self {
            v,
            theta,
            kappa,
            sigma,
            rho,
        }
    }

    /// The model-parameter part of `params`.
    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self::new(
            params.v(),
            params.theta(),
            params.kappa(),
            params.sigma(),
            params.rho(),
        )
    }

    /// Check the model invariants (`v, theta, sigma >= 0`, `kappa > 0`,
    /// `|rho| <= 1`).
    pub fn validate(&self) -> Result<()> {
        ensure!(self.v >= 0.0 && self.v.is_finite(), "variance must be non-negative, got {}", self.v);
        ensure!(
            self.theta >= 0.0 && self.theta.is_finite(),
            "long-run variance must be non-negative, got {}",
            self.theta
        );
        ensure!(
            self.kappa > 0.0 && self.kappa.is_finite(),
            "mean-reversion speed must be positive, got {}",
            self.kappa
        );
        ensure!(
            self.sigma >= 0.0 && self.sigma.is_finite(),
            "vol-of-vol must be non-negative, got {}",
            self.sigma
        );
        ensure!(
            (-1.0..=1.0).contains(&self.rho),
            "correlation must lie in [-1, 1], got {}",
            self.rho
        );
        Ok(())
    }

    /// `[v, theta, kappa, sigma, rho]`
    pub fn to_array(&self) -> Array {
        Array::from_slice(&[self.v, self.theta, self.kappa, self.sigma, self.rho])
    }

    /// Inverse of [`CalibrationGuess::to_array`].
    pub fn from_array(x: &Array) -> Result<Self> {
        if x.size() != CALIBRATED_PARAMETERS {
            return Err(Error::InvalidArgument(format!(
                "expected {CALIBRATED_PARAMETERS} calibration parameters, got {}",
                x.size()
            )));
        }
        Ok(Self::new(x[0], x[1], x[2], x[3], x[4]))
    }

    /// Substitute this guess into `base`, keeping its `s, k, t, r`.
    pub fn apply_to(&self, base: &ModelParameters) -> Result<ModelParameters> {
        ModelParameters::new(
            base.s(),
            base.k(),
            base.t(),
            self.v,
            base.r(),
            self.theta,
            self.kappa,
            self.sigma,
            self.rho,
        )
    }
}

/// Component-wise search box for a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    /// Lower corner.
    pub lower: CalibrationGuess,
    /// Upper corner.
    pub upper: CalibrationGuess,
}

impl ParameterBounds {
    /// Create bounds from two corners.
    pub fn new(lower: CalibrationGuess, upper: CalibrationGuess) -> Self {
        Self { lower, upper }
    }

    /// Both corners must be ordered and the lower corner must be in the
    /// model domain, except that `kappa` may start at zero.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = (self.lower.to_array(), self.upper.to_array());
        for (i, name) in ["v", "theta", "kappa", "sigma", "rho"].into_iter().enumerate() {
            ensure!(
                lo[i].is_finite() && hi[i].is_finite() && lo[i] <= hi[i],
                "bounds for {name} are not an interval: [{}, {}]",
                lo[i],
                hi[i]
            );
        }
        ensure!(
            self.lower.v >= 0.0 && self.lower.theta >= 0.0 && self.lower.kappa >= 0.0,
            "variance, long-run variance and mean-reversion bounds must be non-negative"
        );
        ensure!(self.lower.sigma >= 0.0, "vol-of-vol bound must be non-negative");
        ensure!(
            self.lower.rho >= -1.0 && self.upper.rho <= 1.0,
            "correlation bounds must lie in [-1, 1]"
        );
        Ok(())
    }

    /// `true` if `guess` lies inside the box.
    pub fn contains(&self, guess: &CalibrationGuess) -> bool {
        let x = guess.to_array();
        let (lo, hi) = (self.lower.to_array(), self.upper.to_array());
        (0..CALIBRATED_PARAMETERS).all(|i| x[i] >= lo[i] && x[i] <= hi[i])
    }

    /// The box as an optimizer constraint.
    pub fn to_constraint(&self) -> Result<BoxConstraint> {
        self.validate()?;
        BoxConstraint::new(self.lower.to_array(), self.upper.to_array())
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            lower: CalibrationGuess::new(0.0, 0.0, 1e-3, 1e-3, -1.0),
            upper: CalibrationGuess::new(1.0, 1.0, 5.0, 5.0, 1.0),
        }
    }
}
