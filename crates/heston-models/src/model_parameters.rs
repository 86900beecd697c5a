//! Heston model inputs.
//!
//! ```text
//! dS = r·S dt + √v·S dW₁
//! dv = κ(θ − v) dt + σ √v dW₂
//! dW₁·dW₂ = ρ dt
//! ```
//!
//! A [`ModelParameters`] value bundles the contract (`s`, `k`, `t`), the
//! rate `r` and the five model parameters. It is validated on construction
//! and never mutated: sweeps build a fresh value with
//! [`ModelParameters::with_parameter`].

use std::fmt;
use std::str::FromStr;

use heston_core::{
    ensure,
    errors::{Error, Result},
    DiscountFactor, Price, Rate, Real, Time, Variance,
};
use serde::{Deserialize, Serialize};

/// Immutable inputs of a single Heston pricing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParameters {
    s: Price,
    k: Price,
    t: Time,
    v: Variance,
    r: Rate,
    theta: Variance,
    kappa: Real,
    sigma: Real,
    rho: Real,
}

impl ModelParameters {
    /// Create a validated parameter set.
    ///
    /// Fails with `Error::Domain` unless `s, k, t > 0`, `v, theta >= 0`,
    /// `kappa > 0`, `sigma >= 0`, `-1 <= rho <= 1` and `r` is finite.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        s: Price,
        k: Price,
        t: Time,
        v: Variance,
        r: Rate,
        theta: Variance,
        kappa: Real,
        sigma: Real,
        rho: Real,
    ) -> Result<Self> {
        ensure!(s > 0.0 && s.is_finite(), "spot must be positive and finite, got {s}");
        ensure!(k > 0.0 && k.is_finite(), "strike must be positive and finite, got {k}");
        ensure!(t > 0.0 && t.is_finite(), "maturity must be positive and finite, got {t}");
        ensure!(v >= 0.0 && v.is_finite(), "variance must be non-negative, got {v}");
        ensure!(r.is_finite(), "rate must be finite, got {r}");
        ensure!(
            theta >= 0.0 && theta.is_finite(),
            "long-run variance must be non-negative, got {theta}"
        );
        ensure!(
            kappa > 0.0 && kappa.is_finite(),
            "mean-reversion speed must be positive, got {kappa}"
        );
        ensure!(
            sigma >= 0.0 && sigma.is_finite(),
            "vol-of-vol must be non-negative, got {sigma}"
        );
        ensure!(
            (-1.0..=1.0).contains(&rho),
            "correlation must lie in [-1, 1], got {rho}"
        );
        Ok(Self {
            s,
            k,
            t,
            v,
            r,
            theta,
            kappa,
            sigma,
            rho,
        })
    }

    /// Spot price.
    pub fn s(&self) -> Price {
        self.s
    }

    /// Strike.
    pub fn k(&self) -> Price {
        self.k
    }

    /// Time to maturity in years.
    pub fn t(&self) -> Time {
        self.t
    }

    /// Current instantaneous variance.
    pub fn v(&self) -> Variance {
        self.v
    }

    /// Continuously compounded risk-free rate.
    pub fn r(&self) -> Rate {
        self.r
    }

    /// Long-run variance.
    pub fn theta(&self) -> Variance {
        self.theta
    }

    /// Mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.kappa
    }

    /// Vol-of-vol.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Spot-variance correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// `e^{-r·t}`.
    pub fn discount_factor(&self) -> DiscountFactor {
        (-self.r * self.t).exp()
    }

    /// Feller condition: `2κθ > σ²`. Informational only.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa * self.theta > self.sigma * self.sigma
    }

    /// Value of a single input.
    pub fn get(&self, name: ParameterName) -> Real {
        match name {
            ParameterName::Spot => self.s,
            ParameterName::Strike => self.k,
            ParameterName::Maturity => self.t,
            ParameterName::Variance => self.v,
            ParameterName::Rate => self.r,
            ParameterName::Theta => self.theta,
            ParameterName::Kappa => self.kappa,
            ParameterName::Sigma => self.sigma,
            ParameterName::Rho => self.rho,
        }
    }

    /// A copy with one input replaced, re-validated.
    pub fn with_parameter(&self, name: ParameterName, value: Real) -> Result<Self> {
        let mut p = *self;
        match name {
            ParameterName::Spot => p.s = value,
            ParameterName::Strike => p.k = value,
            ParameterName::Maturity => p.t = value,
            ParameterName::Variance => p.v = value,
            ParameterName::Rate => p.r = value,
            ParameterName::Theta => p.theta = value,
            ParameterName::Kappa => p.kappa = value,
            ParameterName::Sigma => p.sigma = value,
            ParameterName::Rho => p.rho = value,
        }
        Self::new(p.s, p.k, p.t, p.v, p.r, p.theta, p.kappa, p.sigma, p.rho)
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s={} k={} t={} v={} r={} theta={} kappa={} sigma={} rho={}",
            self.s, self.k, self.t, self.v, self.r, self.theta, self.kappa, self.sigma, self.rho
        )
    }
}

/// Names of the nine pricing inputs, used to select a sweep axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterName {
    /// `s`
    #[serde(rename = "s")]
    Spot,
    /// `k`
    #[serde(rename = "k")]
    Strike,
    /// `t`
    #[serde(rename = "t")]
    Maturity,
    /// `v`
    #[serde(rename = "v")]
    Variance,
    /// `r`
    #[serde(rename = "r")]
    Rate,
    /// `theta`
    Theta,
    /// `kappa`
    Kappa,
    /// `sigma`
    Sigma,
    /// `rho`
    Rho,
}

impl ParameterName {
    /// All nine inputs in declaration order.
    pub const ALL: [ParameterName; 9] = [
        ParameterName::Spot,
        ParameterName::Strike,
        ParameterName::Maturity,
        ParameterName::Variance,
        ParameterName::Rate,
        ParameterName::Theta,
        ParameterName::Kappa,
        ParameterName::Sigma,
        ParameterName::Rho,
    ];

    /// Short symbol (`"s"`, `"kappa"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterName::Spot => "s",
            ParameterName::Strike => "k",
            ParameterName::Maturity => "t",
            ParameterName::Variance => "v",
            ParameterName::Rate => "r",
            ParameterName::Theta => "theta",
            ParameterName::Kappa => "kappa",
            ParameterName::Sigma => "sigma",
            ParameterName::Rho => "rho",
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ParameterName::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown parameter '{s}'")))
    }
}
