//! Heston Greeks by Fourier integration.
//!
//! Every sensitivity except delta is its own integral over $[0, \infty)$
//! of a kernel built from both branches of the characteristic function at
//! the same node:
//!
//! | Greek | Kernel $\kappa(\phi)$ under $\mathrm{Re}[e^{-i\phi\ln K}\,\cdot\,]$ | Closed-form part |
//! |---|---|---|
//! | gamma | $(1 + i\phi) f_1/S + K e^{-rT}(1 - i\phi) f_2/S^2$ | |
//! | vega | $(S f_1 D_1 - K e^{-rT} f_2 D_2)/(i\phi)$ | |
//! | rho | $T\,[S f_1 - K e^{-rT}(1 - 1/(i\phi)) f_2]$ | $\pm\tfrac12 K T e^{-rT}$ |
//! | volga | $(K e^{-rT} f_2 D_2^2 - S f_1 D_1^2)/(-i\phi)$ | |
//! | vanna | $(1 - i/\phi) f_1 D_1 - K e^{-rT} f_2 D_2 / S$ | |
//! | theta | $-\tfrac{i}{\phi}[(\dot C_1 + v \dot D_1) f_1 S - (\dot C_2 + v \dot D_2 - r) f_2 K e^{-rT}]$ | $\tfrac12 K r e^{-rT}$ |
//!
//! Gamma, vega, volga and vanna do not depend on the option type. The
//! closed-form part of rho enters with `+` for calls and `-` for puts;
//! theta is `-(closed form + integral/π)` for calls and its negation for
//! puts. Delta is $P_1$ for calls and $-P_1$ for puts.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use heston_core::{
    ensure_post,
    errors::{Error, Result},
    OptionType, Real,
};
use heston_math::integrals::{GaussKronrodAdaptive, Integrator};
use heston_models::{
    BranchIndex, CharacteristicCoefficients, HestonCharacteristicFunction, ModelParameters,
    ParameterName,
};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::analytic_heston_engine::{strike_phase, AnalyticHestonEngine};

/// The quantities a sweep can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Greek {
    /// Option price.
    Price,
    /// ∂V/∂S
    Delta,
    /// ∂²V/∂S²
    Gamma,
    /// ∂V/∂v
    Vega,
    /// ∂V/∂r
    Rho,
    /// ∂²V/∂v²
    Volga,
    /// ∂²V/∂S∂v
    Vanna,
    /// Time decay.
    Theta,
}

impl Greek {
    /// The seven sensitivities, without [`Greek::Price`].
    pub const SENSITIVITIES: [Greek; 7] = [
        Greek::Delta,
        Greek::Gamma,
        Greek::Vega,
        Greek::Rho,
        Greek::Volga,
        Greek::Vanna,
        Greek::Theta,
    ];

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Greek::Price => "price",
            Greek::Delta => "delta",
            Greek::Gamma => "gamma",
            Greek::Vega => "vega",
            Greek::Rho => "rho",
            Greek::Volga => "volga",
            Greek::Vanna => "vanna",
            Greek::Theta => "theta",
        }
    }
}

impl fmt::Display for Greek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Greek {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        std::iter::once(Greek::Price)
            .chain(Greek::SENSITIVITIES)
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown greek '{s}'")))
    }
}

/// All seven sensitivities of one option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Greeks {
    /// ∂V/∂S
    pub delta: Real,
    /// ∂²V/∂S²
    pub gamma: Real,
    /// ∂V/∂v
    pub vega: Real,
    /// ∂V/∂r
    pub rho: Real,
    /// ∂²V/∂v²
    pub volga: Real,
    /// ∂²V/∂S∂v
    pub vanna: Real,
    /// Time decay.
    pub theta: Real,
}

/// One quadrature node with both branches evaluated.
struct Node {
    phi: Real,
    phase: Complex64,
    one: CharacteristicCoefficients,
    two: CharacteristicCoefficients,
}

impl Node {
    fn i_phi(&self) -> Complex64 {
        Complex64::new(0.0, self.phi)
    }
}

/// Relative accuracy of the sensitivity integrals of
/// [`AnalyticHestonGreeks::new`].
///
/// Short-dated kernels decay slowly in `phi`; an absolute target of the
/// pricing engine's order cannot be met within its evaluation budget.
pub const SENSITIVITY_RELATIVE_ACCURACY: Real = 1e-8;

/// Greek calculator on top of an [`AnalyticHestonEngine`].
///
/// Delta and prices come from the pricing engine; the other sensitivities
/// integrate their kernels with a second engine.
#[derive(Debug, Clone)]
pub struct AnalyticHestonGreeks<I = GaussKronrodAdaptive> {
    engine: AnalyticHestonEngine<I>,
    sensitivities: AnalyticHestonEngine<I>,
}

impl AnalyticHestonGreeks {
    /// Default pricing engine, with sensitivity integrals held to
    /// [`SENSITIVITY_RELATIVE_ACCURACY`].
    pub fn new() -> Self {
        let integrator =
            GaussKronrodAdaptive::default().with_relative_accuracy(SENSITIVITY_RELATIVE_ACCURACY);
        Self::with_engines(
            AnalyticHestonEngine::new(),
            AnalyticHestonEngine::with_integrator(integrator),
        )
    }
}

impl Default for AnalyticHestonGreeks {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Integrator + Clone> AnalyticHestonGreeks<I> {
    /// Greeks using `engine` for every integral.
    pub fn with_engine(engine: AnalyticHestonEngine<I>) -> Self {
        Self {
            sensitivities: engine.clone(),
            engine,
        }
    }
}

impl<I: Integrator> AnalyticHestonGreeks<I> {
    /// Greeks pricing with `engine` and integrating the gamma, vega, rho,
    /// volga, vanna and theta kernels with `sensitivities`.
    pub fn with_engines(
        engine: AnalyticHestonEngine<I>,
        sensitivities: AnalyticHestonEngine<I>,
    ) -> Self {
        Self {
            engine,
            sensitivities,
        }
    }

    /// The underlying pricing engine.
    pub fn engine(&self) -> &AnalyticHestonEngine<I> {
        &self.engine
    }

    /// The engine integrating the sensitivity kernels.
    pub fn sensitivity_engine(&self) -> &AnalyticHestonEngine<I> {
        &self.sensitivities
    }

    /// $\frac{1}{\pi}\int_0^\infty \mathrm{Re}[e^{-i\phi\ln K}\,\kappa(\phi)]\,d\phi$
    fn kernel_integral<F>(&self, params: &ModelParameters, kernel: F) -> Result<Real>
    where
        F: Fn(&HestonCharacteristicFunction, &Node) -> Complex64,
    {
        let cf = HestonCharacteristicFunction::new(*params)?;
        let ln_k = params.k().ln();
        let integral = self.sensitivities.integrate(|phi| {
            let node = Node {
                phi,
                phase: strike_phase(phi, ln_k),
                one: cf.evaluate(phi, BranchIndex::One),
                two: cf.evaluate(phi, BranchIndex::Two),
            };
            (node.phase * kernel(&cf, &node)).re
        })?;
        Ok(integral / PI)
    }

    /// Delta: $P_1$ for a call, $-P_1$ for a put.
    pub fn delta(&self, option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let p1 = self.engine.probability(BranchIndex::One, params)?;
        Ok(option_type.sign() * p1)
    }

    /// Gamma, identical for calls and puts.
    pub fn gamma(&self, _option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, ke) = (params.s(), params.k() * params.discount_factor());
        let gamma = self.kernel_integral(params, |_, n| {
            (1.0 + n.i_phi()) * n.one.f / s + ke * (1.0 - n.i_phi()) * n.two.f / (s * s)
        })?;
        ensure_post!(gamma.is_finite(), "gamma is not finite for {params}");
        Ok(gamma)
    }

    /// Vega with respect to the initial variance, identical for calls and puts.
    pub fn vega(&self, _option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, ke) = (params.s(), params.k() * params.discount_factor());
        let vega = self.kernel_integral(params, |_, n| {
            (s * n.one.f * n.one.big_d - ke * n.two.f * n.two.big_d) / n.i_phi()
        })?;
        ensure_post!(vega.is_finite(), "vega is not finite for {params}");
        Ok(vega)
    }

    /// Rho. Calls and puts differ by `K·T·e^{-rT}`.
    pub fn rho(&self, option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, t, ke) = (params.s(), params.t(), params.k() * params.discount_factor());
        let integral = self.kernel_integral(params, |_, n| {
            s * n.one.f - ke * (1.0 / -n.i_phi() + 1.0) * n.two.f
        })?;
        let rho = option_type.sign() * 0.5 * ke * t + t * integral;
        ensure_post!(rho.is_finite(), "rho is not finite for {params}");
        Ok(rho)
    }

    /// Volga (second derivative in the initial variance), identical for
    /// calls and puts.
    pub fn volga(&self, _option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, ke) = (params.s(), params.k() * params.discount_factor());
        let volga = self.kernel_integral(params, |_, n| {
            let (d1, d2) = (n.one.big_d, n.two.big_d);
            (ke * n.two.f * d2 * d2 - s * n.one.f * d1 * d1) / -n.i_phi()
        })?;
        ensure_post!(volga.is_finite(), "volga is not finite for {params}");
        Ok(volga)
    }

    /// Vanna (cross spot / initial-variance derivative), identical for
    /// calls and puts.
    pub fn vanna(&self, _option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, ke) = (params.s(), params.k() * params.discount_factor());
        let vanna = self.kernel_integral(params, |_, n| {
            let one_minus_i_over_phi = Complex64::new(1.0, -1.0 / n.phi);
            one_minus_i_over_phi * n.one.f * n.one.big_d - ke / s * n.two.f * n.two.big_d
        })?;
        ensure_post!(vanna.is_finite(), "vanna is not finite for {params}");
        Ok(vanna)
    }

    /// Theta. The put value is the negated call value.
    ///
    /// That is not the calendar decay of a traded put: by put–call parity
    /// the latter is `theta(Call) + r·K·e^{-rT}`.
    pub fn theta(&self, option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        let (s, r, v) = (params.s(), params.r(), params.v());
        let ke = params.k() * params.discount_factor();
        let integral = self.kernel_integral(params, |cf, n| {
            let drift_one = cf.dc_dt(n.phi, &n.one) + v * cf.dd_dt(n.phi, &n.one);
            let drift_two = cf.dc_dt(n.phi, &n.two) + v * cf.dd_dt(n.phi, &n.two);
            Complex64::new(0.0, -1.0 / n.phi)
                * (drift_one * n.one.f * s - n.two.f * ke * (drift_two - r))
        })?;
        let theta = -option_type.sign() * (0.5 * ke * r + integral);
        ensure_post!(theta.is_finite(), "theta is not finite for {params}");
        Ok(theta)
    }
}

impl<I: Integrator + Sync> AnalyticHestonGreeks<I> {
    /// Value of `greek` (or the price) for one option.
    pub fn value(&self, greek: Greek, option_type: OptionType, params: &ModelParameters) -> Result<Real> {
        match greek {
            Greek::Price => self.engine.price(option_type, params),
            Greek::Delta => self.delta(option_type, params),
            Greek::Gamma => self.gamma(option_type, params),
            Greek::Vega => self.vega(option_type, params),
            Greek::Rho => self.rho(option_type, params),
            Greek::Volga => self.volga(option_type, params),
            Greek::Vanna => self.vanna(option_type, params),
            Greek::Theta => self.theta(option_type, params),
        }
    }

    /// All seven sensitivities, computed in parallel.
    pub fn greeks(&self, option_type: OptionType, params: &ModelParameters) -> Result<Greeks> {
        let values = Greek::SENSITIVITIES
            .par_iter()
            .map(|&g| self.value(g, option_type, params))
            .collect::<Result<Vec<_>>>()?;
        Ok(Greeks {
            delta: values[0],
            gamma: values[1],
            vega: values[2],
            rho: values[3],
            volga: values[4],
            vanna: values[5],
            theta: values[6],
        })
    }

    /// `(x, greek)` points with input `name` set to each of `values` and
    /// everything else taken from `base`.
    ///
    /// Each point is a fresh validated [`ModelParameters`]; an out-of-domain
    /// value fails the whole sweep with `Error::Domain`.
    pub fn sweep(
        &self,
        greek: Greek,
        option_type: OptionType,
        base: &ModelParameters,
        name: ParameterName,
        values: &[Real],
    ) -> Result<Vec<(Real, Real)>> {
        tracing::debug!(%greek, %option_type, parameter = %name, points = values.len(), "greek sweep");
        values
            .par_iter()
            .map(|&x| -> Result<(Real, Real)> {
                let params = base.with_parameter(name, x)?;
                Ok((x, self.value(greek, option_type, &params)?))
            })
            .collect()
    }
}

/// Grid `start, start + step, ...` up to and including `finish`.
pub fn sweep_range(start: Real, finish: Real, step: Real) -> Result<Vec<Real>> {
    if !(step > 0.0) || !start.is_finite() || !finish.is_finite() || finish < start {
        return Err(Error::InvalidArgument(format!(
            "invalid sweep range {start}..={finish} step {step}"
        )));
    }
    // Tolerate the rounding of (finish - start) / step.
    let n = ((finish - start) / step + 1e-9).floor() as usize + 1;
    Ok((0..n).map(|i| start + i as Real * step).collect())
}
