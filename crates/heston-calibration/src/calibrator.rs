//! Heston calibration to a basket of call quotes.
//!
//! The objective is the sum of relative absolute pricing errors,
//!
//! $$\sum_i \frac{|C_i^{\text{model}} - C_i^{\text{market}}|}{C_i^{\text{market}}},$$
//!
//! minimized over `(v, theta, kappa, sigma, rho)` inside a box, either
//! locally from the initial guess (Levenberg–Marquardt on the signed
//! relative errors, or a Nelder–Mead simplex) or globally with
//! Differential Evolution.
//!
//! Calibration is best effort once its inputs are valid. A guess that
//! cannot be priced starts from an objective of `Real::MAX`, and a fit that
//! cannot be repriced at full accuracy is reported at search accuracy with
//! `converged == false`.

use std::fmt;
use std::str::FromStr;

use heston_core::{
    ensure,
    errors::{Error, Result},
    Price, Real, Size,
};
use heston_math::{
    Array, CostFunction, DifferentialEvolution, EndCriteria, EndCriteriaType, LevenbergMarquardt,
    OptimizationResult, Simplex,
};
use heston_models::{CalibrationGuess, ParameterBounds};
use heston_pricingengines::AnalyticHestonEngine;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::quotes::QuoteBasket;

// ── Settings ──────────────────────────────────────────────────────────────────

/// Which optimizer drives the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Search from the initial guess with [`LocalMethod`].
    Local,
    /// Differential Evolution over the whole box.
    Global,
}

impl fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationMode::Local => f.write_str("local"),
            CalibrationMode::Global => f.write_str("global"),
        }
    }
}

impl FromStr for CalibrationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(CalibrationMode::Local),
            "global" => Ok(CalibrationMode::Global),
            _ => Err(Error::InvalidArgument(format!(
                "calibration mode must be 'local' or 'global', got '{s}'"
            ))),
        }
    }
}

/// Optimizer of [`CalibrationMode::Local`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalMethod {
    /// Least squares on the signed relative errors.
    #[default]
    LevenbergMarquardt,
    /// Nelder–Mead on the objective itself.
    Simplex,
}

/// Tunables of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Optimizer in local mode.
    pub local_method: LocalMethod,
    /// Iterations (local mode).
    pub max_iterations: Size,
    /// Generations (global mode).
    pub max_generations: Size,
    /// Iterations without improvement of the best objective before stopping.
    pub max_stationary_iterations: Size,
    /// Stop once the objective falls below this.
    pub objective_tolerance: Real,
    /// Stop once the relative spread of objective values falls below this.
    pub function_epsilon: Real,
    /// Initial simplex step as a fraction of each bound's width.
    pub simplex_lambda: Real,
    /// Differential Evolution population size.
    pub population_size: usize,
    /// Differential Evolution crossover probability.
    pub crossover_probability: Real,
    /// Differential Evolution difference-vector weight.
    pub differential_weight: Real,
    /// Differential Evolution seed.
    pub seed: u64,
    /// Quadrature absolute accuracy (local mode and the reported fit).
    pub absolute_accuracy: Real,
    /// Quadrature evaluation budget per integral (local mode and the reported fit).
    pub max_evaluations: Size,
    /// Quadrature absolute accuracy inside the global search.
    pub global_absolute_accuracy: Real,
    /// Quadrature evaluation budget per integral inside the global search.
    pub global_max_evaluations: Size,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            local_method: LocalMethod::LevenbergMarquardt,
            max_iterations: 500,
            max_generations: 100,
            max_stationary_iterations: 100,
            objective_tolerance: 1e-8,
            function_epsilon: 1e-10,
            simplex_lambda: 0.1,
            population_size: 40,
            crossover_probability: 0.9,
            differential_weight: 0.7,
            seed: 42,
            absolute_accuracy: 1e-10,
            max_evaluations: 100_000,
            global_absolute_accuracy: 1e-7,
            global_max_evaluations: 20_000,
        }
    }
}

impl CalibrationSettings {
    fn end_criteria(&self, mode: CalibrationMode) -> EndCriteria {
        let max_iterations = match mode {
            CalibrationMode::Local => self.max_iterations,
            CalibrationMode::Global => self.max_generations,
        };
        EndCriteria::new(
            max_iterations,
            self.max_stationary_iterations,
            self.objective_tolerance,
            self.function_epsilon,
        )
    }

    fn engine(&self, mode: CalibrationMode) -> AnalyticHestonEngine {
        match mode {
            CalibrationMode::Local => {
                AnalyticHestonEngine::with_accuracy(self.absolute_accuracy, self.max_evaluations)
            }
            CalibrationMode::Global => AnalyticHestonEngine::with_accuracy(
                self.global_absolute_accuracy,
                self.global_max_evaluations,
            ),
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Outcome of a calibration: the best iterate and how well it fits.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    /// Best parameters found.
    pub parameters: CalibrationGuess,
    /// Objective at `parameters`.
    pub objective: Real,
    /// Objective at the initial guess.
    pub initial_objective: Real,
    /// Optimizer iterations (generations in global mode).
    pub iterations: Size,
    /// Objective evaluations.
    pub evaluations: Size,
    /// `false` when the optimizer stopped on its iteration cap, could not
    /// start, or the fit was not repriced at full accuracy.
    pub converged: bool,
    /// Why the optimizer stopped.
    pub end_type: EndCriteriaType,
    /// Optimizer used.
    pub mode: CalibrationMode,
    /// Model call price per quote at `parameters`; `NaN` when the
    /// parameters cannot be priced at all.
    pub model_prices: Vec<Price>,
    /// `|model - market| / market` per quote.
    pub relative_errors: Vec<Real>,
}

// ── Objective ─────────────────────────────────────────────────────────────────

/// Sum of relative pricing errors over a basket.
struct HestonObjective<'a> {
    quotes: &'a QuoteBasket,
    engine: AnalyticHestonEngine,
}

impl HestonObjective<'_> {
    fn model_prices(&self, guess: &CalibrationGuess) -> Result<Vec<Price>> {
        self.quotes
            .quotes()
            .par_iter()
            .map(|q| self.engine.european_call(&q.parameters(guess)?))
            .collect()
    }

    fn relative_errors(&self, model_prices: &[Price]) -> Vec<Real> {
        self.quotes
            .iter()
            .zip(model_prices)
            .map(|(q, &m)| (m - q.market_price).abs() / q.market_price)
            .collect()
    }

    fn evaluate(&self, guess: &CalibrationGuess) -> Result<Real> {
        let prices = self.model_prices(guess)?;
        Ok(self.relative_errors(&prices).iter().sum())
    }

    fn signed_errors(&self, guess: &CalibrationGuess) -> Result<Vec<Real>> {
        let prices = self.model_prices(guess)?;
        Ok(self
            .quotes
            .iter()
            .zip(prices)
            .map(|(q, m)| (m - q.market_price) / q.market_price)
            .collect())
    }
}

impl CostFunction for HestonObjective<'_> {
    fn value(&self, x: &Array) -> Real {
        let value = CalibrationGuess::from_array(x).and_then(|g| self.evaluate(&g));
        match value {
            Ok(v) => {
                tracing::debug!(candidate = %x, objective = v, "calibration objective");
                v
            }
            Err(e) => {
                tracing::debug!(candidate = %x, error = %e, "candidate cannot be priced");
                Real::MAX
            }
        }
    }

    fn values(&self, x: &Array) -> Array {
        match CalibrationGuess::from_array(x).and_then(|g| self.signed_errors(&g)) {
            Ok(errors) => Array::from_vec(errors),
            Err(_) => Array::from_element(self.quotes.len(), Real::INFINITY),
        }
    }
}

// ── Calibrator ────────────────────────────────────────────────────────────────

/// Fits `(v, theta, kappa, sigma, rho)` to a [`QuoteBasket`].
#[derive(Debug, Clone, Default)]
pub struct HestonCalibrator {
    settings: CalibrationSettings,
}

impl HestonCalibrator {
    /// Calibrator with the given settings.
    pub fn new(settings: CalibrationSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Objective value of `guess` against `quotes`, priced at full accuracy.
    pub fn objective(&self, guess: &CalibrationGuess, quotes: &QuoteBasket) -> Result<Real> {
        guess.validate()?;
        HestonObjective {
            quotes,
            engine: self.settings.engine(CalibrationMode::Local),
        }
        .evaluate(guess)
    }

    /// Calibrate from `guess0` within `bounds`.
    ///
    /// Invalid bounds or a guess outside them fail with `Error::Domain`
    /// before any pricing. Pricing failures and running out of iterations
    /// are not errors: the best iterate is returned with
    /// `converged == false`.
    pub fn calibrate(
        &self,
        guess0: &CalibrationGuess,
        bounds: &ParameterBounds,
        quotes: &QuoteBasket,
        mode: CalibrationMode,
    ) -> Result<CalibrationResult> {
        let constraint = bounds.to_constraint()?;
        guess0.validate()?;
        ensure!(
            bounds.contains(guess0),
            "initial guess {:?} lies outside the calibration bounds",
            guess0
        );

        let initial_objective = match self.objective(guess0, quotes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(guess = ?guess0, error = %e, "initial guess cannot be priced");
                Real::MAX
            }
        };
        tracing::info!(
            %mode,
            quotes = quotes.len(),
            initial_objective,
            "heston calibration started"
        );

        let objective = HestonObjective {
            quotes,
            engine: self.settings.engine(mode),
        };
        let end_criteria = self.settings.end_criteria(mode);
        let start = guess0.to_array();
        let outcome: OptimizationResult = match mode {
            CalibrationMode::Local => match self.settings.local_method {
                LocalMethod::LevenbergMarquardt => LevenbergMarquardt::default().minimize(
                    &objective,
                    &constraint,
                    &start,
                    &end_criteria,
                )?,
                LocalMethod::Simplex => Simplex::new(self.settings.simplex_lambda).minimize(
                    &objective,
                    &constraint,
                    &start,
                    &end_criteria,
                )?,
            },
            CalibrationMode::Global => DifferentialEvolution::new(
                self.settings.population_size,
                self.settings.crossover_probability,
                self.settings.differential_weight,
            )
            .with_seed(self.settings.seed)
            .minimize(&objective, &constraint, &start, &end_criteria)?,
        };

        let parameters = CalibrationGuess::from_array(&outcome.x)?;
        let reporting = HestonObjective {
            quotes,
            engine: self.settings.engine(CalibrationMode::Local),
        };
        let (model_prices, repriced) = match reporting.model_prices(&parameters) {
            Ok(prices) => (prices, true),
            Err(e) => {
                tracing::warn!(error = %e, "fit cannot be repriced at full accuracy");
                let prices = objective
                    .model_prices(&parameters)
                    .unwrap_or_else(|_| vec![Real::NAN; quotes.len()]);
                (prices, false)
            }
        };
        let relative_errors = reporting.relative_errors(&model_prices);
        let fitted: Real = relative_errors.iter().sum();
        let fitted = if fitted.is_finite() { fitted } else { Real::MAX };
        let converged = outcome.end_type.is_converged() && repriced;

        if converged {
            tracing::info!(
                %mode,
                objective = fitted,
                iterations = outcome.iterations,
                end_type = ?outcome.end_type,
                "heston calibration finished"
            );
        } else {
            tracing::warn!(
                %mode,
                objective = fitted,
                iterations = outcome.iterations,
                end_type = ?outcome.end_type,
                repriced,
                "heston calibration did not converge"
            );
        }

        Ok(CalibrationResult {
            parameters,
            objective: fitted,
            initial_objective,
            iterations: outcome.iterations,
            evaluations: outcome.evaluations,
            converged,
            end_type: outcome.end_type,
            mode,
            model_prices,
            relative_errors,
        })
    }
}
