//! Optimization framework.
//!
//! Provides the cost-function and constraint seams, end criteria, and three
//! minimizers: [`LevenbergMarquardt`] least squares and the Nelder–Mead
//! [`Simplex`] (local), and [`DifferentialEvolution`] (global, population
//! based).

pub mod differential_evolution;
pub mod levenberg_marquardt;

pub use differential_evolution::DifferentialEvolution;
pub use levenberg_marquardt::LevenbergMarquardt;

use crate::array::Array;
use heston_core::{
    errors::{Error, Result},
    Real, Size,
};

// ── Cost function trait ───────────────────────────────────────────────────────

/// A scalar objective over a parameter vector.
pub trait CostFunction {
    /// Evaluate the objective at `x`.
    fn value(&self, x: &Array) -> Real;

    /// Residual vector for least-squares methods. Defaults to `[value(x)]`.
    fn values(&self, x: &Array) -> Array {
        Array::from_slice(&[self.value(x)])
    }
}

impl<F: Fn(&Array) -> Real> CostFunction for F {
    fn value(&self, x: &Array) -> Real {
        self(x)
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on the parameter space.
pub trait Constraint {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;

    /// Component-wise `(lower, upper)` bounds, when the feasible set is a box.
    fn bounds(&self) -> Option<(&Array, &Array)> {
        None
    }
}

/// No constraint — all parameter values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Box constraint — `lower[i] <= x[i] <= upper[i]` for every component.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxConstraint {
    lower: Array,
    upper: Array,
}

impl BoxConstraint {
    /// Create a box constraint. Both bounds must have the same length and
    /// satisfy `lower[i] <= upper[i]`.
    pub fn new(lower: Array, upper: Array) -> Result<Self> {
        if lower.size() != upper.size() {
            return Err(Error::InvalidArgument(format!(
                "box bounds have different sizes ({} vs {})",
                lower.size(),
                upper.size()
            )));
        }
        if let Some(i) = (0..lower.size()).find(|&i| !(lower[i] <= upper[i])) {
            return Err(Error::InvalidArgument(format!(
                "box bound {i}: lower {} exceeds upper {}",
                lower[i], upper[i]
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Lower bounds.
    pub fn lower(&self) -> &Array {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &Array {
        &self.upper
    }

    /// Project `x` onto the box.
    pub fn project(&self, x: &Array) -> Array {
        x.clamp(&self.lower, &self.upper)
    }
}

impl Constraint for BoxConstraint {
    fn test(&self, x: &Array) -> bool {
        x.size() == self.lower.size()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    fn bounds(&self) -> Option<(&Array, &Array)> {
        Some((&self.lower, &self.upper))
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct EndCriteria {
    /// Maximum number of iterations (generations for population methods).
    pub max_iterations: Size,
    /// Maximum number of consecutive iterations without improvement of the
    /// best value.
    pub max_stationary_state_iterations: Size,
    /// Root epsilon — stop when the function value drops below this.
    pub root_epsilon: Real,
    /// Function epsilon — stop when the spread of function values across
    /// the simplex / population drops below this (relative).
    pub function_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: Size,
        max_stationary_state_iterations: Size,
        root_epsilon: Real,
        function_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
        }
    }

    /// `true` when `best` and `worst` agree to within `function_epsilon`.
    fn spread_converged(&self, best: Real, worst: Real) -> bool {
        2.0 * (worst - best).abs()
            <= self.function_epsilon * (worst.abs() + best.abs()) + Real::MIN_POSITIVE
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_stationary_state_iterations: 100,
            root_epsilon: 1e-8,
            function_epsilon: 1e-8,
        }
    }
}

/// The reason an optimization terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Maximum iterations reached.
    MaxIterations,
    /// Function value below root epsilon.
    RootEpsilon,
    /// Function spread below function epsilon.
    FunctionEpsilon,
    /// Maximum stationary-state iterations reached, or no step improves.
    StationaryPoint,
    /// Gradient below its tolerance.
    ZeroGradientNorm,
    /// The cost is not finite at the starting point.
    NonFiniteStart,
}

impl EndCriteriaType {
    /// Every stop except the iteration cap and an unusable start counts as
    /// convergence.
    pub fn is_converged(self) -> bool {
        !matches!(
            self,
            EndCriteriaType::MaxIterations | EndCriteriaType::NonFiniteStart
        )
    }
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values (best iterate found).
    pub x: Array,
    /// Final function value.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: Size,
    /// Number of cost-function evaluations.
    pub evaluations: Size,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

/// Evaluate `cost_fn` at `x`, mapping infeasible points and NaN to `Real::MAX`.
fn penalized<C: CostFunction, K: Constraint>(cost_fn: &C, constraint: &K, x: &Array) -> Real {
    if !constraint.test(x) {
        return Real::MAX;
    }
    let v = cost_fn.value(x);
    if v.is_nan() {
        Real::MAX
    } else {
        v
    }
}

// ── Simplex (Nelder–Mead) ─────────────────────────────────────────────────────

/// Nelder–Mead simplex optimizer.
///
/// The initial simplex steps each coordinate by `lambda` times the width of
/// the feasible box (or by `lambda` itself when the constraint is unbounded).
/// Trial points outside the constraint are scored as `Real::MAX`, so every
/// vertex stays feasible.
#[derive(Debug, Clone, Copy)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a new simplex optimizer with step size `lambda`.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }

    /// Minimize `cost_fn` subject to `constraint`, starting from `initial_values`.
    pub fn minimize<C: CostFunction, K: Constraint>(
        &self,
        cost_fn: &C,
        constraint: &K,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        if !constraint.test(initial_values) {
            return Err(Error::InvalidArgument(format!(
                "Simplex: initial values {initial_values} violate the constraint"
            )));
        }

        let n = initial_values.size();
        let steps: Vec<Real> = match constraint.bounds() {
            Some((lo, hi)) => (0..n).map(|i| self.lambda * (hi[i] - lo[i])).collect(),
            None => vec![self.lambda; n],
        };

        // Build initial simplex
        let mut vertices: Vec<Array> = Vec::with_capacity(n + 1);
        vertices.push(initial_values.clone());
        for (i, &step) in steps.iter().enumerate() {
            let mut v = initial_values.clone();
            v[i] += step;
            if !constraint.test(&v) {
                v[i] = initial_values[i] - step;
            }
            vertices.push(v);
        }

        let mut values: Vec<Real> = vertices
            .iter()
            .map(|v| penalized(cost_fn, constraint, v))
            .collect();
        let mut evaluations = n + 1;

        let mut iterations = 0;
        let mut stationary_count = 0;
        let mut prev_best = Real::MAX;

        loop {
            // Order vertices: best first, worst last
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let (ilo, inhi, ihi) = (order[0], order[n.saturating_sub(1)], order[n]);

            let finish = |end_type: EndCriteriaType, iterations: Size, evaluations: Size| {
                Ok(OptimizationResult {
                    x: vertices[ilo].clone(),
                    value: values[ilo],
                    iterations,
                    evaluations,
                    end_type,
                })
            };

            if values[ilo] < end_criteria.root_epsilon {
                return finish(EndCriteriaType::RootEpsilon, iterations, evaluations);
            }
            if end_criteria.spread_converged(values[ilo], values[ihi]) {
                return finish(EndCriteriaType::FunctionEpsilon, iterations, evaluations);
            }
            if values[ilo] < prev_best {
                stationary_count = 0;
                prev_best = values[ilo];
            } else {
                stationary_count += 1;
                if stationary_count >= end_criteria.max_stationary_state_iterations {
                    return finish(EndCriteriaType::StationaryPoint, iterations, evaluations);
                }
            }
            if iterations >= end_criteria.max_iterations {
                return finish(EndCriteriaType::MaxIterations, iterations, evaluations);
            }
            iterations += 1;

            // Centroid (excluding worst)
            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != ihi {
                    centroid = &centroid + v;
                }
            }
            let centroid = &centroid / n as Real;
            let towards = &centroid - &vertices[ihi];

            // Reflection
            let reflected = &centroid + &towards;
            let fr = penalized(cost_fn, constraint, &reflected);
            evaluations += 1;

            if fr < values[ilo] {
                // Expansion
                let expanded = &reflected + &towards;
                let fe = penalized(cost_fn, constraint, &expanded);
                evaluations += 1;
                if fe < fr {
                    vertices[ihi] = expanded;
                    values[ihi] = fe;
                } else {
                    vertices[ihi] = reflected;
                    values[ihi] = fr;
                }
            } else if fr < values[inhi] {
                vertices[ihi] = reflected;
                values[ihi] = fr;
            } else {
                // Contraction
                let contracted = if fr < values[ihi] {
                    &(&centroid + &reflected) / 2.0
                } else {
                    &(&centroid + &vertices[ihi]) / 2.0
                };
                let fc = penalized(cost_fn, constraint, &contracted);
                evaluations += 1;
                if fc < values[ihi].min(fr) {
                    vertices[ihi] = contracted;
                    values[ihi] = fc;
                } else {
                    // Shrink all towards best
                    let best = vertices[ilo].clone();
                    for i in 0..=n {
                        if i != ilo {
                            vertices[i] = &(&best + &vertices[i]) / 2.0;
                            values[i] = penalized(cost_fn, constraint, &vertices[i]);
                            evaluations += 1;
                        }
                    }
                }
            }
        }
    }
}
