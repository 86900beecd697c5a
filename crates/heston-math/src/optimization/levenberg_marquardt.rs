//! Levenberg–Marquardt least squares inside a box.
//!
//! Minimizes $\tfrac12\lVert r(x)\rVert^2$ for the residual vector
//! [`CostFunction::values`] with a forward-difference Jacobian and
//! Marquardt's diagonal scaling of the damping term. Trial points are
//! projected onto the box of the constraint. The root-epsilon test is
//! applied to [`CostFunction::value`], so a cost function may report an
//! objective other than the sum of squares of its residuals.

use heston_core::{
    errors::{Error, Result},
    Real, Size,
};
use nalgebra::DMatrix;

use super::{Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationResult};
use crate::array::Array;

const INITIAL_DAMPING: Real = 1e-3;
const MIN_DAMPING: Real = 1e-12;
const MAX_DAMPING: Real = 1e12;

/// Levenberg–Marquardt optimizer.
///
/// A plain scalar cost has the one-element residual vector `[value(x)]`,
/// so this minimizes its square; use it on non-negative costs or implement
/// [`CostFunction::values`].
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    epsfcn: Real,
    xtol: Real,
    gtol: Real,
}

impl LevenbergMarquardt {
    /// Create a new optimizer.
    ///
    /// * `epsfcn`: the Jacobian step for `x[j]` is `sqrt(epsfcn)·|x[j]|`
    /// * `xtol`: stop when an accepted step is shorter than `xtol·|x|`
    /// * `gtol`: stop when every gradient component is below `gtol`
    pub fn new(epsfcn: Real, xtol: Real, gtol: Real) -> Self {
        Self { epsfcn, xtol, gtol }
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
                "LevenbergMarquardt: initial values {initial_values} violate the constraint"
            )));
        }
        let bounds = constraint.bounds();
        let project = |x: Array| match bounds {
            Some((lower, upper)) => x.clamp(lower, upper),
            None => x,
        };

        let mut x = initial_values.clone();
        let mut residuals = cost_fn.values(&x);
        let mut value = cost_fn.value(&x);
        let mut evaluations = 2;
        if !residuals.is_finite() {
            return Ok(finished(x, value, 0, evaluations, EndCriteriaType::NonFiniteStart));
        }

        let n = x.size();
        let mut cost = 0.5 * residuals.norm_squared();
        let mut damping = INITIAL_DAMPING;
        let mut iterations = 0;

        loop {
            if value < end_criteria.root_epsilon {
                return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::RootEpsilon));
            }
            if iterations >= end_criteria.max_iterations {
                return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::MaxIterations));
            }
            iterations += 1;

            let jacobian = self.jacobian(cost_fn, &x, &residuals, bounds);
            evaluations += n;
            let gradient = jacobian.tr_mul(residuals.inner());
            if gradient.amax() < self.gtol {
                return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::ZeroGradientNorm));
            }
            let normal = jacobian.tr_mul(&jacobian);
            let descent = -&gradient;

            let (trial, trial_residuals) = loop {
                let mut damped = normal.clone();
                for j in 0..n {
                    damped[(j, j)] += damping * normal[(j, j)].max(MIN_DAMPING);
                }
                if let Some(step) = damped.lu().solve(&descent) {
                    let trial = project(&x + &Array::from(step));
                    let trial_residuals = cost_fn.values(&trial);
                    evaluations += 1;
                    if trial_residuals.is_finite() && 0.5 * trial_residuals.norm_squared() < cost {
                        break (trial, trial_residuals);
                    }
                }
                damping *= 4.0;
                if damping > MAX_DAMPING {
                    return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::StationaryPoint));
                }
            };
            damping = (damping / 3.0).max(MIN_DAMPING);

            let step = (&trial - &x).norm();
            let trial_cost = 0.5 * trial_residuals.norm_squared();
            let reduction = (cost - trial_cost) / cost;
            x = trial;
            residuals = trial_residuals;
            cost = trial_cost;
            value = cost_fn.value(&x);
            evaluations += 1;

            if value < end_criteria.root_epsilon {
                continue;
            }
            if step <= self.xtol * (x.norm() + self.xtol) {
                return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::StationaryPoint));
            }
            if reduction < end_criteria.function_epsilon {
                return Ok(finished(x, value, iterations, evaluations, EndCriteriaType::FunctionEpsilon));
            }
        }
    }

    /// Forward-difference Jacobian, stepping backwards at an upper bound.
    fn jacobian<C: CostFunction>(
        &self,
        cost_fn: &C,
        x: &Array,
        residuals: &Array,
        bounds: Option<(&Array, &Array)>,
    ) -> DMatrix<Real> {
        let (m, n) = (residuals.size(), x.size());
        let scale = self.epsfcn.sqrt();
        let mut jacobian = DMatrix::zeros(m, n);
        for j in 0..n {
            let mut h = scale * x[j].abs();
            if h == 0.0 {
                h = scale;
            }
            if bounds.is_some_and(|(_, upper)| x[j] + h > upper[j]) {
                h = -h;
            }
            let mut shifted = x.clone();
            shifted[j] += h;
            let shifted_residuals = cost_fn.values(&shifted);
            for i in 0..m {
                let shifted_value = shifted_residuals.as_slice().get(i).copied().unwrap_or(Real::NAN);
                let slope = (shifted_value - residuals[i]) / h;
                // An unevaluable neighbour freezes the coordinate for this step.
                jacobian[(i, j)] = if slope.is_finite() { slope } else { 0.0 };
            }
        }
        jacobian
    }
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-8, 1e-10, 1e-12)
    }
}

fn finished(
    x: Array,
    value: Real,
    iterations: Size,
    evaluations: Size,
    end_type: EndCriteriaType,
) -> OptimizationResult {
    OptimizationResult {
        x,
        value,
        iterations,
        evaluations,
        end_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{BoxConstraint, NoConstraint};

    /// Rosenbrock as residuals `(1 - x, 10 (y - x²))`.
    struct Rosenbrock;

    impl CostFunction for Rosenbrock {
        fn value(&self, x: &Array) -> Real {
            self.values(x).norm_squared()
        }

        fn values(&self, x: &Array) -> Array {
            Array::from_slice(&[1.0 - x[0], 10.0 * (x[1] - x[0] * x[0])])
        }
    }

    /// `a·e^{-b t}` against exact samples of `2·e^{-0.7 t}`.
    struct ExponentialFit {
        times: Vec<Real>,
    }

    impl CostFunction for ExponentialFit {
        fn value(&self, x: &Array) -> Real {
            self.values(x).norm_squared()
        }

        fn values(&self, x: &Array) -> Array {
            Array::from_vec(
                self.times
                    .iter()
                    .map(|&t| x[0] * (-x[1] * t).exp() - 2.0 * (-0.7 * t).exp())
                    .collect(),
            )
        }
    }

    #[test]
    fn rosenbrock_residuals() {
        let ec = EndCriteria::new(100, 10, 1e-16, 1e-16);
        let result = LevenbergMarquardt::default()
            .minimize(&Rosenbrock, &NoConstraint, &Array::from_slice(&[-1.2, 1.0]), &ec)
            .unwrap();
        assert!(result.end_type.is_converged(), "{:?}", result.end_type);
        assert!((result.x[0] - 1.0).abs() < 1e-6, "x = {}", result.x);
        assert!((result.x[1] - 1.0).abs() < 1e-6, "x = {}", result.x);
    }

    #[test]
    fn exponential_fit_inside_box() {
        let fit = ExponentialFit {
            times: (0..10).map(|i| 0.5 * i as Real).collect(),
        };
        let bounds =
            BoxConstraint::new(Array::from_slice(&[0.0, 0.0]), Array::from_slice(&[10.0, 10.0])).unwrap();
        let ec = EndCriteria::new(100, 10, 1e-16, 1e-16);
        let result = LevenbergMarquardt::default()
            .minimize(&fit, &bounds, &Array::from_slice(&[1.0, 0.2]), &ec)
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::RootEpsilon);
        assert!((result.x[0] - 2.0).abs() < 1e-6);
        assert!((result.x[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn minimum_outside_box_lands_on_bound() {
        let bounds = BoxConstraint::new(Array::from_slice(&[0.0]), Array::from_slice(&[2.0])).unwrap();
        let distance = |x: &Array| (x[0] - 3.0).abs();
        let result = LevenbergMarquardt::default()
            .minimize(&distance, &bounds, &Array::from_slice(&[0.5]), &EndCriteria::default())
            .unwrap();
        assert_eq!(result.x[0], 2.0);
        assert!(bounds.test(&result.x));
    }

    #[test]
    fn reports_iteration_cap() {
        let ec = EndCriteria::new(1, 10, 1e-16, 1e-16);
        let result = LevenbergMarquardt::default()
            .minimize(&Rosenbrock, &NoConstraint, &Array::from_slice(&[-1.2, 1.0]), &ec)
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::MaxIterations);
        assert_eq!(result.iterations, 1);
        assert!(!result.end_type.is_converged());
    }

    #[test]
    fn non_finite_start_is_reported_not_thrown() {
        let broken = |_: &Array| Real::INFINITY;
        let start = Array::from_slice(&[0.3, 0.4]);
        let result = LevenbergMarquardt::default()
            .minimize(&broken, &NoConstraint, &start, &EndCriteria::default())
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::NonFiniteStart);
        assert!(!result.end_type.is_converged());
        assert_eq!(result.x, start);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn rejects_infeasible_start() {
        let bounds = BoxConstraint::new(Array::from_slice(&[0.0]), Array::from_slice(&[1.0])).unwrap();
        let err = LevenbergMarquardt::default()
            .minimize(&|x: &Array| x[0], &bounds, &Array::from_slice(&[2.0]), &EndCriteria::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
