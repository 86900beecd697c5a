//! Differential Evolution (DE/rand/1/bin) over a box-shaped search space.

use heston_core::{
    errors::{Error, Result},
    Real,
};

use super::{
    penalized, Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationResult,
};
use crate::{array::Array, random_numbers::MersenneTwisterUniformRng};

/// Differential Evolution global optimizer.
///
/// The first population member is the supplied starting point; the others
/// are drawn uniformly from the constraint's bounds. Mutants are clamped
/// back into the box before selection, so the constraint must expose
/// [`Constraint::bounds`].
#[derive(Debug, Clone, Copy)]
pub struct DifferentialEvolution {
    population_size: usize,
    crossover_prob: Real,
    differential_weight: Real,
    seed: u64,
}

impl DifferentialEvolution {
    /// Create a new Differential Evolution optimizer.
    ///
    /// * `population_size` — size of the candidate pool (at least 4)
    /// * `crossover_prob` — probability of taking a mutant component
    /// * `differential_weight` — scale factor for difference vectors
    pub fn new(population_size: usize, crossover_prob: Real, differential_weight: Real) -> Self {
        Self {
            population_size,
            crossover_prob,
            differential_weight,
            seed: 42,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Population size actually used.
    pub fn population_size(&self) -> usize {
        self.population_size.max(4)
    }

    /// Minimize `cost_fn` over the box of `constraint`, seeding the population
    /// with `initial_values`.
    ///
    /// `end_criteria.max_iterations` bounds the number of generations.
    pub fn minimize<C: CostFunction, K: Constraint>(
        &self,
        cost_fn: &C,
        constraint: &K,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        let Some((lower, upper)) = constraint.bounds() else {
            return Err(Error::InvalidArgument(
                "DifferentialEvolution: a bounded constraint is required".into(),
            ));
        };
        let n = initial_values.size();
        if lower.size() != n {
            return Err(Error::InvalidArgument(format!(
                "DifferentialEvolution: {n} starting values for {} bounds",
                lower.size()
            )));
        }
        let np = self.population_size();
        let mut rng = MersenneTwisterUniformRng::new(self.seed);

        let mut population: Vec<Array> = Vec::with_capacity(np);
        population.push(initial_values.clamp(lower, upper));
        for _ in 1..np {
            let candidate: Vec<Real> = (0..n).map(|j| rng.next_in(lower[j], upper[j])).collect();
            population.push(Array::from_vec(candidate));
        }

        let mut costs: Vec<Real> = population
            .iter()
            .map(|p| penalized(cost_fn, constraint, p))
            .collect();
        let mut evaluations = np;

        let mut best_idx = argmin(&costs);
        let mut stationary_count = 0;
        let mut generation = 0;

        let end_type = loop {
            let worst = costs.iter().copied().fold(Real::MIN, Real::max);
            if costs[best_idx] < end_criteria.root_epsilon {
                break EndCriteriaType::RootEpsilon;
            }
            if end_criteria.spread_converged(costs[best_idx], worst) {
                break EndCriteriaType::FunctionEpsilon;
            }
            if stationary_count >= end_criteria.max_stationary_state_iterations {
                break EndCriteriaType::StationaryPoint;
            }
            if generation >= end_criteria.max_iterations {
                break EndCriteriaType::MaxIterations;
            }
            generation += 1;

            let previous_best = costs[best_idx];
            for i in 0..np {
                // Three distinct members, all different from i
                let r1 = draw_distinct(&mut rng, np, &[i]);
                let r2 = draw_distinct(&mut rng, np, &[i, r1]);
                let r3 = draw_distinct(&mut rng, np, &[i, r1, r2]);

                let mut trial = population[i].clone();
                let j_rand = rng.next_index(n.max(1));
                for j in 0..n {
                    if j == j_rand || rng.next_real() < self.crossover_prob {
                        trial[j] = population[r1][j]
                            + self.differential_weight * (population[r2][j] - population[r3][j]);
                    }
                }
                let trial = trial.clamp(lower, upper);

                let trial_cost = penalized(cost_fn, constraint, &trial);
                evaluations += 1;
                if trial_cost <= costs[i] {
                    population[i] = trial;
                    costs[i] = trial_cost;
                }
            }

            best_idx = argmin(&costs);
            if costs[best_idx] < previous_best {
                stationary_count = 0;
            } else {
                stationary_count += 1;
            }
        };

        Ok(OptimizationResult {
            x: population[best_idx].clone(),
            value: costs[best_idx],
            iterations: generation,
            evaluations,
            end_type,
        })
    }
}

fn argmin(values: &[Real]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i)
}

fn draw_distinct(rng: &mut MersenneTwisterUniformRng, n: usize, taken: &[usize]) -> usize {
    loop {
        let r = rng.next_index(n);
        if !taken.contains(&r) {
            return r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{BoxConstraint, NoConstraint};

    fn sphere(x: &Array) -> Real {
        x.iter().map(|v| (v - 0.5) * (v - 0.5)).sum()
    }

    /// Rastrigin: many local minima, global minimum 0 at the origin.
    fn rastrigin(x: &Array) -> Real {
        let two_pi = 2.0 * std::f64::consts::PI;
        10.0 * x.size() as Real
            + x.iter()
                .map(|v| v * v - 10.0 * (two_pi * v).cos())
                .sum::<Real>()
    }

    fn unit_box(n: usize, half_width: Real) -> BoxConstraint {
        BoxConstraint::new(
            Array::from_vec(vec![-half_width; n]),
            Array::from_vec(vec![half_width; n]),
        )
        .unwrap()
    }

    #[test]
    fn de_sphere() {
        let de = DifferentialEvolution::new(30, 0.9, 0.8).with_seed(7);
        let ec = EndCriteria::new(500, 100, 1e-12, 1e-14);
        let result = de
            .minimize(&sphere, &unit_box(3, 2.0), &Array::from_slice(&[1.5, -1.5, 0.0]), &ec)
            .unwrap();
        for &v in result.x.iter() {
            assert!((v - 0.5).abs() < 1e-3, "got {}", result.x);
        }
        assert!(result.end_type.is_converged());
    }

    #[test]
    fn de_escapes_local_minima() {
        let de = DifferentialEvolution::new(40, 0.9, 0.5).with_seed(11);
        let ec = EndCriteria::new(1000, 200, 1e-10, 1e-14);
        let result = de
            .minimize(&rastrigin, &unit_box(2, 5.12), &Array::from_slice(&[3.0, -3.0]), &ec)
            .unwrap();
        assert!(result.value < 1e-4, "value = {}", result.value);
    }

    #[test]
    fn de_stays_in_box() {
        let bounds = BoxConstraint::new(Array::from_slice(&[1.0]), Array::from_slice(&[2.0])).unwrap();
        let de = DifferentialEvolution::new(10, 0.9, 0.8);
        let result = de
            .minimize(&sphere, &bounds, &Array::from_slice(&[1.5]), &EndCriteria::default())
            .unwrap();
        assert!(bounds.test(&result.x));
        assert!((result.x[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn de_is_reproducible() {
        let de = DifferentialEvolution::new(15, 0.7, 0.6).with_seed(3);
        let ec = EndCriteria::new(20, 100, 1e-16, 1e-16);
        let start = Array::from_slice(&[1.0, 1.0]);
        let a = de.minimize(&sphere, &unit_box(2, 2.0), &start, &ec).unwrap();
        let b = de.minimize(&sphere, &unit_box(2, 2.0), &start, &ec).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn de_requires_bounds() {
        let de = DifferentialEvolution::new(10, 0.9, 0.8);
        let err = de
            .minimize(&sphere, &NoConstraint, &Array::from_slice(&[0.0]), &EndCriteria::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
