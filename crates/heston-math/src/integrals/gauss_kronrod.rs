//! Globally adaptive Gauss-Kronrod quadrature (7-point Gauss / 15-point
//! Kronrod pair).
//!
//! The interval with the largest error estimate is bisected until the summed
//! error falls below `max(absolute_accuracy, relative_accuracy·|I|)`.
//! Semi-infinite ranges `[a, ∞)` are mapped onto `(0, 1]` with
//! $x \mapsto a + (1 - t)/t$, so the rule never evaluates the integrand at
//! the lower end point and never needs a truncation of the upper one.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use heston_core::{
    errors::{Error, Result},
    fail, Real, Size,
};

use super::{IntegrationResult, Integrator};

/// Kronrod abscissae on `[0, 1]`; odd indices (and the centre) are the
/// 7-point Gauss nodes.
const XGK: [Real; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

const WGK: [Real; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_2,
    0.140_653_259_715_525_9,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_8,
];

const WG: [Real; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

const EVALUATIONS_PER_SEGMENT: Size = 15;

/// Adaptive Gauss-Kronrod integrator with an evaluation budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussKronrodAdaptive {
    absolute_accuracy: Real,
    relative_accuracy: Real,
    max_evaluations: Size,
}

impl GaussKronrodAdaptive {
    /// Create a new integrator with an absolute accuracy target and an
    /// evaluation budget. The relative accuracy defaults to `1e-10`.
    pub fn new(absolute_accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            absolute_accuracy,
            relative_accuracy: 1e-10,
            max_evaluations,
        }
    }

    /// Set the relative accuracy target.
    pub fn with_relative_accuracy(mut self, relative_accuracy: Real) -> Self {
        self.relative_accuracy = relative_accuracy;
        self
    }

    /// Absolute accuracy target.
    pub fn absolute_accuracy(&self) -> Real {
        self.absolute_accuracy
    }

    /// Relative accuracy target.
    pub fn relative_accuracy(&self) -> Real {
        self.relative_accuracy
    }

    /// Maximum number of integrand evaluations.
    pub fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }

    fn integrate_finite<F: Fn(Real) -> Real>(
        &self,
        f: &F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationResult> {
        let first = kronrod_segment(f, a, b)?;
        let mut evaluations = EVALUATIONS_PER_SEGMENT;
        let mut value = first.value;
        let mut error = first.error;

        let mut segments = BinaryHeap::new();
        segments.push(first);

        loop {
            let tolerance = self
                .absolute_accuracy
                .max(self.relative_accuracy * value.abs());
            if error <= tolerance {
                // Re-sum to shed the drift of the running total.
                let value = segments.iter().map(|s| s.value).sum();
                return Ok(IntegrationResult {
                    value,
                    error,
                    evaluations,
                });
            }

            if evaluations + 2 * EVALUATIONS_PER_SEGMENT > self.max_evaluations {
                tracing::debug!(
                    value,
                    error,
                    tolerance,
                    evaluations,
                    "gauss-kronrod evaluation budget exhausted"
                );
                fail!(
                    "GaussKronrodAdaptive: accuracy {tolerance:e} not reached within {} evaluations \
                     (estimate {value}, error {error:e})",
                    self.max_evaluations
                );
            }

            let Some(worst) = segments.pop() else {
                fail!("GaussKronrodAdaptive: no segment left to refine");
            };
            let mid = 0.5 * (worst.a + worst.b);
            if mid <= worst.a || mid >= worst.b {
                fail!(
                    "GaussKronrodAdaptive: interval [{}, {}] cannot be bisected further \
                     (error {error:e})",
                    worst.a,
                    worst.b
                );
            }

            let left = kronrod_segment(f, worst.a, mid)?;
            let right = kronrod_segment(f, mid, worst.b)?;
            evaluations += 2 * EVALUATIONS_PER_SEGMENT;

            value += left.value + right.value - worst.value;
            error = (error + left.error + right.error - worst.error).max(0.0);

            segments.push(left);
            segments.push(right);
        }
    }
}

impl Default for GaussKronrodAdaptive {
    fn default() -> Self {
        Self::new(1e-10, 100_000)
    }
}

impl Integrator for GaussKronrodAdaptive {
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<IntegrationResult> {
        if a.is_nan() || b.is_nan() || a > b {
            return Err(Error::InvalidArgument(format!(
                "GaussKronrodAdaptive: invalid range [{a}, {b}]"
            )));
        }
        if !a.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "GaussKronrodAdaptive: lower bound must be finite, got {a}"
            )));
        }
        if a == b {
            return Ok(IntegrationResult {
                value: 0.0,
                error: 0.0,
                evaluations: 0,
            });
        }

        if b.is_infinite() {
            let mapped = |t: Real| f(a + (1.0 - t) / t) / (t * t);
            self.integrate_finite(&mapped, 0.0, 1.0)
        } else {
            self.integrate_finite(&f, a, b)
        }
    }
}

// ── Segment bookkeeping ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: Real,
    b: Real,
    value: Real,
    error: Real,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    // Max-heap on the error estimate.
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Apply the G7/K15 pair on `[a, b]`.
fn kronrod_segment<F: Fn(Real) -> Real>(f: &F, a: Real, b: Real) -> Result<Segment> {
    let centre = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(centre);
    let mut kronrod = WGK[7] * fc;
    let mut gauss = WG[3] * fc;

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(centre - dx) + f(centre + dx);
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    if !kronrod.is_finite() || !gauss.is_finite() {
        fail!("GaussKronrodAdaptive: non-finite integrand on [{a}, {b}]");
    }

    Ok(Segment {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}
