//! Objective evaluation in normalized coordinates.
//!
//! The search runs on the unit cube `[0,1]^n`. Every point is mapped back to
//! the user's box before the objective is called:
//!
//! ```text
//! xs1[i] = u[i] - l[i]
//! xs2[i] = l[i] / (u[i] - l[i])
//! x_actual[i] = (x_norm[i] + xs2[i]) * xs1[i]
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{DirectError, Result};
use crate::types::ObjectiveFn;

/// Outcome of one objective call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Objective value, `+inf` when infeasible.
    pub value: f64,
    pub feasible: bool,
}

impl Sample {
    pub fn infeasible() -> Self {
        Self {
            value: f64::INFINITY,
            feasible: false,
        }
    }
}

/// Calls the user objective on normalized points and counts evaluations.
pub struct Evaluator {
    func: Arc<ObjectiveFn>,

    /// Number of dimensions.
    pub dim: usize,

    /// Original lower bounds.
    pub lower: Vec<f64>,

    /// Original upper bounds.
    pub upper: Vec<f64>,

    /// Scaling factors: `xs1[i] = upper[i] - lower[i]`.
    pub xs1: Vec<f64>,

    /// Offset factors: `xs2[i] = lower[i] / (upper[i] - lower[i])`.
    pub xs2: Vec<f64>,

    nfev: AtomicUsize,
}

impl Evaluator {
    /// Preprocess the bounds and wrap the objective.
    ///
    /// # Errors
    /// `InvalidArgs` for an empty box, `InvalidBounds` when some lower bound is
    /// not strictly below its upper bound (or either is not finite).
    pub fn new(func: Arc<ObjectiveFn>, bounds: &[(f64, f64)]) -> Result<Self> {
        let dim = bounds.len();
        if dim == 0 {
            return Err(DirectError::InvalidArgs("dimension must be >= 1".into()));
        }

        let mut lower = Vec::with_capacity(dim);
        let mut upper = Vec::with_capacity(dim);
        let mut xs1 = Vec::with_capacity(dim);
        let mut xs2 = Vec::with_capacity(dim);

        for (i, &(l, u)) in bounds.iter().enumerate() {
            // written so that NaN bounds are rejected too
            if !(l.is_finite() && u.is_finite() && u > l) {
                return Err(DirectError::InvalidBounds { dim: i });
            }
            let help = u - l;
            xs1.push(help);
            xs2.push(l / help);
            lower.push(l);
            upper.push(u);
        }

        Ok(Self {
            func,
            dim,
            lower,
            upper,
            xs1,
            xs2,
            nfev: AtomicUsize::new(0),
        })
    }

    /// Convert normalized coordinates `[0,1]^n` to actual coordinates.
    ///
    /// `to_actual(0.0) = l` and `to_actual(1.0) = u`.
    #[inline]
    pub fn to_actual(&self, x_norm: &[f64], x_actual: &mut [f64]) {
        debug_assert_eq!(x_norm.len(), self.dim);
        debug_assert_eq!(x_actual.len(), self.dim);
        for i in 0..self.dim {
            x_actual[i] = (x_norm[i] + self.xs2[i]) * self.xs1[i];
        }
    }

    /// Convert actual coordinates to normalized coordinates.
    #[inline]
    pub fn to_normalized(&self, x_actual: &[f64], x_norm: &mut [f64]) {
        debug_assert_eq!(x_actual.len(), self.dim);
        debug_assert_eq!(x_norm.len(), self.dim);
        for i in 0..self.dim {
            x_norm[i] = x_actual[i] / self.xs1[i] - self.xs2[i];
        }
    }

    /// Allocating variant of [`Evaluator::to_actual`].
    pub fn actual_point(&self, x_norm: &[f64]) -> Vec<f64> {
        let mut x_actual = vec![0.0; self.dim];
        self.to_actual(x_norm, &mut x_actual);
        x_actual
    }

    /// Evaluate the objective at a normalized point.
    ///
    /// A point is infeasible when the objective flags it or returns a
    /// non-finite value; its stored value is then `+inf`.
    pub fn evaluate(&self, x_norm: &[f64]) -> Sample {
        let x_actual = self.actual_point(x_norm);
        let (f, feasible) = (self.func)(&x_actual);
        self.nfev.fetch_add(1, Ordering::Relaxed);

        if feasible && f.is_finite() {
            Sample { value: f, feasible: true }
        } else {
            Sample::infeasible()
        }
    }

    /// Evaluate a batch of normalized points, in parallel when `parallel` is set.
    ///
    /// Output order always matches input order.
    pub fn evaluate_batch(&self, points: &[Vec<f64>], parallel: bool) -> Vec<Sample> {
        if parallel && points.len() > 1 {
            points.par_iter().map(|x| self.evaluate(x)).collect()
        } else {
            points.iter().map(|x| self.evaluate(x)).collect()
        }
    }

    /// Total number of objective calls so far.
    pub fn nfev(&self) -> usize {
        self.nfev.load(Ordering::Relaxed)
    }
}
