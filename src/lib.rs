//! # direct-opt: DIRECT global optimization over box bounds
//!
//! Derivative-free minimization of a black-box objective over a hyperrectangle
//! with the DIRECT (DIviding RECTangles) algorithm of Jones et al. and its
//! locally-biased variant DIRECT-L by Gablonsky and Kelley.
//!
//! The search space is scaled to the unit cube and partitioned into
//! hyperrectangles, each sampled at its center. Every iteration picks the
//! *potentially optimal* rectangles (those on the lower-right convex hull of
//! the diameter/value scatter that promise a sufficient improvement) and
//! trisects them along their longest sides.
//!
//! The objective returns `(value, feasible)`. Points flagged infeasible (or
//! with a non-finite value) are hidden constraints: they are kept in the
//! partition but never reported as the optimum.
//!
//! ## Example
//!
//! ```
//! use direct_opt::{minimize, DirectOptions};
//!
//! let f = |x: &[f64]| ((x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2), true);
//! let result = minimize(f, &vec![(0.0, 1.0); 2], DirectOptions {
//!     max_feval: 500,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! assert!(result.success);
//! assert!(result.fun < 1e-3);
//! ```
//!
//! ## Algorithm Variants
//!
//! - **DIRECT (Jones 1993)**: `DirectAlgorithm::Original`, divides every longest side.
//! - **DIRECT-L (Gablonsky 2001)**: `DirectAlgorithm::LocallyBiased`, divides one longest side.
//!
//! ## References
//!
//! - Jones, D.R., Perttunen, C.D. & Stuckman, B.E. "Lipschitzian optimization
//!   without the Lipschitz constant." J Optim Theory Appl 79, 157–181 (1993).
//! - Gablonsky, J.M. & Kelley, C.T. "A Locally-Biased form of the DIRECT Algorithm."
//!   Journal of Global Optimization 21, 27–37 (2001).

pub mod direct;
pub mod divider;
pub mod error;
pub mod evaluator;
pub mod monitor;
pub mod report;
pub mod selector;
pub mod storage;
pub mod types;

// Re-export main types
pub use direct::Direct;
pub use error::{DirectError, DirectReturnCode, Result};
pub use types::{
    feasible_if_finite, unit_bounds, Bounds, DirectAlgorithm, DirectOptions, DirectResult,
    ObjectiveFn, DIRECT_UNKNOWN_FGLOBAL, MAX_FEVAL_LIMIT, MAX_ITER_LIMIT,
};

/// Minimize `func` over `bounds`.
///
/// `func` is called with points in original coordinates and returns
/// `(value, feasible)`. Use [`feasible_if_finite`] to adapt a plain objective.
///
/// # Errors
/// Invalid configuration or a fatal condition during the run. Normal
/// termination (including a run without any feasible point) is `Ok`.
pub fn minimize<F>(func: F, bounds: &[(f64, f64)], options: DirectOptions) -> Result<DirectResult>
where
    F: Fn(&[f64]) -> (f64, bool) + Send + Sync + 'static,
{
    Direct::new(func, bounds, options)?.minimize()
}

/// Minimize an objective that takes a fixed extra argument.
pub fn minimize_with_args<F, A>(
    func: F,
    args: A,
    bounds: &[(f64, f64)],
    options: DirectOptions,
) -> Result<DirectResult>
where
    F: Fn(&[f64], &A) -> (f64, bool) + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    minimize(move |x: &[f64]| func(x, &args), bounds, options)
}

/// Minimize over the unit box `[0, 1]^nvar`.
pub fn minimize_unit<F>(func: F, nvar: usize, options: DirectOptions) -> Result<DirectResult>
where
    F: Fn(&[f64]) -> (f64, bool) + Send + Sync + 'static,
{
    minimize(func, &unit_bounds(nvar), options)
}
