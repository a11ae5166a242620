//! Core type definitions: algorithm variants, options, objective signature and results.

use std::fmt;
use std::path::PathBuf;

use crate::error::DirectReturnCode;

// ──────────────────────────────────────────────────────────────────────────────
// Algorithm Variants
// ──────────────────────────────────────────────────────────────────────────────

/// DIRECT algorithm variant selection.
///
/// The variant only changes which of a rectangle's longest sides the divider
/// trisects. Diameter measure and selection rule are shared by both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DirectAlgorithm {
    /// Jones' original DIRECT (1993): trisect every longest side.
    #[default]
    Original,

    /// Locally-biased DIRECT-L (Gablonsky 2001): trisect only the first longest side.
    LocallyBiased,
}

impl DirectAlgorithm {
    /// Map the integer `algmethod` selector (`0` = original, `1` = DIRECT-L).
    pub fn from_algmethod(algmethod: i32) -> Option<Self> {
        match algmethod {
            0 => Some(Self::Original),
            1 => Some(Self::LocallyBiased),
            _ => None,
        }
    }

    /// The integer `algmethod` selector for this variant.
    pub fn algmethod(&self) -> i32 {
        match self {
            Self::Original => 0,
            Self::LocallyBiased => 1,
        }
    }

    /// Returns true if every tied longest side is divided.
    pub fn divides_all_longest(&self) -> bool {
        matches!(self, Self::Original)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Original => "DIRECT",
            Self::LocallyBiased => "DIRECT-L",
        }
    }
}

impl fmt::Display for DirectAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Type Aliases
// ──────────────────────────────────────────────────────────────────────────────

/// Bounds for each dimension: `Vec<(lower, upper)>`.
pub type Bounds = Vec<(f64, f64)>;

/// Objective function signature.
///
/// - `x`: point in original (user) coordinates
/// - Returns: `(value, feasible)`; `feasible == false` marks `x` as a point where
///   the objective is undefined (a hidden constraint)
pub type ObjectiveFn = dyn Fn(&[f64]) -> (f64, bool) + Send + Sync;

/// Unit-box bounds `[0, 1]^n`, used when only a dimensionality is given.
pub fn unit_bounds(n: usize) -> Bounds {
    vec![(0.0, 1.0); n]
}

/// Adapt a plain objective value: NaN and infinities are reported infeasible.
#[inline]
pub fn feasible_if_finite(f: f64) -> (f64, bool) {
    (f, f.is_finite())
}

// ──────────────────────────────────────────────────────────────────────────────
// Options
// ──────────────────────────────────────────────────────────────────────────────

/// Sentinel for an unknown global minimum. Any `fglobal` at or below it disables
/// the percentage-gap stopping test.
pub const DIRECT_UNKNOWN_FGLOBAL: f64 = -1e100;

/// Largest accepted `max_feval`, the internal evaluation capacity.
pub const MAX_FEVAL_LIMIT: usize = 90_000;

/// Largest accepted `max_iter`.
pub const MAX_ITER_LIMIT: usize = 6_000;

/// Configuration options for the DIRECT optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectOptions {
    /// Sufficient-improvement epsilon for the potentially-optimal test.
    /// A negative value enables Jones' adaptive update with `|eps|` as floor.
    /// Default: 1e-4.
    pub eps: f64,

    /// Approximate upper bound on objective evaluations. Must be in
    /// `1..=MAX_FEVAL_LIMIT - 20`. Default: 20000.
    pub max_feval: usize,

    /// Maximum number of iterations. Must be in `1..=MAX_ITER_LIMIT`. Default: 6000.
    pub max_iter: usize,

    /// Algorithm variant to use.
    pub algorithm: DirectAlgorithm,

    /// Known global minimum value, or `DIRECT_UNKNOWN_FGLOBAL`.
    pub fglobal: f64,

    /// Stop when `100 * (fmin - fglobal) / max(1, |fglobal|) <= fglper`.
    /// Only used when `fglobal` is known. Default: 0.01.
    pub fglper: f64,

    /// Stop when the largest remaining rectangle holds at most `volper` percent
    /// of the domain volume. Disabled when `<= 0`. Default: -1.0.
    pub volper: f64,

    /// Stop when the diameter of the largest remaining rectangle is at most
    /// `sigmaper`. Disabled when `<= 0`. Default: -1.0.
    pub sigmaper: f64,

    /// Write a plain-text run report to this file when the run ends.
    pub log_file: Option<PathBuf>,

    /// Enable parallel function evaluation using rayon.
    pub parallel: bool,

    /// Evaluate the samples of all rectangles selected in one iteration as a
    /// single parallel batch (requires `parallel`). The evaluation budget is
    /// then checked once per iteration instead of once per rectangle.
    pub parallel_batch: bool,

    /// Minimum batch size for the parallel path; smaller batches are evaluated
    /// serially. Default: 4.
    pub min_parallel_evals: usize,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            eps: 1e-4,
            max_feval: 20_000,
            max_iter: 6_000,
            algorithm: DirectAlgorithm::default(),
            fglobal: DIRECT_UNKNOWN_FGLOBAL,
            fglper: 0.01,
            volper: -1.0,
            sigmaper: -1.0,
            log_file: None,
            parallel: false,
            parallel_batch: false,
            min_parallel_evals: 4,
        }
    }
}

impl DirectOptions {
    /// Returns true if a global minimum value was supplied.
    pub fn fglobal_known(&self) -> bool {
        self.fglobal > DIRECT_UNKNOWN_FGLOBAL
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Result
// ──────────────────────────────────────────────────────────────────────────────

/// Result of a DIRECT optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectResult {
    /// Best point found, in original coordinates.
    pub x: Vec<f64>,

    /// Best function value found (`+inf` when no feasible point was found).
    pub fun: f64,

    /// Total number of function evaluations.
    pub nfev: usize,

    /// Total number of iterations.
    pub nit: usize,

    /// Whether the optimization terminated successfully.
    pub success: bool,

    /// Whether at least one feasible point was found.
    pub feasible: bool,

    /// The return code indicating why optimization stopped.
    pub return_code: DirectReturnCode,

    /// Human-readable message describing the termination reason.
    pub message: String,
}

impl DirectResult {
    pub fn new(
        x: Vec<f64>,
        fun: f64,
        nfev: usize,
        nit: usize,
        return_code: DirectReturnCode,
        feasible: bool,
    ) -> Self {
        let success = return_code.is_success();
        let message = if feasible {
            format!("{}", return_code)
        } else {
            format!("{} (no feasible point found)", return_code)
        };
        Self {
            x,
            fun,
            nfev,
            nit,
            success,
            feasible,
            return_code,
            message,
        }
    }

    /// Integer status code of the run.
    pub fn status(&self) -> i32 {
        self.return_code as i32
    }
}

impl fmt::Display for DirectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DirectResult {{")?;
        writeln!(f, "  success: {}", self.success)?;
        writeln!(f, "  status: {}", self.status())?;
        writeln!(f, "  message: {}", self.message)?;
        writeln!(f, "  fun: {:.15e}", self.fun)?;
        write!(f, "  x: [")?;
        for (i, xi) in self.x.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.15e}", xi)?;
        }
        writeln!(f, "]")?;
        writeln!(f, "  nfev: {}", self.nfev)?;
        writeln!(f, "  nit: {}", self.nit)?;
        write!(f, "}}")
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Display for DirectReturnCode
// ──────────────────────────────────────────────────────────────────────────────

impl fmt::Display for DirectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBounds => write!(f, "u[i] <= l[i] for some i"),
            Self::MaxFevalTooBig => write!(f, "maxf is too large"),
            Self::MaxIterTooBig => write!(f, "maxT is too large"),
            Self::InitFailed => write!(f, "Initialization failed"),
            Self::SamplePointsFailed => {
                write!(f, "There was an error in the creation of the sample points")
            }
            Self::SampleFailed => write!(f, "An error occurred while the function was sampled"),
            Self::MaxDepthReached => write!(f, "Maximum number of levels has been reached"),
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::InvalidArgs => write!(f, "Invalid arguments"),
            Self::MaxFevalExceeded => {
                write!(f, "Number of function evaluations done is larger than maxf")
            }
            Self::MaxIterExceeded => write!(f, "Number of iterations is equal to maxT"),
            Self::GlobalFound => write!(
                f,
                "The best function value found is within fglper of the (known) global optimum"
            ),
            Self::VolTol => write!(
                f,
                "The volume of the largest hyperrectangle is below volper"
            ),
            Self::SigmaTol => write!(
                f,
                "The measure of the largest hyperrectangle is below sigmaper"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_algmethod() {
        assert_eq!(DirectAlgorithm::Original.algmethod(), 0);
        assert_eq!(DirectAlgorithm::LocallyBiased.algmethod(), 1);
        assert_eq!(
            DirectAlgorithm::from_algmethod(0),
            Some(DirectAlgorithm::Original)
        );
        assert_eq!(
            DirectAlgorithm::from_algmethod(1),
            Some(DirectAlgorithm::LocallyBiased)
        );
        assert_eq!(DirectAlgorithm::from_algmethod(2), None);
    }

    #[test]
    fn test_algorithm_default_and_display() {
        assert_eq!(DirectAlgorithm::default(), DirectAlgorithm::Original);
        assert!(DirectAlgorithm::Original.divides_all_longest());
        assert!(!DirectAlgorithm::LocallyBiased.divides_all_longest());
        assert_eq!(format!("{}", DirectAlgorithm::LocallyBiased), "DIRECT-L");
    }

    #[test]
    fn test_default_options() {
        let opts = DirectOptions::default();
        assert_eq!(opts.eps, 1e-4);
        assert_eq!(opts.max_feval, 20000);
        assert_eq!(opts.max_iter, 6000);
        assert_eq!(opts.algorithm, DirectAlgorithm::Original);
        assert_eq!(opts.fglobal, DIRECT_UNKNOWN_FGLOBAL);
        assert!(!opts.fglobal_known());
        assert_eq!(opts.fglper, 0.01);
        assert_eq!(opts.volper, -1.0);
        assert_eq!(opts.sigmaper, -1.0);
        assert!(opts.log_file.is_none());
        assert!(!opts.parallel);
        assert!(!opts.parallel_batch);
        assert_eq!(opts.min_parallel_evals, 4);
    }

    #[test]
    fn test_fglobal_known() {
        let opts = DirectOptions {
            fglobal: 0.0,
            ..Default::default()
        };
        assert!(opts.fglobal_known());
        let opts = DirectOptions {
            fglobal: -2e100,
            ..Default::default()
        };
        assert!(!opts.fglobal_known());
    }

    #[test]
    fn test_feasible_if_finite() {
        assert_eq!(feasible_if_finite(1.5), (1.5, true));
        assert!(!feasible_if_finite(f64::NAN).1);
        assert!(!feasible_if_finite(f64::INFINITY).1);
        assert!(!feasible_if_finite(f64::NEG_INFINITY).1);
    }

    #[test]
    fn test_unit_bounds() {
        assert_eq!(unit_bounds(3), vec![(0.0, 1.0); 3]);
    }

    #[test]
    fn test_direct_result_new() {
        let result = DirectResult::new(
            vec![1.0, 2.0],
            42.0,
            100,
            10,
            DirectReturnCode::MaxFevalExceeded,
            true,
        );
        assert_eq!(result.x, vec![1.0, 2.0]);
        assert_eq!(result.fun, 42.0);
        assert_eq!(result.nfev, 100);
        assert_eq!(result.nit, 10);
        assert!(result.success);
        assert!(result.feasible);
        assert_eq!(result.status(), 1);
        assert_eq!(
            result.message,
            "Number of function evaluations done is larger than maxf"
        );
    }

    #[test]
    fn test_direct_result_infeasible_message() {
        let result = DirectResult::new(
            vec![0.5],
            f64::INFINITY,
            50,
            3,
            DirectReturnCode::MaxFevalExceeded,
            false,
        );
        assert!(result.success);
        assert!(!result.feasible);
        assert!(result.message.ends_with("(no feasible point found)"));
    }

    #[test]
    fn test_direct_result_display() {
        let result = DirectResult::new(
            vec![1.0, 2.0],
            3.0,
            50,
            5,
            DirectReturnCode::GlobalFound,
            true,
        );
        let display = format!("{}", result);
        assert!(display.contains("success: true"));
        assert!(display.contains("status: 3"));
        assert!(display.contains("nfev: 50"));
        assert!(display.contains("nit: 5"));
    }
}
