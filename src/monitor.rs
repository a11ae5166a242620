//! Termination tests, evaluated after initialization and after every iteration.
//!
//! The first criterion that holds ends the run, in this order:
//!
//! | Code | Criterion                                                   |
//! |------|-------------------------------------------------------------|
//! | 1    | `nfev >= max_feval`                                         |
//! | 2    | `nit >= max_iter`                                           |
//! | 3    | `100 * (fmin - fglobal) / max(1, |fglobal|) <= fglper`      |
//! | 4    | `100 * volume(largest leaf) <= volper`                      |
//! | 5    | `diameter(largest leaf) <= sigmaper`                        |
//!
//! Criterion 3 needs a known `fglobal` and a feasible point, criteria 4 and 5
//! are disabled by non-positive tolerances.

use crate::error::DirectReturnCode;
use crate::types::DirectOptions;

/// Snapshot of the run state the criteria look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub nfev: usize,
    pub nit: usize,
    /// Best feasible value, `+inf` when none.
    pub fmin: f64,
    /// Volume fraction of a largest leaf.
    pub largest_volume: f64,
    /// Diameter of a largest leaf.
    pub largest_diameter: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceMonitor {
    max_feval: usize,
    max_iter: usize,
    fglobal: Option<f64>,
    fglper: f64,
    volper: f64,
    sigmaper: f64,
}

impl ConvergenceMonitor {
    pub fn new(options: &DirectOptions) -> Self {
        Self {
            max_feval: options.max_feval,
            max_iter: options.max_iter,
            fglobal: options.fglobal_known().then_some(options.fglobal),
            fglper: options.fglper,
            volper: options.volper,
            sigmaper: options.sigmaper,
        }
    }

    /// Relative gap to the known global minimum, in percent.
    pub fn global_gap_pct(&self, fmin: f64) -> Option<f64> {
        let fglobal = self.fglobal?;
        if !fmin.is_finite() {
            return None;
        }
        Some(100.0 * (fmin - fglobal) / fglobal.abs().max(1.0))
    }

    /// Return the status code of the first criterion that holds.
    pub fn check(&self, p: &Progress) -> Option<DirectReturnCode> {
        if p.nfev >= self.max_feval {
            return Some(DirectReturnCode::MaxFevalExceeded);
        }
        if p.nit >= self.max_iter {
            return Some(DirectReturnCode::MaxIterExceeded);
        }
        if let Some(gap) = self.global_gap_pct(p.fmin) {
            if gap <= self.fglper {
                return Some(DirectReturnCode::GlobalFound);
            }
        }
        if self.volper > 0.0 && 100.0 * p.largest_volume <= self.volper {
            return Some(DirectReturnCode::VolTol);
        }
        if self.sigmaper > 0.0 && p.largest_diameter <= self.sigmaper {
            return Some(DirectReturnCode::SigmaTol);
        }
        None
    }
}
