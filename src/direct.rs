//! DIRECT driver: validation, initialization and the main iteration loop.
//!
//! One iteration selects the potentially optimal leaves, divides each of them
//! and updates the incumbent. The convergence monitor runs once after
//! initialization and once after every iteration.
//!
//! | Step                         | Method                         |
//! |------------------------------|--------------------------------|
//! | option checks, epsilon mode  | [`Direct::validate_inputs`]    |
//! | evaluate the domain center   | [`Direct::initialize`]         |
//! | Jones' epsilon update        | [`Direct::update_epsilon`]     |
//! | select and divide            | [`Direct::iterate`]            |
//! | termination test             | [`Direct::check_termination`]  |
//! | full run                     | [`Direct::minimize`]           |

use std::sync::Arc;

use log::{debug, info, warn};

use crate::divider::{apply_division, plan_division, DivisionPlan};
use crate::error::{DirectError, DirectReturnCode, Result};
use crate::evaluator::{Evaluator, Sample};
use crate::monitor::{ConvergenceMonitor, Progress};
use crate::report::RunReport;
use crate::selector::{potentially_optimal, Candidate};
use crate::storage::{Rect, RectangleStore};
use crate::types::{DirectOptions, DirectResult, MAX_FEVAL_LIMIT, MAX_ITER_LIMIT};

/// Optimizer state for one run.
///
/// Created by [`Direct::new`], run by [`Direct::minimize`]. The leaves of the
/// final partition stay available through [`Direct::store`].
pub struct Direct {
    evaluator: Evaluator,

    /// Optimizer options.
    pub options: DirectOptions,

    /// Epsilon of the potentially-optimal test (updated each iteration when
    /// adaptive).
    pub eps: f64,

    /// Lower limit for the adaptive epsilon.
    pub eps_fix: f64,

    /// True when epsilon follows Jones' update `max(1e-4 * |fmin|, eps_fix)`.
    pub adaptive_eps: bool,

    store: RectangleStore,
    monitor: ConvergenceMonitor,
    report: Option<RunReport>,

    /// Best feasible value found, `+inf` when none.
    pub fmin: f64,

    /// Normalized point of `fmin` (the domain center until a feasible point
    /// is found).
    xmin: Vec<f64>,

    /// Completed iterations.
    pub nit: usize,

    initialized: bool,
}

impl Direct {
    /// Prepare a run over `bounds`.
    ///
    /// `func` receives points in original coordinates and returns
    /// `(value, feasible)`.
    ///
    /// # Errors
    /// Configuration errors (`InvalidBounds`, `InvalidArgs`, `MaxFevalTooBig`,
    /// `MaxIterTooBig`). Nothing is evaluated before they are reported.
    pub fn new(
        func: impl Fn(&[f64]) -> (f64, bool) + Send + Sync + 'static,
        bounds: &[(f64, f64)],
        options: DirectOptions,
    ) -> Result<Self> {
        let evaluator = Evaluator::new(Arc::new(func), bounds)?;
        let dim = evaluator.dim;

        // every evaluation leaves one leaf behind; the slack covers the
        // samples of the rectangle that crosses the budget
        let maxf = options.max_feval;
        let capacity = maxf + maxf / 2 + 1000 + 2 * dim;

        let report = options.log_file.clone().map(RunReport::new);

        let mut direct = Self {
            evaluator,
            monitor: ConvergenceMonitor::new(&options),
            options,
            eps: 0.0,
            eps_fix: 0.0,
            adaptive_eps: false,
            store: RectangleStore::new(dim, capacity),
            report,
            fmin: f64::INFINITY,
            xmin: vec![0.5; dim],
            nit: 0,
            initialized: false,
        };
        direct.validate_inputs()?;
        Ok(direct)
    }

    /// Check budgets and set up the epsilon mode.
    ///
    /// A negative `eps` switches on the adaptive update with `|eps|` as its
    /// floor; a non-negative one is used unchanged.
    pub fn validate_inputs(&mut self) -> Result<()> {
        let maxf = self.options.max_feval;
        let maxt = self.options.max_iter;

        if maxf == 0 {
            return Err(DirectError::InvalidArgs("max_feval must be >= 1".into()));
        }
        if maxt == 0 {
            return Err(DirectError::InvalidArgs("max_iter must be >= 1".into()));
        }
        if maxf + 20 > MAX_FEVAL_LIMIT {
            return Err(DirectError::MaxFevalTooBig {
                requested: maxf,
                limit: MAX_FEVAL_LIMIT - 20,
            });
        }
        if maxt > MAX_ITER_LIMIT {
            return Err(DirectError::MaxIterTooBig {
                requested: maxt,
                limit: MAX_ITER_LIMIT,
            });
        }

        let eps = self.options.eps;
        if !eps.is_finite() {
            return Err(DirectError::InvalidArgs(format!("eps must be finite, got {}", eps)));
        }
        if eps < 0.0 {
            self.adaptive_eps = true;
            self.eps_fix = -eps;
            self.eps = -eps;
        } else {
            self.adaptive_eps = false;
            self.eps_fix = 1e100;
            self.eps = eps;
        }

        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    // Initialization
    // ──────────────────────────────────────────────────────────────────────

    /// Evaluate the domain center and seed the store with the whole domain.
    ///
    /// Afterwards `nfev == 1` and the store holds a single leaf.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(DirectError::InitFailed("already initialized".into()));
        }
        let n = self.evaluator.dim;

        if let Some(report) = &self.report {
            let bounds: Vec<(f64, f64)> = self
                .evaluator
                .lower
                .iter()
                .copied()
                .zip(self.evaluator.upper.iter().copied())
                .collect();
            report.header(&bounds, &self.options);
        }

        let center = vec![0.5; n];
        let sample = self.evaluator.evaluate(&center);
        self.store
            .insert(Rect::root(n, sample))
            .map_err(|e| DirectError::InitFailed(e.to_string()))?;

        self.xmin = center;
        self.fmin = if sample.feasible {
            sample.value
        } else {
            f64::INFINITY
        };
        self.initialized = true;

        info!(
            "{}: dim={} max_feval={} max_iter={} eps={:e}{}",
            self.options.algorithm,
            n,
            self.options.max_feval,
            self.options.max_iter,
            self.eps,
            if self.adaptive_eps { " (adaptive)" } else { "" }
        );
        debug!("center value {:e} (feasible: {})", sample.value, sample.feasible);

        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    // Iteration
    // ──────────────────────────────────────────────────────────────────────

    /// Jones' epsilon update, `eps = max(1e-4 * |fmin|, eps_fix)`.
    pub fn update_epsilon(&mut self) {
        if self.adaptive_eps && self.fmin.is_finite() {
            self.eps = (self.fmin.abs() * 1e-4).max(self.eps_fix);
        }
    }

    /// Current state as seen by the convergence monitor.
    pub fn progress(&self) -> Progress {
        let (largest_volume, largest_diameter) = self
            .store
            .largest()
            .map(|r| (r.volume(), r.diameter))
            .unwrap_or((0.0, 0.0));
        Progress {
            nfev: self.evaluator.nfev(),
            nit: self.nit,
            fmin: self.fmin,
            largest_volume,
            largest_diameter,
        }
    }

    /// Status code of the first termination criterion that holds.
    pub fn check_termination(&self) -> Option<DirectReturnCode> {
        self.monitor.check(&self.progress())
    }

    /// Run one iteration and return the number of selected rectangles.
    ///
    /// # Errors
    /// `MaxDepthReached` when no leaf can be divided any more, and any
    /// sampling or storage error of the divisions.
    pub fn iterate(&mut self) -> Result<usize> {
        if !self.initialized {
            self.initialize()?;
        }
        self.nit += 1;
        self.update_epsilon();

        let candidates = self.store.level_minima();
        let selected = potentially_optimal(&candidates, self.fmin, self.eps);
        if selected.is_empty() {
            return Err(DirectError::MaxDepthReached);
        }

        if self.options.parallel && self.options.parallel_batch {
            self.divide_batch(&selected)?;
        } else {
            self.divide_each(&selected)?;
        }

        debug!(
            "iter {}: selected={} levels={} nfev={} fmin={:e} eps={:e}",
            self.nit,
            selected.len(),
            self.store.level_count(),
            self.evaluator.nfev(),
            self.fmin,
            self.eps
        );
        if let Some(report) = &self.report {
            report.iteration(self.nit, self.evaluator.nfev(), self.fmin, selected.len());
        }

        Ok(selected.len())
    }

    /// Divide the selected leaves one after another, stopping once the
    /// evaluation budget is used up.
    fn divide_each(&mut self, selected: &[Candidate]) -> Result<()> {
        for c in selected {
            if self.evaluator.nfev() >= self.options.max_feval {
                break;
            }
            let plan = plan_division(&self.store, c.handle, self.options.algorithm)?;
            let samples = self.evaluate_points(&plan.points);
            self.apply(&plan, &samples)?;
        }
        Ok(())
    }

    /// Evaluate the samples of all selected leaves in one batch, then divide
    /// them in selection order.
    fn divide_batch(&mut self, selected: &[Candidate]) -> Result<()> {
        let plans = selected
            .iter()
            .map(|c| plan_division(&self.store, c.handle, self.options.algorithm))
            .collect::<Result<Vec<DivisionPlan>>>()?;

        let points: Vec<Vec<f64>> = plans.iter().flat_map(|p| p.points.iter().cloned()).collect();
        let samples = self.evaluate_points(&points);

        let mut offset = 0;
        for plan in &plans {
            let end = offset + plan.evaluations();
            self.apply(plan, &samples[offset..end])?;
            offset = end;
        }
        Ok(())
    }

    fn evaluate_points(&self, points: &[Vec<f64>]) -> Vec<Sample> {
        let parallel = self.options.parallel && points.len() >= self.options.min_parallel_evals;
        self.evaluator.evaluate_batch(points, parallel)
    }

    /// Insert the children of `plan` and update the incumbent.
    fn apply(&mut self, plan: &DivisionPlan, samples: &[Sample]) -> Result<()> {
        apply_division(&mut self.store, plan, samples)?;
        for (x, s) in plan.points.iter().zip(samples) {
            if s.feasible && s.value < self.fmin {
                self.fmin = s.value;
                self.xmin.clone_from(x);
            }
        }
        Ok(())
    }

    // ──────────────────────────────────────────────────────────────────────
    // Run
    // ──────────────────────────────────────────────────────────────────────

    /// Run until a termination criterion holds.
    ///
    /// # Errors
    /// Any fatal condition; no partial result is returned in that case.
    pub fn minimize(&mut self) -> Result<DirectResult> {
        if !self.initialized {
            self.initialize()?;
        }

        let code = loop {
            if let Some(code) = self.check_termination() {
                break code;
            }
            self.iterate()?;
        };

        let result = self.result(code);
        info!(
            "{} finished: {} (fmin={:e}, nfev={}, nit={})",
            self.options.algorithm, result.message, result.fun, result.nfev, result.nit
        );
        if !result.feasible {
            warn!("no feasible point found after {} evaluations", result.nfev);
        }

        if let Some(report) = &self.report {
            report.summary(&result);
            if let Err(e) = report.flush() {
                warn!("could not write run report to {}: {}", report.path().display(), e);
            }
        }

        Ok(result)
    }

    /// Result for termination code `code`, best point in original coordinates.
    pub fn result(&self, code: DirectReturnCode) -> DirectResult {
        DirectResult::new(
            self.evaluator.actual_point(&self.xmin),
            self.fmin,
            self.evaluator.nfev(),
            self.nit,
            code,
            self.fmin.is_finite(),
        )
    }

    // ──────────────────────────────────────────────────────────────────────
    // Accessors
    // ──────────────────────────────────────────────────────────────────────

    /// Leaves of the current partition.
    pub fn store(&self) -> &RectangleStore {
        &self.store
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Total objective evaluations so far.
    pub fn nfev(&self) -> usize {
        self.evaluator.nfev()
    }

    /// Best point so far in normalized coordinates.
    pub fn xmin_normalized(&self) -> &[f64] {
        &self.xmin
    }
}
