//! Plain-text run report.
//!
//! Lines are collected in memory during the run and written to the configured
//! file once the run ends:
//!
//! ```text
//! DIRECT run report
//! algorithm=DIRECT dim=2 eps=1e-4 max_feval=500 max_iter=6000
//! bounds[0]=[0, 1]
//! ...
//! ITER nit=1 nfev=7 fmin=1.2e-2 selected=1
//! ...
//! END status=1 nfev=503 nit=40 fmin=3.1e-9
//! END message=Number of function evaluations done is larger than maxf
//! END x=[3.0e-1, 7.0e-1]
//! ```

use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::types::{DirectOptions, DirectResult};

/// Line buffer for one run, flushed to `path` at the end.
pub struct RunReport {
    path: PathBuf,
    buffer: Mutex<String>,
}

impl RunReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Mutex::new(String::with_capacity(16 * 1024)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        // a poisoned buffer still holds valid lines
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one line.
    pub fn write_line(&self, line: &str) {
        let mut buf = self.lock();
        buf.push_str(line);
        buf.push('\n');
    }

    /// Append one line from format args.
    pub fn write_fmt(&self, args: std::fmt::Arguments<'_>) {
        let mut buf = self.lock();
        let _ = buf.write_fmt(args);
        buf.push('\n');
    }

    /// Problem and option summary.
    pub fn header(&self, bounds: &[(f64, f64)], options: &DirectOptions) {
        self.write_line("DIRECT run report");
        self.write_fmt(format_args!(
            "algorithm={} dim={} eps={:e} max_feval={} max_iter={}",
            options.algorithm,
            bounds.len(),
            options.eps,
            options.max_feval,
            options.max_iter
        ));
        self.write_fmt(format_args!(
            "fglobal={:e} fglper={} volper={} sigmaper={} parallel={}",
            options.fglobal, options.fglper, options.volper, options.sigmaper, options.parallel
        ));
        for (i, (l, u)) in bounds.iter().enumerate() {
            self.write_fmt(format_args!("bounds[{}]=[{}, {}]", i, l, u));
        }
    }

    /// One line per iteration.
    pub fn iteration(&self, nit: usize, nfev: usize, fmin: f64, selected: usize) {
        self.write_fmt(format_args!(
            "ITER nit={} nfev={} fmin={:e} selected={}",
            nit, nfev, fmin, selected
        ));
    }

    /// Final status and best point.
    pub fn summary(&self, result: &DirectResult) {
        self.write_fmt(format_args!(
            "END status={} nfev={} nit={} fmin={:e}",
            result.status(),
            result.nfev,
            result.nit,
            result.fun
        ));
        self.write_fmt(format_args!("END message={}", result.message));
        let xs: Vec<String> = result.x.iter().map(|xi| format!("{:e}", xi)).collect();
        self.write_fmt(format_args!("END x=[{}]", xs.join(", ")));
    }

    /// All collected output.
    pub fn output(&self) -> String {
        self.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().lines().map(|s| s.to_string()).collect()
    }

    /// Write the collected lines to the report file, replacing it.
    pub fn flush(&self) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(self.lock().as_bytes())?;
        file.flush()
    }
}
