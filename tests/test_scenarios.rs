//! End-to-end runs on standard test problems.
//!
//! Covers both algorithm variants, the convenience entry points and
//! bound validation before any evaluation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_abs_diff_eq;

use direct_opt::{
    minimize, minimize_unit, minimize_with_args, DirectAlgorithm, DirectError, DirectOptions,
    DirectReturnCode,
};

// ─────────────────────────────────────────────────────────────────────────────
// Objective functions
// ─────────────────────────────────────────────────────────────────────────────

fn quadratic_37(x: &[f64]) -> (f64, bool) {
    ((x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2), true)
}

/// Branin-Hoo, global minimum 0.397887 on [-5, 10] x [0, 15].
fn branin(x: &[f64]) -> (f64, bool) {
    let pi = std::f64::consts::PI;
    let a = 1.0;
    let b = 5.1 / (4.0 * pi * pi);
    let c = 5.0 / pi;
    let r = 6.0;
    let s = 10.0;
    let t = 1.0 / (8.0 * pi);
    let f = a * (x[1] - b * x[0] * x[0] + c * x[0] - r).powi(2) + s * (1.0 - t) * x[0].cos() + s;
    (f, true)
}

/// Six-hump camel back, global minimum -1.0316285 on [-3, 3] x [-2, 2].
fn six_hump_camel(x: &[f64]) -> (f64, bool) {
    let (x1, x2) = (x[0], x[1]);
    let f = (4.0 - 2.1 * x1 * x1 + x1.powi(4) / 3.0) * x1 * x1
        + x1 * x2
        + (-4.0 + 4.0 * x2 * x2) * x2 * x2;
    (f, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Quadratic with minimum at (0.3, 0.7)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_quadratic_unit_square_500_evals() {
    let result = minimize(
        quadratic_37,
        &[(0.0, 1.0), (0.0, 1.0)],
        DirectOptions {
            max_feval: 500,
            ..Default::default()
        },
    )
    .unwrap();

    println!("{}", result);
    assert!(result.success);
    assert!(result.feasible);
    assert_eq!(result.return_code, DirectReturnCode::MaxFevalExceeded);
    assert!(result.nfev >= 500 && result.nfev <= 504, "nfev = {}", result.nfev);
    assert!(result.fun < 1e-4, "fun = {}", result.fun);
    assert_abs_diff_eq!(result.x[0], 0.3, epsilon = 1e-2);
    assert_abs_diff_eq!(result.x[1], 0.7, epsilon = 1e-2);
}

#[test]
fn test_quadratic_locally_biased() {
    let result = minimize(
        quadratic_37,
        &[(0.0, 1.0), (0.0, 1.0)],
        DirectOptions {
            max_feval: 500,
            algorithm: DirectAlgorithm::LocallyBiased,
            ..Default::default()
        },
    )
    .unwrap();

    assert!(result.success);
    assert!(result.nfev >= 500 && result.nfev <= 502, "nfev = {}", result.nfev);
    assert!(result.fun < 1e-4, "fun = {}", result.fun);
}

// ─────────────────────────────────────────────────────────────────────────────
// Known global minimum
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_branin_reaches_global() {
    let result = minimize(
        branin,
        &[(-5.0, 10.0), (0.0, 15.0)],
        DirectOptions {
            fglobal: 0.397887,
            fglper: 0.01,
            ..Default::default()
        },
    )
    .unwrap();

    println!("{}", result);
    assert_eq!(result.return_code, DirectReturnCode::GlobalFound);
    assert!(result.nfev < 2000, "nfev = {}", result.nfev);
    assert!(100.0 * (result.fun - 0.397887) / 0.397887 <= 0.01);
}

#[test]
fn test_six_hump_camel_both_variants() {
    for algorithm in [DirectAlgorithm::Original, DirectAlgorithm::LocallyBiased] {
        let result = minimize(
            six_hump_camel,
            &[(-3.0, 3.0), (-2.0, 2.0)],
            DirectOptions {
                fglobal: -1.0316285,
                fglper: 0.01,
                algorithm,
                ..Default::default()
            },
        )
        .unwrap();

        println!("{}: {}", algorithm, result);
        assert_eq!(result.return_code, DirectReturnCode::GlobalFound, "{}", algorithm);
        assert!(result.fun <= -1.0316285 + 1e-3);
    }
}

#[test]
fn test_center_optimal_stops_after_initialization() {
    let result = minimize(
        |x: &[f64]| (x.iter().map(|xi| (xi - 1.0).powi(2)).sum(), true),
        &vec![(-1.0, 3.0); 4],
        DirectOptions {
            fglobal: 0.0,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(result.return_code, DirectReturnCode::GlobalFound);
    assert_eq!(result.nfev, 1);
    assert_eq!(result.nit, 0);
    assert_eq!(result.x, vec![1.0; 4]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_minimize_unit() {
    let result = minimize_unit(
        quadratic_37,
        2,
        DirectOptions {
            max_feval: 300,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(result.fun < 1e-3);
}

#[test]
fn test_minimize_with_args() {
    let target = vec![-1.5, 2.5, 0.25];
    let result = minimize_with_args(
        |x: &[f64], t: &Vec<f64>| {
            (x.iter().zip(t).map(|(xi, ti)| (xi - ti).powi(2)).sum(), true)
        },
        target.clone(),
        &vec![(-4.0, 4.0); 3],
        DirectOptions {
            max_feval: 2000,
            ..Default::default()
        },
    )
    .unwrap();

    for (xi, ti) in result.x.iter().zip(&target) {
        assert_abs_diff_eq!(xi, ti, epsilon = 5e-2);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid configuration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_inverted_bounds_rejected_without_evaluation() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let err = minimize(
        move |x: &[f64]| {
            counter.fetch_add(1, Ordering::Relaxed);
            quadratic_37(x)
        },
        &[(0.0, 1.0), (1.0, 0.0)],
        DirectOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, DirectError::InvalidBounds { dim: 1 });
    assert_eq!(err.code(), DirectReturnCode::InvalidBounds);
    assert_eq!(err.code() as i32, -1);
    assert_eq!(count.load(Ordering::Relaxed), 0);
}

#[test]
fn test_oversized_budgets_rejected() {
    let err = minimize(
        quadratic_37,
        &[(0.0, 1.0), (0.0, 1.0)],
        DirectOptions {
            max_feval: 100_000,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code() as i32, -2);

    let err = minimize(
        quadratic_37,
        &[(0.0, 1.0), (0.0, 1.0)],
        DirectOptions {
            max_iter: 10_000,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code() as i32, -7);
}

#[test]
fn test_empty_bounds_rejected() {
    let err = minimize(quadratic_37, &[], DirectOptions::default()).unwrap_err();
    assert_eq!(err.code(), DirectReturnCode::InvalidArgs);
}
