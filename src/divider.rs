//! Trisection of selected rectangles.
//!
//! Dividing a leaf happens in two steps so that the samples of several leaves
//! can be evaluated together:
//!
//! 1. [`plan_division`] picks the split dimensions and builds the `2m` sample
//!    points `c ± 3^-(k+1) e_j` (positive then negative, per dimension in
//!    increasing index order).
//! 2. [`apply_division`] takes the evaluated samples, orders the split
//!    dimensions by `min(f+, f-)` and trisects the parent in that order. The
//!    end children of the first dimension keep the largest boxes; what remains
//!    in the middle is split again along the next dimension. The final middle
//!    box keeps the parent's center and value.
//!
//! The parent is removed and `2m + 1` leaves are inserted, so the number of
//! leaves always equals the number of evaluations.

use crate::error::{DirectError, Result};
use crate::evaluator::Sample;
use crate::storage::{Handle, Rect, RectangleStore};
use crate::types::DirectAlgorithm;

/// Sample points of one pending division.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionPlan {
    pub parent: Handle,
    /// Split dimensions, increasing index order.
    pub dims: Vec<usize>,
    /// `points[2*i]` is `c + delta e_dims[i]`, `points[2*i + 1]` is `c - delta e_dims[i]`.
    pub points: Vec<Vec<f64>>,
}

impl DivisionPlan {
    /// Number of objective evaluations the division needs.
    pub fn evaluations(&self) -> usize {
        self.points.len()
    }
}

/// Dimensions to trisect: every longest side for the original variant, only
/// the first one for the locally-biased variant.
pub fn split_dims(rect: &Rect, algorithm: DirectAlgorithm) -> Vec<usize> {
    let mut dims = rect.longest_dims();
    if !algorithm.divides_all_longest() {
        dims.truncate(1);
    }
    dims
}

/// Build the sample points for dividing the leaf `parent`.
///
/// # Errors
/// `SamplePointsFailed` for a stale handle, or when the offset is too small to
/// move a coordinate away from the center.
pub fn plan_division(
    store: &RectangleStore,
    parent: Handle,
    algorithm: DirectAlgorithm,
) -> Result<DivisionPlan> {
    let rect = store.get(parent).ok_or_else(|| {
        DirectError::SamplePointsFailed(format!("no live rectangle at slot {}", parent.index()))
    })?;

    let dims = split_dims(rect, algorithm);
    let delta = 3.0_f64.powi(-(rect.min_divisions() as i32 + 1));

    let mut points = Vec::with_capacity(2 * dims.len());
    for &j in &dims {
        let c = rect.center[j];
        let (plus, minus) = (c + delta, c - delta);
        if plus == c || minus == c {
            return Err(DirectError::SamplePointsFailed(format!(
                "offset {:e} vanishes at coordinate {} of dimension {}",
                delta, c, j
            )));
        }

        let mut x = rect.center.clone();
        x[j] = plus;
        points.push(x);

        let mut x = rect.center.clone();
        x[j] = minus;
        points.push(x);
    }

    Ok(DivisionPlan {
        parent,
        dims,
        points,
    })
}

/// Trisect the parent of `plan` using the evaluated `samples` and return the
/// handles of the inserted leaves. The middle leaf comes last.
///
/// # Errors
/// - `SampleFailed` when `samples` does not match the plan.
/// - `OutOfMemory` when the children do not fit; the store is left unchanged.
/// - `SamplePointsFailed` for a stale parent handle.
pub fn apply_division(
    store: &mut RectangleStore,
    plan: &DivisionPlan,
    samples: &[Sample],
) -> Result<Vec<Handle>> {
    if samples.len() != plan.points.len() {
        return Err(DirectError::SampleFailed(format!(
            "expected {} samples, got {}",
            plan.points.len(),
            samples.len()
        )));
    }
    // parent leaves, 2m + 1 children enter
    if store.len() + samples.len() > store.capacity {
        return Err(DirectError::OutOfMemory(store.capacity));
    }

    let parent = store.remove(plan.parent).ok_or_else(|| {
        DirectError::SamplePointsFailed(format!(
            "no live rectangle at slot {}",
            plan.parent.index()
        ))
    })?;

    // (w, position in plan), stable so ties keep increasing dimension order
    let mut order: Vec<(f64, usize)> = (0..plan.dims.len())
        .map(|i| (samples[2 * i].value.min(samples[2 * i + 1].value), i))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut divisions = parent.divisions.clone();
    let mut inserted = Vec::with_capacity(samples.len() + 1);

    for &(_, i) in &order {
        divisions[plan.dims[i]] += 1;
        for s in 0..2 {
            let idx = 2 * i + s;
            let child = Rect::new(plan.points[idx].clone(), divisions.clone(), samples[idx]);
            inserted.push(store.insert(child)?);
        }
    }

    let middle = Rect::new(
        parent.center,
        divisions,
        Sample {
            value: parent.value,
            feasible: parent.feasible,
        },
    );
    inserted.push(store.insert(middle)?);

    Ok(inserted)
}
