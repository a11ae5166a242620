//! Selection of potentially optimal rectangles.
//!
//! A rectangle with diameter `d` and center value `f` is potentially optimal if
//! some rate-of-change constant `K > 0` makes it the best lower bound,
//! `f - K*d <= f_i - K*d_i` for every other rectangle `i`, and that bound
//! improves on the incumbent by a sufficient amount:
//!
//! ```text
//! f - K*d <= fmin - eps * max(1, |fmin|)
//! ```
//!
//! Only the best rectangle of each diameter can qualify, so the selector works
//! on one [`Candidate`] per diameter. The qualifying points lie on the lower
//! convex hull of the `(d, f)` scatter, to the right of the minimum value. For
//! a hull point the largest admissible `K` is the slope to the next hull point;
//! the largest rectangle has no upper limit on `K` and is always selected.
//!
//! Everything here is a pure function of its inputs.

use crate::storage::{Handle, MAX_DIVISIONS};

/// Best rectangle of one diameter class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub handle: Handle,
    /// Diameter class (larger level, smaller diameter).
    pub level: usize,
    pub diameter: f64,
    /// Center value, `+inf` for infeasible rectangles.
    pub value: f64,
    /// Insertion order of the rectangle.
    pub order: u64,
    pub min_divisions: u32,
}

impl Candidate {
    /// Whether the rectangle may still be divided.
    #[inline]
    pub fn divisible(&self) -> bool {
        self.min_divisions < MAX_DIVISIONS
    }
}

/// Sufficient-improvement target `fmin - eps * max(1, |fmin|)`.
#[inline]
pub fn improvement_target(fmin: f64, eps: f64) -> f64 {
    fmin - eps * fmin.abs().max(1.0)
}

/// Lower convex hull of `points` (sorted by increasing diameter), starting at
/// the minimum value. Returns indices into `points`.
///
/// Among equal minimum values the one with the larger diameter starts the
/// hull. Collinear points are kept.
pub fn lower_right_hull(points: &[Candidate]) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }

    // last index attaining the minimum => largest diameter among ties
    let mut start = 0;
    for (i, p) in points.iter().enumerate() {
        if p.value <= points[start].value {
            start = i;
        }
    }

    let mut hull: Vec<usize> = Vec::with_capacity(points.len() - start);
    for i in start..points.len() {
        let p = &points[i];
        while hull.len() >= 2 {
            let a = &points[hull[hull.len() - 2]];
            let b = &points[hull[hull.len() - 1]];
            // (b - a) x (p - a) < 0 means b lies strictly above segment a-p
            let cross = (b.diameter - a.diameter) * (p.value - a.value)
                - (b.value - a.value) * (p.diameter - a.diameter);
            if cross < 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(i);
    }
    hull
}

/// Select the potentially optimal rectangles.
///
/// `candidates` holds one entry per diameter (as produced by
/// `RectangleStore::level_minima`), `fmin` is the best feasible value seen so
/// far (`+inf` when none), `eps` the sufficient-improvement epsilon.
///
/// Returns the selected candidates ordered by decreasing diameter. Rectangles
/// at maximal division depth are never selected. When no feasible rectangle
/// can be selected, the best rectangle of the largest diameter is returned
/// alone. The result is empty only when nothing is divisible.
pub fn potentially_optimal(candidates: &[Candidate], fmin: f64, eps: f64) -> Vec<Candidate> {
    let mut points: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.divisible() && c.value.is_finite())
        .copied()
        .collect();

    if points.is_empty() {
        return candidates
            .iter()
            .filter(|c| c.divisible())
            .max_by(|a, b| {
                a.diameter
                    .total_cmp(&b.diameter)
                    .then_with(|| b.order.cmp(&a.order))
            })
            .copied()
            .into_iter()
            .collect();
    }

    points.sort_by(|a, b| a.diameter.total_cmp(&b.diameter));

    let hull = lower_right_hull(&points);
    let target = improvement_target(fmin, eps);

    let mut selected = Vec::with_capacity(hull.len());
    for (pos, &i) in hull.iter().enumerate() {
        let p = &points[i];
        match hull.get(pos + 1) {
            Some(&next) => {
                let q = &points[next];
                let k = (q.value - p.value) / (q.diameter - p.diameter);
                if p.value - k * p.diameter <= target {
                    selected.push(*p);
                }
            }
            // largest diameter: K may be arbitrarily large
            None => selected.push(*p),
        }
    }

    selected.reverse();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Sample;
    use crate::storage::{Rect, RectangleStore};

    fn cand(id: usize, diameter: f64, value: f64) -> Candidate {
        Candidate {
            handle: store_handle(id),
            level: 100 - id,
            diameter,
            value,
            order: id as u64,
            min_divisions: 0,
        }
    }

    /// Obtain real handles by inserting placeholder rectangles.
    fn store_handle(id: usize) -> Handle {
        let mut s = RectangleStore::new(1, id + 1);
        let mut last = None;
        for _ in 0..=id {
            last = Some(
                s.insert(Rect::new(vec![0.5], vec![0], Sample { value: 0.0, feasible: true }))
                    .unwrap(),
            );
        }
        last.unwrap()
    }

    fn orders(sel: &[Candidate]) -> Vec<u64> {
        sel.iter().map(|c| c.order).collect()
    }

    // ────────────────────────────────────────────────────────────────
    // Hull
    // ────────────────────────────────────────────────────────────────

    #[test]
    fn test_hull_starts_at_minimum() {
        // sorted by diameter; minimum at index 1
        let pts = vec![
            cand(0, 0.1, 5.0),
            cand(1, 0.2, 1.0),
            cand(2, 0.3, 3.0),
            cand(3, 0.4, 4.0),
        ];
        let hull = lower_right_hull(&pts);
        assert_eq!(hull[0], 1);
        assert_eq!(*hull.last().unwrap(), 3);
    }

    #[test]
    fn test_hull_drops_points_above() {
        let pts = vec![
            cand(0, 0.1, 0.0),
            cand(1, 0.2, 5.0), // above the segment (0.1,0)-(0.3,1)
            cand(2, 0.3, 1.0),
        ];
        assert_eq!(lower_right_hull(&pts), vec![0, 2]);
    }

    #[test]
    fn test_hull_keeps_collinear() {
        let pts = vec![cand(0, 1.0, 0.0), cand(1, 2.0, 1.0), cand(2, 3.0, 2.0)];
        assert_eq!(lower_right_hull(&pts), vec![0, 1, 2]);
    }

    #[test]
    fn test_hull_tie_prefers_larger_diameter() {
        let pts = vec![cand(0, 0.1, 1.0), cand(1, 0.2, 1.0), cand(2, 0.3, 2.0)];
        assert_eq!(lower_right_hull(&pts)[0], 1);
    }

    #[test]
    fn test_hull_empty() {
        assert!(lower_right_hull(&[]).is_empty());
    }

    // ────────────────────────────────────────────────────────────────
    // Selection
    // ────────────────────────────────────────────────────────────────

    #[test]
    fn test_single_candidate_selected() {
        let c = vec![cand(0, 0.5, 3.0)];
        let sel = potentially_optimal(&c, 3.0, 1e-4);
        assert_eq!(orders(&sel), vec![0]);
    }

    #[test]
    fn test_largest_always_selected() {
        // largest rectangle is terrible but still selected
        let c = vec![cand(0, 0.9, 1e6), cand(1, 0.1, 0.0)];
        let sel = potentially_optimal(&c, 0.0, 1e-4);
        assert!(orders(&sel).contains(&0));
    }

    #[test]
    fn test_epsilon_rejects_insignificant_gain() {
        // Slope from min point to the largest one is tiny: the min point's
        // lower bound 1.0 - K*0.1 barely improves on fmin = 1.0.
        let c = vec![cand(0, 0.9, 1.0 + 1e-6), cand(1, 0.1, 1.0)];
        let with_eps = potentially_optimal(&c, 1.0, 1e-2);
        assert_eq!(orders(&with_eps), vec![0]);

        let without_eps = potentially_optimal(&c, 1.0, 0.0);
        assert_eq!(orders(&without_eps), vec![0, 1]);
    }

    #[test]
    fn test_epsilon_uses_unit_floor() {
        // fmin = 0: target is -eps, not 0
        assert_eq!(improvement_target(0.0, 1e-4), -1e-4);
        assert_eq!(improvement_target(-200.0, 1e-2), -202.0);
        assert_eq!(improvement_target(0.5, 1e-2), 0.49);
    }

    #[test]
    fn test_dominated_point_not_selected() {
        // middle point is above the hull
        let c = vec![cand(0, 0.9, 2.0), cand(1, 0.5, 10.0), cand(2, 0.1, 0.0)];
        let sel = potentially_optimal(&c, 0.0, 1e-4);
        assert_eq!(orders(&sel), vec![0, 2]);
    }

    #[test]
    fn test_smaller_than_minimum_not_selected() {
        // rectangles smaller than the minimiser with worse value never qualify
        let c = vec![cand(0, 0.9, 2.0), cand(1, 0.5, 0.0), cand(2, 0.1, 1.0)];
        let sel = potentially_optimal(&c, 0.0, 1e-4);
        assert!(!orders(&sel).contains(&2));
        assert_eq!(orders(&sel), vec![0, 1]);
    }

    #[test]
    fn test_result_ordered_by_decreasing_diameter() {
        let c = vec![
            cand(0, 0.1, 0.0),
            cand(1, 0.3, 0.5),
            cand(2, 0.9, 3.0),
        ];
        let sel = potentially_optimal(&c, 0.0, 0.0);
        let diams: Vec<f64> = sel.iter().map(|s| s.diameter).collect();
        let mut sorted = diams.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(diams, sorted);
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn test_infeasible_candidates_skipped() {
        let c = vec![cand(0, 0.9, f64::INFINITY), cand(1, 0.3, 1.0)];
        let sel = potentially_optimal(&c, 1.0, 1e-4);
        assert_eq!(orders(&sel), vec![1]);
    }

    #[test]
    fn test_all_infeasible_selects_largest() {
        let c = vec![
            cand(0, 0.3, f64::INFINITY),
            cand(1, 0.9, f64::INFINITY),
            cand(2, 0.1, f64::INFINITY),
        ];
        let sel = potentially_optimal(&c, f64::INFINITY, 1e-4);
        assert_eq!(orders(&sel), vec![1]);
    }

    #[test]
    fn test_max_depth_excluded() {
        let mut deep = cand(0, 0.1, 0.0);
        deep.min_divisions = MAX_DIVISIONS;
        let c = vec![cand(1, 0.9, 5.0), deep];
        let sel = potentially_optimal(&c, 0.0, 1e-4);
        assert_eq!(orders(&sel), vec![1]);

        let sel = potentially_optimal(&[deep], 0.0, 1e-4);
        assert!(sel.is_empty());
    }
}
