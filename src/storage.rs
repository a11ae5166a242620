//! Rectangle storage: an arena of hyperrectangles addressed by stable handles.
//!
//! Only leaves of the current partition are stored. Freed slots are recycled
//! through a free list, so the number of occupied slots always equals the
//! number of live leaves.
//!
//! Leaves are grouped by *level*, a discrete stand-in for the diameter. Since
//! only longest sides are ever divided, the division counts of a leaf take at
//! most two values `k` and `k + 1`; with `m` dimensions at `k + 1` the level is
//! `k * n + m`. Levels increase as diameters decrease, and two leaves share a
//! level exactly when they share a diameter. Each level holds an ordered set
//! keyed by `(value, insertion order)`, so the best leaf of a level is its first
//! element.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DirectError, Result};
use crate::evaluator::Sample;
use crate::selector::Candidate;

/// Largest minimum division count at which a leaf may still be divided.
///
/// The next sample offset `3^-(k+1)` stays above the spacing of doubles in
/// `[0, 1]` for every `k < MAX_DIVISIONS`.
pub const MAX_DIVISIONS: u32 = 30;

/// Stable index of a live rectangle in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Distance from the center to a vertex: `0.5 * sqrt(sum_i 3^(-2 d_i))`.
pub fn diameter_of(divisions: &[u32]) -> f64 {
    let sum: f64 = divisions
        .iter()
        .map(|&d| 9.0_f64.powi(-(d as i32)))
        .sum();
    0.5 * sum.sqrt()
}

/// Level of a division vector, see the module documentation.
pub fn level_of(divisions: &[u32]) -> usize {
    let n = divisions.len();
    let k = divisions.iter().copied().min().unwrap_or(0);
    let m = divisions.iter().filter(|&&d| d > k).count();
    k as usize * n + m
}

// ──────────────────────────────────────────────────────────────────────────────
// Rect
// ──────────────────────────────────────────────────────────────────────────────

/// A leaf hyperrectangle in normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    /// Center in `[0,1]^n`.
    pub center: Vec<f64>,
    /// Number of trisections applied along each dimension.
    pub divisions: Vec<u32>,
    /// Center-to-vertex distance, derived from `divisions`.
    pub diameter: f64,
    /// Objective value at the center, `+inf` when infeasible.
    pub value: f64,
    pub feasible: bool,
    /// Sum of `divisions`.
    pub depth: u32,
    /// Insertion sequence number, assigned by the store.
    pub order: u64,
}

impl Rect {
    pub fn new(center: Vec<f64>, divisions: Vec<u32>, sample: Sample) -> Self {
        debug_assert_eq!(center.len(), divisions.len());
        let diameter = diameter_of(&divisions);
        let depth = divisions.iter().sum();
        Self {
            center,
            divisions,
            diameter,
            value: sample.value,
            feasible: sample.feasible,
            depth,
            order: 0,
        }
    }

    /// The whole normalized domain.
    pub fn root(dim: usize, sample: Sample) -> Self {
        Self::new(vec![0.5; dim], vec![0; dim], sample)
    }

    pub fn dim(&self) -> usize {
        self.center.len()
    }

    /// Division count of the longest sides.
    pub fn min_divisions(&self) -> u32 {
        self.divisions.iter().copied().min().unwrap_or(0)
    }

    pub fn level(&self) -> usize {
        level_of(&self.divisions)
    }

    /// Side length along dimension `i`.
    pub fn side(&self, i: usize) -> f64 {
        3.0_f64.powi(-(self.divisions[i] as i32))
    }

    /// Volume as a fraction of the unit cube.
    pub fn volume(&self) -> f64 {
        3.0_f64.powi(-(self.depth as i32))
    }

    /// Dimensions with the longest side, in increasing index order.
    pub fn longest_dims(&self) -> Vec<usize> {
        let k = self.min_divisions();
        self.divisions
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == k)
            .map(|(i, _)| i)
            .collect()
    }

    /// Value used for ordering and selection (infeasible sorts last).
    #[inline]
    pub fn selection_value(&self) -> f64 {
        if self.feasible {
            self.value
        } else {
            f64::INFINITY
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Ordering key within a level
// ──────────────────────────────────────────────────────────────────────────────

/// `(value, order)` ordering key for the leaves of one level.
#[derive(Debug, Clone, Copy)]
struct LeafKey {
    value: f64,
    order: u64,
    handle: Handle,
}

impl PartialEq for LeafKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for LeafKey {}

impl PartialOrd for LeafKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LeafKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // order is unique, so the handle never decides
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.order.cmp(&other.order))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// RectangleStore
// ──────────────────────────────────────────────────────────────────────────────

/// Arena of live leaves with per-level ordered groups.
#[derive(Debug)]
pub struct RectangleStore {
    /// Number of dimensions.
    pub dim: usize,
    /// Maximum number of live leaves.
    pub capacity: usize,

    slots: Vec<Option<Rect>>,
    free: Vec<usize>,
    groups: BTreeMap<usize, BTreeSet<LeafKey>>,
    next_order: u64,
    live: usize,
}

impl RectangleStore {
    pub fn new(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            capacity,
            slots: Vec::with_capacity(capacity.min(1 << 16)),
            free: Vec::new(),
            groups: BTreeMap::new(),
            next_order: 0,
            live: 0,
        }
    }

    /// Insert a leaf and return its handle.
    ///
    /// # Errors
    /// `OutOfMemory` when the store already holds `capacity` leaves.
    pub fn insert(&mut self, mut rect: Rect) -> Result<Handle> {
        debug_assert_eq!(rect.dim(), self.dim);
        if self.live >= self.capacity {
            return Err(DirectError::OutOfMemory(self.capacity));
        }

        rect.order = self.next_order;
        self.next_order += 1;

        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        let handle = Handle(idx);

        self.groups.entry(rect.level()).or_default().insert(LeafKey {
            value: rect.selection_value(),
            order: rect.order,
            handle,
        });
        self.slots[idx] = Some(rect);
        self.live += 1;

        Ok(handle)
    }

    /// Remove a leaf, returning it. Returns `None` for a stale handle.
    pub fn remove(&mut self, handle: Handle) -> Option<Rect> {
        let rect = self.slots.get_mut(handle.0)?.take()?;
        let level = rect.level();
        if let Some(group) = self.groups.get_mut(&level) {
            group.remove(&LeafKey {
                value: rect.selection_value(),
                order: rect.order,
                handle,
            });
            if group.is_empty() {
                self.groups.remove(&level);
            }
        }
        self.free.push(handle.0);
        self.live -= 1;
        Some(rect)
    }

    pub fn get(&self, handle: Handle) -> Option<&Rect> {
        self.slots.get(handle.0).and_then(|s| s.as_ref())
    }

    /// Number of live leaves.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Lazy iterator over all live leaves.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Rect)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|r| (Handle(i), r)))
    }

    /// Number of distinct diameters among live leaves.
    pub fn level_count(&self) -> usize {
        self.groups.len()
    }

    /// Level with the largest diameter.
    pub fn largest_level(&self) -> Option<usize> {
        self.groups.keys().next().copied()
    }

    /// Best leaf of every level, largest diameter first.
    pub fn level_minima(&self) -> Vec<Candidate> {
        self.groups
            .iter()
            .filter_map(|(&level, group)| {
                let key = group.first()?;
                let rect = self.get(key.handle)?;
                Some(Candidate {
                    handle: key.handle,
                    level,
                    diameter: rect.diameter,
                    value: key.value,
                    order: key.order,
                    min_divisions: rect.min_divisions(),
                })
            })
            .collect()
    }

    /// A leaf of the largest diameter (the best one of that level).
    pub fn largest(&self) -> Option<&Rect> {
        let (_, group) = self.groups.iter().next()?;
        self.get(group.first()?.handle)
    }

    /// Best feasible leaf, ties broken by insertion order.
    pub fn best_feasible(&self) -> Option<(Handle, &Rect)> {
        self.groups
            .values()
            .filter_map(|g| g.first())
            .filter(|k| k.value.is_finite())
            .min()
            .and_then(|k| self.get(k.handle).map(|r| (k.handle, r)))
    }

    /// Sum of leaf volumes; equals 1 for a complete partition.
    pub fn total_volume(&self) -> f64 {
        self.iter().map(|(_, r)| r.volume()).sum()
    }
}
