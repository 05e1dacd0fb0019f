//! Disjoint random subsets of the cloud, each indexed by its own octree.
//!
//! The store is split into contiguous ranges: the tail half of the points
//! (chosen at random) forms the largest subset, a random half of what is
//! left forms the next one, and so on; subset 0 keeps the remainder at the
//! front and is the smallest. Candidates are scored against subset 0 first
//! and fold further subsets in only when their bounds need tightening.
//!
//! Each subset keeps an available-size counter that drops whenever one of
//! its points is assigned to a committed shape. Trees are never rebuilt
//! during a run.

use crate::octree::{Octree, OctreeOptions};
use crate::points::{DirectAccessor, PointStore};
use rand::Rng;

/// Points below which no extra subset levels are added (2^9).
const SUBSET_LEVEL_OFFSET: usize = 9;
pub const MIN_SUBSETS: usize = 2;

#[derive(Clone, Debug)]
pub struct SubsetHierarchy {
    octrees: Vec<Octree<DirectAccessor>>,
    available: Vec<usize>,
}

impl SubsetHierarchy {
    /// `max(floor(log2 n) - 9, 2)`.
    pub fn subset_count(num_points: usize) -> usize {
        let log2 = num_points.max(1).ilog2() as usize;
        log2.saturating_sub(SUBSET_LEVEL_OFFSET).max(MIN_SUBSETS)
    }

    /// Splits `store` into subsets and builds one octree per subset.
    pub fn build<R: Rng + ?Sized>(
        store: &mut PointStore,
        options: OctreeOptions,
        rng: &mut R,
    ) -> Self {
        let count = Self::subset_count(store.len());
        let mut ranges = vec![(0usize, 0usize); count];
        let mut remaining = store.len();
        for s in (1..count).rev() {
            let half = remaining / 2;
            // Partial Fisher-Yates: a uniform random half ends up in the tail.
            for i in 0..half {
                let tail = remaining - 1 - i;
                let pick = rng.gen_range(0..=tail);
                store.swap(pick, tail);
            }
            ranges[s] = (remaining - half, half);
            remaining -= half;
        }
        ranges[0] = (0, remaining);

        let octrees: Vec<_> = ranges
            .into_iter()
            .map(|(offset, len)| Octree::build(DirectAccessor::new(offset, len), store, options))
            .collect();
        let available = octrees.iter().map(|tree| tree.size()).collect();
        Self { octrees, available }
    }

    pub fn len(&self) -> usize {
        self.octrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octrees.is_empty()
    }

    pub fn octree(&self, subset: usize) -> &Octree<DirectAccessor> {
        &self.octrees[subset]
    }

    pub fn octrees(&self) -> &[Octree<DirectAccessor>] {
        &self.octrees
    }

    /// Unassigned points left in each subset.
    pub fn available_sizes(&self) -> &[usize] {
        &self.available
    }

    /// Sum of the available sizes of subsets `0..count`.
    pub fn available_in_first(&self, count: usize) -> usize {
        self.available[..count.min(self.available.len())].iter().sum()
    }

    /// Running totals of the available sizes, subset 0 first.
    pub fn cumulative_sizes(&self) -> Vec<usize> {
        self.available
            .iter()
            .scan(0usize, |acc, &n| {
                *acc += n;
                Some(*acc)
            })
            .collect()
    }

    /// Restores every counter to its subset's full size.
    pub fn reset_counters(&mut self) {
        for (slot, tree) in self.available.iter_mut().zip(&self.octrees) {
            *slot = tree.size();
        }
    }

    /// Accounts for the store position `pos` having been assigned.
    pub fn remove_point(&mut self, pos: usize) {
        if let Some(s) = self
            .octrees
            .iter()
            .position(|tree| tree.accessor().contains(pos))
        {
            self.available[s] = self.available[s].saturating_sub(1);
        }
    }
}
