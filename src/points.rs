//! Point storage and reorderable accessors.
//!
//! The detector owns a single [`PointStore`]. Octrees never own points; they
//! see the store through a [`PointAccessor`], which maps positions in the
//! octree's own ordering to positions in the store.
//!
//! - [`DirectAccessor`] covers a contiguous range of the store and reorders
//!   the records themselves.
//! - [`IndexedAccessor`] covers the whole store through a permutation vector
//!   and never moves records.
//!
//! Accessors over disjoint ranges never observe each other's swaps. The
//! store keeps the caller-facing id of every record so that reordering stays
//! invisible outside the crate.

use crate::types::PointWithNormal;

/// Owned point records plus the caller index each record came from.
#[derive(Clone, Debug, Default)]
pub struct PointStore {
    records: Vec<PointWithNormal>,
    ids: Vec<usize>,
}

impl PointStore {
    pub fn new(records: Vec<PointWithNormal>) -> Self {
        let ids = (0..records.len()).collect();
        Self { records, ids }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, pos: usize) -> &PointWithNormal {
        &self.records[pos]
    }

    #[inline]
    pub fn get_mut(&mut self, pos: usize) -> &mut PointWithNormal {
        &mut self.records[pos]
    }

    /// Caller index of the record currently stored at `pos`.
    #[inline]
    pub fn id(&self, pos: usize) -> usize {
        self.ids[pos]
    }

    pub fn records(&self) -> &[PointWithNormal] {
        &self.records
    }

    /// Swaps two records together with their caller ids.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.records.swap(a, b);
        self.ids.swap(a, b);
    }
}

/// Reorderable, indexable view over a [`PointStore`].
pub trait PointAccessor {
    /// Number of records covered by the view.
    fn size(&self) -> usize;

    /// Store position of the record at view position `i`.
    fn index(&self, i: usize) -> usize;

    /// Exchanges the records at view positions `a` and `b`.
    fn swap(&mut self, store: &mut PointStore, a: usize, b: usize);

    #[inline]
    fn at<'s>(&self, store: &'s PointStore, i: usize) -> &'s PointWithNormal {
        store.get(self.index(i))
    }

    #[inline]
    fn at_mut<'s>(&self, store: &'s mut PointStore, i: usize) -> &'s mut PointWithNormal {
        store.get_mut(self.index(i))
    }
}

/// Contiguous range `[offset, offset + len)` of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectAccessor {
    offset: usize,
    len: usize,
}

impl DirectAccessor {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether store position `pos` falls inside this range.
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.offset && pos - self.offset < self.len
    }
}

impl PointAccessor for DirectAccessor {
    fn size(&self) -> usize {
        self.len
    }

    #[inline]
    fn index(&self, i: usize) -> usize {
        self.offset + i
    }

    fn swap(&mut self, store: &mut PointStore, a: usize, b: usize) {
        store.swap(self.offset + a, self.offset + b);
    }
}

/// Permutation over store positions; swapping only permutes the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedAccessor {
    order: Vec<usize>,
}

impl IndexedAccessor {
    /// Identity permutation over the first `len` store positions.
    pub fn new(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
        }
    }
}

impl PointAccessor for IndexedAccessor {
    fn size(&self) -> usize {
        self.order.len()
    }

    #[inline]
    fn index(&self, i: usize) -> usize {
        self.order[i]
    }

    fn swap(&mut self, _store: &mut PointStore, a: usize, b: usize) {
        self.order.swap(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(n: usize) -> PointStore {
        PointStore::new(
            (0..n)
                .map(|i| PointWithNormal::from_arrays([i as f64, 0.0, 0.0], [0.0, 0.0, 1.0]))
                .collect(),
        )
    }

    #[test]
    fn direct_swaps_stay_inside_their_range() {
        let mut s = store(8);
        let mut low = DirectAccessor::new(0, 4);
        let high = DirectAccessor::new(4, 4);
        assert_eq!(low.size(), 4);
        assert_eq!(high.size(), 4);

        low.swap(&mut s, 0, 3);
        assert_eq!(low.at(&s, 0).position.x, 3.0);
        assert_eq!(s.id(low.index(0)), 3, "caller id follows the record");
        for i in 0..4 {
            assert_eq!(
                high.at(&s, i).position.x,
                (4 + i) as f64,
                "disjoint range must be untouched"
            );
        }
    }

    #[test]
    fn indexed_swaps_leave_storage_untouched() {
        let mut s = store(5);
        let mut view = IndexedAccessor::new(5);
        view.swap(&mut s, 1, 4);
        assert_eq!(view.index(1), 4);
        assert_eq!(view.at(&s, 1).position.x, 4.0);
        assert_eq!(s.get(1).position.x, 1.0, "records must not move");
        assert_eq!(s.id(4), 4);
    }

    #[test]
    fn mutable_access_goes_through_the_mapping() {
        let mut s = store(4);
        let mut view = IndexedAccessor::new(4);
        view.swap(&mut s, 0, 2);
        view.at_mut(&mut s, 0).position.y = 5.0;
        assert_eq!(s.get(2).position.y, 5.0);
        assert_eq!(s.get(0).position.y, 0.0);

        let direct = DirectAccessor::new(1, 3);
        direct.at_mut(&mut s, 2).normal.z = -1.0;
        assert_eq!(s.get(3).normal.z, -1.0);
    }

    #[test]
    fn direct_contains_matches_range() {
        let view = DirectAccessor::new(10, 5);
        assert!(!view.contains(9));
        assert!(view.contains(10));
        assert!(view.contains(14));
        assert!(!view.contains(15));
    }
}
