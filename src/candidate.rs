//! Shape candidates and their probabilistic size bounds.
//!
//! A candidate wraps a fitted [`Shape`] together with the store positions it
//! covers so far. The detector scores it subset by subset; after `k` inliers
//! were found among `s` evaluated points, the number of inliers among all
//! `N` available points is bracketed by a hypergeometric confidence interval
//! (`min_bound`, `max_bound`). The interval is recomputed eagerly by
//! [`Candidate::compute_bound`] and only read afterwards, so ordering
//! candidates never triggers any scoring.

use crate::cluster::largest_component;
use crate::points::PointStore;
use crate::shapes::Shape;

/// Fitted primitive hypothesis plus its covered indices and bounds.
#[derive(Debug)]
pub struct Candidate {
    shape: Box<dyn Shape>,
    indices: Vec<usize>,
    nb_subset_used: usize,
    min_bound: f64,
    max_bound: f64,
}

impl Candidate {
    pub fn new(shape: Box<dyn Shape>) -> Self {
        Self {
            shape,
            indices: Vec::new(),
            nb_subset_used: 0,
            min_bound: 0.0,
            max_bound: 0.0,
        }
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    /// Store positions covered so far.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Exact number of covered points over the subsets evaluated so far.
    pub fn score(&self) -> usize {
        self.indices.len()
    }

    /// Number of subsets folded into the score.
    pub fn nb_subset_used(&self) -> usize {
        self.nb_subset_used
    }

    pub fn min_bound(&self) -> f64 {
        self.min_bound
    }

    pub fn max_bound(&self) -> f64 {
        self.max_bound
    }

    pub fn expected_value(&self) -> f64 {
        0.5 * (self.min_bound + self.max_bound)
    }

    pub fn into_parts(self) -> (Box<dyn Shape>, Vec<usize>) {
        (self.shape, self.indices)
    }

    /// Appends every unassigned position of `indices` that lies within
    /// `epsilon` and passes the normal test. Returns the number appended.
    pub fn cost_function(
        &mut self,
        store: &PointStore,
        shape_index: &[Option<usize>],
        epsilon: f64,
        normal_threshold: f64,
        indices: &[usize],
    ) -> usize {
        let before = self.indices.len();
        for &j in indices {
            if shape_index[j].is_none() && self.shape.accepts(store.get(j), epsilon, normal_threshold)
            {
                self.indices.push(j);
            }
        }
        self.indices.len() - before
    }

    /// Restricts the covered points to their largest connected component
    /// and returns its size.
    pub fn connected_component(&mut self, store: &PointStore, cluster_epsilon: f64) -> usize {
        self.indices = largest_component(&self.indices, cluster_epsilon, |j| {
            store.get(j).position
        });
        self.indices.len()
    }

    /// Drops covered points that have since been assigned to a shape.
    pub fn update_points(&mut self, shape_index: &[Option<usize>]) {
        self.indices.retain(|&j| shape_index[j].is_none());
    }

    /// Recomputes the bounds from the current score, `num_evaluated` points
    /// sampled so far and `num_available` unassigned points overall.
    ///
    /// With `k = score`, `s = num_evaluated`, `N = num_available` the
    /// interval is `c ± sqrt(v) / (s + 2)` where
    /// `c = (N + 2)(k + 1) / (s + 2) - 1` and
    /// `v = (N + 2)(k + 1)(N - s)(s + 1 - k) / (s + 3)`.
    /// Non-finite results collapse the interval to zero; `s == N` collapses it
    /// to the exact score.
    pub fn compute_bound(&mut self, num_evaluated: usize, num_available: usize) {
        let k = self.score() as f64;
        let s = num_evaluated as f64;
        let n = num_available as f64;
        let center = (n + 2.0) * (k + 1.0) / (s + 2.0) - 1.0;
        let variance = (n + 2.0) * (k + 1.0) * (n - s) * (s + 1.0 - k) / (s + 3.0);
        let spread = variance.sqrt() / (s + 2.0);
        let (low, high) = (center - spread, center + spread);
        if low.is_finite() && high.is_finite() {
            self.min_bound = low;
            self.max_bound = high;
        } else {
            self.min_bound = 0.0;
            self.max_bound = 0.0;
        }
    }

    pub(crate) fn clear_indices(&mut self) {
        self.indices.clear();
    }

    pub(crate) fn mark_subset_used(&mut self) {
        self.nb_subset_used += 1;
    }

    /// Marks the score as exact over all `count` subsets.
    pub(crate) fn mark_all_subsets_used(&mut self, count: usize) {
        self.nb_subset_used = self.nb_subset_used.max(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Plane;
    use crate::types::PointWithNormal;
    use nalgebra::Vector3;

    fn flat_plane() -> Box<dyn Shape> {
        Box::new(Plane {
            normal: Vector3::z(),
            d: 0.0,
        })
    }

    fn candidate_with_score(k: usize) -> Candidate {
        let mut c = Candidate::new(flat_plane());
        c.indices = (0..k).collect();
        c
    }

    #[test]
    fn bound_narrows_around_a_constant_ratio() {
        let mut c = candidate_with_score(50);
        c.compute_bound(100, 1000);
        let (lo_100, hi_100) = (c.min_bound(), c.max_bound());

        let mut c = candidate_with_score(200);
        c.compute_bound(400, 1000);
        let (lo_400, hi_400) = (c.min_bound(), c.max_bound());

        assert!((c.expected_value() - 500.0).abs() < 1e-9, "expected {}", c.expected_value());
        assert!(lo_100 <= lo_400, "min bound must not drop: {lo_100} -> {lo_400}");
        assert!(hi_100 >= hi_400, "max bound must not grow: {hi_100} -> {hi_400}");
        assert!(hi_400 - lo_400 < hi_100 - lo_100);
    }

    #[test]
    fn bound_collapses_to_score_when_everything_was_evaluated() {
        let mut c = candidate_with_score(37);
        c.compute_bound(500, 500);
        assert!((c.min_bound() - 37.0).abs() < 1e-9);
        assert!((c.max_bound() - 37.0).abs() < 1e-9);
        assert!((c.expected_value() - 37.0).abs() < 1e-9);
    }

    #[test]
    fn cost_function_and_update_points_respect_assignments() {
        let store = PointStore::new(vec![
            PointWithNormal::from_arrays([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            PointWithNormal::from_arrays([1.0, 0.0, 0.005], [0.0, 0.0, -1.0]),
            PointWithNormal::from_arrays([2.0, 0.0, 0.5], [0.0, 0.0, 1.0]),
            PointWithNormal::from_arrays([3.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            PointWithNormal::from_arrays([4.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ]);
        let mut shape_index = vec![None, None, None, None, Some(0)];
        let mut c = Candidate::new(flat_plane());
        let added = c.cost_function(&store, &shape_index, 0.01, 0.9, &[0, 1, 2, 3, 4]);
        assert_eq!(added, 2, "only near, well-oriented, unassigned points count");
        assert_eq!(c.indices(), &[0, 1]);

        shape_index[1] = Some(1);
        c.update_points(&shape_index);
        assert_eq!(c.indices(), &[0]);
        assert_eq!(c.score(), 1);
    }

    #[test]
    fn connected_component_keeps_largest_patch() {
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(PointWithNormal::from_arrays([i as f64 * 0.1, 0.0, 0.0], [0.0, 0.0, 1.0]));
        }
        for i in 0..8 {
            records.push(PointWithNormal::from_arrays(
                [10.0 + i as f64 * 0.1, 0.0, 0.0],
                [0.0, 0.0, 1.0],
            ));
        }
        let store = PointStore::new(records);
        let mut c = Candidate::new(flat_plane());
        let all: Vec<usize> = (0..13).collect();
        c.cost_function(&store, &vec![None; 13], 0.01, 0.9, &all);
        assert_eq!(c.connected_component(&store, 0.5), 8);
        assert_eq!(c.indices(), (5..13).collect::<Vec<_>>().as_slice());
    }
}
