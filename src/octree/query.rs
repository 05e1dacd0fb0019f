use super::{octant_of, Octree};
use crate::candidate::Candidate;
use crate::points::{PointAccessor, PointStore};
use nalgebra::Point3;
use rand::Rng;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

impl<A: PointAccessor> Octree<A> {
    /// Arena index of the cell containing `query` at `level`.
    ///
    /// Descent stops early at a leaf. Returns `None` for an empty tree or
    /// when `query` falls into an octant that holds no points.
    pub fn cell_containing_point(&self, query: &Point3<f64>, level: usize) -> Option<usize> {
        let mut cur = 0usize;
        let mut cell = self.cells.first()?;
        while cell.level < level && !cell.is_leaf() {
            cur = cell.children[octant_of(&cell.center, query)]?;
            cell = &self.cells[cur];
        }
        Some(cur)
    }

    /// Unassigned store positions in the cell containing `query` at `level`.
    pub fn points_in_cell_containing_point(
        &self,
        query: &Point3<f64>,
        level: usize,
        shape_index: &[Option<usize>],
    ) -> Option<Vec<usize>> {
        let cell = &self.cells[self.cell_containing_point(query, level)?];
        Some(
            cell.range()
                .map(|i| self.accessor.index(i))
                .filter(|&j| shape_index[j].is_none())
                .collect(),
        )
    }

    /// Draws `required` distinct unassigned store positions uniformly from
    /// the cell containing `query` at `level`.
    ///
    /// Returns `None` when the cell holds fewer than `required` unassigned
    /// points.
    pub fn draw_samples_from_cell_containing_point<R: Rng + ?Sized>(
        &self,
        query: &Point3<f64>,
        level: usize,
        required: usize,
        shape_index: &[Option<usize>],
        rng: &mut R,
    ) -> Option<Vec<usize>> {
        let cell = &self.cells[self.cell_containing_point(query, level)?];
        let available = cell
            .range()
            .filter(|&i| shape_index[self.accessor.index(i)].is_none())
            .take(required)
            .count();
        if available < required {
            return None;
        }
        let mut picked = Vec::with_capacity(required);
        while picked.len() < required {
            let j = self.accessor.index(rng.gen_range(cell.range()));
            if shape_index[j].is_none() && !picked.contains(&j) {
                picked.push(j);
            }
        }
        Some(picked)
    }

    /// Adds every unassigned inlier of `candidate` found in this tree to the
    /// candidate and returns how many were added.
    ///
    /// A subtree is skipped when the candidate surface passes farther than
    /// `epsilon` plus the cell half-diagonal from the cell center.
    pub fn score(
        &self,
        candidate: &mut Candidate,
        store: &PointStore,
        shape_index: &[Option<usize>],
        epsilon: f64,
        normal_threshold: f64,
    ) -> usize {
        if self.cells.is_empty() {
            return 0;
        }
        let mut added = 0;
        let mut leaf = Vec::new();
        let mut stack = vec![0usize];
        while let Some(ci) = stack.pop() {
            let cell = &self.cells[ci];
            let reach = epsilon + self.cell_half_width(cell.level) * SQRT_3;
            if candidate.shape().distance(&cell.center) > reach {
                continue;
            }
            if cell.is_leaf() {
                leaf.clear();
                leaf.extend(cell.range().map(|i| self.accessor.index(i)));
                added +=
                    candidate.cost_function(store, shape_index, epsilon, normal_threshold, &leaf);
            } else {
                stack.extend(cell.children.iter().flatten().copied());
            }
        }
        added
    }
}
