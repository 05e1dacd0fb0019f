//! Point octree over a [`PointAccessor`], stored as an arena of cells.
//!
//! Purpose
//! - Find the cell around a seed point at a chosen depth, so that RANSAC
//!   samples are drawn from a spatial neighbourhood instead of the whole
//!   cloud.
//! - Score a shape candidate while skipping every subtree that cannot
//!   contain an inlier.
//!
//! Design
//! - One bounding cube with half-width `W` (half the largest bbox side)
//!   centred on the bbox center. A cell at level `L` is a cube of half-width
//!   `W / 2^L` around its `center`.
//! - Each cell owns a contiguous range `[first, last)` of the accessor's
//!   ordering. A split runs three in-place binary partitions (z, then y,
//!   then x) around the cell center; the eight resulting ranges become the
//!   non-empty children and exactly partition the parent range.
//! - A cell stays a leaf once it holds at most `bucket_size` points or sits
//!   at `max_depth`, so identical points still terminate.
//! - Construction and traversal use explicit stacks.
//! - Child links are arena indices; dropping the octree frees every cell.
//!
//! Octant numbering is `x | y << 1 | z << 2`, a coordinate counting as
//! "upper" when it is `>=` the cell center coordinate.

mod query;

use crate::points::{PointAccessor, PointStore};
use crate::types::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BUCKET_SIZE: usize = 2;
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Construction limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeOptions {
    /// Cells with at most this many points are not subdivided.
    pub bucket_size: usize,
    /// Deepest level a cell may reach.
    pub max_depth: usize,
}

impl Default for OctreeOptions {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Octree node: a range of the accessor ordering plus up to eight children.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// First position of the range.
    pub first: usize,
    /// One past the last position of the range.
    pub last: usize,
    pub children: [Option<usize>; 8],
    pub center: Point3<f64>,
    pub level: usize,
}

impl Cell {
    fn new(first: usize, last: usize, center: Point3<f64>, level: usize) -> Self {
        Self {
            first,
            last,
            children: [None; 8],
            center,
            level,
        }
    }

    pub fn size(&self) -> usize {
        self.last - self.first
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.first..self.last
    }
}

/// Octree built over one accessor of a shared [`PointStore`].
#[derive(Clone, Debug)]
pub struct Octree<A: PointAccessor> {
    accessor: A,
    cells: Vec<Cell>,
    bbox: Option<BoundingBox>,
    half_width: f64,
    max_level: usize,
    options: OctreeOptions,
}

impl<A: PointAccessor> Octree<A> {
    /// Builds the tree, reordering the accessor's range in place.
    pub fn build(mut accessor: A, store: &mut PointStore, options: OctreeOptions) -> Self {
        let n = accessor.size();
        let bbox = {
            let records: &PointStore = store;
            BoundingBox::from_points((0..n).map(|i| &accessor.at(records, i).position))
        };
        let Some(bbox) = bbox else {
            return Self {
                accessor,
                cells: Vec::new(),
                bbox: None,
                half_width: 0.0,
                max_level: 0,
                options,
            };
        };
        let extent = bbox.extent();
        let half_width = 0.5 * extent.x.max(extent.y).max(extent.z);

        let mut cells = vec![Cell::new(0, n, bbox.center(), 0)];
        let mut max_level = 0;
        let mut stack = vec![0usize];
        while let Some(ci) = stack.pop() {
            let (first, last, center, level) = {
                let c = &cells[ci];
                (c.first, c.last, c.center, c.level)
            };
            max_level = max_level.max(level);
            if last - first <= options.bucket_size || level >= options.max_depth {
                continue;
            }

            let z_split = partition(&mut accessor, store, first, last, 2, center.z);
            let y_low = partition(&mut accessor, store, first, z_split, 1, center.y);
            let y_high = partition(&mut accessor, store, z_split, last, 1, center.y);
            let bounds = [
                first,
                partition(&mut accessor, store, first, y_low, 0, center.x),
                y_low,
                partition(&mut accessor, store, y_low, z_split, 0, center.x),
                z_split,
                partition(&mut accessor, store, z_split, y_high, 0, center.x),
                y_high,
                partition(&mut accessor, store, y_high, last, 0, center.x),
                last,
            ];

            let offset = half_width * 0.5f64.powi(level as i32 + 1);
            for octant in 0..8 {
                let (lo, hi) = (bounds[octant], bounds[octant + 1]);
                if lo == hi {
                    continue;
                }
                let child = cells.len();
                cells.push(Cell::new(
                    lo,
                    hi,
                    center + octant_direction(octant) * offset,
                    level + 1,
                ));
                cells[ci].children[octant] = Some(child);
                stack.push(child);
            }
        }

        Self {
            accessor,
            cells,
            bbox: Some(bbox),
            half_width,
            max_level,
            options,
        }
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Number of points covered by the tree.
    pub fn size(&self) -> usize {
        self.accessor.size()
    }

    /// Store position of the point at tree position `i`.
    #[inline]
    pub fn index(&self, i: usize) -> usize {
        self.accessor.index(i)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Root cell, `None` for an empty tree.
    pub fn root(&self) -> Option<&Cell> {
        self.cells.first()
    }

    pub fn leaf_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_leaf())
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// Length of the bounding-box diagonal, zero for an empty tree.
    pub fn diagonal(&self) -> f64 {
        self.bbox.map_or(0.0, |b| b.diagonal())
    }

    /// Half-width of the root cube.
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// Half-width of a cell at `level`.
    #[inline]
    pub fn cell_half_width(&self, level: usize) -> f64 {
        self.half_width * 0.5f64.powi(level as i32)
    }

    /// Deepest level reached during construction.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn options(&self) -> OctreeOptions {
        self.options
    }
}

/// Moves every point with `coord < threshold` in front of the others and
/// returns the first position of the upper part.
fn partition<A: PointAccessor>(
    accessor: &mut A,
    store: &mut PointStore,
    mut lo: usize,
    mut hi: usize,
    axis: usize,
    threshold: f64,
) -> usize {
    while lo < hi {
        if accessor.at(store, lo).position[axis] < threshold {
            lo += 1;
        } else {
            hi -= 1;
            accessor.swap(store, lo, hi);
        }
    }
    lo
}

/// Unit offset direction of `octant` (each component ±1).
#[inline]
fn octant_direction(octant: usize) -> Vector3<f64> {
    let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
    Vector3::new(sign(1), sign(2), sign(4))
}

/// Octant of `p` relative to `center`.
#[inline]
pub(crate) fn octant_of(center: &Point3<f64>, p: &Point3<f64>) -> usize {
    usize::from(p.x >= center.x) | usize::from(p.y >= center.y) << 1 | usize::from(p.z >= center.z) << 2
}

#[cfg(test)]
mod tests;
