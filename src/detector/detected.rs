use crate::shapes::{Shape, ShapeKind, ShapeParameters};
use std::iter::FusedIterator;

/// A committed shape and the caller indices of the points it covers.
#[derive(Debug)]
pub struct DetectedShape {
    shape: Box<dyn Shape>,
    indices: Vec<usize>,
}

impl DetectedShape {
    pub(crate) fn new(shape: Box<dyn Shape>, indices: Vec<usize>) -> Self {
        Self { shape, indices }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn parameters(&self) -> ShapeParameters {
        self.shape.parameters()
    }

    /// Caller indices of the member points, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Caller indices of the points no shape claimed, ascending.
///
/// Borrowing iterator over the per-point assignment; clone it to restart.
#[derive(Clone, Debug)]
pub struct UnassignedIndices<'a> {
    assignment: &'a [Option<usize>],
    next: usize,
}

impl<'a> UnassignedIndices<'a> {
    pub(crate) fn new(assignment: &'a [Option<usize>]) -> Self {
        Self {
            assignment,
            next: 0,
        }
    }
}

impl Iterator for UnassignedIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.assignment.len() {
            let id = self.next;
            self.next += 1;
            if self.assignment[id].is_none() {
                return Some(id);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.assignment.len() - self.next))
    }
}

impl FusedIterator for UnassignedIndices<'_> {}
