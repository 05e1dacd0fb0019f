//! Serializable summary of one detection run.

use crate::detector::ResolvedParams;
use crate::shapes::{ShapeKind, ShapeParameters};
use serde::Serialize;

/// Why the search loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No undiscovered shape of at least `min_points` is likely to remain.
    ProbabilityReached,
    /// Fewer unassigned points remain than a shape or a sample needs.
    TooFewPoints,
    /// Too many consecutive fits were discarded.
    Exhausted,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShapeSummary {
    pub id: usize,
    pub kind: ShapeKind,
    pub points: usize,
    pub parameters: ShapeParameters,
}

#[derive(Clone, Debug, Serialize)]
pub struct DetectionReport {
    pub params: ResolvedParams,
    pub termination: Termination,
    pub total_points: usize,
    pub unassigned_points: usize,
    /// Iterations of the generate/select/commit loop.
    pub rounds: usize,
    /// Local samples drawn (each may yield one fit per shape kind).
    pub samples_drawn: usize,
    pub candidates_generated: usize,
    pub candidates_failed: usize,
    /// Winners whose connected component fell short of `min_points`.
    pub winners_discarded: usize,
    /// Initial size of each subset, smallest first.
    pub subset_sizes: Vec<usize>,
    pub octree_depth: usize,
    pub shapes: Vec<ShapeSummary>,
    pub preprocess_ms: f64,
    pub detect_ms: f64,
}

impl DetectionReport {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize report: {e}"))
    }
}
