//! Parameter types configuring a detection run.
//!
//! [`DetectParams`] is what callers and the JSON configuration provide. Some
//! knobs depend on the input (the bounding-box diagonal, the point count), so
//! the engine turns them into [`ResolvedParams`] right before searching; the
//! resolved copy is what ends up in the report.

use serde::{Deserialize, Serialize};

/// Fraction of the bounding-box diagonal used for unset distance tolerances.
pub const DEFAULT_TOLERANCE_FRACTION: f64 = 0.01;
/// Fraction of the point count used for an unset `min_points`.
pub const DEFAULT_MIN_POINTS_FRACTION: f64 = 0.001;

/// Knobs of [`crate::ShapeDetector::detect`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectParams {
    /// Accepted probability of missing the largest remaining shape.
    pub probability: f64,
    /// Minimum number of points a shape must cover.
    /// `None` (or a value not below the point count) uses 0.1% of the points.
    pub min_points: Option<usize>,
    /// Maximum point-to-surface distance of an inlier.
    /// `None` uses 1% of the bounding-box diagonal.
    pub epsilon: Option<f64>,
    /// Minimum absolute cosine between a point normal and the surface normal.
    pub normal_threshold: f64,
    /// Maximum step between neighbouring points of one shape.
    /// `None` uses 1% of the bounding-box diagonal.
    pub cluster_epsilon: Option<f64>,
    /// Consecutive discarded fits after which the search gives up.
    pub max_failed_candidates: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            probability: 0.01,
            min_points: None,
            epsilon: None,
            normal_threshold: 0.9,
            cluster_epsilon: None,
            max_failed_candidates: 10_000,
        }
    }
}

impl DetectParams {
    /// Fills input-dependent defaults for a cloud of `num_points` points whose
    /// bounding box has the given `diagonal`.
    pub fn resolve(&self, num_points: usize, diagonal: f64) -> ResolvedParams {
        let tolerance = |value: Option<f64>| match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => DEFAULT_TOLERANCE_FRACTION * diagonal,
        };
        let min_points = match self.min_points {
            Some(m) if m > 0 && m < num_points => m,
            _ => ((num_points as f64 * DEFAULT_MIN_POINTS_FRACTION) as usize).max(1),
        };
        ResolvedParams {
            probability: self.probability,
            min_points,
            epsilon: tolerance(self.epsilon),
            normal_threshold: self.normal_threshold,
            cluster_epsilon: tolerance(self.cluster_epsilon),
            max_failed_candidates: self.max_failed_candidates,
        }
    }
}

/// Parameters after input-dependent defaults were applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedParams {
    pub probability: f64,
    pub min_points: usize,
    pub epsilon: f64,
    pub normal_threshold: f64,
    pub cluster_epsilon: f64,
    pub max_failed_candidates: usize,
}
