#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod io;
pub mod shapes;
pub mod types;

// Building blocks of the detector – public for tools and tests, but
// considered unstable internals.
pub mod candidate;
pub mod cluster;
pub mod config;
pub mod octree;
pub mod points;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector, parameters and results.
pub use crate::detector::{DetectParams, DetectedShape, ShapeDetector, Termination};
pub use crate::shapes::{Shape, ShapeKind, ShapeParameters, ShapeRegistry};
pub use crate::types::PointWithNormal;

// Diagnostics returned after a run.
pub use crate::diagnostics::DetectionReport;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use shape_detector::prelude::*;
///
/// # fn main() {
/// let points: Vec<PointWithNormal> = Vec::new();
/// let mut detector = ShapeDetector::with_seed(42);
/// detector.set_input(points);
/// detector.set_shape_registry(ShapeRegistry::with_defaults());
/// if detector.detect(&DetectParams::default()) {
///     for shape in detector.shapes() {
///         println!("{} with {} points", shape.parameters(), shape.len());
///     }
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::types::PointWithNormal;
    pub use crate::{DetectParams, ShapeDetector, ShapeKind, ShapeRegistry};
}
