//! Efficient RANSAC shape detector driven by octrees and confidence bounds.
//!
//! Overview
//! - Preprocessing splits the cloud into geometrically shrinking random
//!   subsets, each indexed by a direct octree, and builds one index-based
//!   octree over the whole cloud.
//! - Candidates are fitted from minimal samples drawn inside a random octree
//!   cell around a random unassigned seed point, so samples are local.
//! - A candidate is scored on the smallest subset first; its inlier count
//!   over the whole cloud is bracketed by a hypergeometric interval that
//!   narrows as more subsets are folded in.
//! - Each round picks the candidate with the best upper bound, refining
//!   overlapping rivals until the leader is separated, rescores it on the
//!   whole cloud, keeps its largest connected component and commits it once
//!   a shape of its size is unlikely to have been missed.
//!
//! Modules
//! - [`params`] – run parameters and their input-dependent defaults.
//! - `engine` – the [`ShapeDetector`] and its search loop.
//! - `subsets` – the subset hierarchy and its available-size counters.
//! - `selection` – bound refinement and winner selection.
//! - `probability` – the stopping rule.
//! - `detected` – committed shapes and the unassigned-index iterator.

mod detected;
mod engine;
pub mod params;
mod probability;
mod selection;
mod subsets;

pub use crate::diagnostics::Termination;
pub use detected::{DetectedShape, UnassignedIndices};
pub use engine::ShapeDetector;
pub use params::{DetectParams, ResolvedParams};
pub use probability::stop_probability;
pub use selection::MIN_SAMPLED_POINTS;
pub use subsets::SubsetHierarchy;
