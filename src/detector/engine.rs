use super::detected::{DetectedShape, UnassignedIndices};
use super::params::{DetectParams, ResolvedParams};
use super::probability::stop_probability;
use super::selection::{Scoring, MIN_SAMPLED_POINTS};
use super::subsets::SubsetHierarchy;
use crate::candidate::Candidate;
use crate::diagnostics::{DetectionReport, ShapeSummary, Termination};
use crate::octree::{Octree, OctreeOptions};
use crate::points::{IndexedAccessor, PointStore};
use crate::shapes::{Shape, ShapeFactory, ShapeRegistry};
use crate::types::PointWithNormal;
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Upper limit on local samples drawn per generation batch.
const MAX_BATCH: usize = 200;
/// Winners are rescored against the whole cloud with this multiple of epsilon.
const RESCORE_TOLERANCE_FACTOR: f64 = 3.0;

/// Spatial indices built by [`ShapeDetector::preprocess`].
struct SearchIndex {
    subsets: SubsetHierarchy,
    global: Octree<IndexedAccessor>,
    /// Store position of every caller index.
    position_of: Vec<usize>,
}

/// Efficient-RANSAC shape detector over an oriented point cloud.
///
/// Typical usage:
/// ```
/// use shape_detector::{DetectParams, ShapeDetector, ShapeKind};
/// use shape_detector::types::PointWithNormal;
///
/// let mut points = Vec::new();
/// for i in 0..40 {
///     for j in 0..40 {
///         points.push(PointWithNormal::from_arrays(
///             [i as f64 / 40.0, j as f64 / 40.0, 0.0],
///             [0.0, 0.0, 1.0],
///         ));
///     }
/// }
/// let mut detector = ShapeDetector::with_seed(7);
/// detector.set_input(points);
/// detector.add_shape_factory(ShapeKind::Plane.factory());
/// let params = DetectParams {
///     min_points: Some(100),
///     epsilon: Some(0.01),
///     cluster_epsilon: Some(0.05),
///     ..Default::default()
/// };
/// assert!(detector.detect(&params));
/// assert_eq!(detector.shapes().len(), 1);
/// ```
pub struct ShapeDetector<R: Rng = ChaCha8Rng> {
    rng: R,
    registry: ShapeRegistry,
    octree_options: OctreeOptions,
    store: PointStore,
    index: Option<SearchIndex>,
    /// Shape id per store position.
    shape_index: Vec<Option<usize>>,
    /// Shape id per caller index.
    assignment: Vec<Option<usize>>,
    shapes: Vec<DetectedShape>,
    report: Option<DetectionReport>,
    preprocess_ms: f64,
}

impl ShapeDetector<ChaCha8Rng> {
    /// Detector driven by a `ChaCha8Rng` seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ShapeDetector<R> {
    /// Empty detector with no input and no registered shape kinds.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            registry: ShapeRegistry::new(),
            octree_options: OctreeOptions::default(),
            store: PointStore::default(),
            index: None,
            shape_index: Vec::new(),
            assignment: Vec::new(),
            shapes: Vec::new(),
            report: None,
            preprocess_ms: 0.0,
        }
    }

    /// Replaces the input cloud and drops every index and result.
    pub fn set_input(&mut self, points: Vec<PointWithNormal>) {
        let n = points.len();
        self.store = PointStore::new(points);
        self.index = None;
        self.shape_index = vec![None; n];
        self.assignment = vec![None; n];
        self.shapes.clear();
        self.report = None;
        self.preprocess_ms = 0.0;
    }

    /// Changes the octree limits; indices are rebuilt on the next run.
    pub fn set_octree_options(&mut self, options: OctreeOptions) {
        self.octree_options = options;
        self.index = None;
    }

    pub fn add_shape_factory(&mut self, factory: ShapeFactory) {
        self.registry.add(factory);
    }

    pub fn set_shape_registry(&mut self, registry: ShapeRegistry) {
        self.registry = registry;
    }

    pub fn clear_shape_factories(&mut self) {
        self.registry.clear();
    }

    pub fn shape_registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Drops the input, the indices and all results. Registered shape kinds
    /// are kept.
    pub fn clear(&mut self) {
        self.set_input(Vec::new());
    }

    pub fn num_points(&self) -> usize {
        self.store.len()
    }

    /// Builds the subset hierarchy and the global octree.
    ///
    /// Returns `false` on empty input. Calling it again without new input is
    /// a no-op.
    pub fn preprocess(&mut self) -> bool {
        if self.store.is_empty() {
            debug!("ShapeDetector::preprocess empty input");
            return false;
        }
        if self.index.is_some() {
            return true;
        }
        let start = Instant::now();
        let n = self.store.len();
        let subsets = SubsetHierarchy::build(&mut self.store, self.octree_options, &mut self.rng);
        let global = Octree::build(IndexedAccessor::new(n), &mut self.store, self.octree_options);
        let mut position_of = vec![0; n];
        for pos in 0..n {
            position_of[self.store.id(pos)] = pos;
        }
        self.shape_index = vec![None; n];
        self.preprocess_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "ShapeDetector::preprocess points={} subsets={:?} depth={} cells={} elapsed_ms={:.3}",
            n,
            subsets.available_sizes(),
            global.max_level(),
            global.cells().len(),
            self.preprocess_ms
        );
        self.index = Some(SearchIndex {
            subsets,
            global,
            position_of,
        });
        true
    }

    /// Runs the search. Returns `false` on empty input or when no shape kind
    /// is registered; results of a previous run are discarded either way.
    pub fn detect(&mut self, params: &DetectParams) -> bool {
        self.shapes.clear();
        self.report = None;
        self.assignment.iter_mut().for_each(|slot| *slot = None);
        if self.registry.is_empty() {
            debug!("ShapeDetector::detect no shape kind registered");
            return false;
        }
        if !self.preprocess() {
            return false;
        }
        let start = Instant::now();

        let Some(index) = self.index.as_mut() else {
            return false;
        };
        let n = self.store.len();
        let params = params.resolve(n, index.global.diagonal());
        self.shape_index.iter_mut().for_each(|slot| *slot = None);
        index.subsets.reset_counters();
        debug!(
            "ShapeDetector::detect points={} kinds={} min_points={} epsilon={:.5} cluster_epsilon={:.5} probability={}",
            n,
            self.registry.len(),
            params.min_points,
            params.epsilon,
            params.cluster_epsilon,
            params.probability
        );

        let mut search = Search {
            rng: &mut self.rng,
            registry: &self.registry,
            store: &self.store,
            subsets: &mut index.subsets,
            global: &index.global,
            shape_index: &mut self.shape_index,
            required: self.registry.required_samples(),
            max_level: index.global.max_level(),
            remaining: n,
            draws: 0,
            failed: 0,
            committed: Vec::new(),
            stats: SearchStats::default(),
            params,
        };
        let termination = search.run();
        let Search {
            committed,
            stats,
            params,
            remaining,
            ..
        } = search;

        for (id, slot) in self.assignment.iter_mut().enumerate() {
            *slot = self.shape_index[index.position_of[id]];
        }
        self.shapes = committed
            .into_iter()
            .map(|(shape, positions)| {
                let mut ids: Vec<usize> = positions.iter().map(|&pos| self.store.id(pos)).collect();
                ids.sort_unstable();
                DetectedShape::new(shape, ids)
            })
            .collect();

        let detect_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "ShapeDetector::detect termination={:?} shapes={} unassigned={} rounds={} elapsed_ms={:.3}",
            termination,
            self.shapes.len(),
            remaining,
            stats.rounds,
            detect_ms
        );
        self.report = Some(DetectionReport {
            params,
            termination,
            total_points: n,
            unassigned_points: remaining,
            rounds: stats.rounds,
            samples_drawn: stats.samples_drawn,
            candidates_generated: stats.candidates_generated,
            candidates_failed: stats.candidates_failed,
            winners_discarded: stats.winners_discarded,
            subset_sizes: index.subsets.octrees().iter().map(|t| t.size()).collect(),
            octree_depth: index.global.max_level(),
            shapes: self
                .shapes
                .iter()
                .enumerate()
                .map(|(id, s)| ShapeSummary {
                    id,
                    kind: s.kind(),
                    points: s.len(),
                    parameters: s.parameters(),
                })
                .collect(),
            preprocess_ms: self.preprocess_ms,
            detect_ms,
        });
        true
    }

    /// Committed shapes, largest first.
    pub fn shapes(&self) -> &[DetectedShape] {
        &self.shapes
    }

    /// Shape id per caller index, `None` for unassigned points.
    pub fn shape_index(&self) -> &[Option<usize>] {
        &self.assignment
    }

    pub fn indices_of_unassigned_points(&self) -> UnassignedIndices<'_> {
        UnassignedIndices::new(&self.assignment)
    }

    pub fn number_of_unassigned_points(&self) -> usize {
        self.assignment.iter().filter(|s| s.is_none()).count()
    }

    /// Diagnostics of the last successful [`ShapeDetector::detect`].
    pub fn report(&self) -> Option<&DetectionReport> {
        self.report.as_ref()
    }
}

#[derive(Debug, Default)]
struct SearchStats {
    rounds: usize,
    samples_drawn: usize,
    candidates_generated: usize,
    candidates_failed: usize,
    winners_discarded: usize,
}

enum Generation {
    Done { best_expected: f64, keep_searching: bool },
    Exhausted,
}

/// State of one detection run, borrowing the detector's disjoint parts.
struct Search<'a, R: Rng> {
    rng: &'a mut R,
    registry: &'a ShapeRegistry,
    store: &'a PointStore,
    subsets: &'a mut SubsetHierarchy,
    global: &'a Octree<IndexedAccessor>,
    shape_index: &'a mut [Option<usize>],
    params: ResolvedParams,
    required: usize,
    max_level: usize,
    /// Unassigned points.
    remaining: usize,
    /// Draw counter feeding the stop probability; decays on every commit.
    draws: usize,
    /// Consecutive discarded fits since the last kept candidate.
    failed: usize,
    /// Committed shapes with their store positions.
    committed: Vec<(Box<dyn Shape>, Vec<usize>)>,
    stats: SearchStats,
}

impl<R: Rng> Search<'_, R> {
    fn run(&mut self) -> Termination {
        let min_points = self.params.min_points;
        let min_points_f = min_points as f64;
        let probability = self.params.probability;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut keep_searching = true;

        loop {
            self.stats.rounds += 1;
            let mut best_expected = 0.0f64;
            if self.remaining == 0 || self.remaining < self.required {
                return Termination::TooFewPoints;
            }

            if keep_searching {
                match self.generate(&mut candidates) {
                    Generation::Exhausted => {
                        warn!(
                            "ShapeDetector::detect giving up after {} consecutive discarded fits ({} shapes, {} points left)",
                            self.failed,
                            self.committed.len(),
                            self.remaining
                        );
                        return Termination::Exhausted;
                    }
                    Generation::Done {
                        best_expected: expected,
                        keep_searching: keep,
                    } => {
                        best_expected = expected;
                        keep_searching = keep;
                    }
                }
            }

            if !candidates.is_empty() {
                let scoring = Scoring {
                    store: self.store,
                    subsets: &*self.subsets,
                    shape_index: &*self.shape_index,
                    epsilon: self.params.epsilon,
                    normal_threshold: self.params.normal_threshold,
                };
                let best = scoring.select_best(&mut candidates, min_points, self.remaining);
                let done = best.is_some_and(|b| {
                    !keep_searching && candidates[b].expected_value() < min_points_f
                });
                if done {
                    debug!(
                        "ShapeDetector::detect best of {} candidates expected below min_points",
                        candidates.len()
                    );
                    return Termination::ProbabilityReached;
                }
                if let Some(winner) = candidates.pop() {
                    best_expected = self.extract(winner, &mut candidates, keep_searching);
                }
            }

            keep_searching =
                stop_probability(min_points, self.remaining, self.draws, self.max_level) > probability;
            let more = (keep_searching && self.remaining >= min_points) || best_expected >= min_points_f;
            if !more {
                return if self.remaining < min_points {
                    Termination::TooFewPoints
                } else {
                    Termination::ProbabilityReached
                };
            }
        }
    }

    /// Draws local samples in batches and keeps every fit whose bound may
    /// still reach `min_points`.
    fn generate(&mut self, candidates: &mut Vec<Candidate>) -> Generation {
        let min_points = self.params.min_points;
        let probability = self.params.probability;
        let epsilon = self.params.epsilon;
        let normal_threshold = self.params.normal_threshold;
        let mut best_expected = 0.0f64;
        let mut samples = Vec::with_capacity(self.required);

        loop {
            let batch = (self.remaining / min_points).clamp(1, MAX_BATCH);
            let scoring = Scoring {
                store: self.store,
                subsets: &*self.subsets,
                shape_index: &*self.shape_index,
                epsilon,
                normal_threshold,
            };
            for _ in 0..batch {
                let drawn = draw_sample(
                    &mut *self.rng,
                    self.global,
                    self.store,
                    scoring.shape_index,
                    self.required,
                );
                samples.clear();
                samples.extend(drawn.iter().map(|&pos| *self.store.get(pos)));
                self.draws += 1;
                self.stats.samples_drawn += 1;

                for factory in self.registry.iter() {
                    let mut shape = factory.create();
                    if !shape.compute(&samples, epsilon, normal_threshold) {
                        self.failed += 1;
                        self.stats.candidates_failed += 1;
                        continue;
                    }
                    let mut candidate = Candidate::new(shape);
                    scoring.improve_bound(&mut candidate, MIN_SAMPLED_POINTS, self.remaining);
                    if candidate.max_bound() >= min_points as f64 && candidate.score() > 0 {
                        trace!(
                            "ShapeDetector::detect candidate {} score={} bound=[{:.1}, {:.1}]",
                            factory.kind,
                            candidate.score(),
                            candidate.min_bound(),
                            candidate.max_bound()
                        );
                        best_expected = best_expected.max(candidate.expected_value());
                        self.stats.candidates_generated += 1;
                        self.failed = 0;
                        candidates.push(candidate);
                    } else {
                        self.failed += 1;
                        self.stats.candidates_failed += 1;
                    }
                }
            }

            if self.failed >= self.params.max_failed_candidates.max(1) {
                return Generation::Exhausted;
            }
            let keep_searching =
                stop_probability(min_points, self.remaining, self.draws, self.max_level) > probability;
            let best_found = stop_probability(
                best_expected as usize,
                self.remaining,
                self.draws,
                self.max_level,
            ) <= probability;
            if !keep_searching || best_found {
                return Generation::Done {
                    best_expected,
                    keep_searching,
                };
            }
        }
    }

    /// Rescores `winner` against the whole cloud, keeps its largest
    /// connected component and commits it when it is both big enough and
    /// unlikely to be beaten. Returns the new best expected size.
    fn extract(
        &mut self,
        mut winner: Candidate,
        candidates: &mut Vec<Candidate>,
        keep_searching: bool,
    ) -> f64 {
        let min_points = self.params.min_points;
        winner.clear_indices();
        let rescored = self.global.score(
            &mut winner,
            self.store,
            self.shape_index,
            RESCORE_TOLERANCE_FACTOR * self.params.epsilon,
            self.params.normal_threshold,
        );
        let size = winner.connected_component(self.store, self.params.cluster_epsilon);
        if size < min_points {
            self.stats.winners_discarded += 1;
            debug!(
                "ShapeDetector::detect discarded {} winner: component {} of {} < min_points {}",
                winner.shape().kind(),
                size,
                rescored,
                min_points
            );
            return rescored as f64;
        }

        winner.compute_bound(self.remaining, self.remaining);
        winner.mark_all_subsets_used(self.subsets.len());
        if stop_probability(size, self.remaining, self.draws, self.max_level)
            > self.params.probability
        {
            if !keep_searching {
                self.draws += 1;
            }
            candidates.push(winner);
            return rescored as f64;
        }

        self.commit(winner);
        self.sweep(candidates)
    }

    fn commit(&mut self, winner: Candidate) {
        let (shape, positions) = winner.into_parts();
        let id = self.committed.len();
        let before = self.remaining;
        for &pos in &positions {
            self.shape_index[pos] = Some(id);
            self.subsets.remove_point(pos);
        }
        self.remaining -= positions.len();
        let kept = 1.0 - positions.len() as f64 / before as f64;
        self.draws = (self.draws as f64 * kept.powi(3)) as usize;
        self.failed = 0;
        debug!(
            "ShapeDetector::detect committed #{} {} points={} remaining={} ({})",
            id,
            shape.kind(),
            positions.len(),
            self.remaining,
            shape.parameters()
        );
        self.committed.push((shape, positions));
    }

    /// Drops freshly assigned points from the open candidates and discards
    /// those that can no longer reach `min_points`. Returns the best
    /// remaining expected size.
    fn sweep(&mut self, candidates: &mut Vec<Candidate>) -> f64 {
        let cumulative = self.subsets.cumulative_sizes();
        let shape_index: &[Option<usize>] = self.shape_index;
        let remaining = self.remaining;
        let min_points = self.params.min_points as f64;
        let mut best_expected = 0.0f64;
        candidates.retain_mut(|c| {
            c.update_points(shape_index);
            let used = c.nb_subset_used().clamp(1, cumulative.len());
            c.compute_bound(cumulative[used - 1], remaining);
            if c.max_bound() < min_points {
                return false;
            }
            best_expected = best_expected.max(c.expected_value());
            true
        });
        best_expected
    }
}

/// Picks a random unassigned seed point and a random depth and draws
/// `required` samples from the seed's cell, retrying on under-full cells.
///
/// Terminates as long as at least `required` points are unassigned, since
/// the root cell then always holds enough.
fn draw_sample<R: Rng + ?Sized>(
    rng: &mut R,
    global: &Octree<IndexedAccessor>,
    store: &PointStore,
    shape_index: &[Option<usize>],
    required: usize,
) -> Vec<usize> {
    let n = shape_index.len();
    loop {
        let seed = rng.gen_range(0..n);
        if shape_index[seed].is_some() {
            continue;
        }
        let level = rng.gen_range(0..=global.max_level());
        if let Some(sample) = global.draw_samples_from_cell_containing_point(
            &store.get(seed).position,
            level,
            required,
            shape_index,
            rng,
        ) {
            return sample;
        }
    }
}
