//! Bound refinement and winner selection over the open candidates.
//!
//! A candidate's score only covers the subsets folded in so far. Refining
//! folds the next subset in and recomputes the hypergeometric interval, so
//! competing candidates can be told apart without scoring the whole cloud.

use super::subsets::SubsetHierarchy;
use crate::candidate::Candidate;
use crate::points::PointStore;

/// Subset points to sample before a fresh candidate's bound is trusted.
pub const MIN_SAMPLED_POINTS: usize = 500;

/// Read-only view of the search state needed to score candidates.
pub(crate) struct Scoring<'a> {
    pub store: &'a PointStore,
    pub subsets: &'a SubsetHierarchy,
    pub shape_index: &'a [Option<usize>],
    pub epsilon: f64,
    pub normal_threshold: f64,
}

impl Scoring<'_> {
    /// Folds unused subsets into `candidate` until at least `min_sampled`
    /// new subset points were covered or every subset is used, then
    /// recomputes its bound against `num_available` points.
    ///
    /// Returns `false` when every subset was already used.
    pub fn improve_bound(
        &self,
        candidate: &mut Candidate,
        min_sampled: usize,
        num_available: usize,
    ) -> bool {
        if candidate.nb_subset_used() >= self.subsets.len() {
            return false;
        }
        let mut sampled = 0;
        while sampled < min_sampled && candidate.nb_subset_used() < self.subsets.len() {
            let s = candidate.nb_subset_used();
            self.subsets.octree(s).score(
                candidate,
                self.store,
                self.shape_index,
                self.epsilon,
                self.normal_threshold,
            );
            sampled += self.subsets.available_sizes()[s];
            candidate.mark_subset_used();
        }
        let evaluated = self.subsets.available_in_first(candidate.nb_subset_used());
        candidate.compute_bound(evaluated, num_available);
        true
    }

    /// Orders `candidates` by ascending `max_bound` and refines bounds until
    /// the last one is separated from every competitor worth considering.
    ///
    /// Competitors whose interval still overlaps the leader, and whose
    /// `max_bound` exceeds `min_points`, get one more subset per pass. The
    /// search stops once no interval overlaps or no bound can be refined.
    /// Returns the index of the winner, which is always the last element.
    pub fn select_best(
        &self,
        candidates: &mut [Candidate],
        min_points: usize,
        num_available: usize,
    ) -> Option<usize> {
        let last = candidates.len().checked_sub(1)?;
        if last == 0 {
            return Some(0);
        }
        let min_points_f = min_points as f64;
        let mut lower = 0usize;
        let mut improved = true;
        while lower < last && improved {
            improved = false;
            candidates[lower..].sort_by(|a, b| a.max_bound().total_cmp(&b.max_bound()));
            self.improve_bound(&mut candidates[last], min_points, num_available);

            let mut stop = last;
            while stop > lower {
                let leader_min = candidates[last].min_bound();
                let rival = &mut candidates[stop - 1];
                if leader_min > rival.max_bound() || rival.max_bound() <= min_points_f {
                    break;
                }
                improved |= self.improve_bound(rival, min_points, num_available);
                if leader_min > rival.max_bound() {
                    break;
                }
                stop -= 1;
            }
            lower = stop;
        }
        Some(last)
    }
}
