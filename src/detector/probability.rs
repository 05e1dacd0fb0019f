/// Probability that a shape covering `size` of `num_points` points is still
/// undiscovered after `num_draws` local samples in an octree `max_level` deep.
///
/// `min(1, (1 - size / (num_points * max_level * 3))^num_draws)`, with
/// `max_level` clamped to at least 1. An empty cloud yields 1.
pub fn stop_probability(size: usize, num_points: usize, num_draws: usize, max_level: usize) -> f64 {
    if num_points == 0 {
        return 1.0;
    }
    let levels = max_level.max(1) as f64;
    let hit = size as f64 / (num_points as f64 * levels * 3.0);
    (1.0 - hit).clamp(0.0, 1.0).powf(num_draws as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cloud_or_no_draws_never_stops() {
        assert_eq!(stop_probability(10, 0, 100, 5), 1.0);
        assert_eq!(stop_probability(10, 100, 0, 5), 1.0);
    }

    #[test]
    fn monotone_in_draws_and_size() {
        let mut last = 1.0;
        for draws in (0..500).step_by(25) {
            let p = stop_probability(200, 10_000, draws, 7);
            assert!(p <= last, "draws={draws}: {p} > {last}");
            last = p;
        }
        let mut last = 1.0;
        for size in (0..10_000).step_by(500) {
            let p = stop_probability(size, 10_000, 50, 7);
            assert!(p <= last, "size={size}: {p} > {last}");
            last = p;
        }
    }

    #[test]
    fn zero_depth_counts_as_one_level() {
        assert_eq!(
            stop_probability(30, 100, 4, 0),
            stop_probability(30, 100, 4, 1)
        );
        let expected = (1.0f64 - 30.0 / 300.0).powi(4);
        assert!((stop_probability(30, 100, 4, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn oversized_shapes_are_found_immediately() {
        assert_eq!(stop_probability(1000, 10, 1, 1), 0.0);
    }
}
