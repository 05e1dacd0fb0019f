use crate::types::PointWithNormal;
use nalgebra::{Point3, Vector3};

const PARALLEL_EPS: f64 = 1e-12;

/// Closest points between the lines `p0 + s·d0` and `p1 + t·d1`.
///
/// Returns `None` when the directions are (numerically) parallel.
pub(super) fn closest_points_on_lines(
    p0: &Point3<f64>,
    d0: &Vector3<f64>,
    p1: &Point3<f64>,
    d1: &Vector3<f64>,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let w = p0 - p1;
    let a = d0.dot(d0);
    let b = d0.dot(d1);
    let c = d1.dot(d1);
    let d = d0.dot(&w);
    let e = d1.dot(&w);
    let denom = a * c - b * b;
    if denom.abs() <= PARALLEL_EPS * a.max(c).max(1.0) {
        return None;
    }
    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;
    Some((p0 + d0 * s, p1 + d1 * t))
}

/// Checks every sample against a fitted shape's distance and normal tests.
pub(super) fn samples_agree<D, N>(
    samples: &[PointWithNormal],
    epsilon: f64,
    normal_threshold: f64,
    distance: D,
    cos_to_normal: N,
) -> bool
where
    D: Fn(&Point3<f64>) -> f64,
    N: Fn(&Point3<f64>, &Vector3<f64>) -> f64,
{
    samples.iter().all(|s| {
        distance(&s.position) <= epsilon && cos_to_normal(&s.position, &s.normal) >= normal_threshold
    })
}
