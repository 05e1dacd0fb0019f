use super::fit::{closest_points_on_lines, samples_agree};
use super::{Shape, ShapeKind, ShapeParameters};
use crate::types::PointWithNormal;
use nalgebra::{Point3, Vector3};

const MIN_AXIS_NORM: f64 = 1e-9;

/// Infinite cylinder around the axis `axis_point + t·axis_direction`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    pub axis_point: Point3<f64>,
    pub axis_direction: Vector3<f64>,
    pub radius: f64,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self {
            axis_point: Point3::origin(),
            axis_direction: Vector3::z(),
            radius: 0.0,
        }
    }
}

impl Cylinder {
    /// Component of `p - axis_point` orthogonal to the axis.
    #[inline]
    fn radial(&self, p: &Point3<f64>) -> Vector3<f64> {
        let v = p - self.axis_point;
        v - self.axis_direction * v.dot(&self.axis_direction)
    }
}

impl Shape for Cylinder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Cylinder
    }

    fn minimum_sample_size(&self) -> usize {
        2
    }

    fn compute(
        &mut self,
        samples: &[PointWithNormal],
        epsilon: f64,
        normal_threshold: f64,
    ) -> bool {
        if samples.len() < self.minimum_sample_size() {
            return false;
        }
        let (s0, s1) = (&samples[0], &samples[1]);
        let axis = s0.normal.cross(&s1.normal);
        let axis_len = axis.norm();
        if axis_len <= MIN_AXIS_NORM {
            return false;
        }
        let axis = axis / axis_len;

        // Both normals are orthogonal to the axis; drop p1 into the plane of
        // p0 so the two normal lines intersect.
        let p1 = s1.position - axis * (s1.position - s0.position).dot(&axis);
        let Some((c0, c1)) = closest_points_on_lines(&s0.position, &s0.normal, &p1, &s1.normal)
        else {
            return false;
        };
        let axis_point = nalgebra::center(&c0, &c1);
        let radius = 0.5 * ((s0.position - axis_point).norm() + (p1 - axis_point).norm());
        if !radius.is_finite() || radius <= epsilon {
            return false;
        }
        self.axis_point = axis_point;
        self.axis_direction = axis;
        self.radius = radius;
        samples_agree(
            samples,
            epsilon,
            normal_threshold,
            |p| self.distance(p),
            |p, n| self.cos_to_normal(p, n),
        )
    }

    #[inline]
    fn distance(&self, p: &Point3<f64>) -> f64 {
        (self.radial(p).norm() - self.radius).abs()
    }

    fn cos_to_normal(&self, p: &Point3<f64>, n: &Vector3<f64>) -> f64 {
        let radial = self.radial(p);
        let len = radial.norm();
        if len <= f64::EPSILON {
            return 0.0;
        }
        (radial.dot(n) / len).abs()
    }

    fn parameters(&self) -> ShapeParameters {
        ShapeParameters::Cylinder {
            axis_point: self.axis_point,
            axis_direction: self.axis_direction,
            radius: self.radius,
        }
    }
}
