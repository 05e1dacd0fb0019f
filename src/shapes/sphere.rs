use super::fit::{closest_points_on_lines, samples_agree};
use super::{Shape, ShapeKind, ShapeParameters};
use crate::types::PointWithNormal;
use nalgebra::{Point3, Vector3};

/// Sphere given by center and radius.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            radius: 0.0,
        }
    }
}

impl Shape for Sphere {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Sphere
    }

    fn minimum_sample_size(&self) -> usize {
        3
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
        // The center sits where the two normal lines pass closest.
        let Some((c0, c1)) =
            closest_points_on_lines(&s0.position, &s0.normal, &s1.position, &s1.normal)
        else {
            return false;
        };
        let center = nalgebra::center(&c0, &c1);
        let radius = 0.5 * ((s0.position - center).norm() + (s1.position - center).norm());
        if !radius.is_finite() || radius <= epsilon {
            return false;
        }
        self.center = center;
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
        ((p - self.center).norm() - self.radius).abs()
    }

    fn cos_to_normal(&self, p: &Point3<f64>, n: &Vector3<f64>) -> f64 {
        let radial = p - self.center;
        let len = radial.norm();
        if len <= f64::EPSILON {
            return 0.0;
        }
        (radial.dot(n) / len).abs()
    }

    fn parameters(&self) -> ShapeParameters {
        ShapeParameters::Sphere {
            center: self.center,
            radius: self.radius,
        }
    }
}
