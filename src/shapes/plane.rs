use super::fit::samples_agree;
use super::{Shape, ShapeKind, ShapeParameters};
use crate::types::PointWithNormal;
use nalgebra::{Point3, Vector3};

const MIN_CROSS_NORM: f64 = 1e-12;

/// Infinite plane `normal · p + d = 0` with a unit normal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub d: f64,
}

impl Plane {
    /// Plane through three points, `None` when they are collinear.
    pub fn through(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        let cross = (p1 - p0).cross(&(p2 - p0));
        let len = cross.norm();
        if len <= MIN_CROSS_NORM {
            return None;
        }
        let normal = cross / len;
        Some(Self {
            normal,
            d: -normal.dot(&p0.coords),
        })
    }

    #[inline]
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) + self.d
    }
}

impl Shape for Plane {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Plane
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
        let Some(fit) = Plane::through(
            &samples[0].position,
            &samples[1].position,
            &samples[2].position,
        ) else {
            return false;
        };
        *self = fit;
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
        self.signed_distance(p).abs()
    }

    #[inline]
    fn cos_to_normal(&self, _p: &Point3<f64>, n: &Vector3<f64>) -> f64 {
        self.normal.dot(n).abs()
    }

    fn parameters(&self) -> ShapeParameters {
        ShapeParameters::Plane {
            normal: self.normal,
            d: self.d,
        }
    }
}
