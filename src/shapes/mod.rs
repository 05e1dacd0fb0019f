//! Primitive shapes and the factory registry consumed by the detector.
//!
//! The detector never looks inside a primitive. It fits a shape from a
//! minimal sample, asks for distances and normal agreement, and serializes
//! the result. Everything geometric lives behind the [`Shape`] trait.
//!
//! Built-in primitives
//! - [`Plane`]: three samples, normal from the cross product.
//! - [`Sphere`]: three samples, center where the first two normal lines meet.
//! - [`Cylinder`]: two samples, axis along the cross product of the normals.
//!
//! Custom primitives register through [`ShapeRegistry::add`] with a plain
//! `fn() -> Box<dyn Shape>` constructor returning an empty (unfitted) shape.

mod cylinder;
mod fit;
mod plane;
mod sphere;

pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;

use crate::types::PointWithNormal;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying a primitive type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Plane,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    /// Factory for the built-in implementation of this kind.
    pub fn factory(self) -> ShapeFactory {
        match self {
            ShapeKind::Plane => ShapeFactory::new(self, || Box::new(Plane::default())),
            ShapeKind::Sphere => ShapeFactory::new(self, || Box::new(Sphere::default())),
            ShapeKind::Cylinder => ShapeFactory::new(self, || Box::new(Cylinder::default())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Plane => "plane",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializable description of a fitted primitive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeParameters {
    /// `normal · p + d = 0`
    Plane { normal: Vector3<f64>, d: f64 },
    Sphere { center: Point3<f64>, radius: f64 },
    Cylinder {
        axis_point: Point3<f64>,
        axis_direction: Vector3<f64>,
        radius: f64,
    },
}

impl fmt::Display for ShapeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeParameters::Plane { normal, d } => write!(
                f,
                "plane n=({:.4}, {:.4}, {:.4}) d={:.4}",
                normal.x, normal.y, normal.z, d
            ),
            ShapeParameters::Sphere { center, radius } => write!(
                f,
                "sphere c=({:.4}, {:.4}, {:.4}) r={:.4}",
                center.x, center.y, center.z, radius
            ),
            ShapeParameters::Cylinder {
                axis_point,
                axis_direction,
                radius,
            } => write!(
                f,
                "cylinder p=({:.4}, {:.4}, {:.4}) a=({:.4}, {:.4}, {:.4}) r={:.4}",
                axis_point.x,
                axis_point.y,
                axis_point.z,
                axis_direction.x,
                axis_direction.y,
                axis_direction.z,
                radius
            ),
        }
    }
}

/// Fitted primitive hypothesis.
///
/// Implementations start empty and become meaningful once [`Shape::compute`]
/// returned `true`.
pub trait Shape: fmt::Debug {
    fn kind(&self) -> ShapeKind;

    /// Number of oriented samples needed by [`Shape::compute`].
    fn minimum_sample_size(&self) -> usize;

    /// Fits the primitive to `samples` and checks that every sample lies
    /// within `epsilon` and agrees with the surface normal up to
    /// `normal_threshold` (absolute cosine). Returns whether the fit is valid.
    fn compute(&mut self, samples: &[PointWithNormal], epsilon: f64, normal_threshold: f64)
        -> bool;

    /// Unsigned Euclidean distance from `p` to the surface.
    fn distance(&self, p: &Point3<f64>) -> f64;

    /// Absolute cosine between `n` and the surface normal closest to `p`.
    fn cos_to_normal(&self, p: &Point3<f64>, n: &Vector3<f64>) -> f64;

    fn parameters(&self) -> ShapeParameters;

    /// Whether `record` lies within `epsilon` and passes the normal test.
    #[inline]
    fn accepts(&self, record: &PointWithNormal, epsilon: f64, normal_threshold: f64) -> bool {
        self.distance(&record.position) <= epsilon
            && self.cos_to_normal(&record.position, &record.normal) >= normal_threshold
    }
}

/// Tagged constructor producing an empty shape of one kind.
#[derive(Clone, Copy)]
pub struct ShapeFactory {
    pub kind: ShapeKind,
    create: fn() -> Box<dyn Shape>,
}

impl ShapeFactory {
    pub fn new(kind: ShapeKind, create: fn() -> Box<dyn Shape>) -> Self {
        Self { kind, create }
    }

    pub fn create(&self) -> Box<dyn Shape> {
        (self.create)()
    }
}

impl fmt::Debug for ShapeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeFactory")
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered set of shape factories tried on every drawn sample.
#[derive(Clone, Debug, Default)]
pub struct ShapeRegistry {
    factories: Vec<ShapeFactory>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plane, sphere and cylinder, in that order.
    pub fn with_defaults() -> Self {
        Self::from_kinds(&[ShapeKind::Plane, ShapeKind::Sphere, ShapeKind::Cylinder])
    }

    pub fn from_kinds(kinds: &[ShapeKind]) -> Self {
        let mut registry = Self::new();
        for kind in kinds {
            registry.add(kind.factory());
        }
        registry
    }

    pub fn add(&mut self, factory: ShapeFactory) {
        self.factories.push(factory);
    }

    pub fn clear(&mut self) {
        self.factories.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeFactory> {
        self.factories.iter()
    }

    /// Largest minimum sample size over the registered kinds.
    pub fn required_samples(&self) -> usize {
        self.factories
            .iter()
            .map(|f| f.create().minimum_sample_size())
            .max()
            .unwrap_or(0)
    }
}
