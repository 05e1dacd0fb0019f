use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Oriented point: a position plus its unit normal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointWithNormal {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl PointWithNormal {
    /// Builds a record and normalizes `normal`. A zero normal stays zero.
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        let len = normal.norm();
        let normal = if len > f64::EPSILON {
            normal / len
        } else {
            Vector3::zeros()
        };
        Self { position, normal }
    }

    /// Convenience constructor from raw `[x, y, z]` and `[nx, ny, nz]` arrays.
    pub fn from_arrays(position: [f64; 3], normal: [f64; 3]) -> Self {
        Self::new(Point3::from(position), Vector3::from(normal))
    }
}

/// Axis-aligned bounding box over point positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Bounding box of `positions`, `None` when empty.
    pub fn from_points<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = positions.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.min = bbox.min.inf(p);
            bbox.max = bbox.max.sup(p);
        }
        Some(bbox)
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }
}
