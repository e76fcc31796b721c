//! Oriented planes (origin + orientation).

use std::fmt;

use nalgebra::{Isometry3, Translation3};
use serde::{Deserialize, Serialize};

use crate::{Rotation, Vector};

/// A plane defined by an origin and an orientation.
///
/// The plane's normal is the local Z axis of `rotation`. Arc motions use
/// planes for both their through point and their end pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Vector,
    pub rotation: Rotation,
}

impl Plane {
    pub fn new(origin: Vector, rotation: Rotation) -> Self {
        Self { origin, rotation }
    }

    /// A plane at `origin` aligned with the world axes.
    pub fn from_origin(origin: Vector) -> Self {
        Self { origin, rotation: Rotation::identity() }
    }

    /// Plane from origin plus X and Y direction vectors.
    pub fn from_vectors(origin: Vector, x_axis: Vector, y_axis: Vector) -> Option<Self> {
        Rotation::from_vectors(x_axis, y_axis).map(|rotation| Self { origin, rotation })
    }

    pub fn x_axis(&self) -> Vector {
        self.rotation.x_axis()
    }

    pub fn y_axis(&self) -> Vector {
        self.rotation.y_axis()
    }

    pub fn normal(&self) -> Vector {
        self.rotation.z_axis()
    }

    /// The plane as an SE3 transform.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.origin.x(), self.origin.y(), self.origin.z()),
            self.rotation.0,
        )
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plane(origin: {}, x: {}, y: {})", self.origin, self.x_axis(), self.y_axis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_axes_follow_rotation() {
        let plane = Plane::from_vectors(Vector::new(1.0, 2.0, 3.0), Vector::y_axis(), -Vector::x_axis()).unwrap();
        assert!(plane.normal().is_similar(&Vector::z_axis(), 1e-9));

        let iso = plane.to_isometry();
        let moved = iso * nalgebra::Point3::new(1.0, 0.0, 0.0);
        assert!((moved.x - 1.0).abs() < 1e-9);
        assert!((moved.y - 3.0).abs() < 1e-9);
    }
}
