//! 3D vector type.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{round_to, EPSILON};

/// A 3D vector, in millimeters when used as a position.
///
/// Internally uses [`nalgebra::Vector3<f64>`] for downstream math convenience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector(pub Vector3<f64>);

impl Vector {
    /// Convenience constructor.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn zero() -> Self {
        Self(Vector3::zeros())
    }

    pub fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn length(&self) -> f64 {
        self.0.norm()
    }

    /// True if every component is within [`EPSILON`] of zero.
    pub fn is_zero(&self) -> bool {
        self.length() < EPSILON
    }

    /// Unit-length copy of this vector, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Vector> {
        if self.is_zero() {
            None
        } else {
            Some(Self(self.0.normalize()))
        }
    }

    pub fn distance(&self, other: &Vector) -> f64 {
        (self.0 - other.0).norm()
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn cross(&self, other: &Vector) -> Vector {
        Self(self.0.cross(&other.0))
    }

    /// Component-wise equality within `epsilon`.
    pub fn is_similar(&self, other: &Vector, epsilon: f64) -> bool {
        (self.x() - other.x()).abs() < epsilon
            && (self.y() - other.y()).abs() < epsilon
            && (self.z() - other.z()).abs() < epsilon
    }

    /// Components rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> [f64; 3] {
        [
            round_to(self.x(), decimals),
            round_to(self.y(), decimals),
            round_to(self.z(), decimals),
        ]
    }
}

impl Default for Vector {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Vector3<f64>> for Vector {
    fn from(value: Vector3<f64>) -> Self {
        Self(value)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Self(-self.0)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.rounded(3);
        write!(f, "[{}, {}, {}]", x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_length() {
        let a = Vector::new(0.0, 3.0, 0.0);
        let b = Vector::new(4.0, 0.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert!((Vector::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        assert!(Vector::zero().normalized().is_none());
        let unit = Vector::new(0.0, 0.0, 10.0).normalized().unwrap();
        assert!(unit.is_similar(&Vector::z_axis(), 1e-12));
    }

    #[test]
    fn test_display_rounds() {
        assert_eq!(Vector::new(1.00049, -0.0001, 300.0).to_string(), "[1, 0, 300]");
    }
}
