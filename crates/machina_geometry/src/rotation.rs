//! Rotation types using UnitQuaternion representation.
//!
//! [`Rotation`] is the authoritative orientation type. [`AxisAngle`] and
//! [`RotationVector`] are the axis/angle views compilers need for vendor
//! formats (URScript takes rotation vectors in radians, the human-readable
//! output takes axis + degrees).

use std::fmt;
use std::ops::Mul;

use nalgebra::{Quaternion, Rotation3, Unit, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::conversion::{euler_zyx_to_quaternion, quaternion_to_euler_zyx, YawPitchRoll};
use crate::{round_to, Vector, EPSILON};

/// An orientation in 3D space.
///
/// Uses nalgebra's `UnitQuaternion<f64>` internally (singularity-free and
/// composable). Composition follows nalgebra: `a * b` applies `b` first in
/// the frame of `a`, so `current * delta` is a rotation around local axes
/// and `delta * current` is a rotation around world axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation(pub UnitQuaternion<f64>);

impl Rotation {
    pub fn identity() -> Self {
        Self(UnitQuaternion::identity())
    }

    /// Rotation of `angle_degrees` around `axis`.
    ///
    /// A zero-length axis yields the identity rotation.
    pub fn from_axis_angle(axis: Vector, angle_degrees: f64) -> Self {
        match Unit::try_new(axis.0, EPSILON) {
            Some(unit) => Self(UnitQuaternion::from_axis_angle(&unit, angle_degrees.to_radians())),
            None => Self::identity(),
        }
    }

    /// Rotation from raw quaternion components; the quaternion is normalized.
    pub fn from_quaternion(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self(UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)))
    }

    /// Rotation whose local X and Y axes point along `x_axis` and `y_axis`.
    ///
    /// `y_axis` does not need to be orthogonal to `x_axis`; it only selects
    /// the XY plane. Returns `None` when the vectors are zero or parallel.
    pub fn from_vectors(x_axis: Vector, y_axis: Vector) -> Option<Self> {
        let x = x_axis.normalized()?;
        let z = x.cross(&y_axis).normalized()?;
        let y = z.cross(&x);
        let basis = Rotation3::from_basis_unchecked(&[x.0, y.0, z.0]);
        Some(Self(UnitQuaternion::from_rotation_matrix(&basis)))
    }

    /// Rotation from Euler ZYX angles in degrees.
    pub fn from_euler_zyx(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self(euler_zyx_to_quaternion(yaw, pitch, roll))
    }

    /// Quaternion components as `(w, x, y, z)`.
    pub fn quaternion(&self) -> (f64, f64, f64, f64) {
        let q = self.0.quaternion();
        (q.w, q.i, q.j, q.k)
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    /// Rotate a vector by this rotation.
    pub fn rotate(&self, vector: Vector) -> Vector {
        Vector(self.0 * vector.0)
    }

    pub fn x_axis(&self) -> Vector {
        self.rotate(Vector::x_axis())
    }

    pub fn y_axis(&self) -> Vector {
        self.rotate(Vector::y_axis())
    }

    pub fn z_axis(&self) -> Vector {
        self.rotate(Vector::z_axis())
    }

    pub fn axis_angle(&self) -> AxisAngle {
        match self.0.axis_angle() {
            Some((axis, angle)) => AxisAngle::new(Vector(axis.into_inner()), angle.to_degrees()),
            None => AxisAngle::zero(),
        }
    }

    pub fn rotation_vector(&self) -> RotationVector {
        self.axis_angle().to_rotation_vector()
    }

    pub fn euler_zyx(&self) -> YawPitchRoll {
        quaternion_to_euler_zyx(&self.0)
    }

    /// Angular distance to `other` in degrees.
    pub fn angle_to(&self, other: &Rotation) -> f64 {
        // atan2 form keeps precision near zero
        let delta = self.0.rotation_to(&other.0);
        let q = delta.quaternion();
        (2.0 * q.imag().norm().atan2(q.scalar().abs())).to_degrees()
    }

    /// True if both rotations describe the same orientation within
    /// `epsilon_degrees`, regardless of quaternion sign.
    pub fn is_similar(&self, other: &Rotation, epsilon_degrees: f64) -> bool {
        self.angle_to(other) < epsilon_degrees
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    fn mul(self, rhs: Rotation) -> Rotation {
        Self(self.0 * rhs.0)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, x, y, z) = self.quaternion();
        write!(
            f,
            "[{}, {}, {}, {}]",
            round_to(w, 4),
            round_to(x, 4),
            round_to(y, 4),
            round_to(z, 4)
        )
    }
}

/// A rotation expressed as a unit axis and an angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAngle {
    axis: Vector,
    angle: f64,
}

impl AxisAngle {
    /// Create an axis-angle; the axis is normalized.
    ///
    /// A zero-length axis produces the zero rotation (zero axis, angle 0).
    pub fn new(axis: Vector, angle_degrees: f64) -> Self {
        match axis.normalized() {
            Some(unit) => Self { axis: unit, angle: angle_degrees },
            None => Self::zero(),
        }
    }

    pub fn zero() -> Self {
        Self { axis: Vector::zero(), angle: 0.0 }
    }

    pub fn axis(&self) -> Vector {
        self.axis
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn is_zero(&self) -> bool {
        self.axis.is_zero() || self.angle.abs() < EPSILON
    }

    pub fn to_rotation_vector(&self) -> RotationVector {
        if self.is_zero() {
            return RotationVector::zero();
        }
        RotationVector(self.axis * self.angle)
    }

    pub fn to_rotation(&self) -> Rotation {
        Rotation::from_axis_angle(self.axis, self.angle)
    }
}

impl fmt::Display for AxisAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deg around {}", round_to(self.angle, 3), self.axis)
    }
}

/// A rotation expressed as its axis scaled by the angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationVector(pub Vector);

impl RotationVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector::new(x, y, z))
    }

    /// Rotation vector for `angle_degrees` around `axis`.
    ///
    /// A zero-length axis produces the zero vector regardless of the angle.
    pub fn from_axis_angle(axis: Vector, angle_degrees: f64) -> Self {
        AxisAngle::new(axis, angle_degrees).to_rotation_vector()
    }

    pub fn zero() -> Self {
        Self(Vector::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The rotation angle in degrees (the vector length).
    pub fn angle(&self) -> f64 {
        if self.is_zero() { 0.0 } else { self.0.length() }
    }

    /// The unit rotation axis, or the zero vector for a zero rotation.
    pub fn axis(&self) -> Vector {
        self.0.normalized().unwrap_or_default()
    }

    pub fn to_axis_angle(&self) -> AxisAngle {
        AxisAngle::new(self.axis(), self.angle())
    }

    /// Components scaled to radians, as URScript expects.
    pub fn to_radians(&self) -> Vector {
        self.0 * (std::f64::consts::PI / 180.0)
    }

    pub fn to_rotation(&self) -> Rotation {
        self.to_axis_angle().to_rotation()
    }
}

impl fmt::Display for RotationVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn test_rotation_vector_to_axis_angle_and_back() {
        let rv = RotationVector::from_axis_angle(Vector::new(0.0, 0.0, 1.0), 90.0);
        let aa = rv.to_axis_angle();

        assert!((aa.angle() - 90.0).abs() < TOLERANCE, "angle should be 90, got {}", aa.angle());
        assert!(aa.axis().is_similar(&Vector::z_axis(), TOLERANCE));

        let back = aa.to_rotation_vector();
        assert!(back.0.is_similar(&rv.0, TOLERANCE));
    }

    #[test]
    fn test_zero_axis_rotation_vector() {
        for angle in [0.0, 45.0, 90.0, -270.0] {
            let rv = RotationVector::from_axis_angle(Vector::zero(), angle);
            assert!(rv.is_zero());
            assert_eq!(rv.angle(), 0.0);
        }
    }

    #[test]
    fn test_from_vectors_builds_orthonormal_frame() {
        let rotation = Rotation::from_vectors(Vector::new(0.0, 1.0, 0.0), Vector::new(-1.0, 0.0, 0.0)).unwrap();
        assert!(rotation.x_axis().is_similar(&Vector::y_axis(), TOLERANCE));
        assert!(rotation.z_axis().is_similar(&Vector::z_axis(), TOLERANCE));
        assert!(rotation.is_similar(&Rotation::from_axis_angle(Vector::z_axis(), 90.0), TOLERANCE));

        assert!(Rotation::from_vectors(Vector::x_axis(), Vector::x_axis() * 2.0).is_none());
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let rotation = Rotation::from_euler_zyx(30.0, -20.0, 75.0);
        let composed = rotation * rotation.inverse();
        assert!(composed.is_similar(&Rotation::identity(), TOLERANCE));
    }

    #[test]
    fn test_axis_angle_of_identity_is_zero() {
        assert!(Rotation::identity().axis_angle().is_zero());
        assert!(Rotation::identity().rotation_vector().is_zero());
    }
}
