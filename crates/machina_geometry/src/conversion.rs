//! Quaternion ↔ Euler angle conversion utilities.
//!
//! Machina uses the Euler ZYX intrinsic convention for yaw/pitch/roll,
//! which KUKA calls A-B-C:
//! - Yaw (A): rotation around Z (first)
//! - Pitch (B): rotation around Y' (second)
//! - Roll (C): rotation around X'' (third)
//!
//! This is equivalent to extrinsic XYZ: roll around fixed X, pitch around
//! fixed Y, yaw around fixed Z.

use std::fmt;

use nalgebra::{Rotation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::round_to;

/// Euler ZYX angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YawPitchRoll {
    /// Rotation around Z, degrees
    pub yaw: f64,
    /// Rotation around the rotated Y, degrees
    pub pitch: f64,
    /// Rotation around the twice-rotated X, degrees
    pub roll: f64,
}

impl YawPitchRoll {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        euler_zyx_to_quaternion(self.yaw, self.pitch, self.roll)
    }
}

impl fmt::Display for YawPitchRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}]",
            round_to(self.yaw, 3),
            round_to(self.pitch, 3),
            round_to(self.roll, 3)
        )
    }
}

/// Convert a unit quaternion to Euler ZYX angles in degrees.
///
/// # Gimbal Lock
/// When pitch = ±90°, yaw and roll become coupled. nalgebra resolves this
/// by setting roll to 0 and encoding all rotation in yaw.
pub fn quaternion_to_euler_zyx(q: &UnitQuaternion<f64>) -> YawPitchRoll {
    // nalgebra's euler_angles returns (roll, pitch, yaw) in the XYZ
    // extrinsic order (= ZYX intrinsic)
    let rotation_matrix = q.to_rotation_matrix();
    let (roll, pitch, yaw) = rotation_matrix.euler_angles();

    YawPitchRoll {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Convert Euler ZYX angles in degrees to a unit quaternion.
pub fn euler_zyx_to_quaternion(yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> UnitQuaternion<f64> {
    // nalgebra's from_euler_angles takes (roll, pitch, yaw) = (X, Y, Z)
    let rotation = Rotation3::from_euler_angles(
        roll_deg.to_radians(),
        pitch_deg.to_radians(),
        yaw_deg.to_radians(),
    );
    UnitQuaternion::from_rotation_matrix(&rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::f64::consts::{FRAC_PI_2, PI};

    const ANGLE_TOLERANCE: f64 = 1e-6; // degrees

    #[test]
    fn test_identity() {
        let ypr = quaternion_to_euler_zyx(&UnitQuaternion::identity());

        assert!(ypr.yaw.abs() < ANGLE_TOLERANCE, "yaw should be 0, got {}", ypr.yaw);
        assert!(ypr.pitch.abs() < ANGLE_TOLERANCE, "pitch should be 0, got {}", ypr.pitch);
        assert!(ypr.roll.abs() < ANGLE_TOLERANCE, "roll should be 0, got {}", ypr.roll);
    }

    #[test]
    fn test_yaw_90() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let ypr = quaternion_to_euler_zyx(&q);

        assert!((ypr.yaw - 90.0).abs() < ANGLE_TOLERANCE, "yaw should be 90, got {}", ypr.yaw);
        assert!(ypr.pitch.abs() < ANGLE_TOLERANCE);
        assert!(ypr.roll.abs() < ANGLE_TOLERANCE);
    }

    #[test]
    fn test_pitch_90() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let ypr = quaternion_to_euler_zyx(&q);

        // At gimbal lock, yaw and roll become coupled
        assert!((ypr.pitch - 90.0).abs() < ANGLE_TOLERANCE, "pitch should be 90, got {}", ypr.pitch);
    }

    #[test]
    fn test_tool_down_180() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI);
        let ypr = quaternion_to_euler_zyx(&q);

        assert!((ypr.roll.abs() - 180.0).abs() < ANGLE_TOLERANCE, "roll should be ±180, got {}", ypr.roll);
    }

    #[test]
    fn test_roundtrip() {
        let cases = [
            (45.0, 30.0, 15.0),
            (-45.0, -30.0, -15.0),
            (0.0, 45.0, 0.0),
            (0.0, 0.0, 90.0),
        ];

        for (yaw, pitch, roll) in cases {
            let ypr = quaternion_to_euler_zyx(&euler_zyx_to_quaternion(yaw, pitch, roll));

            assert!((yaw - ypr.yaw).abs() < ANGLE_TOLERANCE, "yaw roundtrip failed: {} -> {}", yaw, ypr.yaw);
            assert!((pitch - ypr.pitch).abs() < ANGLE_TOLERANCE, "pitch roundtrip failed: {} -> {}", pitch, ypr.pitch);
            assert!((roll - ypr.roll).abs() < ANGLE_TOLERANCE, "roll roundtrip failed: {} -> {}", roll, ypr.roll);
        }
    }
}
