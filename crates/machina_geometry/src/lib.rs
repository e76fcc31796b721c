//! Robot-agnostic geometry value types for machina.
//!
//! This crate provides the small set of value objects the cursor and the
//! compilers operate on, all backed by nalgebra:
//!
//! - [`Vector`]: a 3D vector in millimeters (`Vector3<f64>`)
//! - [`Rotation`]: an orientation backed by `UnitQuaternion<f64>`
//! - [`AxisAngle`] and [`RotationVector`]: axis/angle views of a rotation (degrees)
//! - [`YawPitchRoll`]: Euler ZYX angles in degrees
//! - [`Joints`]: a 6-tuple of joint angles in degrees
//! - [`Plane`]: an origin plus an orientation
//!
//! All types are plain values: operations return new values and never
//! mutate their inputs.
//!
//! # Example
//!
//! ```rust
//! use machina_geometry::{Rotation, Vector};
//!
//! let rotation = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
//! let rotated = rotation.rotate(Vector::x_axis());
//! assert!(rotated.is_similar(&Vector::y_axis(), 1e-9));
//! ```

pub mod conversion;
pub mod joints;
pub mod plane;
pub mod rotation;
pub mod vector;

pub use conversion::{euler_zyx_to_quaternion, quaternion_to_euler_zyx, YawPitchRoll};
pub use joints::Joints;
pub use plane::Plane;
pub use rotation::{AxisAngle, Rotation, RotationVector};
pub use vector::Vector;

/// Tolerance used for geometric equality checks.
pub const EPSILON: f64 = 1e-6;

/// Round `value` to `decimals` places, normalizing negative zero.
///
/// Compilers rely on this to print stable numbers: `-0.0001` rounded to
/// three places prints as `0`, never `-0`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}
