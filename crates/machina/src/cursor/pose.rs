//! Cursor pose representation.

use std::fmt;

use machina_geometry::{Joints, Rotation, Vector};
use serde::{Deserialize, Serialize};

/// The authoritative pose of a cursor.
///
/// Without kinematics a cursor can only know one representation at a time:
/// setting joints forgets the Cartesian pose and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PoseState {
    /// Nothing is known until an initialization or absolute motion
    #[default]
    Unknown,
    /// Known TCP pose
    Cartesian {
        /// TCP position, mm
        position: Vector,
        /// TCP orientation
        rotation: Rotation,
    },
    /// Known joint angles
    Joint {
        /// Joint angles, degrees
        axes: Joints,
    },
}

impl PoseState {
    /// TCP position of a Cartesian pose.
    pub fn position(&self) -> Option<Vector> {
        match self {
            PoseState::Cartesian { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// TCP orientation of a Cartesian pose.
    pub fn rotation(&self) -> Option<Rotation> {
        match self {
            PoseState::Cartesian { rotation, .. } => Some(*rotation),
            _ => None,
        }
    }

    /// Joint angles of a joint pose.
    pub fn axes(&self) -> Option<Joints> {
        match self {
            PoseState::Joint { axes } => Some(*axes),
            _ => None,
        }
    }

    /// Whether the TCP pose is known.
    pub fn is_cartesian(&self) -> bool {
        matches!(self, PoseState::Cartesian { .. })
    }

    /// Whether the joint angles are known.
    pub fn is_joint(&self) -> bool {
        matches!(self, PoseState::Joint { .. })
    }

    /// Whether nothing is known.
    pub fn is_unknown(&self) -> bool {
        matches!(self, PoseState::Unknown)
    }
}

impl fmt::Display for PoseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseState::Unknown => f.write_str("unknown pose"),
            PoseState::Cartesian { position, rotation } => write!(f, "{} {}", position, rotation),
            PoseState::Joint { axes } => write!(f, "axes {}", axes),
        }
    }
}
