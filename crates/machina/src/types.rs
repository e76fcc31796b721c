//! Small enums and records shared by actions, cursors and compilers.

use std::fmt;
use std::str::FromStr;

use machina_geometry::{Joints, Rotation, Vector};
use serde::{Deserialize, Serialize};

use crate::error::MachinaError;

/// How the controller interpolates between targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionType {
    /// Straight line in Cartesian space
    #[default]
    Linear,
    /// Interpolated in joint space
    Joint,
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionType::Linear => f.write_str("Linear"),
            MotionType::Joint => f.write_str("Joint"),
        }
    }
}

impl FromStr for MotionType {
    type Err = MachinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "l" => Ok(MotionType::Linear),
            "joint" | "j" => Ok(MotionType::Joint),
            _ => Err(MachinaError::InvalidCommand(format!("unknown motion type {s:?}"))),
        }
    }
}

/// Frame that relative motions are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferenceCS {
    /// The robot base frame
    #[default]
    World,
    /// The current tool frame
    Local,
}

impl fmt::Display for ReferenceCS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceCS::World => f.write_str("World"),
            ReferenceCS::Local => f.write_str("Local"),
        }
    }
}

impl FromStr for ReferenceCS {
    type Err = MachinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "world" | "global" => Ok(ReferenceCS::World),
            "local" | "tool" => Ok(ReferenceCS::Local),
            _ => Err(MachinaError::InvalidCommand(format!("unknown reference frame {s:?}"))),
        }
    }
}

/// Heated parts of a fabrication device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RobotPartType {
    /// Filament extruder
    Extruder,
    /// Print bed
    Bed,
    /// Enclosure
    Chamber,
}

impl RobotPartType {
    /// Every part.
    pub const ALL: [RobotPartType; 3] = [RobotPartType::Extruder, RobotPartType::Bed, RobotPartType::Chamber];
}

impl fmt::Display for RobotPartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotPartType::Extruder => f.write_str("extruder"),
            RobotPartType::Bed => f.write_str("bed"),
            RobotPartType::Chamber => f.write_str("chamber"),
        }
    }
}

impl FromStr for RobotPartType {
    type Err = MachinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "extruder" | "hotend" => Ok(RobotPartType::Extruder),
            "bed" => Ok(RobotPartType::Bed),
            "chamber" => Ok(RobotPartType::Chamber),
            _ => Err(MachinaError::InvalidCommand(format!("unknown robot part {s:?}"))),
        }
    }
}

/// Which external axis slot set an [`ExternalAxis`](crate::action::ActionKind::ExternalAxis)
/// action writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExternalAxesTarget {
    /// Both slot sets
    #[default]
    All,
    /// Only Cartesian targets
    Cartesian,
    /// Only joint targets
    Joint,
}

impl ExternalAxesTarget {
    /// Whether Cartesian targets are written.
    pub fn includes_cartesian(&self) -> bool {
        matches!(self, ExternalAxesTarget::All | ExternalAxesTarget::Cartesian)
    }

    /// Whether joint targets are written.
    pub fn includes_joint(&self) -> bool {
        matches!(self, ExternalAxesTarget::All | ExternalAxesTarget::Joint)
    }
}

impl fmt::Display for ExternalAxesTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalAxesTarget::All => f.write_str("All"),
            ExternalAxesTarget::Cartesian => f.write_str("Cartesian"),
            ExternalAxesTarget::Joint => f.write_str("Joint"),
        }
    }
}

impl FromStr for ExternalAxesTarget {
    type Err = MachinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ExternalAxesTarget::All),
            "cartesian" => Ok(ExternalAxesTarget::Cartesian),
            "joint" => Ok(ExternalAxesTarget::Joint),
            _ => Err(MachinaError::InvalidCommand(format!("unknown external axes target {s:?}"))),
        }
    }
}

/// Starting pose used to seed a fresh cursor.
///
/// When both `position` and `rotation` are present the cursor starts
/// Cartesian-known; otherwise `axes` seeds a Joint-known cursor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPose {
    /// TCP position, mm
    pub position: Option<Vector>,
    /// TCP orientation
    pub rotation: Option<Rotation>,
    /// Joint angles, degrees
    pub axes: Option<Joints>,
}

impl InitialPose {
    /// A known TCP pose.
    pub fn cartesian(position: Vector, rotation: Rotation) -> Self {
        Self {
            position: Some(position),
            rotation: Some(rotation),
            axes: None,
        }
    }

    /// Known joint angles.
    pub fn joints(axes: Joints) -> Self {
        Self {
            position: None,
            rotation: None,
            axes: Some(axes),
        }
    }
}

impl fmt::Display for InitialPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.position, self.rotation, self.axes) {
            (Some(position), Some(rotation), _) => write!(f, "position {} and rotation {}", position, rotation),
            (_, _, Some(axes)) => write!(f, "axes {}", axes),
            _ => f.write_str("no pose"),
        }
    }
}
