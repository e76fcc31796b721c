//! End-effector definitions.

use std::fmt;

use machina_geometry::{Rotation, Vector};
use serde::{Deserialize, Serialize};

use crate::error::{MachinaError, Result};

/// A tool that can be defined on a robot and later attached to its flange.
///
/// The TCP transform is expressed in the flange frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToolData")]
pub struct Tool {
    name: String,
    /// TCP offset from the flange, mm
    pub tcp_position: Vector,
    /// TCP orientation relative to the flange
    pub tcp_orientation: Rotation,
    /// Weight in kg
    pub weight: f64,
    /// Center of gravity in the flange frame, mm
    pub center_of_gravity: Vector,
}

impl Tool {
    /// Create a tool, validating that `name` can be used as a variable name
    /// in every output language.
    pub fn new(
        name: impl Into<String>,
        tcp_position: Vector,
        tcp_orientation: Rotation,
        weight: f64,
        center_of_gravity: Vector,
    ) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(MachinaError::InvalidName { name });
        }
        Ok(Self {
            name,
            tcp_position,
            tcp_orientation,
            weight: weight.max(0.0),
            center_of_gravity,
        })
    }

    /// Identifier used in compiled declarations.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Wire form of a [`Tool`]; deserialized tools are validated through [`Tool::new`].
#[derive(Deserialize)]
struct ToolData {
    name: String,
    tcp_position: Vector,
    tcp_orientation: Rotation,
    weight: f64,
    center_of_gravity: Vector,
}

impl TryFrom<ToolData> for Tool {
    type Error = MachinaError;

    fn try_from(data: ToolData) -> Result<Self> {
        Tool::new(
            data.name,
            data.tcp_position,
            data.tcp_orientation,
            data.weight,
            data.center_of_gravity,
        )
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tool \"{}\" with TCP {} {}, weight {} kg",
            self.name, self.tcp_position, self.tcp_orientation, self.weight
        )
    }
}

/// True for ASCII identifiers: a letter or underscore followed by letters,
/// digits or underscores.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("gripper_2"));
        assert!(is_valid_name("_t"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2gripper"));
        assert!(!is_valid_name("my tool"));
        assert!(!is_valid_name("pen-holder"));
    }

    #[test]
    fn test_invalid_tool_name_is_rejected() {
        let result = Tool::new("bad name", Vector::zero(), Rotation::identity(), 1.0, Vector::zero());
        assert!(matches!(result, Err(MachinaError::InvalidName { .. })));
    }

    #[test]
    fn test_deserialized_tools_are_validated() {
        let tool = Tool::new("pen", Vector::new(0.0, 0.0, 100.0), Rotation::identity(), 0.5, Vector::zero()).unwrap();
        let json = serde_json::to_string(&tool).unwrap();
        let parsed: Tool = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tool);

        let renamed = json.replace("\"pen\"", "\"my pen\"");
        assert!(serde_json::from_str::<Tool>(&renamed).is_err());
    }
}
