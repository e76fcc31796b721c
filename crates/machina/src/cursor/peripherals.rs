//! Non-motion handlers: settings stack, tools, external axes, initialization.

use super::{PoseState, RobotCursor, EXTERNAL_AXES_COUNT};
use crate::tool::Tool;
use crate::types::{ExternalAxesTarget, InitialPose};

impl RobotCursor {
    pub(super) fn apply_pop_settings(&mut self) -> bool {
        match self.settings_buffer.pop(self.settings) {
            Some(restored) => self.settings = restored,
            None => self.logger.verbose("Nothing to pop from the settings buffer"),
        }
        true
    }

    pub(super) fn apply_define_tool(&mut self, tool: &Tool) -> bool {
        if self.available_tools.contains_key(tool.name()) {
            self.logger
                .info(format!("Tool \"{}\" was already defined, overwriting it", tool.name()));
        }
        self.available_tools.insert(tool.name().to_string(), tool.clone());
        true
    }

    /// Attach a defined tool, detaching the current one first.
    ///
    /// The TCP offset is rotated into the world frame and added to the
    /// position, and the TCP orientation is post-multiplied.
    pub(super) fn apply_attach_tool(&mut self, name: &str) -> bool {
        let Some(tool) = self.available_tools.get(name).cloned() else {
            self.logger
                .warning(format!("Cannot attach tool \"{}\": it has not been defined", name));
            return false;
        };

        if self.tool.is_some() {
            self.remove_tool_transform();
        }

        if let PoseState::Cartesian { position, rotation } = self.pose {
            self.prev_pose = self.pose;
            self.pose = PoseState::Cartesian {
                position: position + rotation.rotate(tool.tcp_position),
                rotation: rotation * tool.tcp_orientation,
            };
        }

        self.tool = Some(tool);
        true
    }

    pub(super) fn apply_detach_tool(&mut self) -> bool {
        if self.tool.is_none() {
            self.logger.warning("Cannot detach tool: no tool is attached");
            return false;
        }
        self.remove_tool_transform();
        self.tool = None;
        true
    }

    /// Undo the attached tool's transform on a Cartesian pose.
    fn remove_tool_transform(&mut self) {
        let (Some(tool), PoseState::Cartesian { position, rotation }) = (self.tool.as_ref(), self.pose) else {
            return;
        };
        let flange_rotation = rotation * tool.tcp_orientation.inverse();
        let flange_position = position - flange_rotation.rotate(tool.tcp_position);

        self.prev_pose = self.pose;
        self.pose = PoseState::Cartesian {
            position: flange_position,
            rotation: flange_rotation,
        };
    }

    pub(super) fn apply_external_axis(
        &mut self,
        axis_number: u8,
        value: f64,
        target: ExternalAxesTarget,
        relative: bool,
    ) -> bool {
        let index = axis_number as usize;
        if index == 0 || index > EXTERNAL_AXES_COUNT {
            self.logger.error(format!(
                "External axis number {} is out of range 1..={}",
                axis_number, EXTERNAL_AXES_COUNT
            ));
            return false;
        }
        let slot = index - 1;

        if relative {
            let cartesian_unset = target.includes_cartesian() && self.external_axes_cartesian[slot].is_none();
            let joint_unset = target.includes_joint() && self.external_axes_joint[slot].is_none();
            if cartesian_unset || joint_unset {
                self.logger.error(format!(
                    "Cannot increase external axis {}: it has no value yet, use an absolute ExternalAxisTo first",
                    axis_number
                ));
                return false;
            }
        }

        let update = |current: Option<f64>| if relative { current.unwrap_or(0.0) + value } else { value };
        if target.includes_cartesian() {
            self.external_axes_cartesian[slot] = Some(update(self.external_axes_cartesian[slot]));
        }
        if target.includes_joint() {
            self.external_axes_joint[slot] = Some(update(self.external_axes_joint[slot]));
        }
        true
    }

    pub(super) fn apply_arm_angle(&mut self, value: f64, relative: bool) -> bool {
        match (self.arm_angle, relative) {
            (_, false) => self.arm_angle = Some(value),
            (Some(current), true) => self.arm_angle = Some(current + value),
            (None, true) => {
                self.logger
                    .error("Cannot increase the arm angle: it has no value yet, use an absolute ArmAngleTo first");
                return false;
            }
        }
        true
    }

    pub(super) fn apply_initialization(&mut self, pose: &InitialPose) -> bool {
        let state = match (pose.position, pose.rotation, pose.axes) {
            (Some(position), Some(rotation), _) => PoseState::Cartesian { position, rotation },
            (_, _, Some(axes)) => PoseState::Joint { axes },
            _ => {
                self.logger
                    .error("Cannot initialize: needs either position and rotation, or joint axes");
                return false;
            }
        };
        self.prev_pose = state;
        self.pose = state;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use machina_geometry::{Rotation, Vector};

    use super::*;
    use crate::action::{Action, ActionKind};
    use crate::logging::RobotLogger;
    use crate::settings::Settings;

    fn cursor() -> RobotCursor {
        RobotCursor::new("test", RobotLogger::new("test"), Settings::default(), false)
    }

    fn apply(cursor: &mut RobotCursor, kind: ActionKind) -> bool {
        cursor.apply(&Arc::new(Action::new(kind))).unwrap()
    }

    #[test]
    fn test_external_axis_relative_needs_value() {
        let mut cursor = cursor();
        let relative = ActionKind::ExternalAxis {
            axis_number: 1,
            value: 10.0,
            target: ExternalAxesTarget::All,
            relative: true,
        };
        assert!(!apply(&mut cursor, relative.clone()));

        assert!(apply(
            &mut cursor,
            ActionKind::ExternalAxis {
                axis_number: 1,
                value: 100.0,
                target: ExternalAxesTarget::Cartesian,
                relative: false,
            }
        ));
        // Joint slot is still unset
        assert!(!apply(&mut cursor, relative));
        assert_eq!(cursor.external_axes_cartesian()[0], Some(100.0));
        assert_eq!(cursor.external_axes_joint()[0], None);

        assert!(apply(
            &mut cursor,
            ActionKind::ExternalAxis {
                axis_number: 1,
                value: 5.0,
                target: ExternalAxesTarget::Cartesian,
                relative: true,
            }
        ));
        assert_eq!(cursor.external_axes_cartesian()[0], Some(105.0));
    }

    #[test]
    fn test_external_axis_number_out_of_range() {
        let mut cursor = cursor();
        for axis_number in [0, 7] {
            assert!(!apply(
                &mut cursor,
                ActionKind::ExternalAxis {
                    axis_number,
                    value: 1.0,
                    target: ExternalAxesTarget::All,
                    relative: false,
                }
            ));
        }
    }

    #[test]
    fn test_detach_without_tool_fails() {
        let mut cursor = cursor();
        assert!(!apply(&mut cursor, ActionKind::DetachTool));
        assert!(!apply(
            &mut cursor,
            ActionKind::AttachTool {
                name: "missing".to_string()
            }
        ));
    }

    #[test]
    fn test_attach_replaces_previous_tool() {
        let mut cursor = cursor();
        apply(
            &mut cursor,
            ActionKind::Initialization {
                pose: InitialPose::cartesian(Vector::new(0.0, 0.0, 500.0), Rotation::identity()),
            },
        );
        for (name, length) in [("short", 50.0), ("long", 150.0)] {
            let tool = Tool::new(name, Vector::new(0.0, 0.0, length), Rotation::identity(), 1.0, Vector::zero()).unwrap();
            apply(&mut cursor, ActionKind::DefineTool { tool });
        }

        apply(&mut cursor, ActionKind::AttachTool { name: "short".into() });
        apply(&mut cursor, ActionKind::AttachTool { name: "long".into() });

        let position = cursor.position().unwrap();
        assert!((position.z() - 650.0).abs() < 1e-9, "expected flange + long tool, got {}", position);
        assert_eq!(cursor.tool().map(|t| t.name()), Some("long"));
    }

    #[test]
    fn test_initialization_without_pose_fails() {
        let mut cursor = cursor();
        assert!(!apply(
            &mut cursor,
            ActionKind::Initialization {
                pose: InitialPose::default()
            }
        ));
        assert!(cursor.pose().is_unknown());
    }
}
