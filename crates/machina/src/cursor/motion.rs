//! Motion handlers: translation, rotation, transformation, axes and arcs.

use machina_geometry::{Joints, Plane, Rotation, Vector};

use super::{PoseState, RobotCursor};
use crate::error::{MachinaError, Result};
use crate::types::ReferenceCS;

impl RobotCursor {
    /// The current Cartesian pose, or a logged warning naming `what` needed it.
    fn require_cartesian(&self, what: &str) -> Option<(Vector, Rotation)> {
        match self.pose {
            PoseState::Cartesian { position, rotation } => Some((position, rotation)),
            _ => {
                self.logger.warning(format!(
                    "Cannot apply {}: position and rotation must be known first (current: {})",
                    what, self.pose
                ));
                None
            }
        }
    }

    pub(super) fn apply_translation(&mut self, translation: Vector, relative: bool) -> bool {
        let what = if relative { "relative translation" } else { "absolute translation" };
        let Some((position, rotation)) = self.require_cartesian(what) else {
            return false;
        };

        let position = if !relative {
            translation
        } else {
            match self.settings.reference_cs {
                ReferenceCS::World => position + translation,
                ReferenceCS::Local => position + rotation.rotate(translation),
            }
        };

        self.commit_pose(PoseState::Cartesian { position, rotation });
        true
    }

    pub(super) fn apply_rotation(&mut self, delta: Rotation, relative: bool) -> bool {
        let what = if relative { "relative rotation" } else { "absolute rotation" };
        let Some((position, rotation)) = self.require_cartesian(what) else {
            return false;
        };

        let rotation = if !relative {
            delta
        } else {
            match self.settings.reference_cs {
                ReferenceCS::World => delta * rotation,
                ReferenceCS::Local => rotation * delta,
            }
        };

        self.commit_pose(PoseState::Cartesian { position, rotation });
        true
    }

    /// Combined translation and rotation.
    ///
    /// World: translation is added as is and the rotation pre-multiplied,
    /// whatever the order flag says. Local + translation first: translate in
    /// the current frame, then pre-multiply the rotation. Local + rotation
    /// first: post-multiply the rotation, then translate in the resulting frame.
    pub(super) fn apply_transformation(
        &mut self,
        translation: Vector,
        delta: Rotation,
        relative: bool,
        translation_first: bool,
    ) -> bool {
        if !relative {
            self.commit_pose(PoseState::Cartesian {
                position: translation,
                rotation: delta,
            });
            return true;
        }

        let Some((position, rotation)) = self.require_cartesian("relative transformation") else {
            return false;
        };

        let (position, rotation) = match (self.settings.reference_cs, translation_first) {
            (ReferenceCS::World, _) => (position + translation, delta * rotation),
            (ReferenceCS::Local, true) => (position + rotation.rotate(translation), delta * rotation),
            (ReferenceCS::Local, false) => {
                let rotated = rotation * delta;
                (position + rotated.rotate(translation), rotated)
            }
        };

        self.commit_pose(PoseState::Cartesian { position, rotation });
        true
    }

    pub(super) fn apply_axes(&mut self, joints: Joints, relative: bool) -> bool {
        let axes = if !relative {
            joints
        } else {
            match self.pose {
                PoseState::Joint { axes } => axes + joints,
                _ => {
                    self.logger.warning(format!(
                        "Cannot apply relative axes: joint values must be known first (current: {})",
                        self.pose
                    ));
                    return false;
                }
            }
        };

        self.commit_pose(PoseState::Joint { axes });
        true
    }

    pub(super) fn apply_arc_motion(&mut self, end: &Plane, relative: bool, position_only: bool) -> bool {
        if relative && !position_only {
            self.logger
                .error("Relative arc motions are only supported in position-only mode");
            return false;
        }

        if !relative && !position_only {
            self.commit_pose(PoseState::Cartesian {
                position: end.origin,
                rotation: end.rotation,
            });
            return true;
        }

        let Some((position, rotation)) = self.require_cartesian("position-only arc motion") else {
            return false;
        };
        let position = if relative { self.relative_offset(position, rotation, end.origin) } else { end.origin };

        self.commit_pose(PoseState::Cartesian { position, rotation });
        true
    }

    fn relative_offset(&self, position: Vector, rotation: Rotation, offset: Vector) -> Vector {
        match self.settings.reference_cs {
            ReferenceCS::World => position + offset,
            ReferenceCS::Local => position + rotation.rotate(offset),
        }
    }

    /// World-space through plane of an arc that has just been applied.
    ///
    /// Relative arcs are resolved against the pose before the arc. Relative
    /// arcs carrying orientation are unsupported.
    pub fn compute_through_plane(&self, through: &Plane, relative: bool, position_only: bool) -> Result<Option<Plane>> {
        if relative && !position_only {
            return Err(MachinaError::UnsupportedArc);
        }

        if !relative {
            if position_only {
                return Ok(self.rotation().map(|rotation| Plane::new(through.origin, rotation)));
            }
            return Ok(Some(*through));
        }

        Ok(match self.prev_pose {
            PoseState::Cartesian { position, rotation } => Some(Plane::new(
                self.relative_offset(position, rotation, through.origin),
                rotation,
            )),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::action::{Action, ActionKind};
    use crate::logging::RobotLogger;
    use crate::settings::Settings;
    use crate::types::InitialPose;

    const TOLERANCE: f64 = 1e-6;

    fn cursor_at(position: Vector, rotation: Rotation) -> RobotCursor {
        let mut cursor = RobotCursor::new("test", RobotLogger::new("test"), Settings::default(), false);
        let init = Arc::new(Action::new(ActionKind::Initialization {
            pose: InitialPose::cartesian(position, rotation),
        }));
        assert!(cursor.apply(&init).unwrap());
        cursor
    }

    fn apply(cursor: &mut RobotCursor, kind: ActionKind) -> bool {
        cursor.apply(&Arc::new(Action::new(kind))).unwrap()
    }

    #[test]
    fn test_local_translation_follows_orientation() {
        let rotation = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
        let mut cursor = cursor_at(Vector::zero(), rotation);
        apply(
            &mut cursor,
            ActionKind::Coordinates {
                reference_cs: ReferenceCS::Local,
            },
        );
        apply(
            &mut cursor,
            ActionKind::Translation {
                translation: Vector::new(10.0, 0.0, 0.0),
                relative: true,
            },
        );

        let position = cursor.position().unwrap();
        assert!(position.is_similar(&Vector::new(0.0, 10.0, 0.0), TOLERANCE), "got {}", position);
    }

    #[test]
    fn test_world_rotation_premultiplies() {
        let start = Rotation::from_axis_angle(Vector::x_axis(), 90.0);
        let delta = Rotation::from_axis_angle(Vector::z_axis(), 90.0);
        let mut cursor = cursor_at(Vector::zero(), start);
        apply(
            &mut cursor,
            ActionKind::Rotation {
                rotation: delta,
                relative: true,
            },
        );
        assert!(cursor.rotation().unwrap().is_similar(&(delta * start), TOLERANCE));
    }

    #[test]
    fn test_relative_axes_require_joint_pose() {
        let mut cursor = cursor_at(Vector::zero(), Rotation::identity());
        let joints = Joints::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert!(!apply(&mut cursor, ActionKind::Axes { joints, relative: true }));
        assert!(cursor.pose().is_cartesian());

        assert!(apply(&mut cursor, ActionKind::Axes { joints, relative: false }));
        assert!(cursor.position().is_none(), "joint motion forgets the Cartesian pose");
        assert!(apply(&mut cursor, ActionKind::Axes { joints, relative: true }));
        assert!(cursor.axes().unwrap().is_similar(&(joints + joints), TOLERANCE));
    }

    #[test]
    fn test_relative_arc_with_orientation_fails() {
        let mut cursor = cursor_at(Vector::zero(), Rotation::identity());
        let plane = Plane::from_origin(Vector::new(10.0, 10.0, 0.0));
        let applied = apply(
            &mut cursor,
            ActionKind::ArcMotion {
                through: plane,
                end: plane,
                relative: true,
                position_only: false,
            },
        );
        assert!(!applied);
        assert!(matches!(
            cursor.compute_through_plane(&plane, true, false),
            Err(MachinaError::UnsupportedArc)
        ));
    }

    #[test]
    fn test_relative_position_only_arc_through_plane() {
        let mut cursor = cursor_at(Vector::new(100.0, 0.0, 0.0), Rotation::identity());
        let through = Plane::from_origin(Vector::new(10.0, 10.0, 0.0));
        let end = Plane::from_origin(Vector::new(20.0, 0.0, 0.0));
        assert!(apply(
            &mut cursor,
            ActionKind::ArcMotion {
                through,
                end,
                relative: true,
                position_only: true,
            },
        ));
        assert!(cursor.position().unwrap().is_similar(&Vector::new(120.0, 0.0, 0.0), TOLERANCE));

        let resolved = cursor.compute_through_plane(&through, true, true).unwrap().unwrap();
        assert!(resolved.origin.is_similar(&Vector::new(110.0, 10.0, 0.0), TOLERANCE));
    }
}
