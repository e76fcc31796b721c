//! Actions: the device-independent commands issued to a robot.
//!
//! An [`Action`] is an immutable [`ActionKind`] payload plus the id assigned
//! when the issue cursor admits it. Once issued, the same `Arc<Action>` is
//! shared by every cursor in the chain.

use std::fmt;

use machina_geometry::{Joints, Plane, Rotation, Vector};
use serde::{Deserialize, Serialize};

use crate::format::{join_nums, num, quoted, DEG_DECIMALS, MM_DECIMALS, TEMPERATURE_DECIMALS, VOLTAGE_DECIMALS};
use crate::tool::Tool;
use crate::types::{ExternalAxesTarget, InitialPose, MotionType, ReferenceCS, RobotPartType};

/// Discriminant of an [`ActionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// [`ActionKind::Translation`]
    Translation,
    /// [`ActionKind::Rotation`]
    Rotation,
    /// [`ActionKind::Transformation`]
    Transformation,
    /// [`ActionKind::Axes`]
    Axes,
    /// [`ActionKind::ArcMotion`]
    ArcMotion,
    /// [`ActionKind::Speed`]
    Speed,
    /// [`ActionKind::Acceleration`]
    Acceleration,
    /// [`ActionKind::Precision`]
    Precision,
    /// [`ActionKind::MotionMode`]
    MotionMode,
    /// [`ActionKind::Coordinates`]
    Coordinates,
    /// [`ActionKind::PushSettings`]
    PushSettings,
    /// [`ActionKind::PopSettings`]
    PopSettings,
    /// [`ActionKind::Wait`]
    Wait,
    /// [`ActionKind::Message`]
    Message,
    /// [`ActionKind::Comment`]
    Comment,
    /// [`ActionKind::DefineTool`]
    DefineTool,
    /// [`ActionKind::AttachTool`]
    AttachTool,
    /// [`ActionKind::DetachTool`]
    DetachTool,
    /// [`ActionKind::IODigital`]
    IODigital,
    /// [`ActionKind::IOAnalog`]
    IOAnalog,
    /// [`ActionKind::Temperature`]
    Temperature,
    /// [`ActionKind::Extrusion`]
    Extrusion,
    /// [`ActionKind::ExtrusionRate`]
    ExtrusionRate,
    /// [`ActionKind::ExternalAxis`]
    ExternalAxis,
    /// [`ActionKind::ArmAngle`]
    ArmAngle,
    /// [`ActionKind::CustomCode`]
    CustomCode,
    /// [`ActionKind::Initialization`]
    Initialization,
}

/// Payload of an action.
///
/// `relative` variants add to the current value; absolute ones replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move the TCP, keeping its orientation
    Translation {
        /// Offset or target position, mm
        translation: Vector,
        /// Add to the current position
        relative: bool,
    },
    /// Reorient the TCP, keeping its position
    Rotation {
        /// Delta or target orientation
        rotation: Rotation,
        /// Compose with the current orientation
        relative: bool,
    },
    /// Move and reorient the TCP in one motion
    Transformation {
        /// Offset or target position, mm
        translation: Vector,
        /// Delta or target orientation
        rotation: Rotation,
        /// Apply on top of the current pose
        relative: bool,
        /// For relative local transformations: translate before rotating
        translation_first: bool,
    },
    /// Joint motion
    Axes {
        /// Joint angles in degrees
        joints: Joints,
        /// Add to the current joint angles
        relative: bool,
    },
    /// Circular motion through one point to another
    ArcMotion {
        /// Intermediate point of the arc
        through: Plane,
        /// End of the arc
        end: Plane,
        /// Planes are offsets from the current pose
        relative: bool,
        /// Keep the current orientation and only use the planes' origins
        position_only: bool,
    },
    /// TCP speed
    Speed {
        /// mm/s
        value: f64,
        /// Add to the current speed
        relative: bool,
    },
    /// TCP acceleration
    Acceleration {
        /// mm/s²
        value: f64,
        /// Add to the current acceleration
        relative: bool,
    },
    /// Approximation radius between motions
    Precision {
        /// Blend radius, mm
        value: f64,
        /// Add to the current radius
        relative: bool,
    },
    /// Interpolation used by subsequent motions
    MotionMode {
        /// Linear or joint interpolation
        motion_type: MotionType,
    },
    /// Frame relative motions are expressed in
    Coordinates {
        /// World or local (TCP) frame
        reference_cs: ReferenceCS,
    },
    /// Save the current settings on the settings stack
    PushSettings,
    /// Restore the settings saved by the matching push
    PopSettings,
    /// Pause execution
    Wait {
        /// Duration in milliseconds
        millis: u64,
    },
    /// Show a message on the controller
    Message {
        /// Message text
        text: String,
    },
    /// Comment in the compiled program
    Comment {
        /// Comment text
        text: String,
    },
    /// Make a tool available for attaching
    DefineTool {
        /// The tool to define
        tool: Tool,
    },
    /// Attach a defined tool to the flange
    AttachTool {
        /// Name of a defined tool
        name: String,
    },
    /// Detach the attached tool
    DetachTool,
    /// Write a digital output
    IODigital {
        /// Controller-specific pin name or number
        pin_id: String,
        /// New state
        on: bool,
        /// Pin on the tool flange
        tool_pin: bool,
    },
    /// Write an analog output
    IOAnalog {
        /// Controller-specific pin name or number
        pin_id: String,
        /// Output value
        value: f64,
        /// Pin on the tool flange
        tool_pin: bool,
    },
    /// Heat a printer part
    Temperature {
        /// °C
        value: f64,
        /// Part to heat
        part: RobotPartType,
        /// Block until the temperature is reached
        wait: bool,
        /// Add to the current temperature
        relative: bool,
    },
    /// Turn extrusion on or off
    Extrusion {
        /// Extrude during subsequent motions
        on: bool,
    },
    /// Filament extruded per distance travelled
    ExtrusionRate {
        /// mm of filament per mm of travel
        value: f64,
        /// Add to the current rate
        relative: bool,
    },
    /// Move an external axis
    ExternalAxis {
        /// 1-based axis number
        axis_number: u8,
        /// Axis value, mm or degrees
        value: f64,
        /// Which targets carry the value
        target: ExternalAxesTarget,
        /// Add to the current axis value
        relative: bool,
    },
    /// Elbow angle for 7-axis arms
    ArmAngle {
        /// Degrees
        value: f64,
        /// Add to the current angle
        relative: bool,
    },
    /// Raw statement in the target language
    CustomCode {
        /// The statement, copied verbatim
        statement: String,
        /// Emit in the declarations instead of the main routine
        is_declaration: bool,
    },
    /// Seed the cursor state; issued once by the chain
    Initialization {
        /// Known starting pose
        pose: InitialPose,
    },
}

impl ActionKind {
    /// The discriminant of this payload.
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::Translation { .. } => ActionType::Translation,
            ActionKind::Rotation { .. } => ActionType::Rotation,
            ActionKind::Transformation { .. } => ActionType::Transformation,
            ActionKind::Axes { .. } => ActionType::Axes,
            ActionKind::ArcMotion { .. } => ActionType::ArcMotion,
            ActionKind::Speed { .. } => ActionType::Speed,
            ActionKind::Acceleration { .. } => ActionType::Acceleration,
            ActionKind::Precision { .. } => ActionType::Precision,
            ActionKind::MotionMode { .. } => ActionType::MotionMode,
            ActionKind::Coordinates { .. } => ActionType::Coordinates,
            ActionKind::PushSettings => ActionType::PushSettings,
            ActionKind::PopSettings => ActionType::PopSettings,
            ActionKind::Wait { .. } => ActionType::Wait,
            ActionKind::Message { .. } => ActionType::Message,
            ActionKind::Comment { .. } => ActionType::Comment,
            ActionKind::DefineTool { .. } => ActionType::DefineTool,
            ActionKind::AttachTool { .. } => ActionType::AttachTool,
            ActionKind::DetachTool => ActionType::DetachTool,
            ActionKind::IODigital { .. } => ActionType::IODigital,
            ActionKind::IOAnalog { .. } => ActionType::IOAnalog,
            ActionKind::Temperature { .. } => ActionType::Temperature,
            ActionKind::Extrusion { .. } => ActionType::Extrusion,
            ActionKind::ExtrusionRate { .. } => ActionType::ExtrusionRate,
            ActionKind::ExternalAxis { .. } => ActionType::ExternalAxis,
            ActionKind::ArmAngle { .. } => ActionType::ArmAngle,
            ActionKind::CustomCode { .. } => ActionType::CustomCode,
            ActionKind::Initialization { .. } => ActionType::Initialization,
        }
    }

    /// The action in Machina instruction syntax, e.g. `MoveTo(100,200,300);`.
    pub fn to_instruction(&self) -> String {
        match self {
            ActionKind::Translation { translation, relative } => {
                let name = if *relative { "Move" } else { "MoveTo" };
                format!("{}({});", name, join_nums(&translation.rounded(MM_DECIMALS), MM_DECIMALS, ","))
            }
            ActionKind::Rotation { rotation, relative } => {
                let name = if *relative { "Rotate" } else { "RotateTo" };
                format!("{}({});", name, axis_angle_args(rotation))
            }
            ActionKind::Transformation {
                translation,
                rotation,
                relative,
                translation_first,
            } => {
                let name = if *relative { "Transform" } else { "TransformTo" };
                // Translation first is the default and stays implicit
                let order = if *translation_first { "" } else { ",false" };
                format!(
                    "{}({},{}{});",
                    name,
                    join_nums(&translation.rounded(MM_DECIMALS), MM_DECIMALS, ","),
                    axis_angle_args(rotation),
                    order
                )
            }
            ActionKind::Axes { joints, relative } => {
                let name = if *relative { "Axes" } else { "AxesTo" };
                format!("{}({});", name, join_nums(&joints.values(), DEG_DECIMALS, ","))
            }
            ActionKind::ArcMotion {
                through,
                end,
                relative,
                position_only,
            } => {
                let name = if *relative { "ArcMotion" } else { "ArcMotionTo" };
                let mut args = format!(
                    "{},{}",
                    join_nums(&through.origin.rounded(MM_DECIMALS), MM_DECIMALS, ","),
                    join_nums(&end.origin.rounded(MM_DECIMALS), MM_DECIMALS, ",")
                );
                if !position_only {
                    args.push(',');
                    args.push_str(&axis_angle_args(&end.rotation));
                }
                format!("{}({});", name, args)
            }
            ActionKind::Speed { value, relative } => setting_instruction("Speed", *value, *relative, MM_DECIMALS),
            ActionKind::Acceleration { value, relative } => {
                setting_instruction("Acceleration", *value, *relative, MM_DECIMALS)
            }
            ActionKind::Precision { value, relative } => {
                setting_instruction("Precision", *value, *relative, MM_DECIMALS)
            }
            ActionKind::MotionMode { motion_type } => {
                format!("MotionMode({});", quoted(&motion_type.to_string().to_lowercase()))
            }
            ActionKind::Coordinates { reference_cs } => {
                format!("CoordinateSystem({});", quoted(&reference_cs.to_string().to_lowercase()))
            }
            ActionKind::PushSettings => "PushSettings();".to_string(),
            ActionKind::PopSettings => "PopSettings();".to_string(),
            ActionKind::Wait { millis } => format!("Wait({});", millis),
            ActionKind::Message { text } => format!("Message({});", quoted(text)),
            ActionKind::Comment { text } => format!("Comment({});", quoted(text)),
            ActionKind::DefineTool { tool } => {
                let aa = tool.tcp_orientation.axis_angle();
                let axis = aa.axis();
                format!(
                    "DefineTool({},{},{},{},{},{});",
                    quoted(tool.name()),
                    join_nums(&tool.tcp_position.rounded(MM_DECIMALS), MM_DECIMALS, ","),
                    join_nums(&[axis.x(), axis.y(), axis.z()], 6, ","),
                    num(aa.angle(), DEG_DECIMALS),
                    num(tool.weight, 3),
                    join_nums(&tool.center_of_gravity.rounded(MM_DECIMALS), MM_DECIMALS, ",")
                )
            }
            ActionKind::AttachTool { name } => format!("AttachTool({});", quoted(name)),
            ActionKind::DetachTool => "DetachTool();".to_string(),
            ActionKind::IODigital { pin_id, on, tool_pin } => {
                format!("WriteDigital({},{},{});", quoted(pin_id), on, tool_pin)
            }
            ActionKind::IOAnalog {
                pin_id,
                value,
                tool_pin,
            } => format!("WriteAnalog({},{},{});", quoted(pin_id), num(*value, VOLTAGE_DECIMALS), tool_pin),
            ActionKind::Temperature {
                value,
                part,
                wait,
                relative,
            } => {
                let name = if *relative { "Temperature" } else { "TemperatureTo" };
                format!(
                    "{}({},{},{});",
                    name,
                    num(*value, TEMPERATURE_DECIMALS),
                    quoted(&part.to_string()),
                    wait
                )
            }
            ActionKind::Extrusion { on } => format!("Extrude({});", on),
            ActionKind::ExtrusionRate { value, relative } => {
                setting_instruction("ExtrusionRate", *value, *relative, MM_DECIMALS)
            }
            ActionKind::ExternalAxis {
                axis_number,
                value,
                target,
                relative,
            } => {
                let name = if *relative { "ExternalAxis" } else { "ExternalAxisTo" };
                format!(
                    "{}({},{},{});",
                    name,
                    axis_number,
                    num(*value, MM_DECIMALS),
                    quoted(&target.to_string().to_lowercase())
                )
            }
            ActionKind::ArmAngle { value, relative } => setting_instruction("ArmAngle", *value, *relative, DEG_DECIMALS),
            ActionKind::CustomCode {
                statement,
                is_declaration,
            } => format!("CustomCode({},{});", quoted(statement), is_declaration),
            ActionKind::Initialization { pose } => format!("// Initialized with {}", pose),
        }
    }
}

fn axis_angle_args(rotation: &Rotation) -> String {
    let aa = rotation.axis_angle();
    let axis = aa.axis();
    format!(
        "{},{}",
        join_nums(&[axis.x(), axis.y(), axis.z()], 6, ","),
        num(aa.angle(), DEG_DECIMALS)
    )
}

fn setting_instruction(name: &str, value: f64, relative: bool, decimals: u32) -> String {
    if relative {
        format!("{}({});", name, num(value, decimals))
    } else {
        format!("{}To({});", name, num(value, decimals))
    }
}

fn change_description(
    f: &mut fmt::Formatter<'_>,
    what: &str,
    value: f64,
    relative: bool,
    decimals: u32,
    unit: &str,
) -> fmt::Result {
    if !relative {
        write!(f, "Set {} to {} {}", what, num(value, decimals), unit)
    } else if value < 0.0 {
        write!(f, "Decrease {} by {} {}", what, num(-value, decimals), unit)
    } else {
        write!(f, "Increase {} by {} {}", what, num(value, decimals), unit)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Translation { translation, relative } => {
                if *relative {
                    write!(f, "Move {} mm", translation)
                } else {
                    write!(f, "Move to {} mm", translation)
                }
            }
            ActionKind::Rotation { rotation, relative } => {
                if *relative {
                    write!(f, "Rotate {}", rotation.axis_angle())
                } else {
                    write!(f, "Rotate to {}", rotation)
                }
            }
            ActionKind::Transformation {
                translation,
                rotation,
                relative,
                translation_first,
            } => {
                if !relative {
                    write!(f, "Transform to {} mm and {}", translation, rotation)
                } else if *translation_first {
                    write!(f, "Move {} mm and rotate {}", translation, rotation.axis_angle())
                } else {
                    write!(f, "Rotate {} and move {} mm", rotation.axis_angle(), translation)
                }
            }
            ActionKind::Axes { joints, relative } => {
                if *relative {
                    write!(f, "Increase joint axes by {} deg", joints)
                } else {
                    write!(f, "Set joint axes to {} deg", joints)
                }
            }
            ActionKind::ArcMotion {
                through,
                end,
                relative,
                ..
            } => {
                if *relative {
                    write!(f, "Arc motion through {} mm to {} mm relative", through.origin, end.origin)
                } else {
                    write!(f, "Arc motion through {} mm to {} mm", through.origin, end.origin)
                }
            }
            ActionKind::Speed { value, relative } => change_description(f, "speed", *value, *relative, 3, "mm/s"),
            ActionKind::Acceleration { value, relative } => {
                change_description(f, "acceleration", *value, *relative, 3, "mm/s^2")
            }
            ActionKind::Precision { value, relative } => {
                change_description(f, "precision", *value, *relative, 3, "mm")
            }
            ActionKind::MotionMode { motion_type } => write!(f, "Set motion type to {}", motion_type),
            ActionKind::Coordinates { reference_cs } => {
                write!(f, "Set reference coordinate system to {}", reference_cs)
            }
            ActionKind::PushSettings => f.write_str("Push settings"),
            ActionKind::PopSettings => f.write_str("Pop settings"),
            ActionKind::Wait { millis } => write!(f, "Wait {} ms", millis),
            ActionKind::Message { text } => write!(f, "Send message {}", quoted(text)),
            ActionKind::Comment { text } => write!(f, "Comment {}", quoted(text)),
            ActionKind::DefineTool { tool } => write!(f, "Define {}", tool),
            ActionKind::AttachTool { name } => write!(f, "Attach tool {}", quoted(name)),
            ActionKind::DetachTool => f.write_str("Detach tool"),
            ActionKind::IODigital { pin_id, on, tool_pin } => {
                let state = if *on { "on" } else { "off" };
                let location = if *tool_pin { "tool digital output" } else { "digital output" };
                write!(f, "Turn {} {} {}", location, quoted(pin_id), state)
            }
            ActionKind::IOAnalog {
                pin_id,
                value,
                tool_pin,
            } => {
                let location = if *tool_pin { "tool analog output" } else { "analog output" };
                write!(f, "Set {} {} to {}", location, quoted(pin_id), num(*value, VOLTAGE_DECIMALS))
            }
            ActionKind::Temperature {
                value,
                part,
                wait,
                relative,
            } => {
                change_description(f, &format!("{} temperature", part), *value, *relative, 0, "C")?;
                if *wait {
                    f.write_str(" and wait")?;
                }
                Ok(())
            }
            ActionKind::Extrusion { on } => {
                if *on {
                    f.write_str("Turn extrusion on")
                } else {
                    f.write_str("Turn extrusion off")
                }
            }
            ActionKind::ExtrusionRate { value, relative } => {
                change_description(f, "extrusion rate", *value, *relative, 3, "mm/mm")
            }
            ActionKind::ExternalAxis {
                axis_number,
                value,
                target,
                relative,
            } => {
                change_description(f, &format!("external axis {}", axis_number), *value, *relative, 3, "")?;
                if *target != ExternalAxesTarget::All {
                    write!(f, "for {} targets", target)?;
                }
                Ok(())
            }
            ActionKind::ArmAngle { value, relative } => {
                change_description(f, "arm angle", *value, *relative, 3, "deg")
            }
            ActionKind::CustomCode {
                statement,
                is_declaration,
            } => {
                if *is_declaration {
                    write!(f, "Declare custom code {}", quoted(statement))
                } else {
                    write!(f, "Send custom code {}", quoted(statement))
                }
            }
            ActionKind::Initialization { pose } => write!(f, "Initialize robot with {}", pose),
        }
    }
}

/// An issued (or not yet issued) action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    id: i64,
    kind: ActionKind,
}

impl Action {
    /// Id of an action that has not been admitted by an issue cursor.
    pub const UNISSUED_ID: i64 = -1;

    /// An action that has not been issued yet.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: Self::UNISSUED_ID,
            kind,
        }
    }

    pub(crate) fn with_id(kind: ActionKind, id: i64) -> Self {
        Self { id, kind }
    }

    /// Id assigned on issue, or [`Self::UNISSUED_ID`].
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The payload.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The discriminant of the payload.
    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    /// Whether an issue cursor admitted this action.
    pub fn is_issued(&self) -> bool {
        self.id != Self::UNISSUED_ID
    }

    /// See [`ActionKind::to_instruction`].
    pub fn to_instruction(&self) -> String {
        self.kind.to_instruction()
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_syntax() {
        let speed = ActionKind::Speed {
            value: 100.0,
            relative: false,
        };
        assert_eq!(speed.to_instruction(), "SpeedTo(100);");

        let translation = ActionKind::Translation {
            translation: Vector::new(100.0, 200.0, 300.0),
            relative: false,
        };
        assert_eq!(translation.to_instruction(), "MoveTo(100,200,300);");

        let rotation = ActionKind::Rotation {
            rotation: Rotation::from_axis_angle(Vector::z_axis(), 90.0),
            relative: true,
        };
        assert_eq!(rotation.to_instruction(), "Rotate(0,0,1,90);");

        assert_eq!(ActionKind::Wait { millis: 500 }.to_instruction(), "Wait(500);");
    }

    #[test]
    fn test_descriptions() {
        let speed = ActionKind::Speed {
            value: -5.0,
            relative: true,
        };
        assert_eq!(speed.to_string(), "Decrease speed by 5 mm/s");

        let temperature = ActionKind::Temperature {
            value: 200.0,
            part: RobotPartType::Extruder,
            wait: true,
            relative: false,
        };
        assert_eq!(temperature.to_string(), "Set extruder temperature to 200 C and wait");
    }

    #[test]
    fn test_unissued_action() {
        let action = Action::new(ActionKind::DetachTool);
        assert_eq!(action.id(), Action::UNISSUED_ID);
        assert!(!action.is_issued());
        assert_eq!(action.action_type(), ActionType::DetachTool);
    }
}
