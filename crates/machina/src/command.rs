//! Structured commands: `{"command": "MoveTo", "args": [100, 200, 300]}`.
//!
//! Command names are the ones [`ActionKind::to_instruction`] prints, so a
//! program compiled with the human-readable compiler lists exactly the
//! commands that rebuild it. Every name maps to a typed factory in a static
//! table; arguments are positional JSON values.

use std::collections::HashMap;
use std::sync::OnceLock;

use machina_geometry::{Joints, Plane, Rotation, Vector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionKind;
use crate::error::{MachinaError, Result};
use crate::tool::Tool;
use crate::types::{ExternalAxesTarget, MotionType, ReferenceCS, RobotPartType};

/// A command name plus positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name, e.g. `MoveTo`.
    pub command: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Command {
    /// A command from its name and arguments.
    pub fn new(command: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Parse the `{"command": ..., "args": [...]}` form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve against the shared registry.
    pub fn to_action(&self) -> Result<ActionKind> {
        CommandRegistry::global().resolve(self)
    }
}

type Factory = fn(&Args<'_>) -> Result<ActionKind>;

// ============================================================================
// Command table
// ============================================================================

const COMMANDS: &[(&str, Factory)] = &[
    ("Move", |a| translation(a, true)),
    ("MoveTo", |a| translation(a, false)),
    ("Rotate", |a| rotation(a, true)),
    ("RotateTo", |a| rotation(a, false)),
    ("Transform", |a| transformation(a, true)),
    ("TransformTo", |a| transformation(a, false)),
    ("Axes", |a| axes(a, true)),
    ("AxesTo", |a| axes(a, false)),
    ("ArcMotion", |a| arc_motion(a, true)),
    ("ArcMotionTo", |a| arc_motion(a, false)),
    ("Speed", |a| Ok(ActionKind::Speed { value: single(a)?, relative: true })),
    ("SpeedTo", |a| Ok(ActionKind::Speed { value: single(a)?, relative: false })),
    ("Acceleration", |a| Ok(ActionKind::Acceleration { value: single(a)?, relative: true })),
    ("AccelerationTo", |a| Ok(ActionKind::Acceleration { value: single(a)?, relative: false })),
    ("Precision", |a| Ok(ActionKind::Precision { value: single(a)?, relative: true })),
    ("PrecisionTo", |a| Ok(ActionKind::Precision { value: single(a)?, relative: false })),
    ("MotionMode", motion_mode),
    ("CoordinateSystem", coordinate_system),
    ("PushSettings", |a| a.expect(0..=0).map(|_| ActionKind::PushSettings)),
    ("PopSettings", |a| a.expect(0..=0).map(|_| ActionKind::PopSettings)),
    ("Wait", wait),
    ("Message", |a| Ok(ActionKind::Message { text: single_text(a)? })),
    ("Comment", |a| Ok(ActionKind::Comment { text: single_text(a)? })),
    ("DefineTool", define_tool),
    ("AttachTool", |a| Ok(ActionKind::AttachTool { name: single_text(a)? })),
    ("DetachTool", |a| a.expect(0..=0).map(|_| ActionKind::DetachTool)),
    ("WriteDigital", write_digital),
    ("WriteAnalog", write_analog),
    ("Temperature", |a| temperature(a, true)),
    ("TemperatureTo", |a| temperature(a, false)),
    ("Extrude", extrude),
    ("ExtrusionRate", |a| Ok(ActionKind::ExtrusionRate { value: single(a)?, relative: true })),
    ("ExtrusionRateTo", |a| Ok(ActionKind::ExtrusionRate { value: single(a)?, relative: false })),
    ("ExternalAxis", |a| external_axis(a, true)),
    ("ExternalAxisTo", |a| external_axis(a, false)),
    ("ArmAngle", |a| Ok(ActionKind::ArmAngle { value: single(a)?, relative: true })),
    ("ArmAngleTo", |a| Ok(ActionKind::ArmAngle { value: single(a)?, relative: false })),
    ("CustomCode", custom_code),
];

/// Name-to-factory lookup over the command table.
#[derive(Debug)]
pub struct CommandRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// A registry holding every built-in command.
    pub fn new() -> Self {
        Self {
            factories: COMMANDS.iter().copied().collect(),
        }
    }

    /// Registry shared by [`Command::to_action`].
    pub fn global() -> &'static CommandRegistry {
        static REGISTRY: OnceLock<CommandRegistry> = OnceLock::new();
        REGISTRY.get_or_init(CommandRegistry::new)
    }

    /// Whether `name` is a known command.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered command names in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        COMMANDS.iter().map(|(name, _)| *name)
    }

    /// Build the action `command` describes.
    pub fn resolve(&self, command: &Command) -> Result<ActionKind> {
        let factory = self
            .factories
            .get(command.command.as_str())
            .ok_or_else(|| MachinaError::InvalidCommand(format!("unknown command {:?}", command.command)))?;
        factory(&Args {
            command: &command.command,
            values: &command.args,
        })
    }
}

// ============================================================================
// Argument access
// ============================================================================

struct Args<'a> {
    command: &'a str,
    values: &'a [Value],
}

impl Args<'_> {
    fn error(&self, message: impl std::fmt::Display) -> MachinaError {
        MachinaError::InvalidCommand(format!("{}: {}", self.command, message))
    }

    fn expect(&self, counts: std::ops::RangeInclusive<usize>) -> Result<usize> {
        let len = self.values.len();
        if counts.contains(&len) {
            return Ok(len);
        }
        let expected = if counts.start() == counts.end() {
            counts.start().to_string()
        } else {
            format!("{} to {}", counts.start(), counts.end())
        };
        Err(self.error(format!("expected {} arguments, got {}", expected, len)))
    }

    fn expect_one_of(&self, counts: &[usize]) -> Result<usize> {
        let len = self.values.len();
        if counts.contains(&len) {
            Ok(len)
        } else {
            Err(self.error(format!("expected {:?} arguments, got {}", counts, len)))
        }
    }

    fn number(&self, index: usize) -> Result<f64> {
        self.values[index]
            .as_f64()
            .ok_or_else(|| self.error(format!("argument {} must be a number", index + 1)))
    }

    fn numbers<const N: usize>(&self, start: usize) -> Result<[f64; N]> {
        let mut values = [0.0; N];
        for (offset, value) in values.iter_mut().enumerate() {
            *value = self.number(start + offset)?;
        }
        Ok(values)
    }

    fn vector(&self, start: usize) -> Result<Vector> {
        let [x, y, z] = self.numbers::<3>(start)?;
        Ok(Vector::new(x, y, z))
    }

    /// Axis (3 numbers) plus angle in degrees.
    fn rotation(&self, start: usize) -> Result<Rotation> {
        let [x, y, z, angle] = self.numbers::<4>(start)?;
        Ok(Rotation::from_axis_angle(Vector::new(x, y, z), angle))
    }

    fn boolean(&self, index: usize) -> Result<bool> {
        self.values[index]
            .as_bool()
            .ok_or_else(|| self.error(format!("argument {} must be a boolean", index + 1)))
    }

    fn optional_boolean(&self, index: usize, default: bool) -> Result<bool> {
        if index < self.values.len() {
            self.boolean(index)
        } else {
            Ok(default)
        }
    }

    fn text(&self, index: usize) -> Result<String> {
        self.values[index]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.error(format!("argument {} must be a string", index + 1)))
    }

    /// Pin ids may be given as strings or integers.
    fn pin(&self, index: usize) -> Result<String> {
        match &self.values[index] {
            Value::String(pin) => Ok(pin.clone()),
            Value::Number(pin) if pin.is_u64() => Ok(pin.to_string()),
            _ => Err(self.error(format!("argument {} must be a pin name or number", index + 1))),
        }
    }

    fn parsed<T: std::str::FromStr<Err = MachinaError>>(&self, index: usize) -> Result<T> {
        self.text(index)?.parse()
    }
}

// ============================================================================
// Factories
// ============================================================================

fn single(args: &Args<'_>) -> Result<f64> {
    args.expect(1..=1)?;
    args.number(0)
}

fn single_text(args: &Args<'_>) -> Result<String> {
    args.expect(1..=1)?;
    args.text(0)
}

fn translation(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    args.expect(3..=3)?;
    Ok(ActionKind::Translation {
        translation: args.vector(0)?,
        relative,
    })
}

fn rotation(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    args.expect(4..=4)?;
    Ok(ActionKind::Rotation {
        rotation: args.rotation(0)?,
        relative,
    })
}

/// `x, y, z, axis_x, axis_y, axis_z, angle[, translation_first]`
fn transformation(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    args.expect(7..=8)?;
    Ok(ActionKind::Transformation {
        translation: args.vector(0)?,
        rotation: args.rotation(3)?,
        relative,
        translation_first: args.optional_boolean(7, true)?,
    })
}

fn axes(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    args.expect(6..=6)?;
    Ok(ActionKind::Axes {
        joints: Joints(args.numbers::<6>(0)?),
        relative,
    })
}

/// `through xyz, end xyz[, end axis_x, axis_y, axis_z, angle]`
///
/// Without an end orientation the arc only moves the position.
fn arc_motion(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    let count = args.expect_one_of(&[6, 10])?;
    let through = args.vector(0)?;
    let end = args.vector(3)?;
    let kind = if count == 6 {
        ActionKind::ArcMotion {
            through: Plane::from_origin(through),
            end: Plane::from_origin(end),
            relative,
            position_only: true,
        }
    } else {
        let rotation = args.rotation(6)?;
        ActionKind::ArcMotion {
            through: Plane::new(through, rotation),
            end: Plane::new(end, rotation),
            relative,
            position_only: false,
        }
    };
    Ok(kind)
}

fn motion_mode(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(1..=1)?;
    Ok(ActionKind::MotionMode {
        motion_type: args.parsed::<MotionType>(0)?,
    })
}

fn coordinate_system(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(1..=1)?;
    Ok(ActionKind::Coordinates {
        reference_cs: args.parsed::<ReferenceCS>(0)?,
    })
}

fn wait(args: &Args<'_>) -> Result<ActionKind> {
    let millis = single(args)?;
    if millis < 0.0 {
        return Err(args.error("wait time cannot be negative"));
    }
    Ok(ActionKind::Wait {
        millis: millis.round() as u64,
    })
}

/// `name, x, y, z, axis_x, axis_y, axis_z, angle, weight[, cog_x, cog_y, cog_z]`
fn define_tool(args: &Args<'_>) -> Result<ActionKind> {
    let count = args.expect_one_of(&[9, 12])?;
    let center_of_gravity = if count == 12 { args.vector(9)? } else { Vector::zero() };
    let tool = Tool::new(
        args.text(0)?,
        args.vector(1)?,
        args.rotation(4)?,
        args.number(8)?,
        center_of_gravity,
    )?;
    Ok(ActionKind::DefineTool { tool })
}

/// `pin, on[, tool_pin]`
fn write_digital(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(2..=3)?;
    Ok(ActionKind::IODigital {
        pin_id: args.pin(0)?,
        on: args.boolean(1)?,
        tool_pin: args.optional_boolean(2, false)?,
    })
}

/// `pin, value[, tool_pin]`
fn write_analog(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(2..=3)?;
    Ok(ActionKind::IOAnalog {
        pin_id: args.pin(0)?,
        value: args.number(1)?,
        tool_pin: args.optional_boolean(2, false)?,
    })
}

/// `value, part[, wait]`
fn temperature(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    args.expect(2..=3)?;
    Ok(ActionKind::Temperature {
        value: args.number(0)?,
        part: args.parsed::<RobotPartType>(1)?,
        wait: args.optional_boolean(2, false)?,
        relative,
    })
}

fn extrude(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(0..=1)?;
    Ok(ActionKind::Extrusion {
        on: args.optional_boolean(0, true)?,
    })
}

/// `axis_number, value[, target]`
fn external_axis(args: &Args<'_>, relative: bool) -> Result<ActionKind> {
    let count = args.expect(2..=3)?;
    let axis_number = args.values[0]
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| args.error("argument 1 must be an axis number"))?;
    let target = if count == 3 {
        args.parsed::<ExternalAxesTarget>(2)?
    } else {
        ExternalAxesTarget::All
    };
    Ok(ActionKind::ExternalAxis {
        axis_number,
        value: args.number(1)?,
        target,
        relative,
    })
}

/// `statement[, is_declaration]`
fn custom_code(args: &Args<'_>) -> Result<ActionKind> {
    args.expect(1..=2)?;
    Ok(ActionKind::CustomCode {
        statement: args.text(0)?,
        is_declaration: args.optional_boolean(1, false)?,
    })
}
