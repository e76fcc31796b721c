//! Universal Robots URScript compiler.
//!
//! URScript works in meters and radians, with orientations as rotation
//! vectors.

use std::collections::HashSet;

use machina_geometry::{Rotation, Vector};

use super::{annotate, invalid, replay, single_file_program, unsupported, Compiler, RobotBrand};
use crate::action::{Action, ActionKind};
use crate::config::CompileOptions;
use crate::cursor::RobotCursor;
use crate::error::Result;
use crate::format::{join_nums, num, quoted, xyz, M_DECIMALS, RAD_DECIMALS, TIME_DECIMALS, VOLTAGE_DECIMALS};
use crate::program::{Encoding, Program, ProgramBuilder, Section};
use crate::tool::Tool;
use crate::types::MotionType;

const COMMENT: &str = "#";
const INDENT: &str = "  ";

const MM_TO_M: f64 = 0.001;

/// Controller defaults for linear motions, m/s²
const DEFAULT_LINEAR_ACCELERATION: f64 = 1.2;
/// Controller defaults for joint motions, rad/s² and rad/s
const DEFAULT_JOINT_ACCELERATION: f64 = 1.4;
const DEFAULT_JOINT_SPEED: f64 = 1.05;

/// Standard digital outputs are 0..=7, tool digital outputs 0..=1.
const MAX_DIGITAL_PIN: u32 = 7;
const MAX_TOOL_DIGITAL_PIN: u32 = 1;
/// Standard analog outputs are 0..=1, driven with values in 0..=1.
const MAX_ANALOG_PIN: u32 = 1;

/// Compiles to a single URScript file (`.script`) with one function.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrCompiler;

impl Compiler for UrCompiler {
    fn brand(&self) -> RobotBrand {
        RobotBrand::Ur
    }

    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program> {
        let mut writer = UrWriter {
            options,
            builder: ProgramBuilder::new(),
            declared: HashSet::new(),
        };
        replay(cursor, options, |action, cursor| {
            writer.render(action, cursor);
            Ok(())
        })?;

        writer.builder.push(Section::Header, format!("def {}():", program_name));
        writer.builder.push(Section::MainClose, "end");
        let lines = writer.builder.build();
        Ok(single_file_program(program_name, RobotBrand::Ur, "script", COMMENT, Encoding::Ascii, lines))
    }
}

/// `p[x, y, z, rx, ry, rz]` in meters and radians.
fn pose_literal(position: &Vector, rotation: &Rotation) -> String {
    format!(
        "p[{},{}]",
        xyz(position, MM_TO_M, M_DECIMALS),
        xyz(&rotation.rotation_vector().to_radians(), 1.0, RAD_DECIMALS)
    )
}

fn parse_pin(pin_id: &str) -> Option<u32> {
    pin_id.trim().parse().ok()
}

fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

struct UrWriter<'a> {
    options: &'a CompileOptions,
    builder: ProgramBuilder,
    declared: HashSet<String>,
}

impl UrWriter<'_> {
    fn main(&mut self, action: &Action, line: String) {
        let line = annotate(format!("{}{}", INDENT, line), action, COMMENT, self.options);
        self.builder.push(Section::Main, line);
    }

    fn main_raw(&mut self, line: String) {
        self.builder.push(Section::Main, format!("{}{}", INDENT, line));
    }

    /// The literal, or a variable assigned in the declarations block.
    fn target(&mut self, name: String, literal: String) -> String {
        if self.options.inline_targets {
            return literal;
        }
        if self.declared.insert(name.clone()) {
            self.builder.push(Section::Targets, format!("{}{}={}", INDENT, name, literal));
        }
        name
    }

    fn linear_parameters(cursor: &RobotCursor) -> String {
        let acceleration = if cursor.acceleration() > 0.0 {
            cursor.acceleration() * MM_TO_M
        } else {
            DEFAULT_LINEAR_ACCELERATION
        };
        format!(
            "a={}, v={}, r={}",
            num(acceleration, M_DECIMALS),
            num(cursor.speed() * MM_TO_M, M_DECIMALS),
            num(cursor.precision() * MM_TO_M, M_DECIMALS)
        )
    }

    fn joint_parameters(cursor: &RobotCursor) -> String {
        format!(
            "a={}, v={}, r={}",
            DEFAULT_JOINT_ACCELERATION,
            DEFAULT_JOINT_SPEED,
            num(cursor.precision() * MM_TO_M, M_DECIMALS)
        )
    }

    fn attach_lines(tool: &Tool) -> Vec<String> {
        vec![
            format!("set_tcp({})", pose_literal(&tool.tcp_position, &tool.tcp_orientation)),
            format!(
                "set_payload({}, [{}])",
                num(tool.weight, 3),
                xyz(&tool.center_of_gravity, MM_TO_M, M_DECIMALS)
            ),
        ]
    }

    fn render(&mut self, action: &Action, cursor: &RobotCursor) {
        match action.kind() {
            ActionKind::Translation { .. } | ActionKind::Rotation { .. } | ActionKind::Transformation { .. } => {
                let (Some(position), Some(rotation)) = (cursor.position(), cursor.rotation()) else {
                    self.main_raw(invalid(action, COMMENT, "Cartesian target is unknown"));
                    return;
                };
                let target = self.target(format!("target{}", action.id()), pose_literal(&position, &rotation));
                let line = match cursor.motion_type() {
                    MotionType::Linear => format!("movel({}, {})", target, Self::linear_parameters(cursor)),
                    MotionType::Joint => format!("movej({}, {})", target, Self::joint_parameters(cursor)),
                };
                self.main(action, line);
            }
            ActionKind::Axes { .. } => {
                let Some(axes) = cursor.axes() else {
                    self.main_raw(invalid(action, COMMENT, "joint target is unknown"));
                    return;
                };
                let literal = format!("[{}]", join_nums(&axes.to_radians(), RAD_DECIMALS, ","));
                let target = self.target(format!("target{}", action.id()), literal);
                let line = format!("movej({}, {})", target, Self::joint_parameters(cursor));
                self.main(action, line);
            }
            ActionKind::ArcMotion {
                through,
                relative,
                position_only,
                ..
            } => {
                let through_plane = match cursor.compute_through_plane(through, *relative, *position_only) {
                    Ok(Some(plane)) => plane,
                    Ok(None) => {
                        self.main_raw(invalid(action, COMMENT, "arc through point is unknown"));
                        return;
                    }
                    Err(error) => {
                        self.main_raw(invalid(action, COMMENT, &error.to_string()));
                        return;
                    }
                };
                let (Some(position), Some(rotation)) = (cursor.position(), cursor.rotation()) else {
                    self.main_raw(invalid(action, COMMENT, "arc end target is unknown"));
                    return;
                };
                let via = self.target(
                    format!("through{}", action.id()),
                    pose_literal(&through_plane.origin, &through_plane.rotation),
                );
                let end = self.target(format!("target{}", action.id()), pose_literal(&position, &rotation));
                let line = format!("movec({}, {}, {})", via, end, Self::linear_parameters(cursor));
                self.main(action, line);
            }
            ActionKind::Wait { millis } => {
                self.main(action, format!("sleep({})", num(*millis as f64 / 1000.0, TIME_DECIMALS)));
            }
            ActionKind::Message { text } => {
                let line = format!("popup({}, title=\"Machina Message\", warning=False, error=False)", quoted(text));
                self.main(action, line);
            }
            ActionKind::Comment { text } => self.main_raw(format!("{} {}", COMMENT, text)),
            ActionKind::AttachTool { .. } => {
                let Some(tool) = cursor.tool() else {
                    self.main_raw(invalid(action, COMMENT, "no tool attached"));
                    return;
                };
                for line in Self::attach_lines(tool) {
                    self.main(action, line);
                }
            }
            ActionKind::DetachTool => {
                self.main(action, "set_tcp(p[0,0,0,0,0,0])".to_string());
                self.main(action, "set_payload(0, [0,0,0])".to_string());
            }
            ActionKind::IODigital { pin_id, on, tool_pin } => {
                let max = if *tool_pin { MAX_TOOL_DIGITAL_PIN } else { MAX_DIGITAL_PIN };
                match parse_pin(pin_id).filter(|pin| *pin <= max) {
                    Some(pin) => {
                        let function = if *tool_pin { "set_tool_digital_out" } else { "set_standard_digital_out" };
                        self.main(action, format!("{}({}, {})", function, pin, python_bool(*on)));
                    }
                    None => {
                        let reason = format!("digital pin {} is out of range 0..={}", quoted(pin_id), max);
                        self.main_raw(invalid(action, COMMENT, &reason));
                    }
                }
            }
            ActionKind::IOAnalog {
                pin_id,
                value,
                tool_pin,
            } => {
                if *tool_pin {
                    self.main_raw(unsupported(action, COMMENT, RobotBrand::Ur));
                    return;
                }
                let Some(pin) = parse_pin(pin_id).filter(|pin| *pin <= MAX_ANALOG_PIN) else {
                    let reason = format!("analog pin {} is out of range 0..={}", quoted(pin_id), MAX_ANALOG_PIN);
                    self.main_raw(invalid(action, COMMENT, &reason));
                    return;
                };
                if !(0.0..=1.0).contains(value) {
                    let reason = format!("analog value {} is out of range 0..=1", num(*value, VOLTAGE_DECIMALS));
                    self.main_raw(invalid(action, COMMENT, &reason));
                    return;
                }
                self.main(action, format!("set_standard_analog_out({}, {})", pin, num(*value, VOLTAGE_DECIMALS)));
            }
            ActionKind::CustomCode {
                statement,
                is_declaration,
            } => {
                if *is_declaration {
                    if self.declared.insert(format!("custom:{}", statement)) {
                        self.builder.push(Section::Custom, format!("{}{}", INDENT, statement));
                    }
                } else {
                    self.main(action, statement.clone());
                }
            }
            ActionKind::Temperature { .. }
            | ActionKind::Extrusion { .. }
            | ActionKind::ExtrusionRate { .. }
            | ActionKind::ExternalAxis { .. }
            | ActionKind::ArmAngle { .. } => self.main_raw(unsupported(action, COMMENT, RobotBrand::Ur)),
            ActionKind::Speed { .. }
            | ActionKind::Acceleration { .. }
            | ActionKind::Precision { .. }
            | ActionKind::MotionMode { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::PopSettings
            | ActionKind::DefineTool { .. }
            | ActionKind::Initialization { .. } => {}
        }
    }
}
