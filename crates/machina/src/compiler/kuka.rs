//! KUKA KRL compiler.
//!
//! KRL frames use Euler ZYX angles (A, B, C) of a tool frame whose X axis
//! points out of the flange, so orientations are rotated 90° around their
//! local Y axis before the angles are extracted.

use std::collections::HashSet;

use machina_geometry::{Rotation, Vector};

use super::{annotate, invalid, replay, single_file_program, unsupported, Compiler, RobotBrand};
use crate::action::{Action, ActionKind};
use crate::config::CompileOptions;
use crate::cursor::{RobotCursor, EXTERNAL_AXES_COUNT};
use crate::error::Result;
use crate::format::{num, quoted, DEG_DECIMALS, MM_DECIMALS, TIME_DECIMALS, VOLTAGE_DECIMALS};
use crate::program::{Encoding, Program, ProgramBuilder, Section};
use crate::settings::Settings;
use crate::tool::Tool;
use crate::types::MotionType;

const COMMENT: &str = ";";
const INDENT: &str = "  ";

const MAX_DIGITAL_PIN: u32 = 4096;
const MAX_ANALOG_PIN: u32 = 32;

/// Compiles to a single KRL source file (`.src`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KukaCompiler;

impl Compiler for KukaCompiler {
    fn brand(&self) -> RobotBrand {
        RobotBrand::Kuka
    }

    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program> {
        let mut writer = KukaWriter {
            options,
            builder: ProgramBuilder::new(),
            declared: HashSet::new(),
        };
        replay(cursor, options, |action, cursor| {
            writer.render(action, cursor);
            Ok(())
        })?;

        writer.builder.push(Section::Header, "&ACCESS RVP");
        writer.builder.push(Section::Header, "&REL 1");
        writer.builder.push(Section::Header, format!("DEF {}()", program_name));
        writer.builder.push(Section::MainClose, "END");
        let lines = writer.builder.build();
        Ok(single_file_program(program_name, RobotBrand::Kuka, "src", COMMENT, Encoding::Ascii, lines))
    }
}

/// `(A, B, C)` of `rotation` in KUKA's convention.
fn kuka_angles(rotation: &Rotation) -> (f64, f64, f64) {
    let adjusted = *rotation * Rotation::from_axis_angle(Vector::y_axis(), 90.0);
    let ypr = adjusted.euler_zyx();
    (ypr.yaw, ypr.pitch, ypr.roll)
}

fn frame_fields(position: &Vector, rotation: &Rotation) -> String {
    let (a, b, c) = kuka_angles(rotation);
    format!(
        "X {},Y {},Z {},A {},B {},C {}",
        num(position.x(), MM_DECIMALS),
        num(position.y(), MM_DECIMALS),
        num(position.z(), MM_DECIMALS),
        num(a, DEG_DECIMALS),
        num(b, DEG_DECIMALS),
        num(c, DEG_DECIMALS)
    )
}

/// `,E1 v,...` for every set external axis.
fn external_fields(axes: &[Option<f64>; EXTERNAL_AXES_COUNT]) -> String {
    axes.iter()
        .enumerate()
        .filter_map(|(index, axis)| axis.map(|value| format!(",E{} {}", index + 1, num(value, MM_DECIMALS))))
        .collect()
}

fn parse_pin(pin_id: &str) -> Option<u32> {
    pin_id.trim().parse().ok()
}

struct KukaWriter<'a> {
    options: &'a CompileOptions,
    builder: ProgramBuilder,
    declared: HashSet<String>,
}

impl KukaWriter<'_> {
    fn main(&mut self, action: &Action, line: String) {
        let line = annotate(format!("{}{}", INDENT, line), action, COMMENT, self.options);
        self.builder.push(Section::Main, line);
    }

    fn main_raw(&mut self, line: String) {
        self.builder.push(Section::Main, format!("{}{}", INDENT, line));
    }

    /// Literal `{...}`, or the name of a `DECL`ared variable holding it.
    fn target(&mut self, data_type: &str, name: String, fields: String) -> String {
        let literal = format!("{{{}}}", fields);
        if self.options.inline_targets {
            return literal;
        }
        if self.declared.insert(name.clone()) {
            self.builder
                .push(Section::Targets, format!("{}DECL {} {}={}", INDENT, data_type, name, literal));
        }
        name
    }

    fn cartesian_target(&mut self, name: String, position: &Vector, rotation: &Rotation, cursor: &RobotCursor) -> String {
        let fields = format!(
            "{}{}",
            frame_fields(position, rotation),
            external_fields(cursor.external_axes_cartesian())
        );
        self.target("E6POS", name, fields)
    }

    fn approximation(cursor: &RobotCursor) -> &'static str {
        if cursor.precision() > 0.0 { " C_DIS" } else { "" }
    }

    fn speed_line(settings: &Settings) -> String {
        format!("$VEL.CP = {}", num(settings.speed / 1000.0, 6))
    }

    fn acceleration_line(settings: &Settings) -> String {
        format!("$ACC.CP = {}", num(settings.acceleration / 1000.0, 6))
    }

    fn precision_line(settings: &Settings) -> String {
        format!("$APO.CDIS = {}", num(settings.precision, MM_DECIMALS))
    }

    fn tool_lines(tool: &Tool) -> Vec<String> {
        let (a, b, c) = {
            let ypr = tool.tcp_orientation.euler_zyx();
            (ypr.yaw, ypr.pitch, ypr.roll)
        };
        vec![
            format!(
                "$TOOL = {{X {},Y {},Z {},A {},B {},C {}}}",
                num(tool.tcp_position.x(), MM_DECIMALS),
                num(tool.tcp_position.y(), MM_DECIMALS),
                num(tool.tcp_position.z(), MM_DECIMALS),
                num(a, DEG_DECIMALS),
                num(b, DEG_DECIMALS),
                num(c, DEG_DECIMALS)
            ),
            format!("$LOAD.M = {}", num(tool.weight, 3)),
        ]
    }

    fn render(&mut self, action: &Action, cursor: &RobotCursor) {
        match action.kind() {
            ActionKind::Translation { .. } | ActionKind::Rotation { .. } | ActionKind::Transformation { .. } => {
                let (Some(position), Some(rotation)) = (cursor.position(), cursor.rotation()) else {
                    self.main_raw(invalid(action, COMMENT, "Cartesian target is unknown"));
                    return;
                };
                let target = self.cartesian_target(format!("target{}", action.id()), &position, &rotation, cursor);
                let instruction = match cursor.motion_type() {
                    MotionType::Linear => "LIN",
                    MotionType::Joint => "PTP",
                };
                let line = format!("{} {}{}", instruction, target, Self::approximation(cursor));
                self.main(action, line);
            }
            ActionKind::Axes { .. } => {
                let Some(axes) = cursor.axes() else {
                    self.main_raw(invalid(action, COMMENT, "joint target is unknown"));
                    return;
                };
                let joints: Vec<String> = axes
                    .values()
                    .iter()
                    .enumerate()
                    .map(|(index, value)| format!("A{} {}", index + 1, num(*value, DEG_DECIMALS)))
                    .collect();
                let fields = format!("{}{}", joints.join(","), external_fields(cursor.external_axes_joint()));
                let target = self.target("E6AXIS", format!("target{}", action.id()), fields);
                let line = format!("PTP {}{}", target, Self::approximation(cursor));
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
                let via = self.cartesian_target(
                    format!("through{}", action.id()),
                    &through_plane.origin,
                    &through_plane.rotation,
                    cursor,
                );
                let end = self.cartesian_target(format!("target{}", action.id()), &position, &rotation, cursor);
                let line = format!("CIRC {}, {}{}", via, end, Self::approximation(cursor));
                self.main(action, line);
            }
            ActionKind::Speed { .. } => self.main(action, Self::speed_line(cursor.settings())),
            ActionKind::Acceleration { .. } => {
                if cursor.acceleration() > 0.0 {
                    self.main(action, Self::acceleration_line(cursor.settings()));
                }
            }
            ActionKind::Precision { .. } => self.main(action, Self::precision_line(cursor.settings())),
            ActionKind::PopSettings => {
                // KRL system variables keep their value, so restore what changed
                let Some(before) = cursor.settings_buffer().settings_before_pop().copied() else {
                    return;
                };
                let after = cursor.settings();
                if before.speed != after.speed {
                    self.main(action, Self::speed_line(after));
                }
                if before.acceleration != after.acceleration && after.acceleration > 0.0 {
                    self.main(action, Self::acceleration_line(after));
                }
                if before.precision != after.precision {
                    self.main(action, Self::precision_line(after));
                }
            }
            ActionKind::Wait { millis } => {
                self.main(action, format!("WAIT SEC {}", num(*millis as f64 / 1000.0, TIME_DECIMALS)));
            }
            ActionKind::Message { text } => self.main(action, format!("MsgNotify({})", quoted(text))),
            ActionKind::Comment { text } => self.main_raw(format!("{} {}", COMMENT, text)),
            ActionKind::AttachTool { .. } => {
                let Some(tool) = cursor.tool() else {
                    self.main_raw(invalid(action, COMMENT, "no tool attached"));
                    return;
                };
                for line in Self::tool_lines(tool) {
                    self.main(action, line);
                }
            }
            ActionKind::DetachTool => {
                self.main(action, "$TOOL = $NULLFRAME".to_string());
                self.main(action, "$LOAD.M = 0".to_string());
            }
            ActionKind::IODigital { pin_id, on, .. } => match parse_pin(pin_id).filter(|pin| (1..=MAX_DIGITAL_PIN).contains(pin)) {
                Some(pin) => {
                    let state = if *on { "TRUE" } else { "FALSE" };
                    self.main(action, format!("$OUT[{}] = {}", pin, state));
                }
                None => {
                    let reason = format!("digital pin {} is out of range 1..={}", quoted(pin_id), MAX_DIGITAL_PIN);
                    self.main_raw(invalid(action, COMMENT, &reason));
                }
            },
            ActionKind::IOAnalog { pin_id, value, .. } => {
                let Some(pin) = parse_pin(pin_id).filter(|pin| (1..=MAX_ANALOG_PIN).contains(pin)) else {
                    let reason = format!("analog pin {} is out of range 1..={}", quoted(pin_id), MAX_ANALOG_PIN);
                    self.main_raw(invalid(action, COMMENT, &reason));
                    return;
                };
                if !(-1.0..=1.0).contains(value) {
                    let reason = format!("analog value {} is out of range -1..=1", num(*value, VOLTAGE_DECIMALS));
                    self.main_raw(invalid(action, COMMENT, &reason));
                    return;
                }
                self.main(action, format!("$ANOUT[{}] = {}", pin, num(*value, VOLTAGE_DECIMALS)));
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
            | ActionKind::ArmAngle { .. } => self.main_raw(unsupported(action, COMMENT, RobotBrand::Kuka)),
            ActionKind::MotionMode { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::DefineTool { .. }
            | ActionKind::ExternalAxis { .. }
            | ActionKind::Initialization { .. } => {}
        }
    }
}
