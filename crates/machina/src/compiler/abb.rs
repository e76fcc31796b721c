//! ABB RAPID compiler.

use std::collections::HashSet;

use machina_geometry::{Rotation, Vector};

use super::{annotate, invalid, replay, single_file_program, unsupported, Compiler, RobotBrand};
use crate::action::{Action, ActionKind};
use crate::config::CompileOptions;
use crate::cursor::{RobotCursor, EXTERNAL_AXES_COUNT};
use crate::error::Result;
use crate::format::{join_nums, name_safe, num, truncate, xyz, DEG_DECIMALS, MM_DECIMALS, QUAT_DECIMALS, TIME_DECIMALS};
use crate::program::{Encoding, Program, ProgramBuilder, Section};
use crate::tool::Tool;
use crate::types::MotionType;

const COMMENT: &str = "!";
const INDENT: &str = "  ";
const BODY_INDENT: &str = "    ";

/// Speeds with a `v<speed>` speeddata built into the controller.
const PREDEFINED_SPEEDS: [u32; 25] = [
    5, 10, 20, 30, 40, 50, 60, 80, 100, 150, 200, 300, 400, 500, 600, 800, 1000, 1500, 2000, 2500, 3000, 4000, 5000,
    6000, 7000,
];

/// Radii with a `z<radius>` zonedata built into the controller.
const PREDEFINED_ZONES: [u32; 14] = [0, 1, 5, 10, 15, 20, 30, 40, 50, 60, 80, 100, 150, 200];

/// TPWrite truncates longer strings.
const MESSAGE_MAX_CHARS: usize = 80;

/// External axis value RAPID uses for "not connected".
const EXTAX_UNSET: &str = "9E9";

/// Compiles to a single RAPID module (`.mod`) with a `main` procedure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbbCompiler;

impl Compiler for AbbCompiler {
    fn brand(&self) -> RobotBrand {
        RobotBrand::Abb
    }

    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program> {
        let mut writer = AbbWriter::new(options);
        replay(cursor, options, |action, cursor| {
            writer.render(action, cursor);
            Ok(())
        })?;

        let lines = writer.finish(program_name);
        Ok(single_file_program(program_name, RobotBrand::Abb, "mod", COMMENT, Encoding::Ascii, lines))
    }
}

/// Is `value` an integer contained in `table`?
fn predefined(value: f64, table: &[u32]) -> Option<u32> {
    if value < 0.0 || (value - value.round()).abs() > 1e-9 {
        return None;
    }
    let rounded = value.round() as u32;
    table.contains(&rounded).then_some(rounded)
}

fn quaternion(rotation: &Rotation) -> String {
    let (w, x, y, z) = rotation.quaternion();
    join_nums(&[w, x, y, z], QUAT_DECIMALS, ",")
}

fn extax(axes: &[Option<f64>; EXTERNAL_AXES_COUNT]) -> String {
    axes.iter()
        .map(|axis| axis.map_or_else(|| EXTAX_UNSET.to_string(), |value| num(value, MM_DECIMALS)))
        .collect::<Vec<_>>()
        .join(",")
}

/// RAPID signal name for a pin: numeric pins get a prefix.
fn signal_name(pin_id: &str, prefix: &str) -> String {
    if pin_id.chars().all(|c| c.is_ascii_digit()) {
        format!("{}_{}", prefix, pin_id)
    } else {
        pin_id.to_string()
    }
}

struct AbbWriter<'a> {
    options: &'a CompileOptions,
    builder: ProgramBuilder,
    /// Tool declarations by name, first definition order, last definition wins
    tools: Vec<(String, String)>,
    declared: HashSet<String>,
}

impl<'a> AbbWriter<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            builder: ProgramBuilder::new(),
            tools: Vec::new(),
            declared: HashSet::new(),
        }
    }

    fn finish(mut self, program_name: &str) -> Vec<String> {
        self.builder.push(Section::Header, format!("MODULE {}", program_name));

        for (index, (_, line)) in self.tools.iter().enumerate() {
            if index == 0 {
                self.builder.push(Section::Tools, format!("{}{} Tool data declarations", INDENT, COMMENT));
            }
            self.builder.push(Section::Tools, line.clone());
        }

        self.builder.push(Section::MainOpen, format!("{}PROC main()", INDENT));
        self.builder.push(Section::MainOpen, format!("{}ConfJ \\Off;", BODY_INDENT));
        self.builder.push(Section::MainOpen, format!("{}ConfL \\Off;", BODY_INDENT));
        self.builder.push(Section::MainClose, format!("{}ENDPROC", INDENT));
        self.builder.push(Section::Footer, "ENDMODULE");
        self.builder.build()
    }

    /// Push `line` to a declaration section, with the section title first.
    fn declare(&mut self, section: Section, title: &str, name: &str, line: String) {
        if !self.declared.insert(name.to_string()) {
            return;
        }
        if self.builder.is_empty(section) {
            self.builder.push(section, format!("{}{} {}", INDENT, COMMENT, title));
        }
        self.builder.push(section, format!("{}{}", INDENT, line));
    }

    fn main(&mut self, action: &Action, line: String) {
        let line = annotate(format!("{}{}", BODY_INDENT, line), action, COMMENT, self.options);
        self.builder.push(Section::Main, line);
    }

    fn main_raw(&mut self, line: String) {
        self.builder.push(Section::Main, format!("{}{}", BODY_INDENT, line));
    }

    fn speed_name(&mut self, speed: f64) -> String {
        if let Some(predefined) = predefined(speed, &PREDEFINED_SPEEDS) {
            return format!("v{}", predefined);
        }
        let name = format!("vel{}", name_safe(speed, MM_DECIMALS));
        let line = format!("CONST speeddata {}:=[{},500,5000,1000];", name, num(speed, MM_DECIMALS));
        self.declare(Section::Speeds, "Speed data declarations", &name, line);
        name
    }

    fn zone_name(&mut self, precision: f64) -> String {
        if precision <= 0.0 {
            return "fine".to_string();
        }
        if let Some(predefined) = predefined(precision, &PREDEFINED_ZONES) {
            return format!("z{}", predefined);
        }
        let name = format!("zone{}", name_safe(precision, MM_DECIMALS));
        let line = format!(
            "CONST zonedata {}:=[FALSE,{},{},{},{},{},{}];",
            name,
            num(precision, MM_DECIMALS),
            num(1.5 * precision, MM_DECIMALS),
            num(1.5 * precision, MM_DECIMALS),
            num(0.15 * precision, MM_DECIMALS),
            num(1.5 * precision, MM_DECIMALS),
            num(0.15 * precision, MM_DECIMALS)
        );
        self.declare(Section::Zones, "Zone data declarations", &name, line);
        name
    }

    fn define_tool(&mut self, tool: &Tool) {
        let line = format!(
            "{}PERS tooldata {}:=[TRUE,[[{}],[{}]],[{},[{}],[1,0,0,0],0,0,0]];",
            INDENT,
            tool.name(),
            xyz(&tool.tcp_position, 1.0, MM_DECIMALS),
            quaternion(&tool.tcp_orientation),
            num(tool.weight.max(0.001), 3),
            xyz(&tool.center_of_gravity, 1.0, MM_DECIMALS)
        );
        match self.tools.iter_mut().find(|(name, _)| name.as_str() == tool.name()) {
            Some(entry) => entry.1 = line,
            None => self.tools.push((tool.name().to_string(), line)),
        }
    }

    fn robtarget(cursor: &RobotCursor, pose_override: Option<(Vector, Rotation)>) -> Option<String> {
        let (position, rotation) = match pose_override {
            Some(pose) => pose,
            None => (cursor.position()?, cursor.rotation()?),
        };
        Some(format!(
            "[[{}],[{}],[0,0,0,0],[{}]]",
            xyz(&position, 1.0, MM_DECIMALS),
            quaternion(&rotation),
            extax(cursor.external_axes_cartesian())
        ))
    }

    fn jointtarget(cursor: &RobotCursor) -> Option<String> {
        let axes = cursor.axes()?;
        Some(format!(
            "[[{}],[{}]]",
            join_nums(&axes.values(), DEG_DECIMALS, ","),
            extax(cursor.external_axes_joint())
        ))
    }

    /// The target literal, or the name of a declared constant holding it.
    fn target(&mut self, data_type: &str, name: String, data: String) -> String {
        if self.options.inline_targets {
            return data;
        }
        let line = format!("CONST {} {}:={};", data_type, name, data);
        self.declare(Section::Targets, "Target declarations", &name, line);
        name
    }

    fn motion_suffix(&mut self, cursor: &RobotCursor) -> String {
        let speed = self.speed_name(cursor.speed());
        let zone = self.zone_name(cursor.precision());
        let tool = cursor.tool().map_or("tool0", |tool| tool.name()).to_string();
        format!("{},{},{}\\WObj:=WObj0;", speed, zone, tool)
    }

    fn acceleration_line(acceleration: f64) -> String {
        if acceleration > 0.0 {
            format!("WorldAccLim \\On := {};", num(acceleration / 1000.0, 3))
        } else {
            "WorldAccLim \\Off;".to_string()
        }
    }

    fn render(&mut self, action: &Action, cursor: &RobotCursor) {
        match action.kind() {
            ActionKind::Translation { .. } | ActionKind::Rotation { .. } | ActionKind::Transformation { .. } => {
                let Some(data) = Self::robtarget(cursor, None) else {
                    self.main_raw(invalid(action, COMMENT, "Cartesian target is unknown"));
                    return;
                };
                let target = self.target("robtarget", format!("target{}", action.id()), data);
                let instruction = match cursor.motion_type() {
                    MotionType::Linear => "MoveL",
                    MotionType::Joint => "MoveJ",
                };
                let suffix = self.motion_suffix(cursor);
                self.main(action, format!("{} {},{}", instruction, target, suffix));
            }
            ActionKind::Axes { .. } => {
                let Some(data) = Self::jointtarget(cursor) else {
                    self.main_raw(invalid(action, COMMENT, "joint target is unknown"));
                    return;
                };
                let target = self.target("jointtarget", format!("target{}", action.id()), data);
                let suffix = self.motion_suffix(cursor);
                self.main(action, format!("MoveAbsJ {},{}", target, suffix));
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
                let (Some(through_data), Some(end_data)) = (
                    Self::robtarget(cursor, Some((through_plane.origin, through_plane.rotation))),
                    Self::robtarget(cursor, None),
                ) else {
                    self.main_raw(invalid(action, COMMENT, "arc end target is unknown"));
                    return;
                };
                let through_target = self.target("robtarget", format!("through{}", action.id()), through_data);
                let end_target = self.target("robtarget", format!("target{}", action.id()), end_data);
                let suffix = self.motion_suffix(cursor);
                self.main(action, format!("MoveC {},{},{}", through_target, end_target, suffix));
            }
            ActionKind::Acceleration { .. } => {
                let line = Self::acceleration_line(cursor.acceleration());
                self.main(action, line);
            }
            ActionKind::PopSettings => {
                let changed = cursor
                    .settings_buffer()
                    .settings_before_pop()
                    .is_some_and(|before| before.acceleration != cursor.acceleration());
                if changed {
                    let line = Self::acceleration_line(cursor.acceleration());
                    self.main(action, line);
                }
            }
            ActionKind::Wait { millis } => {
                self.main(action, format!("WaitTime {};", num(*millis as f64 / 1000.0, TIME_DECIMALS)));
            }
            ActionKind::Message { text } => {
                let text = truncate(&text.replace('"', "'"), MESSAGE_MAX_CHARS);
                self.main(action, format!("TPWrite \"{}\";", text));
            }
            ActionKind::Comment { text } => self.main_raw(format!("{} {}", COMMENT, text)),
            ActionKind::DefineTool { tool } => self.define_tool(tool),
            ActionKind::IODigital { pin_id, on, .. } => {
                let line = format!("SetDO {}, {};", signal_name(pin_id, "DO"), u8::from(*on));
                self.main(action, line);
            }
            ActionKind::IOAnalog { pin_id, value, .. } => {
                let line = format!("SetAO {}, {};", signal_name(pin_id, "AO"), num(*value, 3));
                self.main(action, line);
            }
            ActionKind::CustomCode {
                statement,
                is_declaration,
            } => {
                if *is_declaration {
                    let key = format!("custom:{}", statement);
                    self.declare(Section::Custom, "Custom declarations", &key, statement.clone());
                } else {
                    self.main(action, statement.clone());
                }
            }
            ActionKind::Temperature { .. }
            | ActionKind::Extrusion { .. }
            | ActionKind::ExtrusionRate { .. }
            | ActionKind::ArmAngle { .. } => self.main_raw(unsupported(action, COMMENT, RobotBrand::Abb)),
            // Carried in the state used by later motions
            ActionKind::Speed { .. }
            | ActionKind::Precision { .. }
            | ActionKind::MotionMode { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::AttachTool { .. }
            | ActionKind::DetachTool
            | ActionKind::ExternalAxis { .. }
            | ActionKind::Initialization { .. } => {}
        }
    }
}
