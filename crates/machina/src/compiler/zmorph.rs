//! ZMorph G-code compiler.
//!
//! A 3-axis printer: only the TCP position is used, orientation is ignored.
//! Extrusion is absolute (`M82`), so every extruding move carries the
//! cursor's cumulative extruded length.

use std::collections::HashSet;

use super::{annotate, invalid, replay, single_file_program, unsupported, Compiler, RobotBrand};
use crate::action::{Action, ActionKind};
use crate::config::CompileOptions;
use crate::cursor::RobotCursor;
use crate::error::Result;
use crate::format::{num, MM_DECIMALS, TEMPERATURE_DECIMALS};
use crate::program::{Encoding, Program, ProgramBuilder, Section};
use crate::types::{MotionType, RobotPartType};

const COMMENT: &str = ";";

/// Decimal places of the `E` parameter.
const EXTRUSION_DECIMALS: u32 = 5;

/// Compiles to a single G-code file (`.gcode`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZmorphCompiler;

impl Compiler for ZmorphCompiler {
    fn brand(&self) -> RobotBrand {
        RobotBrand::Zmorph
    }

    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program> {
        let mut writer = ZmorphWriter {
            options,
            builder: ProgramBuilder::new(),
            declared: HashSet::new(),
        };
        replay(cursor, options, |action, cursor| {
            writer.render(action, cursor);
            Ok(())
        })?;

        let builder = &mut writer.builder;
        builder.push(Section::Header, format!("{} {}", COMMENT, program_name));
        builder.push(Section::Header, format!("G21 {} millimeters", COMMENT));
        builder.push(Section::Header, format!("G90 {} absolute positioning", COMMENT));
        builder.push(Section::Header, format!("M82 {} absolute extrusion", COMMENT));
        builder.push(Section::Header, format!("G92 E0 {} reset extruder", COMMENT));
        builder.push(Section::Footer, format!("M104 S0 T0 {} extruder off", COMMENT));
        builder.push(Section::Footer, format!("M140 S0 {} bed off", COMMENT));
        builder.push(Section::Footer, format!("M84 {} motors off", COMMENT));

        let lines = writer.builder.build();
        Ok(single_file_program(program_name, RobotBrand::Zmorph, "gcode", COMMENT, Encoding::Ascii, lines))
    }
}

struct ZmorphWriter<'a> {
    options: &'a CompileOptions,
    builder: ProgramBuilder,
    declared: HashSet<String>,
}

impl ZmorphWriter<'_> {
    fn main(&mut self, action: &Action, line: String) {
        let line = annotate(line, action, COMMENT, self.options);
        self.builder.push(Section::Main, line);
    }

    fn main_raw(&mut self, line: String) {
        self.builder.push(Section::Main, line);
    }

    fn move_line(cursor: &RobotCursor) -> Option<String> {
        let position = cursor.position()?;
        let extruding = cursor.is_extruding();
        let command = if !extruding && cursor.motion_type() == MotionType::Joint { "G0" } else { "G1" };

        let mut line = format!(
            "{} X{} Y{} Z{} F{}",
            command,
            num(position.x(), MM_DECIMALS),
            num(position.y(), MM_DECIMALS),
            num(position.z(), MM_DECIMALS),
            num(cursor.speed() * 60.0, 0)
        );
        if extruding {
            line.push_str(&format!(" E{}", num(cursor.extruded_length(), EXTRUSION_DECIMALS)));
        }
        Some(line)
    }

    fn temperature_line(part: RobotPartType, value: f64, wait: bool) -> String {
        let value = num(value, TEMPERATURE_DECIMALS);
        match (part, wait) {
            (RobotPartType::Extruder, false) => format!("M104 S{} T0", value),
            (RobotPartType::Extruder, true) => format!("M109 S{} T0", value),
            (RobotPartType::Bed, false) => format!("M140 S{}", value),
            (RobotPartType::Bed, true) => format!("M190 S{}", value),
            (RobotPartType::Chamber, false) => format!("M141 S{}", value),
            (RobotPartType::Chamber, true) => format!("M191 S{}", value),
        }
    }

    fn render(&mut self, action: &Action, cursor: &RobotCursor) {
        match action.kind() {
            ActionKind::Translation { .. } | ActionKind::Transformation { .. } => match Self::move_line(cursor) {
                Some(line) => self.main(action, line),
                None => self.main_raw(invalid(action, COMMENT, "position is unknown")),
            },
            ActionKind::Temperature { part, wait, .. } => {
                let line = Self::temperature_line(*part, cursor.temperature(*part), *wait);
                self.main(action, line);
            }
            ActionKind::Wait { millis } => self.main(action, format!("G4 P{}", millis)),
            ActionKind::Message { text } => self.main(action, format!("M117 {}", text.replace(['\n', '\r'], " "))),
            ActionKind::Comment { text } => self.main_raw(format!("{} {}", COMMENT, text)),
            ActionKind::Acceleration { .. } => {
                if cursor.acceleration() > 0.0 {
                    self.main(action, format!("M204 S{}", num(cursor.acceleration(), MM_DECIMALS)));
                }
            }
            ActionKind::CustomCode {
                statement,
                is_declaration,
            } => {
                if *is_declaration {
                    if self.declared.insert(statement.clone()) {
                        self.builder.push(Section::Custom, statement.clone());
                    }
                } else {
                    self.main(action, statement.clone());
                }
            }
            ActionKind::Rotation { .. }
            | ActionKind::Axes { .. }
            | ActionKind::ArcMotion { .. }
            | ActionKind::DefineTool { .. }
            | ActionKind::AttachTool { .. }
            | ActionKind::DetachTool
            | ActionKind::IODigital { .. }
            | ActionKind::IOAnalog { .. }
            | ActionKind::ExternalAxis { .. }
            | ActionKind::ArmAngle { .. } => self.main_raw(unsupported(action, COMMENT, RobotBrand::Zmorph)),
            // Feed rate and E values are written on every move
            ActionKind::Speed { .. }
            | ActionKind::Precision { .. }
            | ActionKind::MotionMode { .. }
            | ActionKind::Coordinates { .. }
            | ActionKind::PushSettings
            | ActionKind::PopSettings
            | ActionKind::Extrusion { .. }
            | ActionKind::ExtrusionRate { .. }
            | ActionKind::Initialization { .. } => {}
        }
    }
}
