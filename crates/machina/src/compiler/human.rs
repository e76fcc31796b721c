//! Machina's own instruction syntax, one instruction per action.

use super::{annotate, replay, single_file_program, Compiler, RobotBrand};
use crate::action::ActionKind;
use crate::config::CompileOptions;
use crate::cursor::RobotCursor;
use crate::error::Result;
use crate::program::{Encoding, Program, ProgramBuilder, Section};

const COMMENT: &str = "//";

/// Compiles to a `.machina` file that can be read back as commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanCompiler;

impl Compiler for HumanCompiler {
    fn brand(&self) -> RobotBrand {
        RobotBrand::Human
    }

    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program> {
        let mut builder = ProgramBuilder::new();
        builder.push(Section::Header, format!("{} Machina program \"{}\"", COMMENT, program_name));

        replay(cursor, options, |action, _| {
            let instruction = action.to_instruction();
            let line = match action.kind() {
                // Already a comment
                ActionKind::Initialization { .. } => instruction,
                _ => annotate(instruction, action, COMMENT, options),
            };
            builder.push(Section::Main, line);
            Ok(())
        })?;

        Ok(single_file_program(
            program_name,
            RobotBrand::Human,
            "machina",
            COMMENT,
            Encoding::Utf8,
            builder.build(),
        ))
    }
}
