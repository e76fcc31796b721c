//! Per-brand program compilers.
//!
//! Every compiler follows the same replay contract: take a read-only
//! snapshot of the cursor's pending actions (the next block, or all of
//! them), then drive the cursor forward one action at a time with
//! [`RobotCursor::apply_next_action`] and render each action from the
//! post-action cursor state. Rendering therefore cannot be separated from
//! advancing the cursor.
//!
//! Actions a brand has no instruction for render as a visible
//! `<comment> ERROR: ...` line and never abort the compilation.

mod abb;
mod human;
mod kuka;
mod ur;
mod zmorph;

pub use abb::AbbCompiler;
pub use human::HumanCompiler;
pub use kuka::KukaCompiler;
pub use ur::UrCompiler;
pub use zmorph::ZmorphCompiler;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::CompileOptions;
use crate::cursor::RobotCursor;
use crate::error::{MachinaError, Result};
use crate::program::{Encoding, Program, RobotProgramFile};

/// Target platform of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotBrand {
    /// ABB RAPID
    Abb,
    /// Universal Robots URScript
    Ur,
    /// KUKA KRL
    Kuka,
    /// ZMorph G-code
    Zmorph,
    /// Machina's own instruction syntax
    Human,
}

impl RobotBrand {
    /// Every supported brand.
    pub const ALL: [RobotBrand; 5] = [
        RobotBrand::Abb,
        RobotBrand::Ur,
        RobotBrand::Kuka,
        RobotBrand::Zmorph,
        RobotBrand::Human,
    ];

    /// The compiler for this brand.
    pub fn compiler(&self) -> Box<dyn Compiler> {
        match self {
            RobotBrand::Abb => Box::new(AbbCompiler),
            RobotBrand::Ur => Box::new(UrCompiler),
            RobotBrand::Kuka => Box::new(KukaCompiler),
            RobotBrand::Zmorph => Box::new(ZmorphCompiler),
            RobotBrand::Human => Box::new(HumanCompiler),
        }
    }
}

impl fmt::Display for RobotBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RobotBrand::Abb => "ABB",
            RobotBrand::Ur => "UR",
            RobotBrand::Kuka => "KUKA",
            RobotBrand::Zmorph => "ZMorph",
            RobotBrand::Human => "Human",
        };
        f.write_str(name)
    }
}

impl FromStr for RobotBrand {
    type Err = MachinaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abb" => Ok(RobotBrand::Abb),
            "ur" | "universal" | "universalrobots" => Ok(RobotBrand::Ur),
            "kuka" => Ok(RobotBrand::Kuka),
            "zmorph" => Ok(RobotBrand::Zmorph),
            "human" | "machina" => Ok(RobotBrand::Human),
            _ => Err(MachinaError::InvalidCommand(format!("unknown robot brand {s:?}"))),
        }
    }
}

/// Renders a cursor's pending actions as a brand-specific program.
pub trait Compiler {
    /// The brand this compiler targets.
    fn brand(&self) -> RobotBrand;

    /// Compile the pending actions of `cursor`, advancing it past them.
    fn compile(&self, program_name: &str, cursor: &mut RobotCursor, options: &CompileOptions) -> Result<Program>;
}

/// Replay the compiled actions through `cursor`, calling `render` after each
/// one is applied.
pub(crate) fn replay<F>(cursor: &mut RobotCursor, options: &CompileOptions, mut render: F) -> Result<usize>
where
    F: FnMut(&Arc<Action>, &RobotCursor) -> Result<()>,
{
    let snapshot = if options.use_block {
        cursor.block_pending()
    } else {
        cursor.pending_actions()
    };

    let mut count = 0;
    for _ in &snapshot {
        let Some(action) = cursor.apply_next_action()? else {
            break;
        };
        render(&action, cursor)?;
        count += 1;
    }
    Ok(count)
}

/// `line` followed by the action's description or id as a trailing comment.
pub(crate) fn annotate(line: impl Into<String>, action: &Action, comment: &str, options: &CompileOptions) -> String {
    let line = line.into();
    if options.human_comments {
        format!("{} {} {}", line, comment, action)
    } else {
        format!("{} {} [{}]", line, comment, action.id())
    }
}

/// Marker for an action this brand cannot express.
pub(crate) fn unsupported(action: &Action, comment: &str, brand: RobotBrand) -> String {
    format!("{} ERROR: \"{}\" is not supported on {} robots", comment, action, brand)
}

/// Marker for an out-of-range or malformed value.
pub(crate) fn invalid(action: &Action, comment: &str, reason: &str) -> String {
    format!("{} ERROR: {} (action {})", comment, reason, action.id())
}

/// A program with a single file.
pub(crate) fn single_file_program(
    name: &str,
    brand: RobotBrand,
    extension: &str,
    comment: &str,
    encoding: Encoding,
    lines: Vec<String>,
) -> Program {
    let mut program = Program::new(name, brand);
    program.add_file(RobotProgramFile {
        name: name.to_string(),
        extension: extension.to_string(),
        lines,
        encoding,
        comment_char: comment.to_string(),
    });
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_round_trip_names() {
        for brand in RobotBrand::ALL {
            let parsed: RobotBrand = brand.to_string().parse().unwrap();
            assert_eq!(parsed, brand);
            assert_eq!(brand.compiler().brand(), brand);
        }
        assert!("fanuc".parse::<RobotBrand>().is_err());
    }
}
