//! The issue → release → execution cursor pipeline of one robot.

use std::sync::Arc;

use crate::action::{Action, ActionKind};
use crate::compiler::Compiler;
use crate::config::{CompileOptions, RobotConfig};
use crate::cursor::RobotCursor;
use crate::error::Result;
use crate::logging::RobotLogger;
use crate::program::Program;

/// First id handed out by a chain.
pub const FIRST_ACTION_ID: i64 = 1;

const RELEASE_STAGE: usize = 1;
const EXECUTION_STAGE: usize = 2;

/// Three chained cursors sharing one robot's actions.
///
/// - The issue cursor applies every action as it is issued, so invalid
///   actions are rejected before they get an id.
/// - The release cursor receives actions as they are released and is the
///   cursor compilers and drivers replay.
/// - The execution cursor follows what the controller reports as done.
#[derive(Debug)]
pub struct CursorChain {
    config: RobotConfig,
    logger: RobotLogger,
    issue: RobotCursor,
    next_id: i64,
}

impl CursorChain {
    /// Build a chain for `config`, logging through `logger`.
    ///
    /// If the config has an initial pose it is issued right away as the first action.
    pub fn new(config: RobotConfig, logger: RobotLogger) -> Result<Self> {
        let defaults = config.defaults;
        let execution = RobotCursor::new(
            format!("{}/execution", config.name),
            logger.scoped("execution"),
            defaults,
            false,
        );
        let release = RobotCursor::new(format!("{}/release", config.name), logger.scoped("release"), defaults, false)
            .with_child(execution);
        let issue = RobotCursor::new(format!("{}/issue", config.name), logger.scoped("issue"), defaults, true)
            .with_child(release);

        let mut chain = Self {
            config,
            logger,
            issue,
            next_id: FIRST_ACTION_ID,
        };

        if let Some(pose) = chain.config.initial_pose {
            chain.issue(ActionKind::Initialization { pose })?;
        }

        tracing::debug!(robot = %chain.config.name, brand = %chain.config.brand, "Cursor chain created");
        Ok(chain)
    }

    /// A chain logging only to `tracing`, with the robot name as source.
    pub fn from_config(config: RobotConfig) -> Result<Self> {
        let logger = RobotLogger::new(config.name.clone());
        Self::new(config, logger)
    }

    /// Issue a new action.
    ///
    /// Returns `Ok(false)` if the action cannot be applied to the issued
    /// state; it is then dropped without consuming an id.
    pub fn issue(&mut self, kind: ActionKind) -> Result<bool> {
        let action = Arc::new(Action::with_id(kind, self.next_id));
        let issued = self.issue.issue(action)?;
        if issued {
            self.next_id += 1;
        }
        Ok(issued)
    }

    /// Issue several actions, stopping at the first error.
    ///
    /// Returns how many were accepted.
    pub fn issue_all(&mut self, kinds: impl IntoIterator<Item = ActionKind>) -> Result<usize> {
        let mut accepted = 0;
        for kind in kinds {
            if self.issue(kind)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Release the oldest issued action into the release cursor.
    pub fn release_next(&mut self) -> Result<Option<Arc<Action>>> {
        self.issue.apply_next_action()
    }

    /// Release every issued action. Returns how many were released.
    pub fn release_all(&mut self) -> Result<usize> {
        let mut released = 0;
        while self.release_next()?.is_some() {
            released += 1;
        }
        Ok(released)
    }

    /// Release everything issued so far and group it into one block on the
    /// release cursor.
    pub fn set_block(&mut self) -> Result<usize> {
        self.release_all()?;
        Ok(self.release_cursor().set_block())
    }

    /// Release pending actions and compile the release cursor.
    pub fn compile(&mut self, compiler: &dyn Compiler, program_name: &str, options: &CompileOptions) -> Result<Program> {
        self.release_all()?;
        self.logger.verbose(format!(
            "Compiling program \"{}\" for {}",
            program_name,
            compiler.brand()
        ));
        compiler.compile(program_name, self.release_cursor_mut(), options)
    }

    /// Compile with the configured brand, using the robot name as program name.
    pub fn compile_program(&mut self, options: &CompileOptions) -> Result<Program> {
        let compiler = self.config.brand.compiler();
        let name = self.config.name.clone();
        self.compile(compiler.as_ref(), &name, options)
    }

    /// Advance the execution cursor to the action the controller reports done.
    pub fn execute_up_to(&mut self, id: i64) -> Result<usize> {
        self.execution_cursor_mut().apply_actions_up_to_id(id)
    }

    /// Discard everything pending on every cursor.
    pub fn flush(&mut self) -> usize {
        let mut discarded = self.issue.flush();
        discarded += self.release_cursor().flush();
        discarded += self.execution_cursor().flush();
        discarded
    }

    /// The configuration the chain was built from.
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Logger shared by all three cursors.
    pub fn logger(&self) -> &RobotLogger {
        &self.logger
    }

    /// Id the next accepted action will get.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// First stage: applies actions as they are issued.
    pub fn issue_cursor(&self) -> &RobotCursor {
        &self.issue
    }

    /// Second stage: holds released actions until compiled or streamed.
    pub fn release_cursor(&self) -> &RobotCursor {
        self.issue.stage(RELEASE_STAGE)
    }

    /// Third stage: tracks what the robot has executed.
    pub fn execution_cursor(&self) -> &RobotCursor {
        self.issue.stage(EXECUTION_STAGE)
    }

    /// Mutable access for compilers and encoders.
    pub fn release_cursor_mut(&mut self) -> &mut RobotCursor {
        self.issue.stage_mut(RELEASE_STAGE)
    }

    /// Mutable access to the execution stage.
    pub fn execution_cursor_mut(&mut self) -> &mut RobotCursor {
        self.issue.stage_mut(EXECUTION_STAGE)
    }
}
