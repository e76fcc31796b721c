//! RobotCursor: the virtual device state machine.
//!
//! A cursor holds the full state of a virtual robot (pose, settings, tools,
//! outputs, temperatures, extrusion) and applies [`Action`]s to it one at a
//! time. Cursors are chained: releasing an action from a cursor issues the
//! same `Arc<Action>` into its child, which yields the fixed
//! issue → release → execution pipeline built by
//! [`CursorChain`](crate::chain::CursorChain).
//!
//! Handlers are split by concern:
//! - `motion`: translations, rotations, transformations, axes, arcs
//! - `peripherals`: settings, tools, IO, temperature, extrusion, external axes

mod motion;
mod peripherals;
mod pose;

pub use pose::PoseState;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use machina_geometry::{Joints, Rotation, Vector};

use crate::action::{Action, ActionKind};
use crate::action_buffer::ActionBuffer;
use crate::error::Result;
use crate::logging::RobotLogger;
use crate::settings::{Settings, SettingsBuffer};
use crate::tool::Tool;
use crate::types::{MotionType, ReferenceCS, RobotPartType};

/// Number of slots in each external axis set.
pub const EXTERNAL_AXES_COUNT: usize = 6;

/// Key of a digital or analog output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputPin {
    /// Controller-specific pin name or number
    pub pin_id: String,
    /// Pin on the tool flange
    pub tool_pin: bool,
}

impl OutputPin {
    /// Key for `pin_id`.
    pub fn new(pin_id: impl Into<String>, tool_pin: bool) -> Self {
        Self {
            pin_id: pin_id.into(),
            tool_pin,
        }
    }
}

/// A virtual robot state plus its pending action queue.
#[derive(Debug)]
pub struct RobotCursor {
    name: String,
    logger: RobotLogger,

    /// Apply actions when they are issued (issue cursor) instead of when
    /// they are consumed from the buffer (release and execution cursors)
    apply_on_issue: bool,

    pose: PoseState,
    prev_pose: PoseState,

    settings: Settings,
    settings_buffer: SettingsBuffer,

    arm_angle: Option<f64>,
    external_axes_cartesian: [Option<f64>; EXTERNAL_AXES_COUNT],
    external_axes_joint: [Option<f64>; EXTERNAL_AXES_COUNT],

    tool: Option<Tool>,
    available_tools: BTreeMap<String, Tool>,

    digital_outputs: BTreeMap<OutputPin, bool>,
    analog_outputs: BTreeMap<OutputPin, f64>,
    temperatures: BTreeMap<RobotPartType, f64>,

    is_extruding: bool,
    extruded_length: f64,
    prev_extruded_length: f64,

    /// The action most recently applied to this cursor
    last_applied: Option<Arc<Action>>,

    buffer: Mutex<ActionBuffer>,
    child: Option<Box<RobotCursor>>,
}

impl RobotCursor {
    /// A cursor with an unknown pose. With `apply_on_issue` actions are applied as they are issued.
    pub fn new(name: impl Into<String>, logger: RobotLogger, defaults: Settings, apply_on_issue: bool) -> Self {
        let temperatures = RobotPartType::ALL.iter().map(|part| (*part, 0.0)).collect();
        Self {
            name: name.into(),
            logger,
            apply_on_issue,
            pose: PoseState::Unknown,
            prev_pose: PoseState::Unknown,
            settings: defaults,
            settings_buffer: SettingsBuffer::new(),
            arm_angle: None,
            external_axes_cartesian: [None; EXTERNAL_AXES_COUNT],
            external_axes_joint: [None; EXTERNAL_AXES_COUNT],
            tool: None,
            available_tools: BTreeMap::new(),
            digital_outputs: BTreeMap::new(),
            analog_outputs: BTreeMap::new(),
            temperatures,
            is_extruding: false,
            extruded_length: 0.0,
            prev_extruded_length: 0.0,
            last_applied: None,
            buffer: Mutex::new(ActionBuffer::new()),
            child: None,
        }
    }

    /// Attach `child` as the next stage of this cursor.
    pub fn with_child(mut self, child: RobotCursor) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    // ========================================================================
    // Buffer operations
    // ========================================================================

    fn buffer(&self) -> MutexGuard<'_, ActionBuffer> {
        // Poisoning is ignored; every buffer mutation is a single step
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit `action` into this cursor's buffer.
    ///
    /// An applying cursor applies it first and rejects it (without
    /// buffering) if the application fails.
    pub fn issue(&mut self, action: Arc<Action>) -> Result<bool> {
        if self.apply_on_issue && !self.apply(&action)? {
            self.logger.warning(format!("Could not issue \"{}\"", action));
            return Ok(false);
        }
        self.buffer().add(action);
        Ok(true)
    }

    /// Consume the next pending action, apply it unless it was applied on
    /// issue, and issue it into the child cursor.
    ///
    /// Returns `None` when nothing is pending.
    pub fn apply_next_action(&mut self) -> Result<Option<Arc<Action>>> {
        let Some(action) = self.buffer().get_next() else {
            return Ok(None);
        };
        self.consume(&action)?;
        Ok(Some(action))
    }

    /// Consume and apply every pending action up to and including `id`.
    ///
    /// Used by drivers to advance the execution cursor when the controller
    /// reports progress.
    pub fn apply_actions_up_to_id(&mut self, id: i64) -> Result<usize> {
        let actions = self.buffer().get_all_up_to_id(id)?;
        for action in &actions {
            self.consume(action)?;
        }
        Ok(actions.len())
    }

    fn consume(&mut self, action: &Arc<Action>) -> Result<()> {
        if !self.apply_on_issue && !self.apply(action)? {
            self.logger.warning(format!("Could not apply \"{}\"", action));
        }
        if let Some(child) = self.child.as_mut() {
            child.issue(Arc::clone(action))?;
        }
        Ok(())
    }

    /// Snapshot of the next block, or of everything pending if no block is set.
    pub fn block_pending(&self) -> Vec<Arc<Action>> {
        self.buffer().get_block_pending(false)
    }

    /// Group pending actions into a block; see [`ActionBuffer::set_block`].
    pub fn set_block(&self) -> usize {
        self.buffer().set_block()
    }

    /// Discard all pending actions and blocks.
    pub fn flush(&self) -> usize {
        let discarded = self.buffer().flush();
        if discarded > 0 {
            self.logger.verbose(format!("Flushed {} pending actions", discarded));
        }
        discarded
    }

    /// Number of pending actions.
    pub fn pending_len(&self) -> usize {
        self.buffer().pending_len()
    }

    /// Number of released actions.
    pub fn released_len(&self) -> usize {
        self.buffer().released_len()
    }

    /// Snapshot of the pending actions.
    pub fn pending_actions(&self) -> Vec<Arc<Action>> {
        self.buffer().pending()
    }

    /// Snapshot of the released history.
    pub fn released_actions(&self) -> Vec<Arc<Action>> {
        self.buffer().released().to_vec()
    }

    // ========================================================================
    // Apply
    // ========================================================================

    /// Apply `action` to this cursor's state.
    ///
    /// Returns `Ok(false)` with the state untouched when a precondition does
    /// not hold. Errors are reserved for broken structural invariants.
    pub fn apply(&mut self, action: &Arc<Action>) -> Result<bool> {
        let applied = match action.kind() {
            ActionKind::Translation { translation, relative } => self.apply_translation(*translation, *relative),
            ActionKind::Rotation { rotation, relative } => self.apply_rotation(*rotation, *relative),
            ActionKind::Transformation {
                translation,
                rotation,
                relative,
                translation_first,
            } => self.apply_transformation(*translation, *rotation, *relative, *translation_first),
            ActionKind::Axes { joints, relative } => self.apply_axes(*joints, *relative),
            ActionKind::ArcMotion {
                end,
                relative,
                position_only,
                ..
            } => self.apply_arc_motion(end, *relative, *position_only),
            ActionKind::Speed { value, relative } => {
                self.settings.speed = Self::next_value(self.settings.speed, *value, *relative).max(0.0);
                true
            }
            ActionKind::Acceleration { value, relative } => {
                self.settings.acceleration = Self::next_value(self.settings.acceleration, *value, *relative).max(0.0);
                true
            }
            ActionKind::Precision { value, relative } => {
                self.settings.precision = Self::next_value(self.settings.precision, *value, *relative).max(0.0);
                true
            }
            ActionKind::MotionMode { motion_type } => {
                self.settings.motion_type = *motion_type;
                true
            }
            ActionKind::Coordinates { reference_cs } => {
                self.settings.reference_cs = *reference_cs;
                true
            }
            ActionKind::PushSettings => {
                self.settings_buffer.push(self.settings)?;
                true
            }
            ActionKind::PopSettings => self.apply_pop_settings(),
            ActionKind::Wait { .. } | ActionKind::Message { .. } | ActionKind::Comment { .. } => true,
            ActionKind::CustomCode { .. } => true,
            ActionKind::DefineTool { tool } => self.apply_define_tool(tool),
            ActionKind::AttachTool { name } => self.apply_attach_tool(name),
            ActionKind::DetachTool => self.apply_detach_tool(),
            ActionKind::IODigital { pin_id, on, tool_pin } => {
                self.digital_outputs.insert(OutputPin::new(pin_id.as_str(), *tool_pin), *on);
                true
            }
            ActionKind::IOAnalog {
                pin_id,
                value,
                tool_pin,
            } => {
                self.analog_outputs.insert(OutputPin::new(pin_id.as_str(), *tool_pin), *value);
                true
            }
            ActionKind::Temperature {
                value, part, relative, ..
            } => {
                let current = self.temperature(*part);
                self.temperatures.insert(*part, Self::next_value(current, *value, *relative));
                true
            }
            ActionKind::Extrusion { on } => {
                self.is_extruding = *on;
                true
            }
            ActionKind::ExtrusionRate { value, relative } => {
                self.settings.extrusion_rate =
                    Self::next_value(self.settings.extrusion_rate, *value, *relative).max(0.0);
                true
            }
            ActionKind::ExternalAxis {
                axis_number,
                value,
                target,
                relative,
            } => self.apply_external_axis(*axis_number, *value, *target, *relative),
            ActionKind::ArmAngle { value, relative } => self.apply_arm_angle(*value, *relative),
            ActionKind::Initialization { pose } => self.apply_initialization(pose),
        };

        if applied {
            self.last_applied = Some(Arc::clone(action));
            self.logger.debug(format!("Applied \"{}\"", action));
        }
        Ok(applied)
    }

    fn next_value(current: f64, value: f64, relative: bool) -> f64 {
        if relative { current + value } else { value }
    }

    /// Replace the pose, keeping the previous one as shadow, and update the
    /// extruded length.
    fn commit_pose(&mut self, pose: PoseState) {
        self.prev_pose = self.pose;
        self.pose = pose;
        self.prev_extruded_length = self.extruded_length;

        if !self.is_extruding {
            return;
        }
        match (self.prev_pose.position(), self.pose.position()) {
            (Some(prev), Some(current)) => {
                self.extruded_length += self.settings.extrusion_rate * prev.distance(&current);
            }
            _ => self
                .logger
                .verbose("Skipping extrusion length update: position unknown before or after motion"),
        }
    }

    // ========================================================================
    // State accessors
    // ========================================================================

    /// Cursor name, used as the log source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This cursor's logger.
    pub fn logger(&self) -> &RobotLogger {
        &self.logger
    }

    /// Whether actions are applied as they are issued.
    pub fn applies_on_issue(&self) -> bool {
        self.apply_on_issue
    }

    /// Current pose.
    pub fn pose(&self) -> PoseState {
        self.pose
    }

    /// Pose before the last applied motion.
    pub fn prev_pose(&self) -> PoseState {
        self.prev_pose
    }

    /// TCP position, mm.
    pub fn position(&self) -> Option<Vector> {
        self.pose.position()
    }

    /// TCP orientation.
    pub fn rotation(&self) -> Option<Rotation> {
        self.pose.rotation()
    }

    /// Joint angles, degrees.
    pub fn axes(&self) -> Option<Joints> {
        self.pose.axes()
    }

    /// Position before the last applied motion.
    pub fn prev_position(&self) -> Option<Vector> {
        self.prev_pose.position()
    }

    /// Orientation before the last applied motion.
    pub fn prev_rotation(&self) -> Option<Rotation> {
        self.prev_pose.rotation()
    }

    /// Joint angles before the last applied motion.
    pub fn prev_axes(&self) -> Option<Joints> {
        self.prev_pose.axes()
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// TCP speed, mm/s.
    pub fn speed(&self) -> f64 {
        self.settings.speed
    }

    /// TCP acceleration, mm/s².
    pub fn acceleration(&self) -> f64 {
        self.settings.acceleration
    }

    /// Blend radius, mm.
    pub fn precision(&self) -> f64 {
        self.settings.precision
    }

    /// Interpolation of the next motion.
    pub fn motion_type(&self) -> MotionType {
        self.settings.motion_type
    }

    /// Frame relative motions are expressed in.
    pub fn reference_cs(&self) -> ReferenceCS {
        self.settings.reference_cs
    }

    /// Filament per distance travelled, mm/mm.
    pub fn extrusion_rate(&self) -> f64 {
        self.settings.extrusion_rate
    }

    /// The push/pop settings stack.
    pub fn settings_buffer(&self) -> &SettingsBuffer {
        &self.settings_buffer
    }

    /// Elbow angle, degrees.
    pub fn arm_angle(&self) -> Option<f64> {
        self.arm_angle
    }

    /// External axis values for Cartesian targets.
    pub fn external_axes_cartesian(&self) -> &[Option<f64>; EXTERNAL_AXES_COUNT] {
        &self.external_axes_cartesian
    }

    /// External axis values for joint targets.
    pub fn external_axes_joint(&self) -> &[Option<f64>; EXTERNAL_AXES_COUNT] {
        &self.external_axes_joint
    }

    /// The attached tool, if any.
    pub fn tool(&self) -> Option<&Tool> {
        self.tool.as_ref()
    }

    /// Defined tools by name.
    pub fn available_tools(&self) -> &BTreeMap<String, Tool> {
        &self.available_tools
    }

    /// Last value written to a digital output.
    pub fn digital_output(&self, pin_id: &str, tool_pin: bool) -> Option<bool> {
        self.digital_outputs.get(&OutputPin::new(pin_id, tool_pin)).copied()
    }

    /// Last value written to an analog output.
    pub fn analog_output(&self, pin_id: &str, tool_pin: bool) -> Option<f64> {
        self.analog_outputs.get(&OutputPin::new(pin_id, tool_pin)).copied()
    }

    /// Target temperature of `part`, °C.
    pub fn temperature(&self, part: RobotPartType) -> f64 {
        self.temperatures.get(&part).copied().unwrap_or(0.0)
    }

    /// Whether motions extrude.
    pub fn is_extruding(&self) -> bool {
        self.is_extruding
    }

    /// Cumulative extruded length in mm.
    pub fn extruded_length(&self) -> f64 {
        self.extruded_length
    }

    /// Extruded length before the last applied motion.
    pub fn prev_extruded_length(&self) -> f64 {
        self.prev_extruded_length
    }

    /// The most recently applied action.
    pub fn last_applied(&self) -> Option<&Arc<Action>> {
        self.last_applied.as_ref()
    }

    /// The next stage, if any.
    pub fn child(&self) -> Option<&RobotCursor> {
        self.child.as_deref()
    }

    /// Mutable access to the next stage.
    pub fn child_mut(&mut self) -> Option<&mut RobotCursor> {
        self.child.as_deref_mut()
    }

    /// The cursor `depth` stages down the chain, or the last one if the chain is shorter.
    pub fn stage(&self, depth: usize) -> &RobotCursor {
        if depth == 0 {
            return self;
        }
        match self.child {
            Some(ref child) => child.stage(depth - 1),
            None => self,
        }
    }

    /// Mutable form of [`Self::stage`].
    pub fn stage_mut(&mut self, depth: usize) -> &mut RobotCursor {
        if depth == 0 {
            return self;
        }
        match self.child {
            Some(ref mut child) => child.stage_mut(depth - 1),
            None => self,
        }
    }
}
