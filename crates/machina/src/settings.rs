//! Push/pop snapshots of the mutable motion settings.

use serde::{Deserialize, Serialize};

use crate::error::{MachinaError, Result};
use crate::types::{MotionType, ReferenceCS};

/// Maximum nesting depth of [`SettingsBuffer::push`].
pub const SETTINGS_BUFFER_CAPACITY: usize = 32;

/// The settings a cursor can push and pop.
///
/// Also used as the default settings of a fresh cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// TCP speed in mm/s
    pub speed: f64,
    /// TCP acceleration in mm/s², 0 means controller default
    pub acceleration: f64,
    /// Blend radius in mm
    pub precision: f64,
    /// Interpolation of motions
    pub motion_type: MotionType,
    /// Frame relative motions are expressed in
    pub reference_cs: ReferenceCS,
    /// Extruded length per mm of travel
    pub extrusion_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 20.0,
            acceleration: 0.0,
            precision: 5.0,
            motion_type: MotionType::Linear,
            reference_cs: ReferenceCS::World,
            extrusion_rate: 0.0,
        }
    }
}

impl Settings {
    /// Set the speed, clamped at 0.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Set the acceleration, clamped at 0.
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration.max(0.0);
        self
    }

    /// Set the blend radius, clamped at 0.
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision.max(0.0);
        self
    }

    /// Set the interpolation.
    pub fn with_motion_type(mut self, motion_type: MotionType) -> Self {
        self.motion_type = motion_type;
        self
    }

    /// Set the reference frame.
    pub fn with_reference_cs(mut self, reference_cs: ReferenceCS) -> Self {
        self.reference_cs = reference_cs;
        self
    }

    /// Set the extrusion rate, clamped at 0.
    pub fn with_extrusion_rate(mut self, extrusion_rate: f64) -> Self {
        self.extrusion_rate = extrusion_rate.max(0.0);
        self
    }
}

/// Bounded LIFO of settings snapshots.
///
/// Overflowing the stack is a broken push/pop nesting contract and returns
/// [`MachinaError::SettingsBufferOverflow`]. Popping an empty stack is a
/// normal no-op.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuffer {
    stack: Vec<Settings>,
    /// Live settings right before the most recent successful pop
    settings_before_pop: Option<Settings>,
    last_popped: Option<Settings>,
}

impl SettingsBuffer {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `current` onto the stack.
    pub fn push(&mut self, current: Settings) -> Result<()> {
        if self.stack.len() >= SETTINGS_BUFFER_CAPACITY {
            return Err(MachinaError::SettingsBufferOverflow {
                capacity: SETTINGS_BUFFER_CAPACITY,
            });
        }
        self.stack.push(current);
        Ok(())
    }

    /// Pop the most recent snapshot, remembering `current` as the pre-pop state.
    ///
    /// An empty pop clears the recorded pair, so callers diffing a pop never
    /// see a stale one.
    pub fn pop(&mut self, current: Settings) -> Option<Settings> {
        let Some(popped) = self.stack.pop() else {
            self.settings_before_pop = None;
            self.last_popped = None;
            return None;
        };
        self.settings_before_pop = Some(current);
        self.last_popped = Some(popped);
        Some(popped)
    }

    /// Number of pushed snapshots.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether nothing is pushed.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Settings that were live before the last pop.
    pub fn settings_before_pop(&self) -> Option<&Settings> {
        self.settings_before_pop.as_ref()
    }

    /// The snapshot restored by the last pop.
    pub fn last_popped(&self) -> Option<&Settings> {
        self.last_popped.as_ref()
    }

    /// Drop every snapshot and the recorded pop.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.settings_before_pop = None;
        self.last_popped = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_on_33rd_push() {
        let mut buffer = SettingsBuffer::new();
        for _ in 0..SETTINGS_BUFFER_CAPACITY {
            buffer.push(Settings::default()).unwrap();
        }
        let result = buffer.push(Settings::default());
        assert!(matches!(result, Err(MachinaError::SettingsBufferOverflow { capacity: 32 })));
        assert_eq!(buffer.depth(), SETTINGS_BUFFER_CAPACITY);
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let mut buffer = SettingsBuffer::new();
        assert!(buffer.pop(Settings::default()).is_none());
        assert!(buffer.settings_before_pop().is_none());
    }

    #[test]
    fn test_pop_records_pre_pop_state() {
        let mut buffer = SettingsBuffer::new();
        let pushed = Settings::default();
        buffer.push(pushed).unwrap();

        let live = pushed.with_acceleration(500.0);
        let popped = buffer.pop(live).unwrap();

        assert_eq!(popped, pushed);
        assert_eq!(buffer.settings_before_pop(), Some(&live));
        assert_eq!(buffer.last_popped(), Some(&pushed));
    }
}
