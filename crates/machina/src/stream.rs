//! Streaming encoders: per-action byte messages for live controllers.
//!
//! An encoder is a compiler that emits bytes instead of text. It follows the
//! same replay contract: pop the next action from the cursor, apply it, and
//! render it from the resulting state. Transports are out of scope; they
//! only move the returned buffers.

use machina_geometry::{Joints, Rotation, Vector};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::cursor::RobotCursor;
use crate::error::{MachinaError, Result};

/// Size of the length prefix on binary frames.
pub const FRAME_HEADER_LEN: usize = 8;

/// Renders the next pending action of a cursor as one message.
pub trait ActionEncoder {
    /// Consume the next action of `cursor` and encode it.
    ///
    /// Returns `None` when nothing is pending.
    fn encode_next(&mut self, cursor: &mut RobotCursor) -> Result<Option<Vec<u8>>>;

    /// Encode every pending action.
    fn encode_all(&mut self, cursor: &mut RobotCursor) -> Result<Vec<Vec<u8>>> {
        let mut messages = Vec::new();
        while let Some(message) = self.encode_next(cursor)? {
            messages.push(message);
        }
        Ok(messages)
    }
}

/// Line-based text protocol: `@<id> <instruction>\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeEncoder;

impl BridgeEncoder {
    /// `@<id> <instruction>\n` for `action`.
    pub fn encode_action(action: &Action) -> Vec<u8> {
        format!("@{} {}\n", action.id(), action.to_instruction()).into_bytes()
    }
}

impl ActionEncoder for BridgeEncoder {
    fn encode_next(&mut self, cursor: &mut RobotCursor) -> Result<Option<Vec<u8>>> {
        Ok(cursor
            .apply_next_action()?
            .map(|action| Self::encode_action(&action)))
    }
}

/// Action plus the pose it leaves the cursor in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFrame {
    /// Id of the action
    pub id: i64,
    /// The applied action
    pub action: Action,
    /// TCP position after the action, mm
    pub position: Option<Vector>,
    /// TCP orientation after the action
    pub rotation: Option<Rotation>,
    /// Joint angles after the action, degrees
    pub axes: Option<Joints>,
}

/// Binary protocol: 8-byte little-endian length prefix followed by a
/// bincode-encoded [`ActionFrame`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    /// Length-prefixed bincode encoding of `frame`.
    pub fn encode_frame(frame: &ActionFrame) -> Result<Vec<u8>> {
        let payload = bincode::serde::encode_to_vec(frame, bincode::config::standard())
            .map_err(|e| MachinaError::Encoding(e.to_string()))?;

        let len = payload.len() as u64;
        let mut buffer = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        buffer.extend_from_slice(&len.to_le_bytes());
        buffer.extend_from_slice(&payload);
        Ok(buffer)
    }
}

impl ActionEncoder for FrameEncoder {
    fn encode_next(&mut self, cursor: &mut RobotCursor) -> Result<Option<Vec<u8>>> {
        let Some(action) = cursor.apply_next_action()? else {
            return Ok(None);
        };
        let frame = ActionFrame {
            id: action.id(),
            action: (*action).clone(),
            position: cursor.position(),
            rotation: cursor.rotation(),
            axes: cursor.axes(),
        };
        Self::encode_frame(&frame).map(Some)
    }
}

/// Decode one length-prefixed frame.
pub fn decode_frame(bytes: &[u8]) -> Result<ActionFrame> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(MachinaError::Encoding(format!(
            "frame is {} bytes, shorter than its header",
            bytes.len()
        )));
    }

    let length_bytes: [u8; FRAME_HEADER_LEN] = bytes[..FRAME_HEADER_LEN]
        .try_into()
        .map_err(|_| MachinaError::Encoding("invalid frame header".to_string()))?;
    let length = u64::from_le_bytes(length_bytes) as usize;

    let payload = &bytes[FRAME_HEADER_LEN..];
    if payload.len() < length {
        return Err(MachinaError::Encoding(format!(
            "frame declares {} payload bytes but only {} are present",
            length,
            payload.len()
        )));
    }

    bincode::serde::decode_from_slice(&payload[..length], bincode::config::standard())
        .map(|(frame, _)| frame)
        .map_err(|e| MachinaError::Encoding(e.to_string()))
}
