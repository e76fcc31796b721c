//! Error type for machina operations.
//!
//! Only structural corruption and API misuse become errors. Precondition
//! violations while applying an Action (missing pose data, unknown tool,
//! uninitialized external axis) are reported as `Ok(false)` by
//! [`RobotCursor::apply`](crate::cursor::RobotCursor::apply) and logged.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = MachinaError> = std::result::Result<T, E>;

/// Error type for machina operations.
#[derive(Debug, Error)]
pub enum MachinaError {
    /// More nested settings pushes than the buffer can hold
    #[error("Settings buffer overflow: more than {capacity} nested pushes without a pop")]
    SettingsBufferOverflow {
        /// Maximum nesting depth
        capacity: usize,
    },

    /// An id scan over the pending buffer never reached the requested id
    #[error("Action id {id} not found in the pending buffer")]
    ActionIdNotFound {
        /// The requested id
        id: i64,
    },

    /// Relative arcs can only move the position, never the orientation
    #[error("Relative arc motion with orientation is not supported")]
    UnsupportedArc,

    /// A name that must be identifier-like is not
    #[error("Invalid name: {name:?}")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// A structured command could not be resolved into an Action
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A binary frame could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Configuration or command JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
